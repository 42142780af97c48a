use crate::array::error::ArrayError;

/// Checked product of axis extents.
pub fn num_elements<I: IntoIterator<Item = usize>>(extents: I) -> Result<usize, ArrayError> {
    extents
        .into_iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(d))
        .ok_or(ArrayError::ShapeOverflow)
}

/// Convert a row-split value to an element offset.
#[inline]
pub(crate) fn offset(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}
