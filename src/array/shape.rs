//! Shape model.
//!
//! A shape is a list of [`Dim`]s, one per axis. Axis 0 is the batch axis and is always
//! [`Dim::Fixed`]. Axis 1 may be [`Dim::Ragged`], in which case the per-row extents live in the
//! row-split table and the axis has no extent of its own.
//!
//! ## Signed encoding
//! The serialized format (and most numeric runtimes that understand ragged tensors) flags the
//! ragged axis with a negative extent whose absolute value is the total number of entries
//! along that axis, summed over all rows:
//! ```text
//! rows of lengths [2, 0, 3], trailing axis 4
//!   shape       = [Fixed(3), Ragged, Fixed(4)]
//!   row_splits  = [0, 2, 2, 5]
//!   signed      = [3, -5, 4]
//!   size        = 5 * 4 = 20
//! ```
//! [`encode_signed`], [`decode_signed`] and [`size_from_signed_shape`] translate between the
//! two representations.
use smallvec::SmallVec;

use crate::array::{
    error::{ArrayError, ArrayResult},
    util::{self, num_elements},
};

/// Extent of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    Fixed(usize),
    /// Per-row extents are carried by the row-split table.
    Ragged,
}

impl Dim {
    pub const fn is_ragged(&self) -> bool {
        matches!(self, Dim::Ragged)
    }

    /// Fixed extent, or `None` for the ragged axis.
    pub const fn extent(&self) -> Option<usize> {
        match self {
            Dim::Fixed(n) => Some(*n),
            Dim::Ragged => None,
        }
    }
}

impl From<usize> for Dim {
    fn from(value: usize) -> Self {
        Dim::Fixed(value)
    }
}

pub type Shape = SmallVec<[Dim; 4]>;

/// Shape of a regular (dense) array.
pub fn regular(extents: &[usize]) -> Shape {
    extents.iter().copied().map(Dim::Fixed).collect()
}

/// Shape of a ragged array with `rows` rows and the given trailing extents.
pub fn ragged(rows: usize, trailing: &[usize]) -> Shape {
    let mut shape = Shape::with_capacity(trailing.len() + 2);
    shape.push(Dim::Fixed(rows));
    shape.push(Dim::Ragged);
    shape.extend(trailing.iter().copied().map(Dim::Fixed));
    shape
}

/// Validate the structural rules of a shape.
///
/// - axis 0 is fixed
/// - only axis 1 may be ragged
/// - the product of the non-zero fixed extents fits in `usize`, so every stride derived from
///   the shape is representable
pub(crate) fn validate_dims(shape: &[Dim]) -> ArrayResult<()> {
    for (axis, dim) in shape.iter().enumerate() {
        if dim.is_ragged() && axis != 1 {
            return Err(ArrayError::RaggedAxis { axis });
        }
    }
    num_elements(
        shape
            .iter()
            .filter_map(Dim::extent)
            .filter(|&extent| extent != 0),
    )?;
    Ok(())
}

/// Number of elements spanned by one step along axis `axis - 1`.
///
/// This is the product of the fixed extents from `axis` onward. The ragged axis never appears
/// in that range for the callers in this crate.
pub(crate) fn stride_from(shape: &[Dim], axis: usize) -> usize {
    shape
        .iter()
        .skip(axis)
        .filter_map(Dim::extent)
        .product()
}

/// Element count implied by `shape` and, for ragged shapes, `row_splits`.
pub(crate) fn size_from_shape(shape: &[Dim], row_splits: &[i64]) -> ArrayResult<usize> {
    if shape.is_empty() {
        return Ok(0);
    }
    if shape.get(1).is_some_and(Dim::is_ragged) {
        let total = row_splits.last().copied().map(util::offset).unwrap_or(0);
        return num_elements([total, stride_from(shape, 2)]);
    }
    num_elements(shape.iter().filter_map(Dim::extent))
}

/// Encode as signed extents, marking the ragged axis with `-total`.
pub fn encode_signed(shape: &[Dim], row_splits: &[i64]) -> ArrayResult<SmallVec<[i32; 4]>> {
    let total = row_splits.last().copied().unwrap_or(0);
    shape
        .iter()
        .map(|dim| {
            let value = match dim {
                Dim::Fixed(n) => i64::try_from(*n).map_err(|_| ArrayError::ShapeOverflow)?,
                Dim::Ragged => -total,
            };
            i32::try_from(value).map_err(|_| ArrayError::ShapeOverflow)
        })
        .collect()
}

/// Decode signed extents, returning the shape and the ragged total if any.
///
/// A ragged axis holding no entries is encoded as `0`, which the sign cannot distinguish from
/// a fixed extent. `has_row_splits` marks such an axis 1 as ragged.
pub fn decode_signed(
    signed: &[i32],
    has_row_splits: bool,
) -> ArrayResult<(Shape, Option<usize>)> {
    let mut total = None;
    let mut shape = Shape::with_capacity(signed.len());
    for (axis, &value) in signed.iter().enumerate() {
        if value < 0 || (axis == 1 && value == 0 && has_row_splits) {
            if axis != 1 {
                return Err(ArrayError::RaggedAxis { axis });
            }
            total = Some(value.unsigned_abs() as usize);
            shape.push(Dim::Ragged);
        } else {
            shape.push(Dim::Fixed(value as usize));
        }
    }
    Ok((shape, total))
}

/// Element count of a signed shape.
///
/// Multiplies absolute extents left to right, except that the ragged (negative) axis *resets*
/// the running product to its absolute value: it already counts the entries of all rows.
pub fn size_from_signed_shape(signed: &[i32]) -> ArrayResult<usize> {
    if signed.is_empty() {
        return Ok(0);
    }
    let mut size = 1usize;
    for &value in signed {
        let extent = value.unsigned_abs() as usize;
        size = if value < 0 {
            extent
        } else {
            size.checked_mul(extent).ok_or(ArrayError::ShapeOverflow)?
        };
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_roundtrip_keeps_ragged_total() {
        let shape = ragged(3, &[4]);
        let signed = encode_signed(&shape, &[0, 2, 2, 5]).unwrap();
        assert_eq!(signed.as_slice(), &[3, -5, 4]);

        let (decoded, total) = decode_signed(&signed, true).unwrap();
        assert_eq!(decoded, shape);
        assert_eq!(total, Some(5));
        assert_eq!(size_from_signed_shape(&signed).unwrap(), 20);
        assert_eq!(size_from_shape(&shape, &[0, 2, 2, 5]).unwrap(), 20);
    }

    #[test]
    fn empty_ragged_axis_needs_row_splits_to_decode() {
        let shape = ragged(2, &[3]);
        let signed = encode_signed(&shape, &[0, 0, 0]).unwrap();
        assert_eq!(signed.as_slice(), &[2, 0, 3]);

        let (decoded, total) = decode_signed(&signed, true).unwrap();
        assert_eq!(decoded, shape);
        assert_eq!(total, Some(0));

        let (decoded, total) = decode_signed(&signed, false).unwrap();
        assert_eq!(decoded, regular(&[2, 0, 3]));
        assert_eq!(total, None);
        assert_eq!(size_from_signed_shape(&signed).unwrap(), 0);
    }

    #[test]
    fn ragged_marker_only_on_axis_one() {
        assert!(matches!(
            validate_dims(&[Dim::Ragged, Dim::Fixed(2)]),
            Err(ArrayError::RaggedAxis { axis: 0 })
        ));
        assert!(matches!(
            decode_signed(&[2, 3, -4], false),
            Err(ArrayError::RaggedAxis { axis: 2 })
        ));
    }

    #[test]
    fn regular_size_is_plain_product() {
        assert_eq!(size_from_shape(&regular(&[4, 3, 2]), &[]).unwrap(), 24);
        assert_eq!(size_from_signed_shape(&[4, 3, 2]).unwrap(), 24);
        assert_eq!(size_from_shape(&regular(&[0, 3]), &[]).unwrap(), 0);
        assert_eq!(size_from_shape(&[], &[]).unwrap(), 0);
    }

    #[test]
    fn stride_overflow_is_rejected_even_with_zero_rows() {
        let shape = regular(&[0, usize::MAX, 2]);
        assert!(matches!(
            validate_dims(&shape),
            Err(ArrayError::ShapeOverflow)
        ));
    }
}
