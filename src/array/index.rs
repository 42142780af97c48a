//! Element access.
//!
//! [`RaggedArray::at`] maps a multi-dimensional index to a flat offset in constant time.
//!
//! - Regular arrays use plain row-major strides. Only the final flat offset is checked against
//!   the array size; individual coordinates past their axis extent are accepted as long as the
//!   offset lands inside the buffer.
//! - Ragged arrays map the first two coordinates through the row splits
//!   (`row_splits[i] + j`) and apply the trailing strides on top. The row `i` and the in-row
//!   position `j` are bounds-checked; trailing coordinates again only through the final
//!   offset.
use crate::array::{
    RaggedArray,
    datatype::Element,
    error::{ArrayError, ArrayResult},
    util,
};

impl<'a, T: Element> RaggedArray<'a, T> {
    /// Reference to the element at `index` (one coordinate per axis).
    ///
    /// # Errors
    /// - [`ArrayError::DimensionMismatch`] if `index.len()` differs from the number of axes.
    /// - [`ArrayError::RaggedIndexOutOfBounds`] if a ragged row or in-row position is invalid.
    /// - [`ArrayError::IndexOutOfBounds`] if the flat offset is outside the buffer.
    pub fn at(&self, index: &[usize]) -> ArrayResult<&T> {
        let flat = self.flat_index(index)?;
        Ok(&self.data()[flat])
    }

    /// Mutable reference to the element at `index`. Copies a borrowed buffer first.
    pub fn at_mut(&mut self, index: &[usize]) -> ArrayResult<&mut T> {
        let flat = self.flat_index(index)?;
        Ok(&mut self.data_mut()[flat])
    }

    /// Flat buffer offset of `index`.
    pub fn flat_index(&self, index: &[usize]) -> ArrayResult<usize> {
        let shape = self.shape();
        if index.len() != shape.len() {
            return Err(ArrayError::DimensionMismatch {
                expected: shape.len(),
                actual: index.len(),
            });
        }

        let size = self.size();

        let (start, trailing_from) = if self.is_ragged() {
            let (row, column) = (index[0], index[1]);
            let in_row = row < self.first_dimension()
                && self.size_at(row).is_ok_and(|length| column < length);
            if !in_row {
                return Err(ArrayError::RaggedIndexOutOfBounds { row, column });
            }
            (util::offset(self.row_splits()[row]) + column, 2)
        } else {
            (index[0], 1)
        };

        let mut flat = start;
        for (axis, &i) in index.iter().enumerate().skip(trailing_from) {
            let extent = shape[axis].extent().unwrap_or(1);
            flat = match flat.checked_mul(extent).and_then(|v| v.checked_add(i)) {
                Some(v) => v,
                None => {
                    return Err(ArrayError::IndexOutOfBounds {
                        index: usize::MAX,
                        size,
                    });
                }
            };
        }

        if flat >= size {
            return Err(ArrayError::IndexOutOfBounds { index: flat, size });
        }
        Ok(flat)
    }
}
