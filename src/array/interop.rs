//! `ndarray` interop.
//!
//! Numeric runtimes have no notion of a ragged axis, so a ragged array crosses the boundary as
//! a dense array over its entries plus the row-split table:
//! ```text
//! shape [3, Ragged, 2], row_splits [0, 2, 2, 5]   <->   ndarray [5, 2] + [0, 2, 2, 5]
//! ```
//! Regular arrays map one to one and carry an empty row-split table.
//!
//! - [`RaggedArray::view`] borrows the buffer without copying.
//! - [`RaggedArray::to_ndarray`] copies.
//! - [`RaggedArray::into_ndarray`] moves an owned buffer out without copying.
//! - [`RaggedArray::from_ndarray`] takes ownership of an `ndarray` buffer.
//! - [`RaggedArray::from_ndarray_view`] borrows a standard-layout `ndarray` without copying.
use ndarray::{ArrayBase, ArrayD, ArrayViewD, Data, IxDyn};
use smallvec::SmallVec;

use crate::array::{
    RaggedArray,
    datatype::Element,
    error::{ArrayError, ArrayResult},
    shape::{self, Dim, Shape},
    util::{self, num_elements},
};

impl<'a, T: Element> RaggedArray<'a, T> {
    /// Dense extents of the buffer: the shape with the batch and ragged axes collapsed into
    /// one axis of entries for ragged arrays.
    pub fn flat_shape(&self) -> SmallVec<[usize; 4]> {
        if self.is_empty() {
            return SmallVec::from_slice(&[0]);
        }
        if self.is_ragged() {
            let total = self.row_splits().last().copied().map(util::offset).unwrap_or(0);
            let mut extents = SmallVec::with_capacity(self.ndim() - 1);
            extents.push(total);
            extents.extend(self.shape()[2..].iter().filter_map(Dim::extent));
            return extents;
        }
        self.shape().iter().filter_map(Dim::extent).collect()
    }

    /// Zero-copy view with [`Self::flat_shape`].
    pub fn view(&self) -> ArrayResult<ArrayViewD<'_, T>> {
        let extents = self.flat_shape();
        ArrayViewD::from_shape(IxDyn(&extents), self.data()).map_err(|_| {
            ArrayError::WrongElementCount {
                expected: num_elements(extents.iter().copied()).unwrap_or(usize::MAX),
                actual: self.size(),
            }
        })
    }

    /// Copy into an owned `ndarray`, returned with the row splits.
    pub fn to_ndarray(&self) -> ArrayResult<(ArrayD<T>, Vec<i64>)> {
        Ok((self.view()?.to_owned(), self.row_splits().to_vec()))
    }

    /// Move the buffer into an `ndarray`, returned with the row splits.
    ///
    /// An owned buffer is handed over without copying; a borrowed one is copied first.
    pub fn into_ndarray(self) -> ArrayResult<(ArrayD<T>, Vec<i64>)> {
        let extents = self.flat_shape();
        let parts = self.into_parts();
        let size = parts.data.len();
        let array = ArrayD::from_shape_vec(IxDyn(&extents), parts.data).map_err(|_| {
            ArrayError::WrongElementCount {
                expected: num_elements(extents.iter().copied()).unwrap_or(usize::MAX),
                actual: size,
            }
        })?;
        Ok((array, parts.row_splits))
    }

    /// Borrow a standard-layout `ndarray` without copying.
    ///
    /// With non-empty `row_splits` the first axis of `array` is the ragged entry axis and must
    /// have `row_splits.last()` entries.
    ///
    /// # Errors
    /// - [`ArrayError::NonContiguous`] if `array` is not in standard (row-major) layout.
    /// - A shape-kind [`ArrayError`] if `array` and `row_splits` disagree.
    pub fn from_ndarray_view<S>(
        array: &'a ArrayBase<S, IxDyn>,
        row_splits: Vec<i64>,
    ) -> ArrayResult<Self>
    where
        S: Data<Elem = T>,
    {
        if !array.is_standard_layout() {
            return Err(ArrayError::NonContiguous);
        }
        let data = array.as_slice().ok_or(ArrayError::NonContiguous)?;
        let layout = shape_for_ndarray(array.shape(), &row_splits)?;
        RaggedArray::from_borrowed(data, &layout, row_splits)
    }
}

impl<T: Element> RaggedArray<'static, T> {
    /// Take ownership of an `ndarray` buffer.
    ///
    /// Standard-layout arrays are adopted without copying the elements; other layouts are
    /// copied into row-major order first.
    pub fn from_ndarray(array: ArrayD<T>, row_splits: Vec<i64>) -> ArrayResult<Self> {
        let layout = shape_for_ndarray(array.shape(), &row_splits)?;
        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        let len = array.len();
        let (mut data, offset) = array.into_raw_vec_and_offset();
        let offset = offset.unwrap_or(0).min(data.len());
        if offset > 0 {
            data.drain(..offset);
        }
        data.truncate(len);
        RaggedArray::from_vec(data, &layout, row_splits)
    }
}

/// Shape of a ragged array whose entries are laid out as `extents`.
fn shape_for_ndarray(extents: &[usize], row_splits: &[i64]) -> ArrayResult<Shape> {
    if row_splits.is_empty() {
        return Ok(shape::regular(extents));
    }
    let Some((&entries, trailing)) = extents.split_first() else {
        return Err(ArrayError::DimensionMismatch {
            expected: 1,
            actual: 0,
        });
    };
    let total = row_splits.last().copied().map(util::offset).unwrap_or(0);
    if total != entries {
        return Err(ArrayError::WrongElementCount {
            expected: total,
            actual: entries,
        });
    }
    Ok(shape::ragged(row_splits.len() - 1, trailing))
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, ShapeBuilder};

    use super::*;
    use crate::array::Ownership;

    #[test]
    fn ragged_view_is_flattened() {
        let data: Vec<i32> = (0..10).collect();
        let arr = RaggedArray::ragged(data, vec![0, 2, 2, 5], &[2]).unwrap();
        let view = arr.view().unwrap();
        assert_eq!(view.shape(), &[5, 2]);
        assert_eq!(view[[3, 1]], 7);
    }

    #[test]
    fn into_ndarray_moves_owned_buffer() {
        let data: Vec<f64> = (0..6).map(f64::from).collect();
        let ptr = data.as_ptr();
        let arr = RaggedArray::regular(data, &[2, 3]).unwrap();
        let (nd, row_splits) = arr.into_ndarray().unwrap();
        assert!(row_splits.is_empty());
        assert_eq!(nd.shape(), &[2, 3]);
        assert_eq!(nd.as_ptr(), ptr);
    }

    #[test]
    fn ndarray_roundtrip_keeps_row_splits() {
        let arr = RaggedArray::ragged(vec![1u8, 2, 3, 4, 5], vec![0, 2, 2, 5], &[]).unwrap();
        let (nd, row_splits) = arr.to_ndarray().unwrap();
        let back = RaggedArray::from_ndarray(nd, row_splits).unwrap();
        assert_eq!(back, arr);
    }

    #[test]
    fn view_from_ndarray_borrows() {
        let nd = Array2::from_shape_vec((2, 2), vec![1i32, 2, 3, 4]).unwrap().into_dyn();
        let arr = RaggedArray::from_ndarray_view(&nd, Vec::new()).unwrap();
        assert_eq!(arr.ownership(), Ownership::Borrowed);
        assert_eq!(arr.data().as_ptr(), nd.as_ptr());
        assert_eq!(arr.shape(), shape::regular(&[2, 2]).as_slice());
    }

    #[test]
    fn transposed_view_is_rejected() {
        let nd = Array2::from_shape_vec((2, 3), vec![0i64; 6]).unwrap().into_dyn();
        let t = nd.t();
        assert!(matches!(
            RaggedArray::from_ndarray_view(&t, Vec::new()),
            Err(ArrayError::NonContiguous)
        ));
    }

    #[test]
    fn owned_column_major_input_is_reordered() {
        let nd = Array2::from_shape_vec((2, 3).f(), vec![1i32, 4, 2, 5, 3, 6])
            .unwrap()
            .into_dyn();
        let arr = RaggedArray::from_ndarray(nd, Vec::new()).unwrap();
        assert_eq!(arr.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn entry_count_must_match_row_splits() {
        let nd = ArrayD::<f32>::zeros(IxDyn(&[4, 2]));
        assert!(matches!(
            RaggedArray::from_ndarray(nd, vec![0, 2, 5]),
            Err(ArrayError::WrongElementCount {
                expected: 5,
                actual: 4
            })
        ));
    }
}
