//! Ragged arrays.
//!
//! This module provides [`RaggedArray`], a contiguous element buffer plus a shape and an
//! optional row-split table. It holds batched numeric data where each batch row may have a
//! different length along axis 1, e.g. per-sample variable-length feature lists.
//!
//! ## Data model
//! - `data`: `size` elements in row-major order, rows stored back to back.
//! - `shape`: one [`Dim`] per axis. Axis 0 is the batch axis. Axis 1 may be [`Dim::Ragged`].
//! - `row_splits`: present iff axis 1 is ragged; `shape[0] + 1` non-decreasing entries starting
//!   at 0. Row `i` spans entries `row_splits[i]..row_splits[i + 1]` along axis 1, each entry
//!   being a block of `product(shape[2..])` elements.
//!
//! ```text
//! shape = [3, Ragged, 2], row_splits = [0, 2, 2, 5]
//!
//! data:  | r0 e0 | r0 e1 | r2 e0 | r2 e1 | r2 e2 |     (row 1 is empty)
//!          2 el.   2 el.   2 el.   2 el.   2 el.       size = 5 * 2 = 10
//! ```
//!
//! ## Ownership
//! The buffer is a `Cow<'a, [T]>`:
//! - *Owned*: the array holds its own `Vec<T>`.
//! - *Borrowed*: the array views a caller-owned slice for `'a` and never frees it.
//!
//! Every operation that writes to or reallocates the buffer promotes a borrowed array to owned
//! storage first. Copies ([`Clone`], [`RaggedArray::get_slice`], ...) always produce owned
//! buffers. [`RaggedArray::into_parts`] gives the buffer away and is the only way to take it
//! out of an array.
//!
//! ## Examples
//! ```rust
//! use ragged::array::{RaggedArray, row_splits};
//!
//! // Three rows of lengths 2, 0 and 3.
//! let rs = row_splits::from_row_lengths(&[2, 0, 3]);
//! let mut arr = RaggedArray::ragged(vec![1.0f32, 2.0, 3.0, 4.0, 5.0], rs, &[]).unwrap();
//! assert_eq!(arr.size_at(1).unwrap(), 0);
//! assert_eq!(*arr.at(&[2, 1]).unwrap(), 4.0);
//!
//! let head = arr.split(2).unwrap();
//! assert_eq!(head.row_splits(), &[0, 2, 2]);
//! assert_eq!(arr.row_splits(), &[0, 3]);
//! ```
use std::{borrow::Cow, fmt};

use smallvec::SmallVec;

use crate::array::{
    datatype::Element,
    error::{ArrayError, ArrayResult},
    shape::{Dim, Shape},
};

pub mod chunking;
pub mod datatype;
pub mod discovery;
pub mod error;
pub mod format;
pub mod index;
pub mod interop;
pub mod metadata;
pub mod ops;
pub mod reader;
pub mod row_splits;
pub mod shape;
pub mod util;
pub mod writer;

/// Whether an array owns its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    /// The buffer belongs to someone else and outlives the array.
    Borrowed,
}

/// The pieces of an array after giving its buffer away.
#[derive(Debug, Clone, PartialEq)]
pub struct RaggedParts<T> {
    pub data: Vec<T>,
    pub shape: Shape,
    pub row_splits: Vec<i64>,
}

/// A batch of rows with at most one ragged axis (axis 1).
pub struct RaggedArray<'a, T: Element> {
    data: Cow<'a, [T]>,
    shape: Shape,
    row_splits: Vec<i64>,
}

impl<T: Element> RaggedArray<'static, T> {
    /// An empty array: no shape, no elements.
    pub fn new() -> Self {
        Self {
            data: Cow::Owned(Vec::new()),
            shape: Shape::new(),
            row_splits: Vec::new(),
        }
    }

    /// Allocate a zero-filled array.
    ///
    /// # Arguments
    /// - `shape`: One [`Dim`] per axis; axis 1 must be [`Dim::Ragged`] iff `row_splits` is
    ///   non-empty.
    /// - `row_splits`: Empty for regular arrays, `shape[0] + 1` entries otherwise.
    ///
    /// # Errors
    /// Returns a shape-kind [`ArrayError`] if the shape and row splits disagree.
    pub fn try_with_shape(shape: &[Dim], row_splits: Vec<i64>) -> ArrayResult<Self> {
        let size = validate_layout(shape, &row_splits)?;
        Ok(Self {
            data: Cow::Owned(vec![T::default(); size]),
            shape: shape.into(),
            row_splits,
        })
    }

    /// Take ownership of `data` without copying it.
    ///
    /// # Errors
    /// Returns a shape-kind [`ArrayError`] if the layout is invalid or `data.len()` does not
    /// match it.
    pub fn from_vec(data: Vec<T>, shape: &[Dim], row_splits: Vec<i64>) -> ArrayResult<Self> {
        Self::from_cow(Cow::Owned(data), shape.into(), row_splits)
    }

    /// Regular array with the given extents.
    pub fn regular(data: Vec<T>, extents: &[usize]) -> ArrayResult<Self> {
        Self::from_cow(Cow::Owned(data), shape::regular(extents), Vec::new())
    }

    /// Ragged array whose axis 1 is described by `row_splits`, followed by `trailing` axes.
    pub fn ragged(data: Vec<T>, row_splits: Vec<i64>, trailing: &[usize]) -> ArrayResult<Self> {
        if row_splits.is_empty() {
            return Err(ArrayError::MissingRowSplits);
        }
        let shape = shape::ragged(row_splits.len() - 1, trailing);
        Self::from_cow(Cow::Owned(data), shape, row_splits)
    }
}

impl<T: Element> Default for RaggedArray<'_, T> {
    fn default() -> Self {
        Self {
            data: Cow::Owned(Vec::new()),
            shape: Shape::new(),
            row_splits: Vec::new(),
        }
    }
}

impl<'a, T: Element> RaggedArray<'a, T> {
    /// Borrow `data` without copying it.
    ///
    /// The array never frees `data`; the first mutation copies it into owned storage.
    pub fn from_borrowed(data: &'a [T], shape: &[Dim], row_splits: Vec<i64>) -> ArrayResult<Self> {
        Self::from_cow(Cow::Borrowed(data), shape.into(), row_splits)
    }

    pub(crate) fn from_cow(
        data: Cow<'a, [T]>,
        shape: Shape,
        row_splits: Vec<i64>,
    ) -> ArrayResult<Self> {
        let size = validate_layout(&shape, &row_splits)?;
        if data.len() != size {
            return Err(ArrayError::WrongElementCount {
                expected: size,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape,
            row_splits,
        })
    }

    /// Assemble an array from parts that are already known to be consistent.
    pub(crate) fn from_parts_unchecked(data: Vec<T>, shape: Shape, row_splits: Vec<i64>) -> Self {
        debug_assert_eq!(
            shape::size_from_shape(&shape, &row_splits).ok(),
            Some(data.len())
        );
        Self {
            data: Cow::Owned(data),
            shape,
            row_splits,
        }
    }

    /// Logical shape, one [`Dim`] per axis. Empty for an empty array.
    pub fn shape(&self) -> &[Dim] {
        &self.shape
    }

    /// Shape in the signed encoding (ragged axis as `-total`).
    pub fn signed_shape(&self) -> ArrayResult<SmallVec<[i32; 4]>> {
        shape::encode_signed(&self.shape, &self.row_splits)
    }

    /// Row-split table; empty for regular arrays.
    pub fn row_splits(&self) -> &[i64] {
        &self.row_splits
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// `true` for an array without a shape (default-constructed or cleared).
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn is_ragged(&self) -> bool {
        !self.row_splits.is_empty()
    }

    /// Extent of the batch axis, 0 for an empty array.
    pub fn first_dimension(&self) -> usize {
        self.shape.first().and_then(Dim::extent).unwrap_or(0)
    }

    /// Number of entries of `row` along axis 1.
    ///
    /// For regular arrays this is the fixed axis-1 extent, whatever `row` is.
    ///
    /// # Errors
    /// - [`ArrayError::DimensionMismatch`] if the array has fewer than two axes.
    /// - [`ArrayError::RowOutOfBounds`] if `row` is not a row of a ragged array.
    pub fn size_at(&self, row: usize) -> ArrayResult<usize> {
        if self.shape.len() < 2 {
            return Err(ArrayError::DimensionMismatch {
                expected: 2,
                actual: self.shape.len(),
            });
        }
        if let Some(extent) = self.shape[1].extent() {
            return Ok(extent);
        }
        let rows = self.first_dimension();
        if row >= rows {
            return Err(ArrayError::RowOutOfBounds { row, rows });
        }
        Ok(util::offset(self.row_splits[row + 1] - self.row_splits[row]))
    }

    /// The elements in row-major order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the elements; copies a borrowed buffer first.
    pub fn data_mut(&mut self) -> &mut [T] {
        self.data.to_mut()
    }

    pub fn ownership(&self) -> Ownership {
        match self.data {
            Cow::Owned(_) => Ownership::Owned,
            Cow::Borrowed(_) => Ownership::Borrowed,
        }
    }

    /// Detach from any lender by copying a borrowed buffer.
    pub fn into_owned(self) -> RaggedArray<'static, T> {
        RaggedArray {
            data: Cow::Owned(self.data.into_owned()),
            shape: self.shape,
            row_splits: self.row_splits,
        }
    }

    /// Give the buffer away together with the shape and row splits.
    ///
    /// A borrowed buffer is copied, since the array cannot hand out memory it does not own.
    pub fn into_parts(self) -> RaggedParts<T> {
        RaggedParts {
            data: self.data.into_owned(),
            shape: self.shape,
            row_splits: self.row_splits,
        }
    }

    /// Give the buffer away, dropping shape and row splits.
    pub fn into_vec(self) -> Vec<T> {
        self.data.into_owned()
    }

    /// Move the contents out, leaving an empty array behind.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Drop the contents. A borrowed buffer is released to its owner, never freed.
    pub fn clear(&mut self) {
        self.data = Cow::Owned(Vec::new());
        self.shape.clear();
        self.row_splits.clear();
    }

    /// Number of elements in one entry along the axis following the batch axis.
    ///
    /// For regular arrays this is the element count of a whole row; for ragged arrays the
    /// element count of one entry along the ragged axis.
    pub(crate) fn entry_stride(&self) -> usize {
        if self.is_ragged() {
            shape::stride_from(&self.shape, 2)
        } else {
            shape::stride_from(&self.shape, 1)
        }
    }

    /// Flat element offset where `row` starts; `row` may equal the row count.
    pub(crate) fn row_offset(&self, row: usize) -> usize {
        if self.is_ragged() {
            util::offset(self.row_splits[row]) * self.entry_stride()
        } else {
            row * self.entry_stride()
        }
    }

    /// Re-derive the batch extent after the row splits changed.
    pub(crate) fn sync_shape_with_row_splits(&mut self) {
        if let Some(rows) = self.row_splits.len().checked_sub(1) {
            self.shape[0] = Dim::Fixed(rows);
        }
    }
}

/// Validate `shape` against `row_splits` and return the element count.
pub(crate) fn validate_layout(shape: &[Dim], row_splits: &[i64]) -> ArrayResult<usize> {
    if shape.is_empty() {
        if !row_splits.is_empty() {
            return Err(ArrayError::UnexpectedRowSplits);
        }
        return Ok(0);
    }
    shape::validate_dims(shape)?;

    let is_ragged = shape.get(1).is_some_and(Dim::is_ragged);
    match (is_ragged, row_splits.is_empty()) {
        (true, true) => return Err(ArrayError::MissingRowSplits),
        (false, false) => return Err(ArrayError::UnexpectedRowSplits),
        (true, false) => {
            let rows = shape[0].extent().unwrap_or(0);
            if row_splits.len() != rows + 1 {
                return Err(ArrayError::RowSplitsLength {
                    expected: rows + 1,
                    actual: row_splits.len(),
                });
            }
            row_splits::validate(row_splits)?;
        }
        (false, true) => {}
    }

    shape::size_from_shape(shape, row_splits)
}

impl<T: Element> Clone for RaggedArray<'_, T> {
    /// Always copies into an owned buffer, whatever the source's ownership.
    fn clone(&self) -> Self {
        Self {
            data: Cow::Owned(self.data.to_vec()),
            shape: self.shape.clone(),
            row_splits: self.row_splits.clone(),
        }
    }
}

impl<'b, T: Element> PartialEq<RaggedArray<'b, T>> for RaggedArray<'_, T> {
    fn eq(&self, other: &RaggedArray<'b, T>) -> bool {
        self.shape == other.shape
            && self.row_splits == other.row_splits
            && self.data.as_ref() == other.data.as_ref()
    }
}

impl<T: Element> fmt::Debug for RaggedArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaggedArray")
            .field("dtype", &T::TYPE)
            .field("shape", &self.shape)
            .field("row_splits", &self.row_splits)
            .field("size", &self.size())
            .field("ownership", &self.ownership())
            .finish()
    }
}

impl<T: Element> fmt::Display for RaggedArray<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data size {}", self.size())?;
        let values: Vec<String> = self.data.iter().map(|v| v.to_string()).collect();
        writeln!(f, "{}", values.join(", "))?;
        let dims: Vec<String> = self
            .shape
            .iter()
            .map(|d| match d {
                Dim::Fixed(n) => n.to_string(),
                Dim::Ragged => "ragged".to_string(),
            })
            .collect();
        write!(f, "shape [{}]", dims.join(", "))?;
        if self.is_ragged() {
            let splits: Vec<String> = self.row_splits.iter().map(|v| v.to_string()).collect();
            write!(f, "\nrow splits [{}]", splits.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::shape::{ragged, regular};

    #[test]
    fn construct_then_read_back() {
        let arr = RaggedArray::<f32>::try_with_shape(&ragged(3, &[2]), vec![0, 2, 2, 5]).unwrap();
        assert_eq!(arr.shape(), ragged(3, &[2]).as_slice());
        assert_eq!(arr.row_splits(), &[0, 2, 2, 5]);
        assert_eq!(arr.size(), 10);
        assert_eq!(arr.first_dimension(), 3);
        assert!(arr.is_ragged());
        assert_eq!(arr.signed_shape().unwrap().as_slice(), &[3, -5, 2]);
    }

    #[test]
    fn row_splits_length_must_match_rows() {
        let err = match RaggedArray::<i32>::try_with_shape(&ragged(3, &[]), vec![0, 1, 2]) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        match err {
            ArrayError::RowSplitsLength { expected, actual } => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.kind(), error::ErrorKind::Shape);
    }

    #[test]
    fn row_splits_require_ragged_axis() {
        let err = match RaggedArray::<i32>::try_with_shape(&regular(&[2, 3]), vec![0, 1, 2]) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, ArrayError::UnexpectedRowSplits));

        let err = match RaggedArray::<i32>::try_with_shape(&ragged(2, &[]), Vec::new()) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(matches!(err, ArrayError::MissingRowSplits));
    }

    #[test]
    fn from_vec_checks_element_count() {
        let err = match RaggedArray::regular(vec![1u8, 2, 3], &[2, 2]) {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        match err {
            ArrayError::WrongElementCount { expected, actual } => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn size_at_regular_and_ragged() {
        let arr = RaggedArray::ragged(vec![1i64, 2, 3, 4, 5], vec![0, 2, 2, 5], &[]).unwrap();
        assert_eq!(arr.size_at(0).unwrap(), 2);
        assert_eq!(arr.size_at(1).unwrap(), 0);
        assert_eq!(arr.size_at(2).unwrap(), 3);
        assert!(matches!(
            arr.size_at(3),
            Err(ArrayError::RowOutOfBounds { row: 3, rows: 3 })
        ));

        let arr = RaggedArray::regular(vec![0i64; 6], &[2, 3]).unwrap();
        assert_eq!(arr.size_at(1).unwrap(), 3);
        let flat = RaggedArray::regular(vec![0i64; 6], &[6]).unwrap();
        assert!(matches!(
            flat.size_at(0),
            Err(ArrayError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn borrowed_buffer_is_copied_on_write() {
        let backing = vec![1i32, 2, 3, 4];
        let mut arr = RaggedArray::from_borrowed(&backing, &regular(&[2, 2]), Vec::new()).unwrap();
        assert_eq!(arr.ownership(), Ownership::Borrowed);

        let copy = arr.clone();
        assert_eq!(copy.ownership(), Ownership::Owned);
        assert_eq!(copy, arr);

        arr.data_mut()[0] = 99;
        assert_eq!(arr.ownership(), Ownership::Owned);
        assert_eq!(arr.data()[0], 99);
        assert_eq!(backing[0], 1);
    }

    #[test]
    fn clear_releases_borrowed_buffer() {
        let backing = vec![1i32, 2, 3];
        let mut arr = RaggedArray::from_borrowed(&backing, &regular(&[3]), Vec::new()).unwrap();
        arr.clear();
        assert!(arr.is_empty());
        assert_eq!(arr.size(), 0);
        assert_eq!(backing, vec![1, 2, 3]);
    }

    #[test]
    fn take_and_into_parts_move_the_buffer() {
        let mut arr = RaggedArray::ragged(vec![1u16, 2, 3], vec![0, 1, 3], &[]).unwrap();
        let moved = arr.take();
        assert!(arr.is_empty());
        assert_eq!(arr.first_dimension(), 0);

        let parts = moved.into_parts();
        assert_eq!(parts.data, vec![1, 2, 3]);
        assert_eq!(parts.row_splits, vec![0, 1, 3]);
        assert_eq!(parts.shape, ragged(2, &[]));
    }

    #[test]
    fn display_lists_shape_and_row_splits() {
        let arr = RaggedArray::ragged(vec![1i32, 2, 3], vec![0, 1, 3], &[]).unwrap();
        let text = arr.to_string();
        assert!(text.contains("data size 3"));
        assert!(text.contains("shape [2, ragged]"));
        assert!(text.contains("row splits [0, 1, 3]"));
    }
}
