//! Structural operators along the batch axis.
//!
//! All operators here copy element data into fresh, owned buffers; none of them return views.
//!
//! For regular arrays a batch index is a row index. For ragged arrays it is an index into the
//! row-split table, which for a valid table is the same thing: row `i` starts at
//! `row_splits[i]`.
use std::borrow::Cow;

use tracing::{debug, warn};

use crate::array::{
    RaggedArray,
    datatype::Element,
    error::{ArrayError, ArrayResult},
    row_splits,
    shape::{Dim, Shape},
};

impl<'a, T: Element> RaggedArray<'a, T> {
    /// Split off the first `at` rows.
    ///
    /// Returns rows `[0, at)` as a new array and keeps rows `[at, end)` in `self`, both in
    /// freshly allocated owned buffers. The retained row splits are rebased to start at 0.
    /// `at == first_dimension()` returns the whole array and leaves `self` empty.
    ///
    /// # Errors
    /// [`ArrayError::SplitOutOfRange`] if `self` is empty or `at > first_dimension()`.
    pub fn split(&mut self, at: usize) -> ArrayResult<RaggedArray<'static, T>> {
        let rows = self.first_dimension();
        if self.is_empty() || at > rows {
            return Err(ArrayError::SplitOutOfRange { index: at, max: rows });
        }
        if at == rows {
            debug!(rows, "split takes the whole array");
            return Ok(self.take().into_owned());
        }

        let split_point = self.row_offset(at);
        let head_data = self.data()[..split_point].to_vec();
        let tail_data = self.data()[split_point..].to_vec();

        let mut head_shape = self.shape.clone();
        head_shape[0] = Dim::Fixed(at);
        self.shape[0] = Dim::Fixed(rows - at);

        let head_row_splits = if self.is_ragged() {
            row_splits::split_at(&mut self.row_splits, at)?
        } else {
            Vec::new()
        };
        self.data = Cow::Owned(tail_data);
        self.sync_shape_with_row_splits();

        debug!(at, head = split_point, tail = self.size(), "split array");
        Ok(RaggedArray::from_parts_unchecked(
            head_data,
            head_shape,
            head_row_splits,
        ))
    }

    /// Copy rows `[begin, end)` into a new array, leaving `self` untouched.
    ///
    /// `begin == end` is allowed and yields a zero-row array; a warning is logged because
    /// callers rarely want that.
    ///
    /// # Errors
    /// [`ArrayError::SliceOutOfRange`] if the range is not within `[0, first_dimension()]`.
    pub fn get_slice(&self, begin: usize, end: usize) -> ArrayResult<RaggedArray<'static, T>> {
        if !self.valid_slice(begin, end) {
            return Err(ArrayError::SliceOutOfRange {
                begin,
                end,
                rows: self.first_dimension(),
            });
        }
        if begin == 0 && end == self.first_dimension() {
            return Ok(self.clone().into_owned());
        }
        if begin == end {
            warn!(begin, "attempt to create empty slice");
        }

        let data = self.data()[self.row_offset(begin)..self.row_offset(end)].to_vec();
        let mut out_shape = self.shape.clone();
        out_shape[0] = Dim::Fixed(end - begin);

        let out_row_splits = if self.is_ragged() {
            let mut rs = self.row_splits[begin..=end].to_vec();
            let base = rs[0];
            for value in rs.iter_mut() {
                *value -= base;
            }
            rs
        } else {
            Vec::new()
        };

        Ok(RaggedArray::from_parts_unchecked(
            data,
            out_shape,
            out_row_splits,
        ))
    }

    /// Whether [`Self::get_slice`] would accept `begin..end`.
    pub fn valid_slice(&self, begin: usize, end: usize) -> bool {
        let rows = self.first_dimension();
        !self.is_empty() && begin <= end && end <= rows
    }

    /// Number of leading entries of `split_points` that are valid batch indices.
    ///
    /// Scanning stops at the first index past the last row boundary.
    pub fn valid_slices(&self, split_points: &[usize]) -> usize {
        if self.is_empty() {
            return 0;
        }
        let rows = self.first_dimension();
        split_points.iter().take_while(|&&p| p <= rows).count()
    }

    /// Append the rows of `other` after the rows of `self`.
    ///
    /// Appending to an empty array copies `other`; appending an empty array is a no-op.
    ///
    /// # Errors
    /// - [`ArrayError::DimensionMismatch`] if the arrays have a different number of axes.
    /// - [`ArrayError::RaggednessMismatch`] if exactly one of them is ragged.
    /// - [`ArrayError::TrailingShapeMismatch`] if any axis but the batch (and ragged) axis
    ///   differs.
    pub fn append(&mut self, other: &RaggedArray<'_, T>) -> ArrayResult<()> {
        if self.is_empty() {
            *self = RaggedArray::from_cow(
                Cow::Owned(other.data().to_vec()),
                other.shape.clone(),
                other.row_splits.clone(),
            )?;
            return Ok(());
        }
        if other.is_empty() {
            return Ok(());
        }
        if self.ndim() != other.ndim() {
            return Err(ArrayError::DimensionMismatch {
                expected: self.ndim(),
                actual: other.ndim(),
            });
        }
        if self.is_ragged() != other.is_ragged() {
            return Err(ArrayError::RaggednessMismatch);
        }
        let fixed_from = if self.is_ragged() { 2 } else { 1 };
        if self.ndim() > fixed_from && self.shape[fixed_from..] != other.shape[fixed_from..] {
            return Err(ArrayError::TrailingShapeMismatch {
                left: format!("{:?}", &self.shape[fixed_from..]),
                right: format!("{:?}", &other.shape[fixed_from..]),
            });
        }

        let mut data = Vec::with_capacity(self.size() + other.size());
        data.extend_from_slice(self.data());
        data.extend_from_slice(other.data());

        let rows = self.first_dimension() + other.first_dimension();
        self.data = Cow::Owned(data);
        self.shape[0] = Dim::Fixed(rows);
        if self.is_ragged() {
            self.row_splits = row_splits::merge(&self.row_splits, &other.row_splits);
            self.sync_shape_with_row_splits();
        }

        debug!(rows, size = self.size(), "appended array");
        Ok(())
    }

    /// Append a copy of `self` to itself, doubling the rows.
    pub fn append_self(&mut self) -> ArrayResult<()> {
        let copy = self.clone();
        self.append(&copy)
    }

    /// Gather rows by index into a new array.
    ///
    /// Output row `k` is source row `indices[k]`; indices may repeat or skip rows. The output
    /// has `indices.len()` rows.
    ///
    /// # Errors
    /// [`ArrayError::RowOutOfBounds`] if any index is not a row of `self`. Nothing is copied
    /// in that case.
    pub fn shuffle(&self, indices: &[usize]) -> ArrayResult<RaggedArray<'static, T>> {
        if let Some(&row) = indices.iter().find(|&&i| !self.valid_slice(i, i + 1)) {
            return Err(ArrayError::RowOutOfBounds {
                row,
                rows: self.first_dimension(),
            });
        }

        let total: usize = indices
            .iter()
            .map(|&i| self.row_offset(i + 1) - self.row_offset(i))
            .sum();
        let mut data = Vec::with_capacity(total);
        for &i in indices {
            data.extend_from_slice(&self.data()[self.row_offset(i)..self.row_offset(i + 1)]);
        }

        let mut out_shape = self.shape.clone();
        let out_row_splits = if self.is_ragged() {
            let lengths = row_splits::to_row_lengths(&self.row_splits);
            let gathered: Vec<i64> = indices.iter().map(|&i| lengths[i]).collect();
            row_splits::from_row_lengths(&gathered)
        } else {
            Vec::new()
        };
        if let Some(first) = out_shape.first_mut() {
            *first = Dim::Fixed(indices.len());
        }

        debug!(rows = indices.len(), size = data.len(), "gathered rows");
        Ok(RaggedArray::from_parts_unchecked(
            data,
            out_shape,
            out_row_splits,
        ))
    }

    /// Change shape and row splits.
    ///
    /// If the new layout holds as many elements as the current buffer the data is kept and
    /// only relabelled; otherwise the buffer is replaced by a zero-filled one.
    ///
    /// # Errors
    /// Returns a shape-kind [`ArrayError`] if the new layout is invalid.
    pub fn set_shape(&mut self, shape: &[Dim], row_splits: Vec<i64>) -> ArrayResult<()> {
        let size = super::validate_layout(shape, &row_splits)?;
        if size != self.size() {
            self.data = Cow::Owned(vec![T::default(); size]);
        }
        self.shape = Shape::from(shape);
        self.row_splits = row_splits;
        Ok(())
    }

    /// Number of elements in row `row`.
    pub fn row_len(&self, row: usize) -> ArrayResult<usize> {
        let rows = self.first_dimension();
        if self.is_empty() || row >= rows {
            return Err(ArrayError::RowOutOfBounds { row, rows });
        }
        Ok(self.row_offset(row + 1) - self.row_offset(row))
    }
}
