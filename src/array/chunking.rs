//! Batch chunk planning.
//!
//! [`plan_chunks`] partitions consecutive rows into chunks whose element count stays within a
//! budget, without ever splitting a row. It is meant for callers that need to bound the memory
//! of each batch they hand on.
//!
//! ```text
//! row splits  [0, 5, 9, 20, 22]      per-row counts [5, 4, 11, 2]
//! limit 10, strict
//!
//! rows 0..2    9 elements   within limit
//! rows 2..3   11 elements   over limit (single row, emitted anyway)
//! rows 3..4    2 elements   within limit
//!
//! RowCounts   [2, 1, 1]
//! Boundaries  [2, 3, 4]
//! ```
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::array::{
    RaggedArray,
    datatype::Element,
    error::{ArrayError, ArrayResult},
    row_splits, util,
};

/// Element budget for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkLimit {
    pub max_elements: usize,
    /// Compare the square of the element count against `max_elements` when grouping rows.
    pub squared: bool,
    /// Flag chunks whose raw element count exceeds `max_elements` as not within the limit.
    ///
    /// The flag never squares the count, even with `squared` set.
    ///
    /// When `false` every non-empty chunk is reported within the limit, including a single
    /// row that exceeds it on its own.
    pub strict: bool,
}

impl ChunkLimit {
    pub const fn new(max_elements: usize) -> Self {
        Self {
            max_elements,
            squared: false,
            strict: true,
        }
    }

    fn cost(&self, elements: usize) -> usize {
        if self.squared {
            elements.saturating_mul(elements)
        } else {
            elements
        }
    }
}

impl Default for ChunkLimit {
    fn default() -> Self {
        Self::new(crate::consts::DEFAULT_CHUNK_ELEMENTS)
    }
}

/// A run of consecutive rows `start_row..end_row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start_row: usize,
    pub end_row: usize,
    pub elements: usize,
    pub within_limit: bool,
}

impl Chunk {
    pub fn rows(&self) -> usize {
        self.end_row - self.start_row
    }
}

/// How [`ChunkPlan::indices`] encodes chunk boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitEncoding {
    /// Number of rows in each chunk, e.g. `[2, 5, 3, 2]`.
    RowCounts,
    /// Cumulative end row of each chunk, e.g. `[2, 7, 10, 12]`.
    Boundaries,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPlan {
    pub chunks: Vec<Chunk>,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn indices(&self, encoding: SplitEncoding) -> Vec<usize> {
        match encoding {
            SplitEncoding::RowCounts => self.chunks.iter().map(Chunk::rows).collect(),
            SplitEncoding::Boundaries => self.chunks.iter().map(|c| c.end_row).collect(),
        }
    }

    pub fn element_counts(&self) -> Vec<usize> {
        self.chunks.iter().map(|c| c.elements).collect()
    }

    pub fn all_within_limit(&self) -> bool {
        self.chunks.iter().all(|c| c.within_limit)
    }
}

/// Greedily group the rows described by `row_splits` into chunks within `limit`.
///
/// Rows are never divided: a row that exceeds the limit on its own becomes a chunk by itself.
/// Rows without elements are attached to a neighbouring chunk, so every chunk holds at least
/// one element.
///
/// # Errors
/// - A shape-kind [`ArrayError`] if `row_splits` is malformed.
/// - [`ArrayError::EmptyChunk`] if there are rows but none of them has elements.
pub fn plan_chunks(row_splits: &[i64], limit: &ChunkLimit) -> ArrayResult<ChunkPlan> {
    row_splits::validate(row_splits)?;
    let counts: Vec<usize> = row_splits::to_row_lengths(row_splits)
        .into_iter()
        .map(util::offset)
        .collect();
    if counts.is_empty() {
        return Ok(ChunkPlan::default());
    }
    if counts.iter().all(|&c| c == 0) {
        return Err(ArrayError::EmptyChunk { row: 0 });
    }

    let mut builder = PlanBuilder::new(limit);
    let mut start = 0;
    let mut acc = 0usize;
    let mut row = 0;
    while row < counts.len() {
        let next = acc + counts[row];
        let cost = limit.cost(next);
        if cost > limit.max_elements && acc > 0 {
            builder.emit(start, row, acc);
            start = row;
            acc = 0;
            continue;
        }
        if cost >= limit.max_elements {
            builder.emit(start, row + 1, next);
            start = row + 1;
            acc = 0;
        } else {
            acc = next;
        }
        row += 1;
    }
    if start < counts.len() {
        builder.emit(start, counts.len(), acc);
    }

    let plan = builder.finish();
    debug!(
        rows = counts.len(),
        chunks = plan.len(),
        max_elements = limit.max_elements,
        "planned chunks"
    );
    Ok(plan)
}

struct PlanBuilder<'l> {
    limit: &'l ChunkLimit,
    chunks: Vec<Chunk>,
    /// First row of leading empty rows not yet attached to a chunk.
    pending_start: Option<usize>,
}

impl<'l> PlanBuilder<'l> {
    fn new(limit: &'l ChunkLimit) -> Self {
        Self {
            limit,
            chunks: Vec::new(),
            pending_start: None,
        }
    }

    fn emit(&mut self, start_row: usize, end_row: usize, elements: usize) {
        if elements == 0 {
            match self.chunks.last_mut() {
                Some(prev) => prev.end_row = end_row,
                None => {
                    self.pending_start.get_or_insert(start_row);
                }
            }
            return;
        }
        let start_row = self.pending_start.take().unwrap_or(start_row);
        let within_limit = !self.limit.strict || elements <= self.limit.max_elements;
        self.chunks.push(Chunk {
            start_row,
            end_row,
            elements,
            within_limit,
        });
    }

    fn finish(self) -> ChunkPlan {
        ChunkPlan {
            chunks: self.chunks,
        }
    }
}

impl<T: Element> RaggedArray<'_, T> {
    /// Plan chunks over the rows of this array, counting every element of a row.
    ///
    /// For ragged arrays each entry along the ragged axis counts as many elements as it spans;
    /// for regular arrays every row counts the same.
    pub fn plan_chunks(&self, limit: &ChunkLimit) -> ArrayResult<ChunkPlan> {
        if self.is_empty() {
            return Ok(ChunkPlan::default());
        }
        let stride = i64::try_from(self.entry_stride()).map_err(|_| ArrayError::ShapeOverflow)?;
        let lengths: Vec<i64> = if self.is_ragged() {
            row_splits::to_row_lengths(self.row_splits())
                .into_iter()
                .map(|len| len * stride)
                .collect()
        } else {
            vec![stride; self.first_dimension()]
        };
        plan_chunks(&row_splits::from_row_lengths(&lengths), limit)
    }

    /// Split the array into the chunks of `plan`, front to back.
    ///
    /// # Errors
    /// [`ArrayError::SliceOutOfRange`] if the plan does not fit this array.
    pub fn chunks(&self, plan: &ChunkPlan) -> ArrayResult<Vec<RaggedArray<'static, T>>> {
        plan.chunks
            .iter()
            .map(|c| self.get_slice(c.start_row, c.end_row))
            .collect()
    }
}
