use thiserror::Error;

use crate::{array::discovery::ArrayDiscoveryError, codec::CodecError, dtype::DataType};

/// Broad category of an [`ArrayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Mismatched dimensions or raggedness.
    Shape,
    /// Split/slice bounds outside the batch axis.
    Range,
    /// Element or row access outside the array.
    Index,
    /// Malformed or unreadable serialized data.
    Format,
    /// A broken internal invariant.
    Internal,
}

/// Errors returned by [`crate::array::RaggedArray`] and its helpers.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// `row_splits.len()` must be `shape[0] + 1`.
    #[error("row splits length must equal shape[0] + 1: expected {expected}, got {actual}")]
    RowSplitsLength { expected: usize, actual: usize },
    #[error("malformed row splits: {reason}")]
    MalformedRowSplits { reason: &'static str },
    /// Only axis 1 may be ragged.
    #[error("axis {axis} cannot be ragged")]
    RaggedAxis { axis: usize },
    #[error("ragged shape requires row splits")]
    MissingRowSplits,
    #[error("row splits given for a regular shape")]
    UnexpectedRowSplits,
    /// An index or operand has the wrong number of axes.
    #[error("dimension mismatch: expected {expected} axes, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("cannot combine ragged and regular arrays")]
    RaggednessMismatch,
    #[error("all axes but the batch axis must match: {left} vs {right}")]
    TrailingShapeMismatch { left: String, right: String },
    #[error("wrong element count: expected {expected}, got {actual}")]
    WrongElementCount { expected: usize, actual: usize },
    #[error("shape element count overflow")]
    ShapeOverflow,
    #[error("array is not contiguous in standard layout")]
    NonContiguous,

    #[error("split index {index} out of range (max {max})")]
    SplitOutOfRange { index: usize, max: usize },
    #[error("slice {begin}..{end} out of range for {rows} rows")]
    SliceOutOfRange { begin: usize, end: usize, rows: usize },
    #[error("row split index {index} out of range (len={len})")]
    RowSplitIndexOutOfRange { index: usize, len: usize },

    #[error("flat index {index} out of bounds (size={size})")]
    IndexOutOfBounds { index: usize, size: usize },
    #[error("ragged index ({row}, {column}) out of bounds")]
    RaggedIndexOutOfBounds { row: usize, column: usize },
    #[error("row {row} out of bounds for {rows} rows")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("wrong format version: expected {expected}, got {actual}")]
    VersionMismatch { expected: f32, actual: f32 },
    #[error("expected and observed length don't match: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("corrupt header: {0}")]
    CorruptHeader(String),
    #[error("file {path} could not be opened: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A chunk plan would contain a chunk without elements.
    #[error("attempting empty chunk at row {row}")]
    EmptyChunk { row: usize },
}

impl ArrayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArrayError::RowSplitsLength { .. }
            | ArrayError::MalformedRowSplits { .. }
            | ArrayError::RaggedAxis { .. }
            | ArrayError::MissingRowSplits
            | ArrayError::UnexpectedRowSplits
            | ArrayError::DimensionMismatch { .. }
            | ArrayError::RaggednessMismatch
            | ArrayError::TrailingShapeMismatch { .. }
            | ArrayError::WrongElementCount { .. }
            | ArrayError::ShapeOverflow
            | ArrayError::NonContiguous => ErrorKind::Shape,
            ArrayError::SplitOutOfRange { .. }
            | ArrayError::SliceOutOfRange { .. }
            | ArrayError::RowSplitIndexOutOfRange { .. } => ErrorKind::Range,
            ArrayError::IndexOutOfBounds { .. }
            | ArrayError::RaggedIndexOutOfBounds { .. }
            | ArrayError::RowOutOfBounds { .. } => ErrorKind::Index,
            ArrayError::VersionMismatch { .. }
            | ArrayError::LengthMismatch { .. }
            | ArrayError::CorruptHeader(_)
            | ArrayError::Open { .. }
            | ArrayError::Io(_)
            | ArrayError::Codec(_) => ErrorKind::Format,
            ArrayError::EmptyChunk { .. } => ErrorKind::Internal,
        }
    }
}

pub type ArrayResult<T> = Result<T, ArrayError>;

/// Errors returned when persisting arrays in an object store.
#[derive(Debug, Error)]
pub enum ArrayStoreError {
    #[error(transparent)]
    ObjectStore(#[from] object_store::Error),

    #[error(transparent)]
    Json(#[from] simd_json::Error),

    #[error(transparent)]
    Array(#[from] ArrayError),

    #[error("object index {object_index} described more than once")]
    DuplicateObjectIndex { object_index: usize },

    #[error("no metadata for array object {object_index}")]
    ObjectMetadataMissing { object_index: usize },

    #[error("data type mismatch when reading arrays: expected {expected:?}, got {actual:?}")]
    DataTypeMismatch { expected: DataType, actual: DataType },

    #[error("array object {object_index} holds {actual} arrays, metadata says {expected}")]
    ArrayCountMismatch {
        object_index: usize,
        expected: usize,
        actual: usize,
    },
}

impl From<ArrayDiscoveryError> for ArrayStoreError {
    fn from(value: ArrayDiscoveryError) -> Self {
        match value {
            ArrayDiscoveryError::ObjectStore(err) => Self::ObjectStore(err),
            ArrayDiscoveryError::Json(err) => Self::Json(err),
            ArrayDiscoveryError::DuplicateObjectIndex { object_index } => {
                Self::DuplicateObjectIndex { object_index }
            }
        }
    }
}
