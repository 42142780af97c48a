//! Ragged multi-dimensional arrays for batched, variable-length numeric data.
//!
//! The crate is built around [`RaggedArray`]: a contiguous element buffer, a shape whose axis 1
//! may be ragged, and a row-split table describing the per-row extents of that axis. On top of
//! it sit the structural operators (split, slice, append, shuffle), chunk planning, a compact
//! versioned binary format, `ndarray` interop and `object_store` persistence.
//!
//! - [`array`]: the container and everything operating on it.
//! - [`codec`]: the compressed block codec used by the binary format.
//! - [`io`]: little-endian fixed-width stream primitives.
//! - [`consts`]: format version, defaults and object-store layout names.
pub mod array;
pub mod codec;
pub mod consts;
pub mod dtype;
pub mod io;

pub use array::{
    Ownership, RaggedArray, RaggedParts,
    chunking::{Chunk, ChunkLimit, ChunkPlan, SplitEncoding, plan_chunks},
    datatype::Element,
    error::{ArrayError, ArrayResult, ArrayStoreError, ErrorKind},
    shape::{Dim, Shape},
};
pub use dtype::DataType;
