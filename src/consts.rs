/// Version tag written at the start of every serialized array.
///
/// Readers compare it bit-for-bit; any other value is a format error.
pub const FORMAT_VERSION: f32 = 4.0;

/// Default zstd compression level used by [`crate::codec::ZstdCodec`].
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Element budget per chunk when a [`crate::array::chunking::ChunkLimit`] is not configured.
pub const DEFAULT_CHUNK_ELEMENTS: usize = 1 << 20;

/// Object-store layout for persisted array files:
///     <dir>/array/
///     <dir>/array_meta/
///
pub const ARRAY_DIR: &str = "array";
pub const ARRAY_META_DIR: &str = "array_meta";

/// File extension of a serialized array file object.
pub const ARRAY_FILE_EXTENSION: &str = "djc";

pub const MAGIC_NUMBER_COMPRESSED: &[u8; 8] = b"RAGCZSTD";
