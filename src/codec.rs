//! Compressed block codec.
//!
//! The array format stores its row-split table and its element buffer as self-delimiting
//! compressed blocks. The array code never looks inside a block; it only asks a
//! [`BlockCodec`] to write one, read one back, or skip over one.
//!
//! ## Block layout
//! ```text
//! +----------------+---------------+------------------+----------------------+
//! | MAGIC (8 B)    | count (u64)   | byte_len (u64)   | zstd frame           |
//! +----------------+---------------+------------------+----------------------+
//!                                                     <----- byte_len ------>
//! ```
//! `count` is the number of encoded values, `byte_len` the size of the compressed payload. An
//! empty block has `byte_len = 0` and no frame. Because `byte_len` is stored up front a block
//! can be skipped without decompressing it.
use std::io::{self, Read, Write};

use thiserror::Error;

use crate::{
    consts,
    io::{FixedWidth, decode_slice, encode_slice, read_fixed, read_fixed_vec, write_fixed},
};

/// Errors produced while writing or reading a compressed block.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid block magic")]
    InvalidMagic,

    #[error("compression error: {0}")]
    Compression(String),

    #[error("block value count overflow")]
    CountOverflow,

    /// The decompressed payload does not hold exactly `count` values.
    #[error("wrong decompressed length: expected {expected} bytes, got {actual}")]
    WrongByteLen { expected: usize, actual: usize },
}

/// Compress/decompress a typed buffer to/from a stream.
pub trait BlockCodec {
    /// Compress `values` and append them to `writer` as one block.
    fn compress_and_write<V: FixedWidth, W: Write>(
        &self,
        values: &[V],
        writer: &mut W,
    ) -> Result<(), CodecError>;

    /// Read one block and decode every value in it.
    fn read_all<V: FixedWidth, R: Read>(&self, reader: &mut R) -> Result<Vec<V>, CodecError>;

    /// Advance `reader` past one block without decoding it.
    fn skip_block<R: Read>(&self, reader: &mut R) -> Result<(), CodecError>;
}

/// [`BlockCodec`] backed by zstd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ZstdCodec {
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self {
            level: consts::DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    /// Read the block header, returning `(count, byte_len)`.
    fn read_header<R: Read>(reader: &mut R) -> Result<(u64, u64), CodecError> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != consts::MAGIC_NUMBER_COMPRESSED {
            return Err(CodecError::InvalidMagic);
        }
        let count: u64 = read_fixed(reader)?;
        let byte_len: u64 = read_fixed(reader)?;
        Ok((count, byte_len))
    }
}

impl BlockCodec for ZstdCodec {
    fn compress_and_write<V: FixedWidth, W: Write>(
        &self,
        values: &[V],
        writer: &mut W,
    ) -> Result<(), CodecError> {
        let compressed = if values.is_empty() {
            Vec::new()
        } else {
            zstd::bulk::compress(&encode_slice(values), self.level)
                .map_err(|e| CodecError::Compression(e.to_string()))?
        };

        writer.write_all(consts::MAGIC_NUMBER_COMPRESSED)?;
        write_fixed(values.len() as u64, writer)?;
        write_fixed(compressed.len() as u64, writer)?;
        writer.write_all(&compressed)?;
        Ok(())
    }

    fn read_all<V: FixedWidth, R: Read>(&self, reader: &mut R) -> Result<Vec<V>, CodecError> {
        let (count, byte_len) = Self::read_header(reader)?;
        let expected = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(V::WIDTH))
            .ok_or(CodecError::CountOverflow)?;
        let byte_len = usize::try_from(byte_len).map_err(|_| CodecError::CountOverflow)?;

        let compressed: Vec<u8> = read_fixed_vec(reader, byte_len)?;
        if expected == 0 {
            return if compressed.is_empty() {
                Ok(Vec::new())
            } else {
                Err(CodecError::WrongByteLen {
                    expected: 0,
                    actual: compressed.len(),
                })
            };
        }

        let decompressed = decompress_bounded(&compressed, expected)?;
        if decompressed.len() != expected {
            return Err(CodecError::WrongByteLen {
                expected,
                actual: decompressed.len(),
            });
        }

        decode_slice(&decompressed).ok_or(CodecError::WrongByteLen {
            expected,
            actual: decompressed.len(),
        })
    }

    fn skip_block<R: Read>(&self, reader: &mut R) -> Result<(), CodecError> {
        let (_, byte_len) = Self::read_header(reader)?;
        let skipped = io::copy(&mut reader.by_ref().take(byte_len), &mut io::sink())?;
        if skipped != byte_len {
            return Err(CodecError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "short block",
            )));
        }
        Ok(())
    }
}

/// Decompress one frame, reading at most one byte past `expected`.
///
/// `expected` comes from the block header, so the output buffer grows with the decompressed
/// payload instead of being reserved up front.
fn decompress_bounded(compressed: &[u8], expected: usize) -> Result<Vec<u8>, CodecError> {
    let decoder = zstd::stream::read::Decoder::with_buffer(compressed)
        .map_err(|e| CodecError::Compression(e.to_string()))?;
    let limit = u64::try_from(expected)
        .ok()
        .and_then(|n| n.checked_add(1))
        .ok_or(CodecError::CountOverflow)?;
    let mut out = Vec::new();
    decoder
        .take(limit)
        .read_to_end(&mut out)
        .map_err(|e| CodecError::Compression(e.to_string()))?;
    Ok(out)
}
