//! Binary serialization.
//!
//! ## Layout
//! ```text
//! +-----------------+  f32  format version, must equal consts::FORMAT_VERSION
//! | version         |
//! +-----------------+  u64  total element count
//! | size            |
//! +-----------------+  u64  number of shape entries, then that many i32 entries
//! | shape_len       |       (signed encoding: the ragged axis is stored as -total)
//! | shape[..]       |
//! +-----------------+  u64  number of row splits
//! | rs_count        |
//! +-----------------+
//! | row splits      |  codec block of rs_count i64, only if rs_count > 0
//! +-----------------+
//! | data            |  codec block of size elements
//! +-----------------+
//! ```
//! All fixed-width values are little-endian. Several arrays may be written back to back into
//! one stream or file; [`RaggedArray::read_all_from_file`] reads them until end of file.
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    array::{
        RaggedArray,
        datatype::Element,
        error::{ArrayError, ArrayResult},
        shape,
    },
    codec::{BlockCodec, ZstdCodec},
    consts,
    io::{read_fixed, read_fixed_vec, write_fixed, write_fixed_slice},
};

/// The uncompressed prefix of a serialized array.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub size: usize,
    pub signed_shape: SmallVec<[i32; 4]>,
    pub row_split_count: usize,
}

impl Header {
    /// Read and check the version tag and the header fields.
    pub fn read<R: Read>(reader: &mut R) -> ArrayResult<Self> {
        let version: f32 = read_fixed(reader)?;
        if version.to_bits() != consts::FORMAT_VERSION.to_bits() {
            return Err(ArrayError::VersionMismatch {
                expected: consts::FORMAT_VERSION,
                actual: version,
            });
        }
        let size = read_len(reader, "size")?;
        let shape_len = read_len(reader, "shape length")?;
        let signed_shape: Vec<i32> = read_fixed_vec(reader, shape_len)?;
        let row_split_count = read_len(reader, "row split count")?;
        Ok(Self {
            size,
            signed_shape: SmallVec::from_vec(signed_shape),
            row_split_count,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> ArrayResult<()> {
        write_fixed(consts::FORMAT_VERSION, writer)?;
        write_fixed(self.size as u64, writer)?;
        write_fixed(self.signed_shape.len() as u64, writer)?;
        write_fixed_slice(&self.signed_shape, writer)?;
        write_fixed(self.row_split_count as u64, writer)?;
        Ok(())
    }
}

fn read_len<R: Read>(reader: &mut R, field: &str) -> ArrayResult<usize> {
    let value: u64 = read_fixed(reader)?;
    usize::try_from(value)
        .map_err(|_| ArrayError::CorruptHeader(format!("{field} {value} does not fit in memory")))
}

fn read_checked_row_splits<R: Read, C: BlockCodec>(
    reader: &mut R,
    header: &Header,
    codec: &C,
) -> ArrayResult<Vec<i64>> {
    if header.row_split_count == 0 {
        return Ok(Vec::new());
    }
    let row_splits: Vec<i64> = codec.read_all(reader)?;
    if row_splits.len() != header.row_split_count {
        return Err(ArrayError::LengthMismatch {
            expected: header.row_split_count,
            actual: row_splits.len(),
        });
    }
    Ok(row_splits)
}

/// Read only the header and the row splits of the next array in `reader`.
///
/// With `skip_data` the data block is skipped without decompressing it, leaving `reader` at
/// the start of the following array. Otherwise `reader` is left at the data block.
pub fn read_row_splits<R: Read>(reader: &mut R, skip_data: bool) -> ArrayResult<Vec<i64>> {
    read_row_splits_with(reader, skip_data, &ZstdCodec::default())
}

pub fn read_row_splits_with<R: Read, C: BlockCodec>(
    reader: &mut R,
    skip_data: bool,
    codec: &C,
) -> ArrayResult<Vec<i64>> {
    let header = Header::read(reader)?;
    let row_splits = read_checked_row_splits(reader, &header, codec)?;
    if skip_data {
        codec.skip_block(reader)?;
    }
    Ok(row_splits)
}

impl<T: Element> RaggedArray<'_, T> {
    /// Serialize with the default [`ZstdCodec`].
    pub fn write_to<W: Write>(&self, writer: &mut W) -> ArrayResult<()> {
        self.write_to_with(writer, &ZstdCodec::default())
    }

    pub fn write_to_with<W: Write, C: BlockCodec>(
        &self,
        writer: &mut W,
        codec: &C,
    ) -> ArrayResult<()> {
        let header = Header {
            size: self.size(),
            signed_shape: self.signed_shape()?,
            row_split_count: self.row_splits().len(),
        };
        header.write(writer)?;
        if header.row_split_count > 0 {
            codec.compress_and_write(self.row_splits(), writer)?;
        }
        codec.compress_and_write(self.data(), writer)?;
        debug!(
            dtype = ?T::TYPE,
            size = header.size,
            ragged = self.is_ragged(),
            "serialized array"
        );
        Ok(())
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self) -> ArrayResult<Bytes> {
        let mut writer = BytesMut::new().writer();
        self.write_to(&mut writer)?;
        Ok(writer.into_inner().freeze())
    }

    /// Write this array as the only content of the file at `path`.
    ///
    /// # Errors
    /// [`ArrayError::Open`] if the file cannot be created.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> ArrayResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ArrayError::Open {
            path: path.display().to_string(),
            source,
        })?;
        self.write_file(file)
    }

    /// Write this array after any arrays already stored in the file at `path`.
    pub fn append_to_file<P: AsRef<Path>>(&self, path: P) -> ArrayResult<()> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ArrayError::Open {
                path: path.display().to_string(),
                source,
            })?;
        self.write_file(file)
    }

    fn write_file(&self, file: File) -> ArrayResult<()> {
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl<T: Element> RaggedArray<'static, T> {
    /// Deserialize one array with the default [`ZstdCodec`].
    pub fn read_from<R: Read>(reader: &mut R) -> ArrayResult<Self> {
        Self::read_from_with(reader, &ZstdCodec::default())
    }

    /// Deserialize one array.
    ///
    /// # Errors
    /// - [`ArrayError::VersionMismatch`] if the version tag differs.
    /// - [`ArrayError::LengthMismatch`] if a block holds a different number of values than
    ///   the header declares, or the declared size disagrees with the shape.
    /// - [`ArrayError::CorruptHeader`] if shape and row splits are inconsistent.
    pub fn read_from_with<R: Read, C: BlockCodec>(reader: &mut R, codec: &C) -> ArrayResult<Self> {
        let header = Header::read(reader)?;
        let (decoded_shape, ragged_total) =
            shape::decode_signed(&header.signed_shape, header.row_split_count > 0)
                .map_err(|e| ArrayError::CorruptHeader(e.to_string()))?;
        let size = shape::size_from_signed_shape(&header.signed_shape)?;
        if size != header.size {
            return Err(ArrayError::LengthMismatch {
                expected: size,
                actual: header.size,
            });
        }

        let row_splits = read_checked_row_splits(reader, &header, codec)?;
        if let Some(total) = ragged_total {
            let last = row_splits.last().copied().unwrap_or(0);
            if usize::try_from(last).ok() != Some(total) {
                return Err(ArrayError::CorruptHeader(format!(
                    "ragged axis total {total} does not match last row split {last}"
                )));
            }
        }

        let data: Vec<T> = codec.read_all(reader)?;
        if data.len() != size {
            return Err(ArrayError::LengthMismatch {
                expected: size,
                actual: data.len(),
            });
        }

        debug!(dtype = ?T::TYPE, size, "deserialized array");
        Self::from_vec(data, &decoded_shape, row_splits)
            .map_err(|e| ArrayError::CorruptHeader(e.to_string()))
    }

    pub fn from_bytes(bytes: Bytes) -> ArrayResult<Self> {
        Self::read_from(&mut bytes.reader())
    }

    /// Read the first array stored in the file at `path`.
    ///
    /// # Errors
    /// [`ArrayError::Open`] if the file cannot be opened.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> ArrayResult<Self> {
        let mut reader = open_buffered(path.as_ref())?;
        Self::read_from(&mut reader)
    }

    /// Read every array stored back to back in the file at `path`.
    pub fn read_all_from_file<P: AsRef<Path>>(path: P) -> ArrayResult<Vec<Self>> {
        let mut reader = open_buffered(path.as_ref())?;
        let mut arrays = Vec::new();
        while !reader.fill_buf()?.is_empty() {
            arrays.push(Self::read_from(&mut reader)?);
        }
        debug!(count = arrays.len(), "read arrays from file");
        Ok(arrays)
    }
}

fn open_buffered(path: &Path) -> ArrayResult<BufReader<File>> {
    let file = File::open(path).map_err(|source| ArrayError::Open {
        path: path.display().to_string(),
        source,
    })?;
    Ok(BufReader::new(file))
}
