//! Raw fixed-width stream primitives.
//!
//! Everything the array format writes *uncompressed* (version tag, counts, shape entries) goes
//! through this module. Values are encoded little-endian at their natural width, so a file
//! written on one host reads back identically on any other.
//!
//! The same [`FixedWidth`] encoding is used by [`crate::codec`] to turn typed element slices
//! into the byte stream that gets compressed.
use std::io::{self, Read, Write};

/// Largest width of any [`FixedWidth`] type, in bytes.
const MAX_WIDTH: usize = 8;

/// A plain value with a fixed little-endian byte encoding.
pub trait FixedWidth: Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Encode into `out`, which is exactly [`Self::WIDTH`] bytes long.
    fn put_le(self, out: &mut [u8]);

    /// Decode from `bytes`, which is exactly [`Self::WIDTH`] bytes long.
    fn get_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_fixed_width {
    ($ty:ty) => {
        impl FixedWidth for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn put_le(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn get_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                <$ty>::from_le_bytes(buf)
            }
        }
    };
}

impl_fixed_width!(i8);
impl_fixed_width!(i16);
impl_fixed_width!(i32);
impl_fixed_width!(i64);
impl_fixed_width!(u8);
impl_fixed_width!(u16);
impl_fixed_width!(u32);
impl_fixed_width!(u64);
impl_fixed_width!(f32);
impl_fixed_width!(f64);

/// Write a single value.
pub fn write_fixed<V: FixedWidth, W: Write>(value: V, writer: &mut W) -> io::Result<()> {
    let mut buf = [0u8; MAX_WIDTH];
    value.put_le(&mut buf[..V::WIDTH]);
    writer.write_all(&buf[..V::WIDTH])
}

/// Write a slice of values back to back.
pub fn write_fixed_slice<V: FixedWidth, W: Write>(
    values: &[V],
    writer: &mut W,
) -> io::Result<()> {
    writer.write_all(&encode_slice(values))
}

/// Read a single value.
pub fn read_fixed<V: FixedWidth, R: Read>(reader: &mut R) -> io::Result<V> {
    let mut buf = [0u8; MAX_WIDTH];
    reader.read_exact(&mut buf[..V::WIDTH])?;
    Ok(V::get_le(&buf[..V::WIDTH]))
}

/// Read exactly `count` values.
///
/// The count usually comes from an untrusted header, so the buffer grows with the bytes
/// actually read instead of being preallocated from `count`.
pub fn read_fixed_vec<V: FixedWidth, R: Read>(
    reader: &mut R,
    count: usize,
) -> io::Result<Vec<V>> {
    let byte_len = count
        .checked_mul(V::WIDTH)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "value count overflow"))?;

    let mut bytes = Vec::new();
    reader.by_ref().take(byte_len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != byte_len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short read: expected {byte_len} bytes, got {}", bytes.len()),
        ));
    }

    Ok(bytes.chunks_exact(V::WIDTH).map(V::get_le).collect())
}

/// Encode a slice into a fresh byte vector.
pub fn encode_slice<V: FixedWidth>(values: &[V]) -> Vec<u8> {
    let mut bytes = vec![0u8; values.len() * V::WIDTH];
    for (value, out) in values.iter().zip(bytes.chunks_exact_mut(V::WIDTH)) {
        value.put_le(out);
    }
    bytes
}

/// Decode a byte buffer into values.
///
/// Returns `None` if `bytes.len()` is not a multiple of [`FixedWidth::WIDTH`].
pub fn decode_slice<V: FixedWidth>(bytes: &[u8]) -> Option<Vec<V>> {
    if bytes.len() % V::WIDTH != 0 {
        return None;
    }
    Some(bytes.chunks_exact(V::WIDTH).map(V::get_le).collect())
}
