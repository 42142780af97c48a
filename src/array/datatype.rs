//! Element types.
//!
//! [`Element`] is the bound every [`crate::array::RaggedArray`] element satisfies. It ties a
//! Rust scalar to its logical [`DataType`] and, through [`FixedWidth`], to the little-endian
//! encoding the codec compresses.
use std::fmt;

use crate::{dtype::DataType, io::FixedWidth};

pub trait Element:
    FixedWidth + PartialEq + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// The logical datatype for this element.
    const TYPE: DataType;
}

macro_rules! impl_element {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const TYPE: DataType = DataType::$dtype;
        }
    };
}

impl_element!(i8, I8);
impl_element!(i16, I16);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(u8, U8);
impl_element!(u16, U16);
impl_element!(u32, U32);
impl_element!(u64, U64);
impl_element!(f32, F32);
impl_element!(f64, F64);
