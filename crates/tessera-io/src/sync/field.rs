// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::wire::{ByteReader, ByteWriter, WireError};

/// The wire encoding of a synchronized field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// One byte.
    U8,
    /// Two bytes, little-endian.
    U16,
    /// Four bytes, little-endian.
    U32,
    /// Eight bytes, little-endian.
    U64,
    /// One byte, two's complement.
    I8,
    /// Two bytes, little-endian.
    I16,
    /// Four bytes, little-endian.
    I32,
    /// IEEE-754 single precision, little-endian.
    F32,
    /// IEEE-754 double precision, little-endian.
    F64,
    /// One byte, 0 or 1.
    Bool,
    /// Varint byte length, then UTF-8.
    String,
    /// Unsigned LEB128.
    Varint,
}

impl WireType {
    /// Returns the encoded size for fixed-width types.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            WireType::U8 | WireType::I8 | WireType::Bool => Some(1),
            WireType::U16 | WireType::I16 => Some(2),
            WireType::U32 | WireType::I32 | WireType::F32 => Some(4),
            WireType::U64 | WireType::F64 => Some(8),
            WireType::String | WireType::Varint => None,
        }
    }
}

/// One entry of a component's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncField {
    /// The Rust field name.
    pub name: &'static str,
    /// How the field is encoded.
    pub wire_type: WireType,
    /// The one-byte index written before the field's value.
    pub index: u8,
}

/// A Rust type with a native wire encoding.
pub trait WireValue: Sized {
    /// The encoding used for this type.
    const WIRE_TYPE: WireType;

    /// Writes the value.
    fn write(&self, writer: &mut ByteWriter);

    /// Reads a value.
    fn read(reader: &mut ByteReader<'_>) -> Result<Self, WireError>;
}

macro_rules! impl_wire_value {
    ($ty:ty, $wire:ident, $write:ident, $read:ident) => {
        impl WireValue for $ty {
            const WIRE_TYPE: WireType = WireType::$wire;

            #[inline]
            fn write(&self, writer: &mut ByteWriter) {
                writer.$write(*self);
            }

            #[inline]
            fn read(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
                reader.$read()
            }
        }
    };
}

impl_wire_value!(u8, U8, write_u8, read_u8);
impl_wire_value!(u16, U16, write_u16, read_u16);
impl_wire_value!(u32, U32, write_u32, read_u32);
impl_wire_value!(u64, U64, write_u64, read_u64);
impl_wire_value!(i8, I8, write_i8, read_i8);
impl_wire_value!(i16, I16, write_i16, read_i16);
impl_wire_value!(i32, I32, write_i32, read_i32);
impl_wire_value!(f32, F32, write_f32, read_f32);
impl_wire_value!(f64, F64, write_f64, read_f64);
impl_wire_value!(bool, Bool, write_bool, read_bool);

impl WireValue for String {
    const WIRE_TYPE: WireType = WireType::String;

    fn write(&self, writer: &mut ByteWriter) {
        writer.write_string(self);
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
        reader.read_string()
    }
}

/// An unsigned integer type that can be sent as a varint with `#[sync(varint)]`.
pub trait VarintValue: Sized {
    /// Writes the value as a varint.
    fn write_varint(&self, writer: &mut ByteWriter);

    /// Reads a varint, failing if it does not fit `Self`.
    fn read_varint(reader: &mut ByteReader<'_>) -> Result<Self, WireError>;
}

macro_rules! impl_varint_value {
    ($($ty:ty),*) => {
        $(
            impl VarintValue for $ty {
                #[inline]
                fn write_varint(&self, writer: &mut ByteWriter) {
                    writer.write_varint(*self as u64);
                }

                #[inline]
                fn read_varint(reader: &mut ByteReader<'_>) -> Result<Self, WireError> {
                    <$ty>::try_from(reader.read_varint()?).map_err(|_| WireError::VarintOverflow)
                }
            }
        )*
    };
}

impl_varint_value!(u8, u16, u32, u64, usize);
