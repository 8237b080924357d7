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

//! Byte-level wire primitives.
//!
//! All multi-byte integers and floats are little-endian. Floats are IEEE-754.
//! Booleans take one byte. Strings are a varint byte length followed by UTF-8.

mod reader;
mod varint;
mod writer;

pub use reader::ByteReader;
pub use varint::{varint_len, MAX_VARINT_LEN};
pub use writer::ByteWriter;

/// An error raised while reading wire data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// A read needed more bytes than the buffer has left.
    #[error("Unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were left.
        remaining: usize,
    },
    /// A varint ran past ten bytes or encodes a value wider than 64 bits, or a decoded
    /// varint does not fit its target integer type.
    #[error("Varint overflows its target type")]
    VarintOverflow,
    /// A string was not valid UTF-8.
    #[error("String is not valid UTF-8")]
    InvalidUtf8,
    /// A boolean byte was neither 0 nor 1.
    #[error("Invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
}
