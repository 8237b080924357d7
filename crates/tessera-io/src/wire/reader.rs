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

use crate::wire::{WireError, MAX_VARINT_LEN};

/// A bounds-checked little-endian reader over a byte slice.
///
/// Every read either consumes exactly the bytes it needs or fails without moving
/// the cursor past the end of the buffer.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Returns the number of bytes consumed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Returns true if every byte has been read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes and returns the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(WireError::UnexpectedEof {
                needed: len,
                remaining,
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a little-endian u16.
    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Reads a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads a little-endian u64.
    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Reads an i8.
    pub fn read_i8(&mut self) -> Result<i8, WireError> {
        self.read_array().map(i8::from_le_bytes)
    }

    /// Reads a little-endian i16.
    pub fn read_i16(&mut self) -> Result<i16, WireError> {
        self.read_array().map(i16::from_le_bytes)
    }

    /// Reads a little-endian i32.
    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Reads a little-endian f32.
    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Reads a little-endian f64.
    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Reads a boolean byte. Only 0 and 1 are accepted.
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidBool(other)),
        }
    }

    /// Reads an unsigned LEB128 varint.
    ///
    /// Fails on truncation mid-value and on encodings wider than 64 bits.
    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            let bits = u64::from(byte & 0x7f);
            let shift = 7 * i as u32;
            // The tenth byte may only contribute the top bit of a u64.
            if i == MAX_VARINT_LEN - 1 && bits > 1 {
                return Err(WireError::VarintOverflow);
            }
            value |= bits << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(WireError::VarintOverflow)
    }

    /// Reads a varint-length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, WireError> {
        let len = self.read_varint()?;
        let remaining = self.remaining();
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= remaining)
            .ok_or(WireError::UnexpectedEof {
                needed: usize::try_from(len).unwrap_or(usize::MAX),
                remaining,
            })?;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{varint_len, ByteWriter};

    #[test]
    fn test_reads_what_the_writer_wrote() {
        let mut writer = ByteWriter::new();
        writer.write_u8(7);
        writer.write_u16(500);
        writer.write_u64(u64::MAX - 1);
        writer.write_i16(-300);
        writer.write_i32(i32::MIN);
        writer.write_f32(1.5);
        writer.write_f64(std::f64::consts::PI);
        writer.write_bool(false);
        writer.write_string("ünïcødé ✓");
        let bytes = writer.finish();

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_u8(), Ok(7));
        assert_eq!(reader.read_u16(), Ok(500));
        assert_eq!(reader.read_u64(), Ok(u64::MAX - 1));
        assert_eq!(reader.read_i16(), Ok(-300));
        assert_eq!(reader.read_i32(), Ok(i32::MIN));
        assert_eq!(reader.read_f32(), Ok(1.5));
        assert_eq!(reader.read_f64(), Ok(std::f64::consts::PI));
        assert_eq!(reader.read_bool(), Ok(false));
        assert_eq!(reader.read_string().as_deref(), Ok("ünïcødé ✓"));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_varints_across_the_31_bit_boundary() {
        for value in [0, 1, 127, 128, 16_383, 16_384, (1 << 31) - 1, 1 << 31, 1 << 40, u64::MAX] {
            let mut writer = ByteWriter::new();
            writer.write_varint(value);
            assert_eq!(writer.len(), varint_len(value), "length of {value}");

            let bytes = writer.finish();
            let mut reader = ByteReader::new(&bytes);
            assert_eq!(reader.read_varint(), Ok(value));
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_overrun_reports_needed_and_remaining() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        assert_eq!(
            reader.read_u32(),
            Err(WireError::UnexpectedEof {
                needed: 4,
                remaining: 3
            })
        );
        // A failed read consumes nothing.
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn test_truncated_varint() {
        let mut reader = ByteReader::new(&[0x80, 0x80]);
        assert!(matches!(
            reader.read_varint(),
            Err(WireError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_oversized_varint() {
        let mut reader = ByteReader::new(&[0xff; 11]);
        assert_eq!(reader.read_varint(), Err(WireError::VarintOverflow));

        // Ten bytes whose last one carries more than the top bit.
        let mut bytes = [0xff; 10];
        bytes[9] = 0x02;
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_varint(), Err(WireError::VarintOverflow));
    }

    #[test]
    fn test_invalid_strings() {
        let mut reader = ByteReader::new(&[2, 0xc3, 0x28]);
        assert_eq!(reader.read_string(), Err(WireError::InvalidUtf8));

        let mut reader = ByteReader::new(&[5, b'a']);
        assert!(matches!(
            reader.read_string(),
            Err(WireError::UnexpectedEof { needed: 5, remaining: 1 })
        ));
    }

    #[test]
    fn test_invalid_bool() {
        let mut reader = ByteReader::new(&[2]);
        assert_eq!(reader.read_bool(), Err(WireError::InvalidBool(2)));
    }
}
