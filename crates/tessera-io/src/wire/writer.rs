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

use crate::wire::varint_len;

const MIN_CAPACITY: usize = 16;

/// An auto-growing little-endian byte writer.
///
/// The backing buffer doubles whenever a write does not fit, so a writer reused
/// across messages settles at the size of the largest one.
/// [`finish`](ByteWriter::finish) hands back only the bytes actually written.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buffer: Vec<u8>,
    position: usize,
}

impl ByteWriter {
    /// Creates a writer with no preallocated storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with `capacity` bytes preallocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            position: 0,
        }
    }

    /// Returns the number of bytes written.
    #[inline]
    pub fn len(&self) -> usize {
        self.position
    }

    /// Returns true if no bytes have been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.position == 0
    }

    /// Returns the size of the backing buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the written bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    /// Discards the written bytes, keeping the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.position = 0;
    }

    /// Consumes the writer and returns the written bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.buffer.truncate(self.position);
        self.buffer
    }

    fn reserve(&mut self, additional: usize) {
        let required = self.position + additional;
        if required <= self.buffer.len() {
            return;
        }
        let mut capacity = self.buffer.len().max(MIN_CAPACITY);
        while capacity < required {
            capacity *= 2;
        }
        self.buffer.resize(capacity, 0);
    }

    /// Writes raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.buffer[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    /// Writes a u16 in little-endian format.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a u32 in little-endian format.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a u64 in little-endian format.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes an i8.
    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes an i16 in little-endian format.
    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes an i32 in little-endian format.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes an f32 in little-endian format.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes an f64 in little-endian format.
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a boolean as one byte, 1 or 0.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Writes an unsigned LEB128 varint.
    pub fn write_varint(&mut self, mut value: u64) {
        self.reserve(varint_len(value));
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buffer[self.position] = byte;
                self.position += 1;
                return;
            }
            self.buffer[self.position] = byte | 0x80;
            self.position += 1;
        }
    }

    /// Writes a string as its varint byte length followed by its UTF-8 bytes.
    pub fn write_string(&mut self, value: &str) {
        self.write_varint(value.len() as u64);
        self.write_bytes(value.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut writer = ByteWriter::new();
        writer.write_u16(0x0102);
        writer.write_u32(0x0304_0506);
        writer.write_i8(-1);
        writer.write_bool(true);

        assert_eq!(
            writer.as_slice(),
            &[0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0xff, 0x01]
        );
    }

    #[test]
    fn test_growth_doubles_and_finish_trims() {
        let mut writer = ByteWriter::with_capacity(4);
        writer.write_u32(1);
        assert_eq!(writer.capacity(), 4);

        writer.write_u8(2);
        assert_eq!(writer.capacity(), 16);
        for _ in 0..4 {
            writer.write_u32(7);
        }
        assert_eq!(writer.capacity(), 32);

        let bytes = writer.finish();
        assert_eq!(bytes.len(), 21);
    }

    #[test]
    fn test_varint_bytes() {
        let mut writer = ByteWriter::new();
        writer.write_varint(0);
        writer.write_varint(127);
        writer.write_varint(128);
        writer.write_varint(300);

        assert_eq!(writer.as_slice(), &[0x00, 0x7f, 0x80, 0x01, 0xac, 0x02]);
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let mut writer = ByteWriter::new();
        writer.write_string("héllo");

        let bytes = writer.finish();
        assert_eq!(bytes[0], 6);
        assert_eq!(&bytes[1..], "héllo".as_bytes());
    }

    #[test]
    fn test_clear_keeps_buffer() {
        let mut writer = ByteWriter::new();
        writer.write_u64(9);
        let capacity = writer.capacity();
        writer.clear();

        assert!(writer.is_empty());
        assert_eq!(writer.capacity(), capacity);
    }
}
