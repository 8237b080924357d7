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

/// The longest LEB128 encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Returns the number of bytes `value` occupies as an unsigned LEB128 varint.
///
/// Each byte carries seven value bits, so the size steps up at every power of 2^7:
///
/// | value range       | bytes |
/// |-------------------|-------|
/// | `< 2^7`           | 1     |
/// | `< 2^14`          | 2     |
/// | `< 2^21`          | 3     |
/// | `< 2^28`          | 4     |
/// | `< 2^35`          | 5     |
/// | ...               | ...   |
/// | `u64::MAX`        | 10    |
pub const fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    if bits == 0 {
        1
    } else {
        bits.div_ceil(7)
    }
}
