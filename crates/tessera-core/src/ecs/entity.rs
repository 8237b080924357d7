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

//! Defines the packed generational handle used to refer to entity slots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of low bits holding the slot index.
pub const INDEX_BITS: u32 = 28;
/// Number of bits above the index holding the generation.
pub const GENERATION_BITS: u32 = 20;
/// Largest representable slot index.
pub const MAX_INDEX: u32 = (1 << INDEX_BITS) - 1;
/// Largest representable generation. Generations wrap back to 0 past this value.
pub const MAX_GENERATION: u32 = (1 << GENERATION_BITS) - 1;

const INDEX_SPAN: u64 = 1 << INDEX_BITS;
const HANDLE_BITS: u32 = INDEX_BITS + GENERATION_BITS;

/// A packed `(index, generation)` identifier for an entity slot.
///
/// The value is laid out as `generation * 2^28 + index` and never exceeds 48 bits,
/// so it survives a round trip through a 64-bit float. When an entity is destroyed
/// its slot index is recycled but the generation is incremented, which makes every
/// old handle to that slot fail the aliveness check instead of silently aliasing the
/// new entity (the "ABA problem").
///
/// The all-zero value is the null handle. Allocators never hand out slot 0, so a
/// live handle is always non-zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// The null handle. It is never alive.
    pub const NULL: Self = Self(0);

    /// Packs an index and a generation into a handle.
    ///
    /// Both parts are masked to their bit widths.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        let index = (index & MAX_INDEX) as u64;
        let generation = (generation & MAX_GENERATION) as u64;
        Self(generation * INDEX_SPAN + index)
    }

    /// Returns the slot index encoded in this handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        (self.0 % INDEX_SPAN) as u32
    }

    /// Returns the generation encoded in this handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        ((self.0 / INDEX_SPAN) & MAX_GENERATION as u64) as u32
    }

    /// Returns the raw packed value.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds a handle from its raw packed value.
    ///
    /// Returns `None` if the value does not fit in 48 bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Option<Self> {
        if bits >> HANDLE_BITS == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Returns `true` for the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns the generation that follows `generation`, wrapping at the bit width.
    #[inline]
    #[must_use]
    pub const fn next_generation(generation: u32) -> u32 {
        generation.wrapping_add(1) & MAX_GENERATION
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}
