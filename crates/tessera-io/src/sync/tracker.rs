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

use std::time::Instant;

use tessera_data::ecs::Bitmask;

/// Per-instance record of which synchronized fields changed since the last encode.
///
/// Field indices are one byte on the wire, so at most 256 fields can be tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    dirty: Bitmask,
    last_sync: Option<Instant>,
}

impl ChangeTracker {
    /// Creates a tracker with no dirty fields that has never been synced.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one field dirty.
    #[inline]
    pub fn mark_dirty(&mut self, index: u8) {
        self.dirty.set(u32::from(index));
    }

    /// Marks the first `field_count` fields dirty.
    pub fn mark_all_dirty(&mut self, field_count: usize) {
        for index in 0..field_count.min(256) {
            self.dirty.set(index as u32);
        }
    }

    /// Returns true if the field is dirty.
    #[inline]
    pub fn is_dirty(&self, index: u8) -> bool {
        self.dirty.contains(u32::from(index))
    }

    /// Returns true if any field is dirty.
    #[inline]
    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Returns the number of dirty fields.
    pub fn dirty_count(&self) -> usize {
        self.dirty.count_ones() as usize
    }

    /// Iterates over the dirty field indices in ascending order.
    pub fn dirty_fields(&self) -> impl Iterator<Item = u8> + '_ {
        self.dirty.iter().map(|index| index as u8)
    }

    /// Clears every dirty field and records the sync instant.
    pub fn clear(&mut self) {
        self.dirty.clear_all();
        self.last_sync = Some(Instant::now());
    }

    /// Returns when the instance was last included in an encode.
    pub fn last_sync(&self) -> Option<Instant> {
        self.last_sync
    }
}
