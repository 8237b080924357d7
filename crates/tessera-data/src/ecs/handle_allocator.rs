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

//! Generational handle allocation with slot recycling.

use tessera_core::ecs::entity::{EntityHandle, MAX_INDEX};

use crate::ecs::EcsError;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u32,
    alive: bool,
    enabled: bool,
}

/// Issues [`EntityHandle`]s and tracks which of them are alive.
///
/// Destroyed slot indices go onto a free list and are reused by later allocations,
/// with the slot's generation incremented so that stale handles stop matching.
/// Every operation is O(1) amortized.
#[derive(Debug, Clone)]
pub struct HandleAllocator {
    /// One entry per slot index ever handed out. Entry 0 is a permanent placeholder so
    /// no live handle can equal [`EntityHandle::NULL`].
    slots: Vec<Slot>,
    /// Indices available for reuse.
    free: Vec<u32>,
    alive_count: usize,
}

impl HandleAllocator {
    /// Creates an allocator with no live handles.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an allocator with room for `capacity` slots before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity + 1);
        slots.push(Slot::default());
        Self {
            slots,
            free: Vec::new(),
            alive_count: 0,
        }
    }

    /// Allocates a handle, reusing a freed slot if one is available.
    ///
    /// New handles start enabled.
    pub fn create(&mut self) -> Result<EntityHandle, EcsError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = self.slots.len() as u32;
                if index > MAX_INDEX {
                    return Err(EcsError::HandleSpaceExhausted);
                }
                self.slots.push(Slot::default());
                index
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.alive = true;
        slot.enabled = true;
        self.alive_count += 1;
        Ok(EntityHandle::new(index, slot.generation))
    }

    /// Releases a handle.
    ///
    /// Returns false, doing nothing, if the handle is null or no longer alive.
    pub fn destroy(&mut self, handle: EntityHandle) -> bool {
        let Some(slot) = self.live_slot_mut(handle) else {
            return false;
        };
        slot.generation = EntityHandle::next_generation(slot.generation);
        slot.alive = false;
        slot.enabled = false;
        self.free.push(handle.index());
        self.alive_count -= 1;
        true
    }

    /// Returns true if `handle` refers to the current occupant of its slot.
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.live_slot(handle).is_some()
    }

    /// Returns true if `handle` is alive and enabled.
    pub fn is_enabled(&self, handle: EntityHandle) -> bool {
        self.live_slot(handle).is_some_and(|slot| slot.enabled)
    }

    /// Sets the enabled flag of a live handle. Returns false for dead handles.
    pub fn set_enabled(&mut self, handle: EntityHandle, enabled: bool) -> bool {
        match self.live_slot_mut(handle) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns the number of live handles.
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the number of slot indices handed out so far, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Destroys every live handle.
    ///
    /// Slots are kept and their generations advanced, so handles issued before the
    /// clear stay dead after their indices are reused.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().skip(1).rev() {
            if slot.alive {
                slot.generation = EntityHandle::next_generation(slot.generation);
                slot.alive = false;
                slot.enabled = false;
            }
            self.free.push(index as u32);
        }
        self.alive_count = 0;
    }

    fn live_slot(&self, handle: EntityHandle) -> Option<&Slot> {
        if handle.is_null() {
            return None;
        }
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.alive && slot.generation == handle.generation())
    }

    fn live_slot_mut(&mut self, handle: EntityHandle) -> Option<&mut Slot> {
        if handle.is_null() {
            return None;
        }
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.alive && slot.generation == handle.generation())
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_handle_is_never_null() {
        let mut allocator = HandleAllocator::new();
        let handle = allocator.create().unwrap();

        assert!(!handle.is_null());
        assert_eq!(handle.index(), 1);
        assert_eq!(handle.generation(), 0);
        assert!(allocator.is_alive(handle));
        assert!(allocator.is_enabled(handle));
    }

    #[test]
    fn test_reuse_bumps_generation() {
        // --- 1. ARRANGE ---
        let mut allocator = HandleAllocator::new();
        let old = allocator.create().unwrap();

        // --- 2. ACT ---
        assert!(allocator.destroy(old));
        let new = allocator.create().unwrap();

        // --- 3. ASSERT ---
        assert_eq!(new.index(), old.index());
        assert_eq!(new.generation(), old.generation() + 1);
        assert!(!allocator.is_alive(old));
        assert!(allocator.is_alive(new));
        assert_eq!(allocator.alive_count(), 1);
        assert_eq!(allocator.capacity(), 1);
    }

    #[test]
    fn test_destroy_is_a_noop_for_dead_and_null_handles() {
        let mut allocator = HandleAllocator::new();
        let handle = allocator.create().unwrap();

        assert!(allocator.destroy(handle));
        assert!(!allocator.destroy(handle));
        assert!(!allocator.destroy(EntityHandle::NULL));
        assert_eq!(allocator.alive_count(), 0);
    }

    #[test]
    fn test_enabled_flag() {
        let mut allocator = HandleAllocator::new();
        let handle = allocator.create().unwrap();

        assert!(allocator.set_enabled(handle, false));
        assert!(!allocator.is_enabled(handle));
        assert!(allocator.is_alive(handle));

        allocator.destroy(handle);
        assert!(!allocator.set_enabled(handle, true));
        assert!(!allocator.is_enabled(handle));

        // A recycled slot starts enabled again.
        let reused = allocator.create().unwrap();
        assert!(allocator.is_enabled(reused));
    }

    #[test]
    fn test_clear_kills_outstanding_handles() {
        let mut allocator = HandleAllocator::new();
        let a = allocator.create().unwrap();
        let b = allocator.create().unwrap();

        allocator.clear();
        assert_eq!(allocator.alive_count(), 0);
        assert!(!allocator.is_alive(a));
        assert!(!allocator.is_alive(b));

        let c = allocator.create().unwrap();
        assert_eq!(c.index(), 1);
        assert_ne!(c, a);
    }
}
