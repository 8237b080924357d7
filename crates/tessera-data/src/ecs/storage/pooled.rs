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

use std::collections::HashMap;

use crate::ecs::{storage::ColumnStorage, ComponentTicks, EntityId};

struct Slot<T> {
    entity: EntityId,
    value: T,
    ticks: ComponentTicks,
}

/// A slot pool: values stay where they were inserted, and freed slots are recycled.
///
/// Removal never moves other values, which keeps slot positions stable for the
/// lifetime of each component.
pub struct PooledColumn<T> {
    slots: Vec<Option<Slot<T>>>,
    /// Freed slot positions, reused last-in first-out.
    free: Vec<usize>,
    lookup: HashMap<EntityId, usize>,
}

impl<T> PooledColumn<T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty pool with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            lookup: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of slots allocated, occupied or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, entity: EntityId) -> Option<&Slot<T>> {
        let index = *self.lookup.get(&entity)?;
        self.slots.get(index)?.as_ref()
    }

    fn slot_mut(&mut self, entity: EntityId) -> Option<&mut Slot<T>> {
        let index = *self.lookup.get(&entity)?;
        self.slots.get_mut(index)?.as_mut()
    }
}

impl<T> Default for PooledColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> ColumnStorage<T> for PooledColumn<T> {
    fn insert(&mut self, entity: EntityId, value: T, ticks: ComponentTicks) -> Option<T> {
        if let Some(slot) = self.slot_mut(entity) {
            slot.ticks = ticks;
            return Some(std::mem::replace(&mut slot.value, value));
        }

        let slot = Slot {
            entity,
            value,
            ticks,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                index
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.lookup.insert(entity, index);
        None
    }

    fn remove(&mut self, entity: EntityId) -> Option<T> {
        let index = self.lookup.remove(&entity)?;
        let slot = self.slots.get_mut(index)?.take()?;
        self.free.push(index);
        Some(slot.value)
    }

    fn get(&self, entity: EntityId) -> Option<&T> {
        self.slot(entity).map(|slot| &slot.value)
    }

    fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.slot_mut(entity).map(|slot| &mut slot.value)
    }

    fn ticks(&self, entity: EntityId) -> Option<&ComponentTicks> {
        self.slot(entity).map(|slot| &slot.ticks)
    }

    fn ticks_mut(&mut self, entity: EntityId) -> Option<&mut ComponentTicks> {
        self.slot_mut(entity).map(|slot| &mut slot.ticks)
    }

    fn get_with_ticks_mut(&mut self, entity: EntityId) -> Option<(&mut T, &mut ComponentTicks)> {
        self.slot_mut(entity)
            .map(|slot| (&mut slot.value, &mut slot.ticks))
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.lookup.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.lookup.len()
    }

    fn entities(&self) -> Vec<EntityId> {
        self.slots
            .iter()
            .flatten()
            .map(|slot| slot.entity)
            .collect()
    }
}
