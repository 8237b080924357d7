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

/// A Structure of Arrays column: values, ticks and owners in parallel dense vectors.
///
/// Row `i` of `values`, `ticks` and `entities` always describes the same instance.
/// Removal is a `swap_remove` across all three vectors, after which the row of the
/// entity moved into the hole is patched in the sparse map.
pub struct DenseColumn<T> {
    values: Vec<T>,
    ticks: Vec<ComponentTicks>,
    entities: Vec<EntityId>,
    rows: HashMap<EntityId, usize>,
}

impl<T> DenseColumn<T> {
    /// Creates an empty column.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty column with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            ticks: Vec::with_capacity(capacity),
            entities: Vec::with_capacity(capacity),
            rows: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the packed values, in row order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns the owner of each row.
    pub fn row_entities(&self) -> &[EntityId] {
        &self.entities
    }
}

impl<T> Default for DenseColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> ColumnStorage<T> for DenseColumn<T> {
    fn insert(&mut self, entity: EntityId, value: T, ticks: ComponentTicks) -> Option<T> {
        if let Some(&row) = self.rows.get(&entity) {
            self.ticks[row] = ticks;
            return Some(std::mem::replace(&mut self.values[row], value));
        }

        self.rows.insert(entity, self.values.len());
        self.values.push(value);
        self.ticks.push(ticks);
        self.entities.push(entity);
        None
    }

    fn remove(&mut self, entity: EntityId) -> Option<T> {
        let row = self.rows.remove(&entity)?;
        let value = self.values.swap_remove(row);
        self.ticks.swap_remove(row);
        self.entities.swap_remove(row);

        if let Some(&moved) = self.entities.get(row) {
            self.rows.insert(moved, row);
        }
        Some(value)
    }

    fn get(&self, entity: EntityId) -> Option<&T> {
        self.values.get(*self.rows.get(&entity)?)
    }

    fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.values.get_mut(*self.rows.get(&entity)?)
    }

    fn ticks(&self, entity: EntityId) -> Option<&ComponentTicks> {
        self.ticks.get(*self.rows.get(&entity)?)
    }

    fn ticks_mut(&mut self, entity: EntityId) -> Option<&mut ComponentTicks> {
        self.ticks.get_mut(*self.rows.get(&entity)?)
    }

    fn get_with_ticks_mut(&mut self, entity: EntityId) -> Option<(&mut T, &mut ComponentTicks)> {
        let row = *self.rows.get(&entity)?;
        Some((self.values.get_mut(row)?, self.ticks.get_mut(row)?))
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.rows.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn entities(&self) -> Vec<EntityId> {
        self.entities.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{storage::backend_tests, Epoch};

    #[test]
    fn test_dense_backend_behavior() {
        let mut column = DenseColumn::<String>::new();
        backend_tests::exercise(&mut column);
        assert_eq!(column.values().len(), 3);
    }

    #[test]
    fn test_swap_remove_patches_moved_row() {
        // --- 1. ARRANGE ---
        let mut column = DenseColumn::new();
        let ticks = ComponentTicks::new(Epoch(1));
        for id in 1..=3 {
            column.insert(EntityId(id), id * 10, ticks);
        }

        // --- 2. ACT ---
        // The last row (entity 3) moves into row 0.
        assert_eq!(column.remove(EntityId(1)), Some(10));

        // --- 3. ASSERT ---
        assert_eq!(column.values(), &[30, 20]);
        assert_eq!(column.row_entities(), &[EntityId(3), EntityId(2)]);
        assert_eq!(column.get(EntityId(3)), Some(&30));
        assert_eq!(column.get(EntityId(2)), Some(&20));

        // Removing the final row needs no patching.
        assert_eq!(column.remove(EntityId(2)), Some(20));
        assert_eq!(column.get(EntityId(3)), Some(&30));
        assert_eq!(column.len(), 1);
    }
}
