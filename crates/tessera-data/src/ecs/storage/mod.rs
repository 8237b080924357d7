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

//! Component storage: one column per component type, behind a pluggable backend.

mod dense;
mod pooled;

pub use dense::DenseColumn;
pub use pooled::PooledColumn;

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

use tessera_core::config::{StorageConfig, StorageKind};

use crate::ecs::{Component, ComponentTicks, EntityId};

/// A storage backend holding every instance of one component type.
///
/// Each instance is stored together with its [`ComponentTicks`]. A backend never
/// decides membership on its own: the owning scene consults the entity's bitmask
/// before touching a column.
pub trait ColumnStorage<T>: Send + Sync {
    /// Stores `value` for `entity`, returning the value it replaces, if any.
    fn insert(&mut self, entity: EntityId, value: T, ticks: ComponentTicks) -> Option<T>;

    /// Removes and returns the value stored for `entity`.
    fn remove(&mut self, entity: EntityId) -> Option<T>;

    /// Returns the value stored for `entity`.
    fn get(&self, entity: EntityId) -> Option<&T>;

    /// Returns the value stored for `entity`, mutably.
    fn get_mut(&mut self, entity: EntityId) -> Option<&mut T>;

    /// Returns the change ticks stored for `entity`.
    fn ticks(&self, entity: EntityId) -> Option<&ComponentTicks>;

    /// Returns the change ticks stored for `entity`, mutably.
    fn ticks_mut(&mut self, entity: EntityId) -> Option<&mut ComponentTicks>;

    /// Returns the value and its ticks, both mutably.
    fn get_with_ticks_mut(&mut self, entity: EntityId) -> Option<(&mut T, &mut ComponentTicks)>;

    /// Returns true if a value is stored for `entity`.
    fn contains(&self, entity: EntityId) -> bool;

    /// Returns the number of stored values.
    fn len(&self) -> usize;

    /// Returns true if the column is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entities that have a value stored, in storage order.
    fn entities(&self) -> Vec<EntityId>;
}

/// A type-erased view of a [`Column`], so columns of different types can share one map.
pub trait AnyColumn: Send + Sync {
    /// Casts the trait object to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts the trait object to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Drops the value stored for `entity`. Returns true if one was stored.
    fn remove_entity(&mut self, entity: EntityId) -> bool;

    /// Returns true if a value is stored for `entity`.
    fn contains_entity(&self, entity: EntityId) -> bool;

    /// Returns the change ticks stored for `entity`.
    fn ticks_of(&self, entity: EntityId) -> Option<ComponentTicks>;

    /// Returns the change ticks stored for `entity`, mutably.
    fn ticks_of_mut(&mut self, entity: EntityId) -> Option<&mut ComponentTicks>;

    /// Returns the number of stored values.
    fn len(&self) -> usize;

    /// Returns the name of the backend.
    fn backend(&self) -> &'static str;
}

/// The column of one component type, wrapping whichever backend was chosen for it.
pub struct Column<T: Component> {
    storage: Box<dyn ColumnStorage<T>>,
    backend: &'static str,
}

impl<T: Component> Column<T> {
    /// Creates an empty column with one of the built-in backends.
    pub fn new(kind: StorageKind, capacity: usize) -> Self {
        match kind {
            StorageKind::Pooled => Self::from_storage(
                Box::new(PooledColumn::with_capacity(capacity)),
                "pooled",
            ),
            StorageKind::Dense => {
                Self::from_storage(Box::new(DenseColumn::with_capacity(capacity)), "dense")
            }
        }
    }

    /// Wraps a custom backend.
    pub fn from_storage(storage: Box<dyn ColumnStorage<T>>, backend: &'static str) -> Self {
        Self { storage, backend }
    }

    /// Returns the backend.
    pub fn storage(&self) -> &dyn ColumnStorage<T> {
        self.storage.as_ref()
    }

    /// Returns the backend, mutably.
    pub fn storage_mut(&mut self) -> &mut dyn ColumnStorage<T> {
        self.storage.as_mut()
    }
}

impl<T: Component> AnyColumn for Column<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.storage.remove(entity).is_some()
    }

    fn contains_entity(&self, entity: EntityId) -> bool {
        self.storage.contains(entity)
    }

    fn ticks_of(&self, entity: EntityId) -> Option<ComponentTicks> {
        self.storage.ticks(entity).copied()
    }

    fn ticks_of_mut(&mut self, entity: EntityId) -> Option<&mut ComponentTicks> {
        self.storage.ticks_mut(entity)
    }

    fn len(&self) -> usize {
        self.storage.len()
    }

    fn backend(&self) -> &'static str {
        self.backend
    }
}

/// Owns the columns of every component type of a scene.
pub struct ComponentStorage {
    columns: HashMap<TypeId, Box<dyn AnyColumn>>,
    kind: StorageKind,
    initial_capacity: usize,
}

impl ComponentStorage {
    /// Creates an empty storage whose new columns use the configured backend.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            columns: HashMap::new(),
            kind: config.kind,
            initial_capacity: config.initial_capacity,
        }
    }

    /// Returns the backend used for columns created from now on.
    pub fn default_kind(&self) -> StorageKind {
        self.kind
    }

    /// Installs a column for `T`, replacing (and dropping) any existing one.
    pub fn install<T: Component>(&mut self, column: Column<T>) {
        if self
            .columns
            .insert(TypeId::of::<T>(), Box::new(column))
            .is_some()
        {
            log::warn!(
                "Replaced the storage column of '{}'; its values were dropped.",
                std::any::type_name::<T>()
            );
        }
    }

    /// Returns the typed column of `T`, if one exists.
    pub fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.columns
            .get(&TypeId::of::<T>())
            .and_then(|column| column.as_any().downcast_ref::<Column<T>>())
    }

    /// Returns the typed column of `T` mutably, if one exists.
    pub fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        self.columns
            .get_mut(&TypeId::of::<T>())
            .and_then(|column| column.as_any_mut().downcast_mut::<Column<T>>())
    }

    /// Returns the erased column of a type.
    pub fn erased(&self, type_id: TypeId) -> Option<&dyn AnyColumn> {
        self.columns.get(&type_id).map(|column| column.as_ref())
    }

    /// Returns the erased column of a type mutably.
    pub fn erased_mut(&mut self, type_id: TypeId) -> Option<&mut dyn AnyColumn> {
        match self.columns.get_mut(&type_id) {
            Some(column) => Some(column.as_mut()),
            None => None,
        }
    }

    /// Stores `value` for `entity`, creating the column on first use.
    pub fn insert<T: Component>(
        &mut self,
        entity: EntityId,
        value: T,
        ticks: ComponentTicks,
    ) -> Option<T> {
        if let Some(column) = self.column_mut::<T>() {
            return column.storage_mut().insert(entity, value, ticks);
        }

        let mut column = Column::<T>::new(self.kind, self.initial_capacity);
        column.storage_mut().insert(entity, value, ticks);
        log::trace!(
            "Created {} column for '{}'.",
            column.backend,
            std::any::type_name::<T>()
        );
        self.columns.insert(TypeId::of::<T>(), Box::new(column));
        None
    }

    /// Removes and returns the value of `T` stored for `entity`.
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        self.column_mut::<T>()?.storage_mut().remove(entity)
    }

    /// Returns the value of `T` stored for `entity`.
    pub fn get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.column::<T>()?.storage().get(entity)
    }

    /// Returns the value of `T` stored for `entity`, mutably.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.column_mut::<T>()?.storage_mut().get_mut(entity)
    }

    /// Returns the change ticks of `T` stored for `entity`.
    pub fn ticks<T: Component>(&self, entity: EntityId) -> Option<ComponentTicks> {
        self.column::<T>()?.storage().ticks(entity).copied()
    }

    /// Returns the value of `T` and its ticks for `entity`, both mutably.
    pub fn get_with_ticks_mut<T: Component>(
        &mut self,
        entity: EntityId,
    ) -> Option<(&mut T, &mut ComponentTicks)> {
        self.column_mut::<T>()?
            .storage_mut()
            .get_with_ticks_mut(entity)
    }

    /// Drops every value stored for `entity` across all columns.
    ///
    /// Returns the number of values removed.
    pub fn remove_entity(&mut self, entity: EntityId) -> usize {
        let mut removed = 0;
        for column in self.columns.values_mut() {
            if column.remove_entity(entity) {
                removed += 1;
            }
        }
        removed
    }

    /// Returns the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Shared behavior checks for every backend.
#[cfg(test)]
pub(crate) mod backend_tests {
    use super::*;
    use crate::ecs::Epoch;

    pub(crate) fn exercise(column: &mut dyn ColumnStorage<String>) {
        let ticks = ComponentTicks::new(Epoch(3));
        assert!(column.is_empty());

        assert_eq!(column.insert(EntityId(1), "a".into(), ticks), None);
        assert_eq!(column.insert(EntityId(2), "b".into(), ticks), None);
        assert_eq!(column.insert(EntityId(3), "c".into(), ticks), None);
        assert_eq!(column.len(), 3);

        // Replacing returns the old value and keeps the length.
        assert_eq!(
            column.insert(EntityId(2), "B".into(), ComponentTicks::new(Epoch(4))),
            Some("b".to_string())
        );
        assert_eq!(column.len(), 3);
        assert_eq!(column.ticks(EntityId(2)).map(|t| t.last_write), Some(Epoch(4)));

        // Removing from the middle keeps the other entries addressable.
        assert_eq!(column.remove(EntityId(1)), Some("a".to_string()));
        assert_eq!(column.remove(EntityId(1)), None);
        assert!(!column.contains(EntityId(1)));
        assert_eq!(column.get(EntityId(2)).map(String::as_str), Some("B"));
        assert_eq!(column.get(EntityId(3)).map(String::as_str), Some("c"));

        if let Some(value) = column.get_mut(EntityId(3)) {
            value.push('!');
        }
        if let Some(ticks) = column.ticks_mut(EntityId(3)) {
            ticks.last_write = Epoch(9);
        }
        let (value, ticks) = column.get_with_ticks_mut(EntityId(3)).unwrap();
        assert_eq!(value.as_str(), "c!");
        assert_eq!(ticks.last_write, Epoch(9));
        assert_eq!(ticks.added, Epoch(3));

        // A freed slot is reused.
        column.insert(EntityId(4), "d".into(), ticks_at(5));
        let mut entities = column.entities();
        entities.sort();
        assert_eq!(entities, vec![EntityId(2), EntityId(3), EntityId(4)]);
    }

    fn ticks_at(epoch: u64) -> ComponentTicks {
        ComponentTicks::new(Epoch(epoch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Epoch;

    #[derive(Debug, PartialEq, crate::ecs::Component)]
    struct Health(u32);

    #[derive(Debug, PartialEq, crate::ecs::Component)]
    struct Armor(u32);

    fn storage(kind: StorageKind) -> ComponentStorage {
        ComponentStorage::new(&StorageConfig {
            kind,
            ..StorageConfig::default()
        })
    }

    #[test]
    fn test_columns_are_created_on_first_insert() {
        for kind in [StorageKind::Pooled, StorageKind::Dense] {
            let mut storage = storage(kind);
            assert!(storage.column::<Health>().is_none());

            storage.insert(EntityId(1), Health(10), ComponentTicks::new(Epoch(1)));
            assert_eq!(storage.column_count(), 1);
            assert_eq!(storage.get::<Health>(EntityId(1)), Some(&Health(10)));
            assert!(storage.get::<Armor>(EntityId(1)).is_none());
        }
    }

    #[test]
    fn test_remove_entity_clears_every_column() {
        let mut storage = storage(StorageKind::Pooled);
        let ticks = ComponentTicks::new(Epoch(1));
        storage.insert(EntityId(1), Health(10), ticks);
        storage.insert(EntityId(1), Armor(5), ticks);
        storage.insert(EntityId(2), Armor(7), ticks);

        assert_eq!(storage.remove_entity(EntityId(1)), 2);
        assert!(storage.get::<Health>(EntityId(1)).is_none());
        assert!(storage.get::<Armor>(EntityId(1)).is_none());
        assert_eq!(storage.get::<Armor>(EntityId(2)), Some(&Armor(7)));
    }

    #[test]
    fn test_installed_column_overrides_default_backend() {
        let mut storage = storage(StorageKind::Pooled);
        storage.install(Column::<Health>::new(StorageKind::Dense, 4));
        storage.insert(EntityId(1), Health(1), ComponentTicks::new(Epoch(1)));

        let erased = storage.erased(TypeId::of::<Health>()).unwrap();
        assert_eq!(erased.backend(), "dense");
        assert!(erased.contains_entity(EntityId(1)));
        assert_eq!(
            erased.ticks_of(EntityId(1)).map(|t| t.last_write),
            Some(Epoch(1))
        );
    }
}
