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

use std::{
    any::TypeId,
    collections::{BTreeMap, BTreeSet, HashMap},
};

use tessera_core::{config::StorageKind, EntityHandle, TesseraConfig};

use crate::ecs::{
    hooks::Hooks,
    storage::{Column, ComponentStorage},
    Bitmask, CommandQueue, CompiledQuery, Component, ComponentBundle, ComponentKey,
    ComponentRegistry, ComponentTicks, ComponentTypeId, EcsError, Entity, EntityId, Epoch,
    EpochManager, HandleAllocator, QueryEngine, QueryFetch,
};

/// The container for a set of entities and their components.
///
/// A `Scene` owns everything its entities need: a registry seeded from the host's
/// default registry, the handle allocator, the epoch counter, the component columns
/// and the query engine's structural version. Structural changes (spawning,
/// destroying, adding and removing components) go through the scene so that entity
/// bitmasks and storage never disagree.
pub struct Scene {
    registry: ComponentRegistry,
    auto_register: bool,
    handles: HandleAllocator,
    epochs: EpochManager,
    storage: ComponentStorage,
    queries: QueryEngine,
    /// Live entities in ascending id order.
    entities: BTreeMap<EntityId, Entity>,
    by_handle: HashMap<EntityHandle, EntityId>,
    names: HashMap<String, BTreeSet<EntityId>>,
    next_id: u32,
    commands: CommandQueue,
    pub(crate) hooks: Hooks,
}

impl Scene {
    /// Creates a scene with the default configuration.
    ///
    /// `defaults` is deep-copied, so every scene created from the same default
    /// registry starts with the same bit layout.
    pub fn new(defaults: &ComponentRegistry) -> Self {
        Self::with_config(defaults, &TesseraConfig::default())
    }

    /// Creates a scene from a default registry and a runtime configuration.
    pub fn with_config(defaults: &ComponentRegistry, config: &TesseraConfig) -> Self {
        let mut registry = defaults.fork();
        if config.registry.hot_reload {
            registry.set_hot_reload(true);
        }

        Self {
            registry,
            auto_register: config.storage.auto_register,
            handles: HandleAllocator::with_capacity(config.storage.initial_capacity),
            epochs: EpochManager::new(),
            storage: ComponentStorage::new(&config.storage),
            queries: QueryEngine::new(),
            entities: BTreeMap::new(),
            by_handle: HashMap::new(),
            names: HashMap::new(),
            next_id: 1,
            commands: CommandQueue::new(),
            hooks: Hooks::default(),
        }
    }

    // --- Entities ---

    /// Creates an empty entity and returns its id.
    pub fn spawn(&mut self) -> Result<EntityId, EcsError> {
        let id = EntityId(self.next_id);
        if self.next_id == u32::MAX {
            return Err(EcsError::HandleSpaceExhausted);
        }
        self.insert_entity(id)?;
        Ok(id)
    }

    /// Creates an empty, named entity.
    pub fn spawn_named(&mut self, name: impl Into<String>) -> Result<EntityId, EcsError> {
        let id = self.spawn()?;
        self.set_name(id, name);
        Ok(id)
    }

    /// Creates an empty entity with an explicit id.
    ///
    /// Used when mirroring entities created elsewhere, e.g. by the network decoder.
    pub fn spawn_with_id(&mut self, id: EntityId) -> Result<EntityId, EcsError> {
        if id.0 == 0 {
            return Err(EcsError::ReservedEntityId);
        }
        if self.entities.contains_key(&id) {
            return Err(EcsError::EntityIdInUse(id));
        }
        self.insert_entity(id)?;
        Ok(id)
    }

    /// Creates an entity carrying every component of `bundle`.
    ///
    /// If any component cannot be added, the entity is destroyed again and the error
    /// is returned.
    pub fn spawn_bundle<B: ComponentBundle>(&mut self, bundle: B) -> Result<EntityId, EcsError> {
        let id = self.spawn()?;
        if let Err(e) = bundle.insert_into(self, id) {
            self.destroy(id);
            return Err(e);
        }
        Ok(id)
    }

    fn insert_entity(&mut self, id: EntityId) -> Result<(), EcsError> {
        let handle = self.handles.create()?;
        self.entities.insert(id, Entity::new(id, handle));
        self.by_handle.insert(handle, id);
        if id.0 >= self.next_id {
            self.next_id = id.0.saturating_add(1);
        }
        self.queries.notify_structural_change();
        log::trace!("Spawned entity {id} ({handle}).");
        Ok(())
    }

    /// Destroys an entity and all of its components.
    ///
    /// Returns false, doing nothing, if the entity does not exist.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(mut entity) = self.entities.remove(&id) else {
            return false;
        };

        self.storage.remove_entity(id);
        entity.clear_all();
        self.handles.destroy(entity.handle());
        self.by_handle.remove(&entity.handle());
        if let Some(name) = entity.name.take() {
            self.unindex_name(&name, id);
        }
        self.queries.notify_structural_change();
        log::trace!("Destroyed entity {id}.");
        true
    }

    /// Returns true if the entity exists.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Returns the entity record.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns the entity record by handle, if the handle is still alive.
    pub fn entity_by_handle(&self, handle: EntityHandle) -> Option<&Entity> {
        if !self.handles.is_alive(handle) {
            return None;
        }
        self.by_handle
            .get(&handle)
            .and_then(|id| self.entities.get(id))
    }

    /// Returns true if `handle` refers to a live entity.
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.handles.is_alive(handle)
    }

    /// Enables or disables an entity. Returns false if it does not exist.
    pub fn set_enabled(&mut self, id: EntityId, enabled: bool) -> bool {
        match self.entities.get(&id) {
            Some(entity) => self.handles.set_enabled(entity.handle(), enabled),
            None => false,
        }
    }

    /// Returns true if the entity exists and is enabled.
    pub fn is_enabled(&self, id: EntityId) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|entity| self.handles.is_enabled(entity.handle()))
    }

    /// Sets the display name of an entity. Returns false if it does not exist.
    pub fn set_name(&mut self, id: EntityId, name: impl Into<String>) -> bool {
        let name = name.into();
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        let previous = entity.name.replace(name.clone());
        if let Some(previous) = previous {
            self.unindex_name(&previous, id);
        }
        self.names.entry(name).or_default().insert(id);
        true
    }

    /// Records the prefab type an entity was spawned from.
    pub fn set_prefab(&mut self, id: EntityId, prefab: impl Into<String>) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.prefab = Some(prefab.into());
                true
            }
            None => false,
        }
    }

    fn unindex_name(&mut self, name: &str, id: EntityId) {
        if let Some(ids) = self.names.get_mut(name) {
            ids.remove(&id);
            if ids.is_empty() {
                self.names.remove(name);
            }
        }
    }

    /// Returns the lowest id among the entities named `name`.
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.names
            .get(name)
            .and_then(|ids| ids.iter().next().copied())
    }

    /// Iterates over the ids of all live entities in ascending order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns the number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the scene has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the component types of an entity in bit order.
    pub fn component_types(&self, id: EntityId) -> Option<&[TypeId]> {
        self.entities
            .get(&id)
            .map(|entity| entity.component_types(&self.registry))
    }

    // --- Components ---

    /// Registers `T` with this scene's registry and returns its bit.
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        self.registry.register::<T>()
    }

    fn component_bit<T: Component>(&mut self) -> Result<ComponentTypeId, EcsError> {
        if let Some(bit) = self.registry.lookup(TypeId::of::<T>()) {
            return Ok(bit);
        }
        if self.auto_register {
            return Ok(self.registry.register::<T>());
        }
        Err(EcsError::NotRegistered {
            type_name: std::any::type_name::<T>().to_string(),
        })
    }

    fn type_label<T: Component>(&self) -> String {
        self.registry
            .name_of(TypeId::of::<T>())
            .unwrap_or_else(std::any::type_name::<T>)
            .to_string()
    }

    /// Attaches `component` to an entity.
    ///
    /// The instance is stamped with the current epoch. Fails if the entity does not
    /// exist, already holds a `T`, or `T` is unknown and auto-registration is off.
    pub fn add_component<T: Component>(
        &mut self,
        id: EntityId,
        component: T,
    ) -> Result<(), EcsError> {
        if !self.entities.contains_key(&id) {
            return Err(EcsError::NoSuchEntity(id));
        }
        let bit = self.component_bit::<T>()?;
        let duplicate = self.entities.get(&id).is_some_and(|entity| entity.has(bit));
        if duplicate {
            return Err(EcsError::DuplicateComponent {
                entity: id,
                type_name: self.type_label::<T>(),
            });
        }

        let epoch = self.epochs.current();
        self.storage
            .insert(id, component, ComponentTicks::new(epoch));
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.set_bit(bit);
        }
        self.queries.notify_structural_change();

        if self.hooks.notify(TypeId::of::<T>(), id) {
            self.run_pending_hooks();
        }
        Ok(())
    }

    /// Detaches and returns the `T` of an entity.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Result<T, EcsError> {
        let bit = self
            .registry
            .lookup(TypeId::of::<T>())
            .ok_or_else(|| EcsError::NotRegistered {
                type_name: std::any::type_name::<T>().to_string(),
            })?;
        let present = self
            .entities
            .get(&id)
            .ok_or(EcsError::NoSuchEntity(id))?
            .has(bit);
        let removed = if present {
            self.storage.remove::<T>(id)
        } else {
            None
        };
        let Some(component) = removed else {
            return Err(EcsError::MissingComponent {
                entity: id,
                type_name: self.type_label::<T>(),
            });
        };

        if let Some(entity) = self.entities.get_mut(&id) {
            entity.clear_bit(bit);
        }
        self.queries.notify_structural_change();
        Ok(component)
    }

    /// Returns true if the entity holds a `T`. Only the entity's bitmask is consulted.
    pub fn has_component<T: Component>(&self, id: EntityId) -> bool {
        self.component_present::<T>(id)
    }

    fn component_present<T: Component>(&self, id: EntityId) -> bool {
        let Some(bit) = self.registry.lookup(TypeId::of::<T>()) else {
            return false;
        };
        self.entities
            .get(&id)
            .is_some_and(|entity| entity.has(bit))
    }

    /// Returns the `T` of an entity.
    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        if !self.component_present::<T>(id) {
            return None;
        }
        self.storage.get::<T>(id)
    }

    /// Returns the `T` of an entity mutably.
    ///
    /// The write epoch is left untouched; call [`mark_changed`](Self::mark_changed)
    /// afterwards, or use [`modify`](Self::modify), to make the write visible to
    /// change detection.
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        if !self.component_present::<T>(id) {
            return None;
        }
        self.storage.get_mut::<T>(id)
    }

    /// Returns the change ticks of an entity's `T`.
    pub fn ticks<T: Component>(&self, id: EntityId) -> Option<ComponentTicks> {
        if !self.component_present::<T>(id) {
            return None;
        }
        self.storage.ticks::<T>(id)
    }

    /// Stamps the entity's `T` with the current epoch. Returns false if it has none.
    pub fn mark_changed<T: Component>(&mut self, id: EntityId) -> bool {
        if !self.component_present::<T>(id) {
            return false;
        }
        let epoch = self.epochs.current();
        match self.storage.get_with_ticks_mut::<T>(id) {
            Some((_, ticks)) => {
                ticks.last_write = epoch;
                true
            }
            None => false,
        }
    }

    /// Mutates the entity's `T` through `f` and stamps it with the current epoch.
    pub fn modify<T: Component, R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        if !self.component_present::<T>(id) {
            return None;
        }
        let epoch = self.epochs.current();
        let (value, ticks) = self.storage.get_with_ticks_mut::<T>(id)?;
        ticks.last_write = epoch;
        Some(f(value))
    }

    /// Chooses the storage backend for `T`'s column.
    ///
    /// Returns false, changing nothing, if the column already holds values.
    pub fn set_storage<T: Component>(&mut self, kind: StorageKind, capacity: usize) -> bool {
        self.install_column(Column::<T>::new(kind, capacity))
    }

    /// Installs a column, possibly with a custom backend, for `T`.
    ///
    /// Returns false, changing nothing, if the existing column already holds values.
    pub fn install_column<T: Component>(&mut self, column: Column<T>) -> bool {
        let occupied = self
            .storage
            .erased(TypeId::of::<T>())
            .is_some_and(|existing| existing.len() > 0);
        if occupied {
            log::warn!(
                "Cannot replace the storage of '{}' while it holds values.",
                std::any::type_name::<T>()
            );
            return false;
        }
        self.storage.install(column);
        true
    }

    /// Returns the component storage.
    pub fn storage(&self) -> &ComponentStorage {
        &self.storage
    }

    // --- Queries ---

    /// Compiles a query for the component set of `Q`.
    pub fn compile<Q: QueryFetch>(&self) -> Result<CompiledQuery<Q>, EcsError> {
        let keys = Q::keys();
        let mask = self.registry.mask_for(&keys)?;
        Ok(CompiledQuery::new(keys, mask))
    }

    /// Returns the ids of the entities whose signature contains `required`.
    pub fn matching(&self, required: &Bitmask) -> Vec<EntityId> {
        QueryEngine::matching(self.entities.values(), required)
    }

    /// Returns the structural version compiled queries compare against.
    pub fn query_version(&self) -> u64 {
        self.queries.version()
    }

    /// Returns the query engine.
    pub fn queries(&self) -> &QueryEngine {
        &self.queries
    }

    // --- Epochs and registry ---

    /// Returns the current epoch.
    pub fn epoch(&self) -> Epoch {
        self.epochs.current()
    }

    /// Advances the epoch counter by one tick and returns the new epoch.
    pub fn advance_epoch(&mut self) -> Epoch {
        self.epochs.increment()
    }

    /// Returns the epoch manager.
    pub fn epochs(&self) -> &EpochManager {
        &self.epochs
    }

    /// Returns the epoch manager mutably.
    pub fn epochs_mut(&mut self) -> &mut EpochManager {
        &mut self.epochs
    }

    /// Returns this scene's component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Returns this scene's component registry mutably.
    ///
    /// Compiled queries are marked stale, since registrations may have changed.
    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        self.queries.notify_structural_change();
        &mut self.registry
    }

    /// Returns the bit of a component type, or an error if it is unknown.
    pub fn bit_of(&self, key: ComponentKey) -> Result<ComponentTypeId, EcsError> {
        self.registry.bit_index_of(key)
    }

    // --- Deferred work ---

    /// Returns the queue of deferred structural changes.
    pub fn commands(&mut self) -> &mut CommandQueue {
        &mut self.commands
    }

    /// Applies every deferred command in recording order, then delivers pending
    /// component-added notifications.
    ///
    /// A failing command does not stop the ones after it; the first error is returned
    /// once the queue is drained.
    pub fn flush(&mut self) -> Result<(), EcsError> {
        let mut first_error = None;
        // Commands recorded while flushing are applied in the same flush.
        loop {
            let commands = self.commands.take();
            if commands.is_empty() {
                break;
            }
            log::trace!("Flushing {} deferred commands.", commands.len());
            for command in commands {
                if let Err(e) = command(self) {
                    log::warn!("Deferred command failed: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        self.run_pending_hooks();
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Registers a callback run whenever a `T` is added to an entity.
    pub fn on_component_added<T, F>(&mut self, callback: F)
    where
        T: Component,
        F: FnMut(&mut Scene, EntityId) + Send + 'static,
    {
        self.hooks.register(TypeId::of::<T>(), Box::new(callback));
    }

    /// Opens a batch: component-added callbacks are queued until the matching
    /// [`end_batch`](Self::end_batch) or the next [`flush`](Self::flush).
    pub fn begin_batch(&mut self) {
        self.hooks.begin_batch();
    }

    /// Closes a batch, delivering the queued callbacks when the outermost batch closes.
    pub fn end_batch(&mut self) {
        if self.hooks.end_batch() {
            self.run_pending_hooks();
        }
    }

    /// Returns true while a batch is open.
    pub fn is_batching(&self) -> bool {
        self.hooks.is_batching()
    }

    /// Returns the number of component-added notifications waiting for delivery.
    pub fn pending_notifications(&self) -> usize {
        self.hooks.pending_len()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(&ComponentRegistry::new())
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("entities", &self.entities.len())
            .field("components", &self.registry.len())
            .field("epoch", &self.epochs.current())
            .field("version", &self.queries.version())
            .finish()
    }
}
