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

use std::{any::TypeId, collections::HashMap, fmt};

use tessera_data::ecs::{ComponentRegistry, EcsError, EntityId, Scene};

use crate::{
    sync::{SyncComponent, SyncError, SyncField},
    wire::{ByteReader, ByteWriter},
};

/// A decoded component value waiting to be written into the scene.
pub(crate) type PendingWrite = Box<dyn FnOnce(&mut Scene, EntityId) -> Result<(), EcsError> + Send>;

/// Type-erased entry points for one synchronized component type.
#[derive(Clone, Copy)]
pub struct SyncEntry {
    name: &'static str,
    type_id: TypeId,
    fields: fn() -> &'static [SyncField],
    is_present: fn(&Scene, EntityId) -> bool,
    has_changes: fn(&Scene, EntityId) -> bool,
    write: fn(&mut Scene, EntityId, bool, &mut ByteWriter) -> bool,
    read: fn(&Scene, EntityId, &mut ByteReader<'_>) -> Result<PendingWrite, SyncError>,
}

impl SyncEntry {
    fn of<T: SyncComponent>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            fields: T::sync_fields,
            is_present: is_present::<T>,
            has_changes: has_changes::<T>,
            write: write_component::<T>,
            read: read_component::<T>,
        }
    }

    /// The name written on the wire.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The Rust type behind the entry.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The component's field table.
    pub fn fields(&self) -> &'static [SyncField] {
        (self.fields)()
    }

    /// Returns true if the entity holds an instance that can be read.
    ///
    /// After a hot reload the entity's bit names the replacement type while older
    /// instances are still stored under the previous one; those are not present.
    pub(crate) fn is_present(&self, scene: &Scene, id: EntityId) -> bool {
        (self.is_present)(scene, id)
    }

    /// Returns true if the entity's instance has a dirty field.
    pub(crate) fn has_changes(&self, scene: &Scene, id: EntityId) -> bool {
        (self.has_changes)(scene, id)
    }

    /// Writes the field count and the field entries, then clears the tracker.
    ///
    /// With `delta` set only dirty fields are written. Returns false if the entity has
    /// no instance.
    pub(crate) fn write(
        &self,
        scene: &mut Scene,
        id: EntityId,
        delta: bool,
        writer: &mut ByteWriter,
    ) -> bool {
        (self.write)(scene, id, delta, writer)
    }

    /// Reads the field count and the field entries into a copy of the current value.
    pub(crate) fn read(
        &self,
        scene: &Scene,
        id: EntityId,
        reader: &mut ByteReader<'_>,
    ) -> Result<PendingWrite, SyncError> {
        (self.read)(scene, id, reader)
    }
}

impl fmt::Debug for SyncEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEntry")
            .field("name", &self.name)
            .field("fields", &self.fields().len())
            .finish()
    }
}

fn is_present<T: SyncComponent>(scene: &Scene, id: EntityId) -> bool {
    scene.get::<T>(id).is_some()
}

fn has_changes<T: SyncComponent>(scene: &Scene, id: EntityId) -> bool {
    scene.get::<T>(id).is_some_and(|component| {
        let tracker = component.tracker();
        T::sync_fields().iter().any(|field| tracker.is_dirty(field.index))
    })
}

fn write_component<T: SyncComponent>(
    scene: &mut Scene,
    id: EntityId,
    delta: bool,
    writer: &mut ByteWriter,
) -> bool {
    // No epoch stamp: clearing the tracker is not a change.
    let Some(component) = scene.get_mut::<T>(id) else {
        return false;
    };

    let tracker = component.tracker();
    let indices: Vec<u8> = T::sync_fields()
        .iter()
        .map(|field| field.index)
        .filter(|&index| !delta || tracker.is_dirty(index))
        .collect();

    writer.write_varint(indices.len() as u64);
    for index in indices {
        writer.write_u8(index);
        component.write_field(index, writer);
    }
    component.tracker_mut().clear();
    true
}

fn read_component<T: SyncComponent>(
    scene: &Scene,
    id: EntityId,
    reader: &mut ByteReader<'_>,
) -> Result<PendingWrite, SyncError> {
    let mut value = scene.get::<T>(id).cloned().unwrap_or_default();
    let count = reader.read_varint()?;
    for _ in 0..count {
        let index = reader.read_u8()?;
        value.read_field(index, reader)?;
    }
    Ok(Box::new(move |scene: &mut Scene, id: EntityId| apply_component(scene, id, value)))
}

fn apply_component<T: SyncComponent>(
    scene: &mut Scene,
    id: EntityId,
    value: T,
) -> Result<(), EcsError> {
    if let Some(slot) = scene.get_mut::<T>(id) {
        *slot = value;
        scene.mark_changed::<T>(id);
        return Ok(());
    }
    scene.register::<T>();
    scene.add_component(id, value)
}

/// The set of component types carried by sync messages.
///
/// Registration is explicit, usually next to the registration of the process-wide
/// default [`ComponentRegistry`] that scenes are created from.
#[derive(Debug, Default, Clone)]
pub struct SyncRegistry {
    entries: HashMap<TypeId, SyncEntry>,
    by_name: HashMap<&'static str, TypeId>,
}

impl SyncRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` for synchronization, and with the component registry.
    ///
    /// Registering the same type twice is a no-op.
    pub fn register<T: SyncComponent>(&mut self, components: &mut ComponentRegistry) {
        components.register::<T>();
        let type_id = TypeId::of::<T>();
        if self.entries.contains_key(&type_id) {
            return;
        }

        let name = components
            .name_of(type_id)
            .unwrap_or_else(std::any::type_name::<T>);
        if T::stable_name().is_none() {
            log::warn!(
                "Synced component '{name}' has no stable name; renaming the type breaks the wire format."
            );
        }
        if let Some(previous) = self.by_name.insert(name, type_id) {
            if previous != type_id {
                log::warn!("Synced component name '{name}' now refers to a different type.");
                self.entries.remove(&previous);
            }
        }

        log::debug!(
            "Registered synced component '{name}' with {} fields.",
            T::sync_fields().len()
        );
        self.entries.insert(type_id, SyncEntry::of::<T>(name));
    }

    /// Returns the entry for a Rust type.
    pub fn entry(&self, type_id: TypeId) -> Option<&SyncEntry> {
        self.entries.get(&type_id)
    }

    /// Resolves a wire name to its entry.
    ///
    /// The name is looked up in `components` first so that a hot-reloaded replacement
    /// type is found, then among the names known to this registry.
    pub fn resolve(&self, components: &ComponentRegistry, name: &str) -> Option<&SyncEntry> {
        components
            .resolve_name(name)
            .and_then(|type_id| self.entries.get(&type_id))
            .or_else(|| {
                self.by_name
                    .get(name)
                    .and_then(|type_id| self.entries.get(type_id))
            })
    }

    /// Returns true if `T` is registered for synchronization.
    pub fn contains<T: SyncComponent>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of synchronized types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
