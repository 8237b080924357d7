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

use std::{any::TypeId, fmt, sync::OnceLock};

use tessera_core::EntityHandle;
use uuid::Uuid;

use crate::ecs::{Bitmask, ComponentRegistry, ComponentTypeId};

/// The scene-local numeric id of an entity.
///
/// Ids start at 1 and are what the network codec writes on the wire. Unlike an
/// [`EntityHandle`], an id carries no generation: the scene never reuses an id while
/// it lives, so an id of a destroyed entity simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Returns the raw id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The record a [`Scene`](crate::ecs::Scene) keeps for every live entity.
///
/// The record describes *which* components an entity has through its bitmask; the
/// component values themselves live in the scene's storage columns.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    handle: EntityHandle,
    guid: Uuid,
    pub(crate) name: Option<String>,
    pub(crate) prefab: Option<String>,
    pub(crate) mask: Bitmask,
    /// The component types in bit order, rebuilt on first use after a structural change.
    component_cache: OnceLock<Vec<TypeId>>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, handle: EntityHandle) -> Self {
        Self {
            id,
            handle,
            guid: Uuid::new_v4(),
            name: None,
            prefab: None,
            mask: Bitmask::new(),
            component_cache: OnceLock::new(),
        }
    }

    /// Returns the scene-local id.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the generational handle of the entity's slot.
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Returns the persistent identifier.
    pub fn guid(&self) -> Uuid {
        self.guid
    }

    /// Replaces the persistent identifier, e.g. with one loaded by the host.
    pub fn set_guid(&mut self, guid: Uuid) {
        self.guid = guid;
    }

    /// Returns the display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the prefab type this entity was spawned from, if any.
    pub fn prefab(&self) -> Option<&str> {
        self.prefab.as_deref()
    }

    /// Returns the component signature.
    pub fn mask(&self) -> &Bitmask {
        &self.mask
    }

    /// Returns true if the component with bit `id` is present.
    pub fn has(&self, id: ComponentTypeId) -> bool {
        self.mask.contains(id.index())
    }

    pub(crate) fn set_bit(&mut self, id: ComponentTypeId) {
        self.mask.set(id.index());
        self.component_cache.take();
    }

    pub(crate) fn clear_bit(&mut self, id: ComponentTypeId) {
        self.mask.clear(id.index());
        self.component_cache.take();
    }

    pub(crate) fn clear_all(&mut self) {
        self.mask.clear_all();
        self.component_cache.take();
    }

    /// Returns the entity's component types in bit order.
    pub(crate) fn component_types(&self, registry: &ComponentRegistry) -> &[TypeId] {
        self.component_cache.get_or_init(|| {
            self.mask
                .iter()
                .filter_map(|bit| registry.type_at(ComponentTypeId::from_index(bit)))
                .collect()
        })
    }
}
