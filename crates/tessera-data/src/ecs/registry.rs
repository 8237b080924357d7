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
    collections::HashMap,
    fmt,
    sync::RwLock,
};

use tessera_core::config::RegistryConfig;

use crate::ecs::{component::registration_name, Bitmask, Component, EcsError};

/// The bit index assigned to a component type by a [`ComponentRegistry`].
///
/// Indices are handed out in increasing order starting at 0 and are never reused while
/// the registry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(u32);

impl ComponentTypeId {
    pub(crate) const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the bit index.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bit {}", self.0)
    }
}

/// Identifies a component type by its `TypeId` and carries its Rust name for errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    /// The Rust type identifier.
    pub type_id: TypeId,
    /// The full Rust type name, used in diagnostics only.
    pub rust_name: &'static str,
}

impl ComponentKey {
    /// Returns the key of `T`.
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            rust_name: std::any::type_name::<T>(),
        }
    }
}

/// Everything the registry knows about one component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    /// The assigned bit index.
    pub id: ComponentTypeId,
    /// The registration name (the stable name when the type declares one).
    pub name: &'static str,
    /// The Rust type identifier.
    pub type_id: TypeId,
    /// Whether `name` was declared by the type rather than derived from its Rust name.
    pub stable: bool,
}

/// Assigns every component type a stable bit index and builds bitmasks from them.
///
/// A registry is a plain value with explicit ownership: the host builds one default
/// registry at startup, registers its component types there, and every
/// [`Scene`](crate::ecs::Scene) starts from a deep copy of it
/// ([`fork`](Self::fork) / [`clone_from_registry`](Self::clone_from_registry)), so all
/// scenes agree on the baseline bit layout.
pub struct ComponentRegistry {
    /// The core map from a component's `TypeId` to its registration record.
    infos: HashMap<TypeId, ComponentInfo>,
    /// Name lookup used by the network codec. Outside hot-reload mode the most recent
    /// registration of a name wins.
    by_name: HashMap<&'static str, TypeId>,
    /// Reverse lookup from a bit index to the type holding it.
    by_index: HashMap<ComponentTypeId, TypeId>,
    next_index: u32,
    hot_reload: bool,
    /// Combined masks keyed by the sorted `(name, index)` list of their types.
    mask_cache: RwLock<HashMap<Vec<(&'static str, u32)>, Bitmask>>,
}

impl ComponentRegistry {
    /// Creates an empty registry with hot reload disabled.
    pub fn new() -> Self {
        Self {
            infos: HashMap::new(),
            by_name: HashMap::new(),
            by_index: HashMap::new(),
            next_index: 0,
            hot_reload: false,
            mask_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an empty registry from its configuration section.
    pub fn with_config(config: &RegistryConfig) -> Self {
        let mut registry = Self::new();
        registry.hot_reload = config.hot_reload;
        registry
    }

    /// Enables or disables hot-reload replacement of same-named types.
    pub fn set_hot_reload(&mut self, enabled: bool) {
        self.hot_reload = enabled;
    }

    /// Returns true if hot-reload mode is enabled.
    pub fn is_hot_reload(&self) -> bool {
        self.hot_reload
    }

    /// Registers `T` and returns its bit index.
    ///
    /// Registering an already known type returns its existing index. In hot-reload mode,
    /// a new type whose name matches an existing registration replaces that
    /// registration and inherits its bit index.
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        let type_id = TypeId::of::<T>();
        if let Some(info) = self.infos.get(&type_id) {
            return info.id;
        }

        let (name, stable) = registration_name::<T>();
        if !stable {
            log::warn!(
                "Component '{}' has no stable name; registering it as '{name}'. \
                 Derive `Component` to pin the name used for synchronization.",
                std::any::type_name::<T>()
            );
        }
        self.insert(type_id, name, stable)
    }

    fn insert(&mut self, type_id: TypeId, name: &'static str, stable: bool) -> ComponentTypeId {
        if let Some(&previous) = self.by_name.get(name) {
            if self.hot_reload {
                if let Some(old) = self.infos.remove(&previous) {
                    log::info!(
                        "Hot reload: component '{name}' replaced; keeping {}.",
                        old.id
                    );
                    self.infos.insert(
                        type_id,
                        ComponentInfo {
                            id: old.id,
                            name,
                            type_id,
                            stable,
                        },
                    );
                    self.by_name.insert(name, type_id);
                    self.by_index.insert(old.id, type_id);
                    self.invalidate_masks();
                    return old.id;
                }
            } else {
                log::warn!(
                    "Component name '{name}' is already taken by another type; \
                     the new type receives its own bit."
                );
            }
        }

        let id = ComponentTypeId(self.next_index);
        self.next_index += 1;
        self.infos.insert(
            type_id,
            ComponentInfo {
                id,
                name,
                type_id,
                stable,
            },
        );
        self.by_name.insert(name, type_id);
        self.by_index.insert(id, type_id);
        log::debug!("Registered component '{name}' at {id}.");
        id
    }

    /// Removes every type registered under `name` and invalidates cached masks.
    ///
    /// The removed bit indices are not recycled. Returns false if nothing was
    /// registered under `name`.
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed: Vec<TypeId> = self
            .infos
            .values()
            .filter(|info| info.name == name)
            .map(|info| info.type_id)
            .collect();
        if removed.is_empty() {
            return false;
        }

        for type_id in removed {
            if let Some(info) = self.infos.remove(&type_id) {
                self.by_index.remove(&info.id);
            }
        }
        self.by_name.remove(name);
        self.invalidate_masks();
        log::debug!("Unregistered component '{name}'.");
        true
    }

    /// Replaces this registry's mappings with a deep copy of `other`'s.
    ///
    /// Every type-to-index mapping and the next-index counter are copied; the hot-reload
    /// flag of `self` is kept.
    pub fn clone_from_registry(&mut self, other: &ComponentRegistry) {
        self.infos = other.infos.clone();
        self.by_name = other.by_name.clone();
        self.by_index = other.by_index.clone();
        self.next_index = other.next_index;
        self.invalidate_masks();
    }

    /// Returns a deep copy of this registry, including the hot-reload flag.
    pub fn fork(&self) -> ComponentRegistry {
        let mut copy = ComponentRegistry::new();
        copy.hot_reload = self.hot_reload;
        copy.clone_from_registry(self);
        copy
    }

    /// Returns true if `T` is registered.
    pub fn is_registered<T: Component>(&self) -> bool {
        self.infos.contains_key(&TypeId::of::<T>())
    }

    /// Returns true if the type identified by `type_id` is registered.
    pub fn is_registered_id(&self, type_id: TypeId) -> bool {
        self.infos.contains_key(&type_id)
    }

    /// Returns the bit index of `T`.
    pub fn bit_index<T: Component>(&self) -> Result<ComponentTypeId, EcsError> {
        self.bit_index_of(ComponentKey::of::<T>())
    }

    /// Returns the bit index of the type identified by `key`.
    pub fn bit_index_of(&self, key: ComponentKey) -> Result<ComponentTypeId, EcsError> {
        self.lookup(key.type_id)
            .ok_or_else(|| EcsError::NotRegistered {
                type_name: key.rust_name.to_string(),
            })
    }

    /// Returns the bit index of a type, if registered.
    pub fn lookup(&self, type_id: TypeId) -> Option<ComponentTypeId> {
        self.infos.get(&type_id).map(|info| info.id)
    }

    /// Returns a mask with only `T`'s bit set.
    pub fn bit_mask<T: Component>(&self) -> Result<Bitmask, EcsError> {
        self.mask_for(&[ComponentKey::of::<T>()])
    }

    /// Returns the OR of the bits of every type in `keys`.
    ///
    /// Masks are cached under the sorted list of the types' names, so repeated requests
    /// for the same set (in any order) reuse one mask.
    pub fn mask_for(&self, keys: &[ComponentKey]) -> Result<Bitmask, EcsError> {
        let mut canonical = Vec::with_capacity(keys.len());
        for key in keys {
            let info = self
                .infos
                .get(&key.type_id)
                .ok_or_else(|| EcsError::NotRegistered {
                    type_name: key.rust_name.to_string(),
                })?;
            canonical.push((info.name, info.id.index()));
        }
        canonical.sort_unstable();
        canonical.dedup();

        if let Ok(cache) = self.mask_cache.read() {
            if let Some(mask) = cache.get(&canonical) {
                return Ok(mask.clone());
            }
        }

        let mask: Bitmask = canonical.iter().map(|(_, index)| *index).collect();
        if let Ok(mut cache) = self.mask_cache.write() {
            cache.insert(canonical, mask.clone());
        }
        Ok(mask)
    }

    /// Returns the registration record of a type.
    pub fn info(&self, type_id: TypeId) -> Option<&ComponentInfo> {
        self.infos.get(&type_id)
    }

    /// Resolves a registration name to the type currently registered under it.
    pub fn resolve_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Returns the registration name of a type.
    pub fn name_of(&self, type_id: TypeId) -> Option<&'static str> {
        self.infos.get(&type_id).map(|info| info.name)
    }

    /// Returns the type holding a bit index.
    pub fn type_at(&self, id: ComponentTypeId) -> Option<TypeId> {
        self.by_index.get(&id).copied()
    }

    /// Returns the index the next new type will receive.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns true if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Iterates over all registrations in bit-index order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        let mut infos: Vec<&ComponentInfo> = self.infos.values().collect();
        infos.sort_by_key(|info| info.id);
        infos.into_iter()
    }

    fn invalidate_masks(&mut self) {
        match self.mask_cache.get_mut() {
            Ok(cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_mask_count(&self) -> usize {
        self.mask_cache.read().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ComponentRegistry {
    fn clone(&self) -> Self {
        self.fork()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.iter().map(|i| (i.name, i.id.index())).collect::<Vec<_>>())
            .field("next_index", &self.next_index)
            .field("hot_reload", &self.hot_reload)
            .finish()
    }
}
