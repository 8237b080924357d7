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

use tessera_core::config::SyncConfig;
use tessera_data::ecs::{EntityId, Scene};

use crate::{
    sync::{MessageKind, SyncEntry, SyncError, SyncRegistry},
    wire::ByteWriter,
};

/// Serializes component state into sync messages.
///
/// Every successful encode clears the change trackers of the components it wrote, so
/// the next DELTA only carries what changed afterwards.
#[derive(Debug, Clone, Copy)]
pub struct SyncEncoder<'r> {
    registry: &'r SyncRegistry,
    capacity: usize,
}

impl<'r> SyncEncoder<'r> {
    /// Creates an encoder with the default buffer settings.
    pub fn new(registry: &'r SyncRegistry) -> Self {
        Self::with_config(registry, &SyncConfig::default())
    }

    /// Creates an encoder whose buffers start at the configured capacity.
    pub fn with_config(registry: &'r SyncRegistry, config: &SyncConfig) -> Self {
        Self {
            registry,
            capacity: config.initial_buffer_capacity,
        }
    }

    /// Encodes every synchronized field of the given entities.
    pub fn encode_full(
        &self,
        scene: &mut Scene,
        entities: &[EntityId],
    ) -> Result<Vec<u8>, SyncError> {
        self.encode_snapshot(scene, entities, false)
    }

    /// Encodes only the fields changed since the previous encode.
    ///
    /// Entities without dirty components are left out.
    pub fn encode_delta(
        &self,
        scene: &mut Scene,
        entities: &[EntityId],
    ) -> Result<Vec<u8>, SyncError> {
        self.encode_snapshot(scene, entities, true)
    }

    /// Encodes every entity of the scene that holds a synchronized component.
    pub fn encode_scene_full(&self, scene: &mut Scene) -> Vec<u8> {
        let ids = self.synced_entities(scene);
        self.write_snapshot(scene, &ids, false)
    }

    /// Encodes the changes of every entity of the scene.
    pub fn encode_scene_delta(&self, scene: &mut Scene) -> Vec<u8> {
        let ids = self.synced_entities(scene);
        self.write_snapshot(scene, &ids, true)
    }

    /// Encodes the creation of one entity with its prefab name and full state.
    pub fn encode_spawn(&self, scene: &mut Scene, id: EntityId) -> Result<Vec<u8>, SyncError> {
        let Some(entity) = scene.entity(id) else {
            return Err(SyncError::NoSuchEntity(id));
        };
        let prefab = entity.prefab().unwrap_or_default().to_owned();
        let components = self.components_of(scene, id);

        let mut writer = ByteWriter::with_capacity(self.capacity);
        writer.write_u8(MessageKind::Spawn as u8);
        writer.write_u32(id.0);
        writer.write_string(&prefab);
        writer.write_varint(components.len() as u64);
        for entry in &components {
            writer.write_string(entry.name());
            let written = entry.write(scene, id, false, &mut writer);
            debug_assert!(written, "'{}' of {id} vanished while encoding", entry.name());
        }

        log::trace!("Encoded SPAWN of {id} ({} bytes).", writer.len());
        Ok(writer.finish())
    }

    /// Encodes the removal of entities.
    ///
    /// A single id is written alone so the message is exactly five bytes long.
    pub fn encode_despawn(&self, entities: &[EntityId]) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.capacity.min(5 + 4 * entities.len()));
        writer.write_u8(MessageKind::Despawn as u8);
        if let [id] = entities {
            writer.write_u32(id.0);
        } else {
            writer.write_varint(entities.len() as u64);
            for id in entities {
                writer.write_u32(id.0);
            }
        }
        writer.finish()
    }

    fn encode_snapshot(
        &self,
        scene: &mut Scene,
        entities: &[EntityId],
        delta: bool,
    ) -> Result<Vec<u8>, SyncError> {
        if let Some(&missing) = entities.iter().find(|&&id| !scene.contains(id)) {
            return Err(SyncError::NoSuchEntity(missing));
        }
        Ok(self.write_snapshot(scene, entities, delta))
    }

    fn write_snapshot(&self, scene: &mut Scene, entities: &[EntityId], delta: bool) -> Vec<u8> {
        let plan: Vec<(EntityId, Vec<SyncEntry>)> = entities
            .iter()
            .map(|&id| {
                let mut components = self.components_of(scene, id);
                if delta {
                    components.retain(|entry| entry.has_changes(scene, id));
                }
                (id, components)
            })
            .filter(|(_, components)| !delta || !components.is_empty())
            .collect();

        let kind = if delta {
            MessageKind::Delta
        } else {
            MessageKind::Full
        };
        let mut writer = ByteWriter::with_capacity(self.capacity);
        writer.write_u8(kind as u8);
        writer.write_varint(plan.len() as u64);
        for (id, components) in &plan {
            writer.write_u32(id.0);
            writer.write_varint(components.len() as u64);
            for entry in components {
                writer.write_string(entry.name());
                let written = entry.write(scene, *id, delta, &mut writer);
                debug_assert!(written, "'{}' of {id} vanished while encoding", entry.name());
            }
        }

        log::trace!(
            "Encoded {kind:?} of {} entities ({} bytes).",
            plan.len(),
            writer.len()
        );
        writer.finish()
    }

    /// The entity's readable synchronized components, in bit order.
    ///
    /// Filtering happens before anything is written so that every listed component
    /// is followed by its field entries.
    fn components_of(&self, scene: &Scene, id: EntityId) -> Vec<SyncEntry> {
        scene
            .component_types(id)
            .unwrap_or_default()
            .iter()
            .filter_map(|type_id| self.registry.entry(*type_id).copied())
            .filter(|entry| {
                let present = entry.is_present(scene, id);
                if !present {
                    log::warn!(
                        "Skipped '{}' of {id}: the instance is stored under a replaced type.",
                        entry.name()
                    );
                }
                present
            })
            .collect()
    }

    fn synced_entities(&self, scene: &Scene) -> Vec<EntityId> {
        scene
            .entity_ids()
            .filter(|&id| {
                scene.component_types(id).is_some_and(|types| {
                    types.iter().any(|t| {
                        self.registry
                            .entry(*t)
                            .is_some_and(|entry| entry.is_present(scene, id))
                    })
                })
            })
            .collect()
    }
}
