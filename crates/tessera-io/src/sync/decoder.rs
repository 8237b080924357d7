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

use std::collections::{BTreeMap, HashSet};

use tessera_data::ecs::{EcsError, EntityId, Scene};

use crate::{
    sync::{registry::PendingWrite, MessageKind, SyncError, SyncRegistry},
    wire::ByteReader,
};

/// What a successfully decoded message did to the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// The message's operation.
    pub kind: MessageKind,
    /// Entities whose components were written.
    pub updated: Vec<EntityId>,
    /// Entities created because they did not exist locally.
    pub spawned: Vec<EntityId>,
    /// Entities destroyed.
    pub despawned: Vec<EntityId>,
}

impl DecodeOutcome {
    fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            updated: Vec::new(),
            spawned: Vec::new(),
            despawned: Vec::new(),
        }
    }
}

/// Counters kept across decoded messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Messages applied.
    pub decoded: u64,
    /// Messages rejected for any reason.
    pub failed: u64,
    /// Occurrences of each unresolvable component type name.
    pub unknown_types: BTreeMap<String, u64>,
}

impl DecodeStats {
    /// Returns the number of rejected messages caused by unknown component types.
    pub fn unknown_type_count(&self) -> u64 {
        self.unknown_types.values().sum()
    }
}

/// One entity's worth of parsed state.
struct EntityUpdate {
    id: EntityId,
    components: Vec<PendingWrite>,
}

/// Applies sync messages to a scene.
///
/// A message is parsed completely before anything is written, so a truncated or
/// otherwise malformed message leaves the scene untouched. Entity id 0 and repeated
/// entities or component types are rejected while parsing: each component entry is
/// decoded on top of the scene's current value, so a repeat would silently drop the
/// fields of the earlier entry. Every message is its own buffer; a failure never
/// affects the next one.
#[derive(Debug)]
pub struct SyncDecoder<'r> {
    registry: &'r SyncRegistry,
    stats: DecodeStats,
}

impl<'r> SyncDecoder<'r> {
    /// Creates a decoder.
    pub fn new(registry: &'r SyncRegistry) -> Self {
        Self {
            registry,
            stats: DecodeStats::default(),
        }
    }

    /// Returns the counters accumulated so far.
    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Decodes one message and applies it to `scene`.
    pub fn decode(&mut self, scene: &mut Scene, bytes: &[u8]) -> Result<DecodeOutcome, SyncError> {
        match self.decode_message(scene, bytes) {
            Ok(outcome) => {
                self.stats.decoded += 1;
                Ok(outcome)
            }
            Err(error) => {
                self.stats.failed += 1;
                if let SyncError::UnknownComponentType(name) = &error {
                    *self.stats.unknown_types.entry(name.clone()).or_default() += 1;
                }
                log::warn!("Dropped sync message of {} bytes: {error}", bytes.len());
                Err(error)
            }
        }
    }

    fn decode_message(&self, scene: &mut Scene, bytes: &[u8]) -> Result<DecodeOutcome, SyncError> {
        let mut reader = ByteReader::new(bytes);
        let op = reader.read_u8()?;
        let kind = MessageKind::from_byte(op).ok_or(SyncError::UnknownOperation(op))?;

        match kind {
            MessageKind::Full | MessageKind::Delta => {
                let count = reader.read_varint()?;
                let mut updates = Vec::new();
                let mut seen = HashSet::new();
                for _ in 0..count {
                    let id = read_entity_id(&mut reader)?;
                    if !seen.insert(id) {
                        return Err(SyncError::DuplicateEntity(id));
                    }
                    updates.push(self.read_entity(scene, id, &mut reader)?);
                }
                finish(&reader)?;
                self.apply(scene, kind, updates, None)
            }
            MessageKind::Spawn => {
                let id = read_entity_id(&mut reader)?;
                let prefab = reader.read_string()?;
                let update = self.read_entity(scene, id, &mut reader)?;
                finish(&reader)?;
                self.apply(scene, kind, vec![update], Some(prefab))
            }
            MessageKind::Despawn => {
                let ids = if reader.remaining() == 4 {
                    vec![EntityId(reader.read_u32()?)]
                } else {
                    let count = reader.read_varint()?;
                    let mut ids = Vec::new();
                    for _ in 0..count {
                        ids.push(EntityId(reader.read_u32()?));
                    }
                    ids
                };
                finish(&reader)?;

                let mut outcome = DecodeOutcome::new(kind);
                outcome.despawned = ids.into_iter().filter(|&id| scene.destroy(id)).collect();
                Ok(outcome)
            }
        }
    }

    /// Reads a component count followed by that many components.
    fn read_entity(
        &self,
        scene: &Scene,
        id: EntityId,
        reader: &mut ByteReader<'_>,
    ) -> Result<EntityUpdate, SyncError> {
        let count = reader.read_varint()?;
        let mut components = Vec::new();
        let mut seen = HashSet::new();
        for _ in 0..count {
            let name = reader.read_string()?;
            let entry = self
                .registry
                .resolve(scene.registry(), &name)
                .ok_or_else(|| SyncError::UnknownComponentType(name.clone()))?;
            if !seen.insert(entry.type_id()) {
                return Err(SyncError::DuplicateComponent {
                    entity: id,
                    component: name,
                });
            }
            components.push(entry.read(scene, id, reader)?);
        }
        Ok(EntityUpdate { id, components })
    }

    fn apply(
        &self,
        scene: &mut Scene,
        kind: MessageKind,
        updates: Vec<EntityUpdate>,
        prefab: Option<String>,
    ) -> Result<DecodeOutcome, SyncError> {
        let mut outcome = DecodeOutcome::new(kind);

        // Component-added callbacks see the whole message applied.
        scene.begin_batch();
        let result = (|| -> Result<(), EcsError> {
            for update in updates {
                if !scene.contains(update.id) {
                    scene.spawn_with_id(update.id)?;
                    outcome.spawned.push(update.id);
                }
                if let Some(prefab) = prefab.as_deref().filter(|p| !p.is_empty()) {
                    scene.set_prefab(update.id, prefab);
                }
                for write in update.components {
                    write(scene, update.id)?;
                }
                outcome.updated.push(update.id);
            }
            Ok(())
        })();
        scene.end_batch();

        result?;
        Ok(outcome)
    }
}

/// Reads an entity id that a message may create locally.
fn read_entity_id(reader: &mut ByteReader<'_>) -> Result<EntityId, SyncError> {
    match reader.read_u32()? {
        0 => Err(SyncError::Ecs(EcsError::ReservedEntityId)),
        raw => Ok(EntityId(raw)),
    }
}

fn finish(reader: &ByteReader<'_>) -> Result<(), SyncError> {
    match reader.remaining() {
        0 => Ok(()),
        extra => Err(SyncError::TrailingBytes(extra)),
    }
}
