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

use tessera_data::ecs::{EcsError, EntityId};

use crate::wire::WireError;

/// An error raised while encoding or decoding a sync message.
///
/// Decode errors are per message: the decoder stays usable for the next one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The message was truncated or held a malformed primitive.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// The first byte is not a known operation.
    #[error("Unknown sync operation {0:#04x}")]
    UnknownOperation(u8),
    /// A component type name does not resolve to a synchronized component.
    #[error("Unknown component type '{0}'")]
    UnknownComponentType(String),
    /// A field index is outside the component's field table.
    #[error("Component '{component}' has no synced field {index}")]
    UnknownField {
        /// The component's registration name.
        component: String,
        /// The offending field index.
        index: u8,
    },
    /// A message lists the same entity twice.
    #[error("Entity {0} appears more than once in the message")]
    DuplicateEntity(EntityId),
    /// An entity lists the same component type twice.
    #[error("Entity {entity} carries component '{component}' more than once")]
    DuplicateComponent {
        /// The entity whose component list repeats a type.
        entity: EntityId,
        /// The repeated wire name.
        component: String,
    },
    /// Bytes were left over after a complete message.
    #[error("{0} trailing bytes after the message")]
    TrailingBytes(usize),
    /// The entity to encode does not exist.
    #[error("Entity {0} does not exist")]
    NoSuchEntity(EntityId),
    /// Applying a decoded message to the scene failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),
}
