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

//! Error types for the data layer.

use crate::ecs::EntityId;

/// An error raised by a structural ECS operation.
///
/// These are usage errors: the operation that raised one did not change the scene.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The component type has not been registered with the scene's registry.
    #[error("Component type '{type_name}' is not registered")]
    NotRegistered {
        /// The Rust or registration name of the type.
        type_name: String,
    },
    /// The entity already holds a component of this exact type.
    #[error("Entity {entity} already has a '{type_name}' component")]
    DuplicateComponent {
        /// The target entity.
        entity: EntityId,
        /// The registration name of the component type.
        type_name: String,
    },
    /// The entity does not hold a component of this type.
    #[error("Entity {entity} has no '{type_name}' component")]
    MissingComponent {
        /// The target entity.
        entity: EntityId,
        /// The registration name of the component type.
        type_name: String,
    },
    /// The entity does not exist (never created, or already destroyed).
    #[error("Entity {0} does not exist")]
    NoSuchEntity(EntityId),
    /// An explicit entity id was requested but is already taken.
    #[error("Entity id {0} is already in use")]
    EntityIdInUse(EntityId),
    /// Entity id 0 is reserved and can never name an entity.
    #[error("Entity id 0 is reserved")]
    ReservedEntityId,
    /// Every slot index representable in a handle is in use.
    #[error("Entity handle space exhausted")]
    HandleSpaceExhausted,
}
