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

use crate::ecs::{Component, ComponentKey, EcsError, EntityId, Scene};

/// A collection of components that can be attached to an entity as a single unit.
///
/// Implemented for tuples of up to eight components, like `(Position, Velocity)`.
/// Use a one-element tuple `(Position,)` for a single component.
pub trait ComponentBundle: Send + 'static {
    /// Returns the component types of the bundle in declaration order.
    fn keys() -> Vec<ComponentKey>;

    /// Adds every component of the bundle to `entity`, in declaration order.
    ///
    /// Stops at the first failing insertion; components inserted before it stay.
    fn insert_into(self, scene: &mut Scene, entity: EntityId) -> Result<(), EcsError>;
}

macro_rules! impl_component_bundle {
    ($($C:ident $idx:tt),*) => {
        impl<$($C: Component),*> ComponentBundle for ($($C,)*) {
            fn keys() -> Vec<ComponentKey> {
                vec![$(ComponentKey::of::<$C>()),*]
            }

            fn insert_into(self, scene: &mut Scene, entity: EntityId) -> Result<(), EcsError> {
                $(scene.add_component(entity, self.$idx)?;)*
                Ok(())
            }
        }
    };
}

impl_component_bundle!(C1 0);
impl_component_bundle!(C1 0, C2 1);
impl_component_bundle!(C1 0, C2 1, C3 2);
impl_component_bundle!(C1 0, C2 1, C3 2, C4 3);
impl_component_bundle!(C1 0, C2 1, C3 2, C4 3, C5 4);
impl_component_bundle!(C1 0, C2 1, C3 2, C4 3, C5 4, C6 5);
impl_component_bundle!(C1 0, C2 1, C3 2, C4 3, C5 4, C6 5, C7 6);
impl_component_bundle!(C1 0, C2 1, C3 2, C4 3, C5 4, C6 5, C7 6, C8 7);
