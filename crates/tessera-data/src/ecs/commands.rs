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

//! Deferred structural changes.

use crate::ecs::{Component, ComponentBundle, EcsError, EntityId, Scene};

/// A structural change recorded for later application.
pub type Command = Box<dyn FnOnce(&mut Scene) -> Result<(), EcsError> + Send>;

/// Records spawns, destroys and component insertions or removals while a system pass
/// is running, to be applied in recording order by [`Scene::flush`].
#[derive(Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an arbitrary structural change.
    pub fn push<F>(&mut self, command: F)
    where
        F: FnOnce(&mut Scene) -> Result<(), EcsError> + Send + 'static,
    {
        self.commands.push(Box::new(command));
    }

    /// Records the spawn of a new entity carrying `bundle`.
    pub fn spawn<B: ComponentBundle>(&mut self, bundle: B) {
        self.push(move |scene| scene.spawn_bundle(bundle).map(|_| ()));
    }

    /// Records the destruction of `entity`. Destroying a missing entity is not an error.
    pub fn destroy(&mut self, entity: EntityId) {
        self.push(move |scene| {
            scene.destroy(entity);
            Ok(())
        });
    }

    /// Records the insertion of `component` on `entity`.
    pub fn insert<T: Component>(&mut self, entity: EntityId, component: T) {
        self.push(move |scene| scene.add_component(entity, component));
    }

    /// Records the removal of `T` from `entity`.
    pub fn remove<T: Component>(&mut self, entity: EntityId) {
        self.push(move |scene| scene.remove_component::<T>(entity).map(|_| ()));
    }

    /// Returns the number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("len", &self.commands.len())
            .finish()
    }
}
