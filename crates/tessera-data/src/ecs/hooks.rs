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
    collections::{HashMap, VecDeque},
};

use crate::ecs::{EntityId, Scene};

/// A callback run after a component of a given type is added to an entity.
pub type AddedCallback = Box<dyn FnMut(&mut Scene, EntityId) + Send>;

/// Component-added callbacks and the notifications waiting to be delivered.
///
/// Notifications are delivered in the order the components were added. While a batch
/// is open, or while callbacks are already running, new notifications are queued and
/// delivered once the outermost dispatch finishes.
#[derive(Default)]
pub(crate) struct Hooks {
    callbacks: HashMap<TypeId, Vec<AddedCallback>>,
    pending: VecDeque<(TypeId, EntityId)>,
    batch_depth: u32,
    running: bool,
}

impl Hooks {
    pub(crate) fn register(&mut self, type_id: TypeId, callback: AddedCallback) {
        self.callbacks.entry(type_id).or_default().push(callback);
    }

    /// Queues a notification. Returns true if it should be delivered right away.
    pub(crate) fn notify(&mut self, type_id: TypeId, entity: EntityId) -> bool {
        if !self.callbacks.contains_key(&type_id) && !self.running {
            return false;
        }
        self.pending.push_back((type_id, entity));
        self.batch_depth == 0 && !self.running
    }

    pub(crate) fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Closes one batch level. Returns true when the outermost batch closed.
    pub(crate) fn end_batch(&mut self) -> bool {
        if self.batch_depth == 0 {
            log::warn!("end_batch called without a matching begin_batch.");
            return false;
        }
        self.batch_depth -= 1;
        self.batch_depth == 0
    }

    pub(crate) fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Scene {
    /// Delivers every queued component-added notification.
    ///
    /// Callbacks receive `&mut Scene`. Components they add are queued and delivered in
    /// the same drain, after the notifications already waiting.
    pub(crate) fn run_pending_hooks(&mut self) {
        if self.hooks.running {
            return;
        }
        self.hooks.running = true;

        while let Some((type_id, entity)) = self.hooks.pending.pop_front() {
            if !self.contains(entity) {
                continue;
            }
            let Some(mut callbacks) = self.hooks.callbacks.remove(&type_id) else {
                continue;
            };
            for callback in callbacks.iter_mut() {
                callback(self, entity);
            }
            // Keep callbacks registered while these were running, after the originals.
            if let Some(added) = self.hooks.callbacks.remove(&type_id) {
                callbacks.extend(added);
            }
            self.hooks.callbacks.insert(type_id, callbacks);
        }

        self.hooks.running = false;
    }
}
