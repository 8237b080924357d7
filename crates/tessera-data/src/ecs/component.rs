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

use crate::ecs::Epoch;

/// A marker trait for types that can be used as components in the ECS.
///
/// This trait must be implemented for any struct you wish to attach to an entity.
/// The `'static` lifetime ensures that the component type does not contain any
/// non-static references, and `Send + Sync` are required to allow the component
/// data to be safely accessed from multiple threads.
///
/// Prefer `#[derive(Component)]`, which also pins the type's [`stable_name`]. The name
/// is what the registry and the network codec use to identify the type, so it must not
/// depend on module paths or compiler output.
///
/// [`stable_name`]: Component::stable_name
pub trait Component: 'static + Send + Sync {
    /// The registration name of this type, if it declares one.
    ///
    /// Types returning `None` are registered under their short Rust type name and a
    /// warning is logged, since that name can drift between builds.
    fn stable_name() -> Option<&'static str>
    where
        Self: Sized,
    {
        None
    }
}

/// Change-detection bookkeeping stored next to every component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentTicks {
    /// The epoch at which the component was inserted.
    pub added: Epoch,
    /// The epoch of the most recent write, or [`Epoch::NEVER`].
    pub last_write: Epoch,
}

impl ComponentTicks {
    /// Ticks for a component inserted (and therefore written) at `epoch`.
    pub fn new(epoch: Epoch) -> Self {
        Self {
            added: epoch,
            last_write: epoch,
        }
    }

    /// Returns true if the component was written after `since`.
    pub fn is_changed_since(&self, since: Epoch) -> bool {
        self.last_write.is_newer_than(since)
    }
}

/// Returns the name a component is registered under.
pub(crate) fn registration_name<T: Component>() -> (&'static str, bool) {
    match T::stable_name() {
        Some(name) => (name, true),
        None => {
            let full = std::any::type_name::<T>();
            // Strip the module path but keep generic arguments intact.
            let head = full.split('<').next().unwrap_or(full);
            let short_start = head.rfind("::").map_or(0, |i| i + 2);
            (&full[short_start..], false)
        }
    }
}
