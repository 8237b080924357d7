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

use tessera_data::ecs::{Epoch, Scene};

use crate::scheduler::Stage;

/// What a system is told about the tick it runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    /// The tick number, starting at 1.
    pub tick: u64,
    /// The current epoch.
    pub epoch: Epoch,
    /// The epoch before this system's previous run, or [`Epoch::NEVER`].
    ///
    /// Pass it to `CompiledQuery::for_each_changed` to visit what changed since then.
    /// Every write is reported at least once: writes made in the epoch of the previous
    /// run, including those by systems ordered after this one, are reported again.
    pub last_run_epoch: Epoch,
}

/// Where and in which order a system runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemMeta {
    /// The stage the system runs in.
    pub stage: Stage,
    /// Systems or sets this system must run before.
    pub before: Vec<String>,
    /// Systems or sets this system must run after.
    pub after: Vec<String>,
    /// Sets this system belongs to.
    pub sets: Vec<String>,
    /// Orders systems that are otherwise unconstrained; lower runs first.
    pub update_order: i32,
}

impl SystemMeta {
    /// Metadata for the default `Update` stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places the system in `stage`.
    pub fn in_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Requires the system to run before `name`.
    pub fn run_before(mut self, name: impl Into<String>) -> Self {
        self.before.push(name.into());
        self
    }

    /// Requires the system to run after `name`.
    pub fn run_after(mut self, name: impl Into<String>) -> Self {
        self.after.push(name.into());
        self
    }

    /// Adds the system to the set `name`.
    pub fn in_set(mut self, name: impl Into<String>) -> Self {
        self.sets.push(name.into());
        self
    }

    /// Sets the fallback order.
    pub fn with_order(mut self, update_order: i32) -> Self {
        self.update_order = update_order;
        self
    }

    /// Returns true if the system declares anything beyond an update order.
    pub fn has_constraints(&self) -> bool {
        self.stage != Stage::Update
            || !self.before.is_empty()
            || !self.after.is_empty()
            || !self.sets.is_empty()
    }
}

/// A unit of per-tick logic.
///
/// ## Lifecycle
///
/// ```text
/// add_system  →  [ update(scene, ctx) ]*  →  remove_system
/// ```
///
/// Systems in the [`Stage::Startup`] stage are updated once, on the first tick.
pub trait System: Send {
    /// The unique name other systems refer to in their constraints.
    fn name(&self) -> &str;

    /// The system's stage and constraints. Read once, when the system is added.
    fn meta(&self) -> SystemMeta {
        SystemMeta::default()
    }

    /// Runs the system for one tick.
    fn update(&mut self, scene: &mut Scene, ctx: &TickContext) -> anyhow::Result<()>;
}

/// A [`System`] built from a closure.
///
/// ```
/// use tessera_control::{FnSystem, Stage, SystemMeta};
///
/// let system = FnSystem::new("spawn_wave", SystemMeta::new().in_stage(Stage::PreUpdate), |scene, _| {
///     scene.spawn()?;
///     Ok(())
/// });
/// # let _ = system;
/// ```
pub struct FnSystem<F> {
    name: String,
    meta: SystemMeta,
    func: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut Scene, &TickContext) -> anyhow::Result<()> + Send,
{
    /// Wraps `func` under `name`.
    pub fn new(name: impl Into<String>, meta: SystemMeta, func: F) -> Self {
        Self {
            name: name.into(),
            meta,
            func,
        }
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut Scene, &TickContext) -> anyhow::Result<()> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn meta(&self) -> SystemMeta {
        self.meta.clone()
    }

    fn update(&mut self, scene: &mut Scene, ctx: &TickContext) -> anyhow::Result<()> {
        (self.func)(scene, ctx)
    }
}
