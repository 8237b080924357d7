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

use std::collections::{BTreeMap, HashMap};

use tessera_core::{
    config::SchedulerConfig,
    graph::{topological_sort, CycleError},
};
use tessera_data::ecs::{Epoch, Scene};

use crate::scheduler::{ScheduleError, Stage, System, SystemMeta, TickContext};

/// A registered system and its scheduling state.
struct SystemSlot {
    system: Box<dyn System>,
    name: String,
    meta: SystemMeta,
    enabled: bool,
    last_run: Epoch,
}

/// Orders systems by stage, then by their before/after/set constraints.
///
/// The scheduler is either unsorted or built. Adding or removing a system, calling
/// [`mark_dirty`](Self::mark_dirty), or toggling dependency sorting makes it unsorted;
/// [`build`](Self::build) computes the order again.
///
/// Systems that nothing constrains relative to each other run by ascending
/// `update_order`, then in the order they were added.
pub struct SystemScheduler {
    systems: Vec<SystemSlot>,
    dependency_sort: bool,
    schedule: BTreeMap<Stage, Vec<usize>>,
    built: bool,
}

impl SystemScheduler {
    /// Creates an empty scheduler with dependency sorting enabled.
    pub fn new() -> Self {
        Self::with_config(&SchedulerConfig::default())
    }

    /// Creates an empty scheduler from configuration.
    pub fn with_config(config: &SchedulerConfig) -> Self {
        Self {
            systems: Vec::new(),
            dependency_sort: config.dependency_sort,
            schedule: BTreeMap::new(),
            built: false,
        }
    }

    /// Adds a system. Returns false, leaving the scheduler unchanged, if a system with
    /// the same name is already present.
    pub fn add_system(&mut self, system: Box<dyn System>) -> bool {
        let name = system.name().to_owned();
        if self.position(&name).is_some() {
            log::warn!("System '{name}' is already registered; the duplicate is ignored.");
            return false;
        }

        let meta = system.meta();
        log::debug!("Added system '{name}' to stage {}.", meta.stage);
        self.systems.push(SystemSlot {
            system,
            name,
            meta,
            enabled: true,
            last_run: Epoch::NEVER,
        });
        self.mark_dirty();
        true
    }

    /// Removes and returns a system.
    pub fn remove_system(&mut self, name: &str) -> Option<Box<dyn System>> {
        let position = self.position(name)?;
        self.mark_dirty();
        Some(self.systems.remove(position).system)
    }

    /// Enables or disables a system. Disabled systems keep their place in the order
    /// but are skipped. Returns false if there is no such system.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.position(name) {
            Some(position) => {
                self.systems[position].enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns true if the system exists and is enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.position(name)
            .is_some_and(|position| self.systems[position].enabled)
    }

    /// Returns true if a system with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns the number of systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns true if no system is registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Discards the computed order.
    pub fn mark_dirty(&mut self) {
        self.built = false;
        self.schedule.clear();
    }

    /// Enables or disables constraint-based ordering.
    pub fn set_dependency_sort(&mut self, enabled: bool) {
        if self.dependency_sort != enabled {
            self.dependency_sort = enabled;
            self.mark_dirty();
        }
    }

    /// Returns true if constraint-based ordering is enabled.
    pub fn dependency_sort(&self) -> bool {
        self.dependency_sort
    }

    /// Returns true if the order is up to date.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Computes the execution order. Does nothing if the order is up to date.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::Cycle`] if the constraints of a stage are cyclic. The scheduler
    /// then stays unsorted.
    pub fn build(&mut self) -> Result<(), ScheduleError> {
        if self.built {
            return Ok(());
        }

        let by_order = self.by_update_order(0..self.systems.len());
        let mut schedule = BTreeMap::new();

        if !self.dependency_sort || !self.systems.iter().any(|s| s.meta.has_constraints()) {
            if !by_order.is_empty() {
                schedule.insert(Stage::Update, by_order);
            }
        } else {
            for stage in Stage::ALL {
                let members: Vec<usize> = by_order
                    .iter()
                    .copied()
                    .filter(|&i| self.systems[i].meta.stage == stage)
                    .collect();
                if !members.is_empty() {
                    schedule.insert(stage, self.sort_stage(stage, members)?);
                }
            }
        }

        self.schedule = schedule;
        self.built = true;
        log::debug!("Built system schedule: {:?}", self.order());
        Ok(())
    }

    /// Returns every system name in execution order, stages concatenated.
    ///
    /// Empty until the scheduler is built.
    pub fn order(&self) -> Vec<&str> {
        self.schedule
            .values()
            .flatten()
            .map(|&i| self.systems[i].name.as_str())
            .collect()
    }

    /// Returns the system names of one stage in execution order.
    pub fn stage_order(&self, stage: Stage) -> Vec<&str> {
        self.schedule
            .get(&stage)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| self.systems[i].name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Runs the enabled systems of one stage in schedule order.
    ///
    /// The first failing system aborts the stage.
    pub(crate) fn run_stage(
        &mut self,
        stage: Stage,
        scene: &mut Scene,
        tick: u64,
    ) -> Result<(), ScheduleError> {
        let Self {
            systems, schedule, ..
        } = self;
        let Some(indices) = schedule.get(&stage) else {
            return Ok(());
        };

        for &i in indices {
            let slot = &mut systems[i];
            if !slot.enabled {
                continue;
            }
            let ctx = TickContext {
                tick,
                epoch: scene.epoch(),
                last_run_epoch: slot.last_run,
            };
            log::trace!("Running system '{}' ({stage}).", slot.name);
            slot.system
                .update(scene, &ctx)
                .map_err(|source| ScheduleError::System {
                    name: slot.name.clone(),
                    source,
                })?;
            // The epoch is still open: later systems may write in it after this one
            // ran, so the next run looks at it again.
            slot.last_run = Epoch(ctx.epoch.get().saturating_sub(1));
        }
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.systems.iter().position(|slot| slot.name == name)
    }

    /// Sorts system indices by (update order, insertion order).
    fn by_update_order(&self, indices: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_by_key(|&i| (self.systems[i].meta.update_order, i));
        indices
    }

    /// Orders the members of one stage.
    ///
    /// Graph nodes are local: `0..members.len()` are the systems in update order,
    /// followed by one virtual node per set.
    fn sort_stage(&self, stage: Stage, members: Vec<usize>) -> Result<Vec<usize>, ScheduleError> {
        let system_nodes: HashMap<&str, usize> = members
            .iter()
            .enumerate()
            .map(|(node, &i)| (self.systems[i].name.as_str(), node))
            .collect();

        let mut set_names: Vec<&str> = Vec::new();
        for &i in &members {
            for set in &self.systems[i].meta.sets {
                if !system_nodes.contains_key(set.as_str()) && !set_names.contains(&set.as_str()) {
                    set_names.push(set);
                }
            }
        }
        let set_node = |name: &str| {
            set_names
                .iter()
                .position(|set| *set == name)
                .map(|position| members.len() + position)
        };

        let mut edges: Vec<(usize, usize)> = Vec::new();
        for (node, &i) in members.iter().enumerate() {
            let meta = &self.systems[i].meta;

            for set in &meta.sets {
                if let Some(set) = set_node(set) {
                    edges.push((node, set));
                }
            }
            for target in &meta.before {
                if let Some(&other) = system_nodes.get(target.as_str()) {
                    edges.push((node, other));
                } else if set_node(target).is_some() {
                    // Before a set means before every one of its members.
                    for (member, &j) in members.iter().enumerate() {
                        if self.systems[j].meta.sets.contains(target) {
                            edges.push((node, member));
                        }
                    }
                } else {
                    self.warn_unresolved(stage, &self.systems[i].name, target);
                }
            }
            for source in &meta.after {
                if let Some(&other) = system_nodes.get(source.as_str()) {
                    edges.push((other, node));
                } else if let Some(set) = set_node(source) {
                    edges.push((set, node));
                } else {
                    self.warn_unresolved(stage, &self.systems[i].name, source);
                }
            }
        }

        let node_count = members.len() + set_names.len();
        match topological_sort(0..node_count, edges) {
            Ok(sorted) => {
                let ordered: Vec<usize> = sorted
                    .into_iter()
                    .filter(|&node| node < members.len())
                    .map(|node| members[node])
                    .collect();
                if ordered.len() == members.len() {
                    Ok(ordered)
                } else {
                    log::warn!(
                        "Stage {stage} could not be fully ordered; falling back to update order."
                    );
                    Ok(members)
                }
            }
            Err(CycleError { nodes }) => {
                let nodes: Vec<String> = nodes
                    .into_iter()
                    .map(|node| match members.get(node) {
                        Some(&i) => self.systems[i].name.clone(),
                        None => set_names[node - members.len()].to_owned(),
                    })
                    .collect();
                log::error!("Dependency cycle in stage {stage}: {}", nodes.join(" -> "));
                Err(ScheduleError::Cycle { stage, nodes })
            }
        }
    }

    fn warn_unresolved(&self, stage: Stage, system: &str, reference: &str) {
        match self.position(reference) {
            Some(position) => log::warn!(
                "System '{system}' ({stage}) refers to '{reference}' in stage {}; the constraint is ignored.",
                self.systems[position].meta.stage
            ),
            None => log::warn!(
                "System '{system}' refers to unknown system or set '{reference}'; the constraint is ignored."
            ),
        }
    }
}

impl Default for SystemScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemScheduler")
            .field("systems", &self.systems.iter().map(|s| &s.name).collect::<Vec<_>>())
            .field("dependency_sort", &self.dependency_sort)
            .field("built", &self.built)
            .finish()
    }
}
