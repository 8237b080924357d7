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

//! The tick driver.

use tessera_core::TesseraConfig;
use tessera_data::ecs::{ComponentRegistry, Scene};

use crate::scheduler::{ScheduleError, Stage, System, SystemScheduler};

/// Drives a [`Scene`] through a [`SystemScheduler`].
///
/// One tick advances the epoch, builds the schedule if it is stale, runs the
/// [`Stage::Startup`] systems on the first tick only, runs the per-tick stages in
/// order, and finally flushes the scene's deferred commands.
#[derive(Debug)]
pub struct Runner {
    scene: Scene,
    scheduler: SystemScheduler,
    tick: u64,
    started: bool,
}

impl Runner {
    /// Creates a runner around an existing scene and scheduler.
    pub fn new(scene: Scene, scheduler: SystemScheduler) -> Self {
        Self {
            scene,
            scheduler,
            tick: 0,
            started: false,
        }
    }

    /// Creates a runner with a scene seeded from `defaults` and everything configured
    /// from `config`.
    pub fn with_config(defaults: &ComponentRegistry, config: &TesseraConfig) -> Self {
        Self::new(
            Scene::with_config(defaults, config),
            SystemScheduler::with_config(&config.scheduler),
        )
    }

    /// Adds a system to the scheduler.
    pub fn add_system(&mut self, system: impl System + 'static) -> bool {
        self.scheduler.add_system(Box::new(system))
    }

    /// Runs one tick.
    ///
    /// # Errors
    ///
    /// A dependency cycle, the first failing system (the rest of the tick is skipped),
    /// or the first failing deferred command.
    pub fn tick(&mut self) -> Result<(), ScheduleError> {
        self.scheduler.build()?;

        self.tick += 1;
        let epoch = self.scene.advance_epoch();
        log::trace!("Tick {} at epoch {epoch}.", self.tick);

        if !self.started {
            self.started = true;
            self.scheduler
                .run_stage(Stage::Startup, &mut self.scene, self.tick)?;
        }
        for stage in Stage::PER_TICK {
            self.scheduler.run_stage(stage, &mut self.scene, self.tick)?;
        }

        self.scene.flush()?;
        Ok(())
    }

    /// Runs `ticks` ticks, stopping at the first error.
    pub fn run(&mut self, ticks: u64) -> Result<(), ScheduleError> {
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    /// Returns the number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Returns the scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Returns the scene mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Returns the scheduler.
    pub fn scheduler(&self) -> &SystemScheduler {
        &self.scheduler
    }

    /// Returns the scheduler mutably.
    pub fn scheduler_mut(&mut self) -> &mut SystemScheduler {
        &mut self.scheduler
    }

    /// Consumes the runner and returns its scene.
    pub fn into_scene(self) -> Scene {
        self.scene
    }
}
