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

use std::sync::{Arc, Mutex};

use tessera_control::{
    FnSystem, Runner, ScheduleError, Stage, System, SystemMeta, SystemScheduler, TickContext,
};
use tessera_core::TesseraConfig;
use tessera_data::ecs::{CompiledQuery, Component, ComponentRegistry, EntityId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Component)]
struct Position(i32);

type Journal = Arc<Mutex<Vec<String>>>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn runner() -> Runner {
    let mut defaults = ComponentRegistry::new();
    defaults.register::<Position>();
    Runner::with_config(&defaults, &TesseraConfig::default())
}

fn recording(name: &str, meta: SystemMeta, journal: &Journal) -> impl System + 'static {
    let journal = Arc::clone(journal);
    let entry = name.to_owned();
    FnSystem::new(name, meta, move |_: &mut Scene, ctx: &TickContext| {
        journal
            .lock()
            .map_err(|_| anyhow::anyhow!("journal poisoned"))?
            .push(format!("{}:{entry}", ctx.tick));
        Ok(())
    })
}

/// Moves the entity once, on the given tick.
fn mover_on_tick(tick: u64, id: EntityId) -> impl System + 'static {
    FnSystem::new(
        "mover",
        SystemMeta::new(),
        move |scene: &mut Scene, ctx: &TickContext| {
            if ctx.tick == tick {
                scene.modify::<Position, _>(id, |p| p.0 += 1);
            }
            Ok(())
        },
    )
}

/// Counts, on every run, the entities whose `Position` changed since its last run.
struct ChangeWatcher {
    meta: SystemMeta,
    query: Option<CompiledQuery<&'static Position>>,
    seen: Arc<Mutex<Vec<usize>>>,
}

impl System for ChangeWatcher {
    fn name(&self) -> &str {
        "watcher"
    }

    fn meta(&self) -> SystemMeta {
        self.meta.clone()
    }

    fn update(&mut self, scene: &mut Scene, ctx: &TickContext) -> anyhow::Result<()> {
        if self.query.is_none() {
            self.query = Some(scene.compile::<&Position>()?);
        }
        let Some(query) = self.query.as_mut() else {
            return Ok(());
        };
        let mut changed = 0;
        query.for_each_changed(scene, ctx.last_run_epoch, |_, _| changed += 1);
        self.seen
            .lock()
            .map_err(|_| anyhow::anyhow!("counter poisoned"))?
            .push(changed);
        Ok(())
    }
}

#[test]
fn test_stages_and_startup_run_in_order() {
    init_logger();
    let journal = Journal::default();
    let mut runner = runner();
    runner.add_system(recording("late", SystemMeta::new().in_stage(Stage::PostUpdate), &journal));
    runner.add_system(recording("main", SystemMeta::new(), &journal));
    runner.add_system(recording("boot", SystemMeta::new().in_stage(Stage::Startup), &journal));
    runner.add_system(recording("early", SystemMeta::new().in_stage(Stage::PreUpdate), &journal));

    runner.run(2).unwrap();

    let journal = journal.lock().unwrap();
    assert_eq!(
        *journal,
        vec!["1:boot", "1:early", "1:main", "1:late", "2:early", "2:main", "2:late"]
    );
    assert_eq!(runner.tick_count(), 2);
}

#[test]
fn test_systems_see_changes_since_their_last_run() {
    let mut runner = runner();
    let id = runner.scene_mut().spawn().unwrap();
    runner.scene_mut().add_component(id, Position(0)).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    runner.add_system(ChangeWatcher {
        meta: SystemMeta::new().run_after("mover"),
        query: None,
        seen: Arc::clone(&seen),
    });
    runner.add_system(mover_on_tick(2, id));

    runner.run(3).unwrap();

    assert_eq!(runner.scheduler().order(), vec!["mover", "watcher"]);
    // The tick-2 write is seen on tick 2 and again on tick 3.
    assert_eq!(*seen.lock().unwrap(), vec![1, 1, 1]);
    assert_eq!(runner.scene().get::<Position>(id), Some(&Position(1)));
}

#[test]
fn test_reader_before_writer_sees_write_on_next_tick() {
    let mut runner = runner();
    let id = runner.scene_mut().spawn().unwrap();
    runner.scene_mut().add_component(id, Position(0)).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    runner.add_system(ChangeWatcher {
        meta: SystemMeta::new().run_before("mover"),
        query: None,
        seen: Arc::clone(&seen),
    });
    runner.add_system(mover_on_tick(2, id));

    runner.run(4).unwrap();

    assert_eq!(runner.scheduler().order(), vec!["watcher", "mover"]);
    assert_eq!(*seen.lock().unwrap(), vec![1, 0, 1, 0]);
}

#[test]
fn test_deferred_commands_flush_at_end_of_tick() {
    let mut runner = runner();
    runner.add_system(FnSystem::new(
        "spawner",
        SystemMeta::new(),
        |scene: &mut Scene, _: &TickContext| {
            scene.commands().spawn((Position(7),));
            Ok(())
        },
    ));

    runner.tick().unwrap();
    runner.tick().unwrap();

    assert_eq!(runner.scene().len(), 2);
    assert!(runner.scene_mut().commands().is_empty());
}

#[test]
fn test_failing_system_aborts_the_tick() {
    let journal = Journal::default();
    let mut runner = runner();
    runner.add_system(FnSystem::new(
        "broken",
        SystemMeta::new().with_order(-1),
        |_: &mut Scene, _: &TickContext| Err(anyhow::anyhow!("out of fuel")),
    ));
    runner.add_system(recording("after", SystemMeta::new(), &journal));

    let result = runner.tick();

    match result {
        Err(ScheduleError::System { name, source }) => {
            assert_eq!(name, "broken");
            assert_eq!(source.to_string(), "out of fuel");
        }
        other => panic!("expected a system error, got {other:?}"),
    }
    assert!(journal.lock().unwrap().is_empty());

    runner.scheduler_mut().set_enabled("broken", false);
    runner.tick().unwrap();
    assert_eq!(*journal.lock().unwrap(), vec!["2:after"]);
}

#[test]
fn test_cycle_stops_the_tick_before_it_starts() {
    let mut scheduler = SystemScheduler::new();
    for (name, next) in [("a", "b"), ("b", "c"), ("c", "a")] {
        scheduler.add_system(Box::new(FnSystem::new(
            name,
            SystemMeta::new().run_before(next),
            |_: &mut Scene, _: &TickContext| Ok(()),
        )));
    }
    let mut runner = Runner::new(Scene::default(), scheduler);
    let epoch = runner.scene().epoch();

    let result = runner.tick();

    assert!(matches!(result, Err(ScheduleError::Cycle { ref nodes, .. }) if nodes.len() == 3));
    assert_eq!(runner.tick_count(), 0);
    assert_eq!(runner.scene().epoch(), epoch);
}

#[test]
fn test_failed_deferred_command_is_reported() {
    let mut runner = runner();
    runner.add_system(FnSystem::new(
        "bad_insert",
        SystemMeta::new(),
        |scene: &mut Scene, _: &TickContext| {
            scene.commands().insert(EntityId(99), Position(1));
            Ok(())
        },
    ));

    assert!(matches!(runner.tick(), Err(ScheduleError::Ecs(_))));
}
