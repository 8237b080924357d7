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

use tessera_core::{config::StorageKind, TesseraConfig};

use super::*;

// --- DUMMY COMPONENTS FOR TESTING ---

#[derive(Debug, Clone, Copy, PartialEq, Component)]
struct Position(i32);

#[derive(Debug, Clone, Copy, PartialEq, Component)]
struct Velocity(i32);

#[derive(Debug, Clone, Copy, PartialEq, Component)]
struct Frozen;

fn scene_with_movers() -> (Scene, EntityId, EntityId, EntityId) {
    let mut scene = Scene::default();
    let a = scene.spawn_bundle((Position(0), Velocity(1))).unwrap();
    let b = scene.spawn_bundle((Position(10),)).unwrap();
    let c = scene.spawn_bundle((Position(20), Velocity(-1))).unwrap();
    (scene, a, b, c)
}

// --- TESTS ---

#[test]
fn test_spawn_assigns_ids_from_one() {
    let mut scene = Scene::default();
    let first = scene.spawn().unwrap();
    let second = scene.spawn().unwrap();

    assert_eq!(first, EntityId(1));
    assert_eq!(second, EntityId(2));
    assert_eq!(scene.len(), 2);
    assert!(scene.is_alive(scene.entity(first).unwrap().handle()));
}

#[test]
fn test_add_and_remove_component() {
    // --- 1. SETUP ---
    let mut scene = Scene::default();
    let e = scene.spawn().unwrap();

    // --- 2. ACTION ---
    scene.add_component(e, Position(5)).unwrap();

    // --- 3. ASSERTIONS ---
    assert!(scene.has_component::<Position>(e));
    assert_eq!(scene.get::<Position>(e), Some(&Position(5)));
    assert_eq!(scene.component_types(e).map(|types| types.len()), Some(1));

    assert_eq!(scene.remove_component::<Position>(e), Ok(Position(5)));
    assert!(!scene.has_component::<Position>(e));
    assert_eq!(scene.get::<Position>(e), None);
    assert_eq!(scene.component_types(e).map(|types| types.len()), Some(0));
}

#[test]
fn test_duplicate_add_is_rejected() {
    let mut scene = Scene::default();
    let e = scene.spawn().unwrap();
    scene.add_component(e, Position(1)).unwrap();

    let err = scene.add_component(e, Position(2)).unwrap_err();
    assert!(matches!(err, EcsError::DuplicateComponent { entity, .. } if entity == e));
    // The original value is untouched.
    assert_eq!(scene.get::<Position>(e), Some(&Position(1)));
}

#[test]
fn test_structural_errors() {
    let mut scene = Scene::default();
    let e = scene.spawn().unwrap();
    scene.register::<Velocity>();

    assert_eq!(
        scene.add_component(EntityId(99), Position(1)),
        Err(EcsError::NoSuchEntity(EntityId(99)))
    );
    assert!(matches!(
        scene.remove_component::<Velocity>(e),
        Err(EcsError::MissingComponent { .. })
    ));
    assert!(matches!(
        scene.remove_component::<Frozen>(e),
        Err(EcsError::NotRegistered { .. })
    ));
    assert_eq!(
        scene.spawn_with_id(e),
        Err(EcsError::EntityIdInUse(e))
    );
    assert_eq!(
        scene.spawn_with_id(EntityId(0)),
        Err(EcsError::ReservedEntityId)
    );
}

#[test]
fn test_auto_registration_can_be_disabled() {
    let mut config = TesseraConfig::default();
    config.storage.auto_register = false;
    let mut scene = Scene::with_config(&ComponentRegistry::new(), &config);
    let e = scene.spawn().unwrap();

    assert!(matches!(
        scene.add_component(e, Position(1)),
        Err(EcsError::NotRegistered { .. })
    ));

    scene.register::<Position>();
    assert!(scene.add_component(e, Position(1)).is_ok());
}

#[test]
fn test_scene_registry_starts_from_defaults() {
    let mut defaults = ComponentRegistry::new();
    defaults.register::<Velocity>();
    defaults.register::<Position>();

    let mut scene = Scene::new(&defaults);
    assert_eq!(scene.registry().bit_index::<Position>().unwrap().index(), 1);

    // Registering in the scene does not leak back into the defaults.
    scene.register::<Frozen>();
    assert!(!defaults.is_registered::<Frozen>());
}

#[test]
fn test_destroy_releases_everything() {
    // --- 1. SETUP ---
    let mut scene = Scene::default();
    let e = scene.spawn_named("player").unwrap();
    scene.add_component(e, Position(1)).unwrap();
    let handle = scene.entity(e).unwrap().handle();
    let version = scene.query_version();

    // --- 2. ACTION ---
    assert!(scene.destroy(e));

    // --- 3. ASSERTIONS ---
    assert!(!scene.contains(e));
    assert!(!scene.is_alive(handle));
    assert!(scene.entity_by_handle(handle).is_none());
    assert_eq!(scene.find_by_name("player"), None);
    assert_eq!(scene.get::<Position>(e), None);
    assert_eq!(scene.query_version(), version + 1);

    // Idempotent.
    assert!(!scene.destroy(e));
    assert_eq!(scene.query_version(), version + 1);
}

#[test]
fn test_stale_handle_after_slot_reuse() {
    let mut scene = Scene::default();
    let old = scene.spawn().unwrap();
    let old_handle = scene.entity(old).unwrap().handle();
    scene.destroy(old);

    let new = scene.spawn().unwrap();
    let new_handle = scene.entity(new).unwrap().handle();

    assert_ne!(old, new);
    assert_eq!(new_handle.index(), old_handle.index());
    assert_eq!(new_handle.generation(), old_handle.generation() + 1);
    assert!(scene.entity_by_handle(old_handle).is_none());
    assert_eq!(scene.entity_by_handle(new_handle).map(Entity::id), Some(new));
}

#[test]
fn test_names_and_enabled_flag() {
    let mut scene = Scene::default();
    let a = scene.spawn_named("crate").unwrap();
    let b = scene.spawn_named("crate").unwrap();

    assert_eq!(scene.find_by_name("crate"), Some(a));
    scene.set_name(a, "barrel");
    assert_eq!(scene.find_by_name("crate"), Some(b));
    assert_eq!(scene.find_by_name("barrel"), Some(a));
    assert_eq!(scene.entity(a).unwrap().name(), Some("barrel"));

    assert!(scene.is_enabled(a));
    assert!(scene.set_enabled(a, false));
    assert!(!scene.is_enabled(a));
    assert!(!scene.set_enabled(EntityId(42), false));
}

#[test]
fn test_query_membership_follows_masks() {
    let (mut scene, a, b, c) = scene_with_movers();
    let mut movers = scene.compile::<(&Position, &Velocity)>().unwrap();

    assert_eq!(movers.entities(&scene), &[a, c]);

    scene.add_component(b, Velocity(3)).unwrap();
    assert!(movers.is_stale(&scene));
    assert_eq!(movers.entities(&scene), &[a, b, c]);

    scene.remove_component::<Velocity>(a).unwrap();
    assert_eq!(movers.entities(&scene), &[b, c]);
}

#[test]
fn test_query_cache_is_reused_until_structure_changes() {
    let (mut scene, a, _, _) = scene_with_movers();
    let mut query = scene.compile::<(&Position,)>().unwrap();

    query.count(&scene);
    query.count(&scene);
    assert_eq!(query.recompute_count(), 1);

    // Value writes are not structural.
    scene.modify::<Position, _>(a, |p| p.0 += 1);
    query.count(&scene);
    assert_eq!(query.recompute_count(), 1);

    scene.spawn().unwrap();
    query.count(&scene);
    assert_eq!(query.recompute_count(), 2);
}

#[test]
fn test_query_helpers() {
    let (scene, a, b, c) = scene_with_movers();
    let mut positions = scene.compile::<(EntityId, &Position)>().unwrap();

    assert_eq!(positions.count(&scene), 3);
    assert!(!positions.is_empty(&scene));
    assert_eq!(positions.first(&scene).map(|(id, _)| id), Some(a));
    assert_eq!(
        positions.find(&scene, |_, (_, p)| p.0 > 5).map(|(id, _)| id),
        Some(b)
    );
    assert_eq!(
        positions
            .filter(&scene, |_, (_, p)| p.0 >= 10)
            .into_iter()
            .map(|(id, _)| id)
            .collect::<Vec<_>>(),
        vec![b, c]
    );
    assert_eq!(
        positions.map(&scene, |_, (_, p)| p.0),
        vec![0, 10, 20]
    );
    assert_eq!(positions.to_vec(&scene).len(), 3);
    assert!(positions.any(&scene, |id, _| id == c));
    assert!(!positions.any(&scene, |_, (_, p)| p.0 < 0));
}

#[test]
fn test_compile_unregistered_type_fails() {
    let scene = Scene::default();
    assert!(matches!(
        scene.compile::<(&Frozen,)>(),
        Err(EcsError::NotRegistered { .. })
    ));
}

#[test]
fn test_for_each_changed_uses_or_semantics() {
    // --- 1. SETUP ---
    let (mut scene, a, _, c) = scene_with_movers();
    let mut movers = scene.compile::<(&Position, &Velocity)>().unwrap();
    let since = scene.epoch();
    scene.advance_epoch();

    // --- 2. ACTION ---
    // Only one of the two requested components is written.
    scene.modify::<Velocity, _>(c, |v| v.0 = -2);

    // --- 3. ASSERTIONS ---
    let mut visited = Vec::new();
    movers.for_each_changed(&scene, since, |id, (pos, vel)| {
        visited.push((id, pos.0, vel.0));
    });
    assert_eq!(visited, vec![(c, 20, -2)]);
    assert!(!visited.iter().any(|(id, ..)| *id == a));

    // After another tick with no writes nothing is visited.
    let since = scene.epoch();
    scene.advance_epoch();
    let mut count = 0;
    movers.for_each_changed(&scene, since, |_, _| count += 1);
    assert_eq!(count, 0);
}

#[test]
fn test_mark_changed_and_get_mut() {
    let mut scene = Scene::default();
    let e = scene.spawn_bundle((Position(1),)).unwrap();
    let inserted = scene.epoch();
    scene.advance_epoch();

    // A raw write does not stamp the epoch.
    scene.get_mut::<Position>(e).unwrap().0 = 2;
    assert_eq!(scene.ticks::<Position>(e).unwrap().last_write, inserted);

    assert!(scene.mark_changed::<Position>(e));
    let ticks = scene.ticks::<Position>(e).unwrap();
    assert_eq!(ticks.added, inserted);
    assert_eq!(ticks.last_write, scene.epoch());
    assert!(!scene.mark_changed::<Velocity>(e));
}

#[test]
fn test_dense_storage_behaves_like_pooled() {
    let mut config = TesseraConfig::default();
    config.storage.kind = StorageKind::Dense;
    let mut scene = Scene::with_config(&ComponentRegistry::new(), &config);

    let ids: Vec<_> = (0..4)
        .map(|i| scene.spawn_bundle((Position(i),)).unwrap())
        .collect();
    scene.destroy(ids[0]);
    scene.remove_component::<Position>(ids[2]).unwrap();

    assert_eq!(scene.get::<Position>(ids[1]), Some(&Position(1)));
    assert_eq!(scene.get::<Position>(ids[3]), Some(&Position(3)));
    let backend = scene
        .storage()
        .erased(std::any::TypeId::of::<Position>())
        .map(|column| column.backend());
    assert_eq!(backend, Some("dense"));
}

#[test]
fn test_set_storage_refuses_occupied_column() {
    let mut scene = Scene::default();
    assert!(scene.set_storage::<Velocity>(StorageKind::Dense, 8));

    let e = scene.spawn_bundle((Velocity(1),)).unwrap();
    assert!(!scene.set_storage::<Velocity>(StorageKind::Pooled, 8));
    assert_eq!(scene.get::<Velocity>(e), Some(&Velocity(1)));
}

#[test]
fn test_spawn_bundle_rolls_back_on_failure() {
    let mut scene = Scene::default();
    let result = scene.spawn_bundle((Position(1), Position(2)));

    assert!(matches!(result, Err(EcsError::DuplicateComponent { .. })));
    assert!(scene.is_empty());
}

#[test]
fn test_deferred_commands_apply_in_order() {
    // --- 1. SETUP ---
    let (mut scene, a, b, _) = scene_with_movers();

    // --- 2. ACTION ---
    scene.commands().insert(b, Velocity(7));
    scene.commands().destroy(a);
    scene.commands().spawn((Frozen,));
    scene.commands().remove::<Velocity>(b);
    assert_eq!(scene.commands().len(), 4);
    // Nothing is applied before the flush.
    assert!(scene.contains(a));

    scene.flush().unwrap();

    // --- 3. ASSERTIONS ---
    assert!(scene.commands().is_empty());
    assert!(!scene.contains(a));
    assert!(!scene.has_component::<Velocity>(b));
    let mut frozen = scene.compile::<(&Frozen,)>().unwrap();
    assert_eq!(frozen.count(&scene), 1);
}

#[test]
fn test_flush_reports_first_error_and_keeps_going() {
    let (mut scene, a, _, _) = scene_with_movers();
    scene.commands().remove::<Velocity>(EntityId(77));
    scene.commands().insert(a, Frozen);

    assert_eq!(
        scene.flush(),
        Err(EcsError::NoSuchEntity(EntityId(77)))
    );
    assert!(scene.has_component::<Frozen>(a));
}

#[test]
fn test_component_added_callbacks_run_immediately() {
    let mut scene = Scene::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    scene.on_component_added::<Velocity, _>(move |scene, id| {
        let speed = scene.get::<Velocity>(id).map(|v| v.0);
        sink.lock().unwrap().push((id, speed));
    });

    let e = scene.spawn_bundle((Position(0), Velocity(4))).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![(e, Some(4))]);
}

#[test]
fn test_component_added_callbacks_wait_for_batch_end() {
    let mut scene = Scene::default();
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    scene.on_component_added::<Position, _>(move |_, _| *counter.lock().unwrap() += 1);

    scene.begin_batch();
    scene.spawn_bundle((Position(0),)).unwrap();
    scene.spawn_bundle((Position(1),)).unwrap();
    assert_eq!(*count.lock().unwrap(), 0);
    assert_eq!(scene.pending_notifications(), 2);

    scene.end_batch();
    assert_eq!(*count.lock().unwrap(), 2);
    assert!(!scene.is_batching());
}

#[test]
fn test_callbacks_may_add_components() {
    let mut scene = Scene::default();
    scene.on_component_added::<Position, _>(|scene, id| {
        scene.add_component(id, Velocity(0)).unwrap();
    });
    let frozen_on = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&frozen_on);
    scene.on_component_added::<Velocity, _>(move |_, id| sink.lock().unwrap().push(id));

    let e = scene.spawn_bundle((Position(0),)).unwrap();
    assert!(scene.has_component::<Velocity>(e));
    assert_eq!(*frozen_on.lock().unwrap(), vec![e]);
}
