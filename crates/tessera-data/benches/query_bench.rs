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

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tessera_core::config::StorageKind;
use tessera_data::ecs::{Component, ComponentRegistry, Scene};

#[derive(Debug, Clone, Copy, Default, Component)]
struct Position(u32);

#[derive(Debug, Clone, Copy, Default, Component)]
struct RenderTag;

fn populated_scene(kind: StorageKind) -> Scene {
    let mut defaults = ComponentRegistry::new();
    defaults.register::<Position>();
    defaults.register::<RenderTag>();

    let mut scene = Scene::new(&defaults);
    scene.set_storage::<Position>(kind, 10_000);

    // Setup 10,000 entities, half of them tagged.
    for i in 0..10_000 {
        if i % 2 == 0 {
            scene.spawn_bundle((Position(i), RenderTag)).unwrap();
        } else {
            scene.spawn_bundle((Position(i),)).unwrap();
        }
    }
    scene
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("ECS Queries");

    for (label, kind) in [("pooled", StorageKind::Pooled), ("dense", StorageKind::Dense)] {
        let scene = populated_scene(kind);
        let mut tagged = scene.compile::<(&Position, &RenderTag)>().unwrap();
        let mut all = scene.compile::<(&Position,)>().unwrap();

        group.bench_function(format!("Cached join ({label})"), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                tagged.for_each(&scene, |_, (pos, _tag)| sum += u64::from(pos.0));
                black_box(sum);
            });
        });

        group.bench_function(format!("Single component ({label})"), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                all.for_each(&scene, |_, (pos,)| sum += u64::from(pos.0));
                black_box(sum);
            });
        });
    }

    group.bench_function("Match recompute after spawn", |b| {
        let mut scene = populated_scene(StorageKind::Pooled);
        let mut tagged = scene.compile::<(&Position, &RenderTag)>().unwrap();
        b.iter(|| {
            let e = scene.spawn().unwrap();
            black_box(tagged.count(&scene));
            scene.destroy(e);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
