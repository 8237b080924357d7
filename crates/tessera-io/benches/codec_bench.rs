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
use tessera_data::ecs::{Component, ComponentRegistry, EntityId, Scene};
use tessera_io::{
    sync::{ChangeTracker, Synced},
    SyncDecoder, SyncEncoder, SyncRegistry,
};

#[derive(Debug, Clone, Default, Component, Synced)]
struct Transform {
    #[sync]
    x: f32,
    #[sync]
    y: f32,
    #[sync]
    rotation: f32,
    #[sync(varint)]
    layer: u32,
    #[sync(tracker)]
    tracker: ChangeTracker,
}

fn setup() -> (ComponentRegistry, SyncRegistry, Scene, Vec<EntityId>) {
    let mut defaults = ComponentRegistry::new();
    let mut sync = SyncRegistry::new();
    sync.register::<Transform>(&mut defaults);

    let mut scene = Scene::new(&defaults);
    let ids = (0..1_000)
        .map(|i| {
            let id = scene.spawn().unwrap();
            scene
                .add_component(
                    id,
                    Transform {
                        x: i as f32,
                        layer: i,
                        ..Default::default()
                    },
                )
                .unwrap();
            id
        })
        .collect();
    (defaults, sync, scene, ids)
}

fn codec_benchmark(c: &mut Criterion) {
    let (defaults, sync, mut scene, ids) = setup();
    let encoder = SyncEncoder::new(&sync);

    c.bench_function("encode_full_1000", |b| {
        b.iter(|| black_box(encoder.encode_full(&mut scene, &ids).unwrap()))
    });

    c.bench_function("encode_delta_100_dirty", |b| {
        b.iter(|| {
            for id in ids.iter().step_by(10) {
                if let Some(transform) = scene.get_mut::<Transform>(*id) {
                    transform.set_rotation(1.0);
                }
            }
            black_box(encoder.encode_delta(&mut scene, &ids).unwrap())
        })
    });

    let full = encoder.encode_full(&mut scene, &ids).unwrap();
    let mut client = Scene::new(&defaults);
    let mut decoder = SyncDecoder::new(&sync);
    c.bench_function("decode_full_1000", |b| {
        b.iter(|| black_box(decoder.decode(&mut client, &full).unwrap()))
    });
}

criterion_group!(benches, codec_benchmark);
criterion_main!(benches);
