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

use std::marker::PhantomData;

use crate::ecs::{Bitmask, Component, ComponentKey, Entity, EntityId, Epoch, Scene};

// ------------------------- //
// ---- QueryFetch Part ---- //
// ------------------------- //

/// A trait implemented by types that can be requested from a [`CompiledQuery`].
///
/// It is implemented for component references (`&T`), for `EntityId`, and for tuples
/// of other `QueryFetch` types.
pub trait QueryFetch {
    /// The type of item handed to query callbacks (e.g. `(&'a Position, &'a Velocity)`).
    type Item<'a>;

    /// Returns the component types the query requires, in declaration order.
    fn keys() -> Vec<ComponentKey>;

    /// Resolves the item for one entity, or `None` if a requested component is missing.
    fn fetch<'a>(scene: &'a Scene, entity: EntityId) -> Option<Self::Item<'a>>;

    /// Returns true if any requested component of `entity` was written after `since`.
    fn changed_since(scene: &Scene, entity: EntityId, since: Epoch) -> bool;
}

impl<T: Component> QueryFetch for &T {
    type Item<'a> = &'a T;

    fn keys() -> Vec<ComponentKey> {
        vec![ComponentKey::of::<T>()]
    }

    fn fetch<'a>(scene: &'a Scene, entity: EntityId) -> Option<Self::Item<'a>> {
        scene.get::<T>(entity)
    }

    fn changed_since(scene: &Scene, entity: EntityId, since: Epoch) -> bool {
        scene
            .ticks::<T>(entity)
            .is_some_and(|ticks| ticks.is_changed_since(since))
    }
}

// The entity's own id. It is not a component and never counts as changed.
impl QueryFetch for EntityId {
    type Item<'a> = EntityId;

    fn keys() -> Vec<ComponentKey> {
        Vec::new()
    }

    fn fetch<'a>(_scene: &'a Scene, entity: EntityId) -> Option<Self::Item<'a>> {
        Some(entity)
    }

    fn changed_since(_scene: &Scene, _entity: EntityId, _since: Epoch) -> bool {
        false
    }
}

macro_rules! impl_query_tuple {
    ($($Q:ident),*) => {
        impl<$($Q: QueryFetch),*> QueryFetch for ($($Q,)*) {
            type Item<'a> = ($($Q::Item<'a>,)*);

            fn keys() -> Vec<ComponentKey> {
                let mut keys = Vec::new();
                $(keys.extend($Q::keys());)*
                keys
            }

            fn fetch<'a>(scene: &'a Scene, entity: EntityId) -> Option<Self::Item<'a>> {
                Some(($($Q::fetch(scene, entity)?,)*))
            }

            fn changed_since(scene: &Scene, entity: EntityId, since: Epoch) -> bool {
                $($Q::changed_since(scene, entity, since))||*
            }
        }
    };
}

impl_query_tuple!(Q1);
impl_query_tuple!(Q1, Q2);
impl_query_tuple!(Q1, Q2, Q3);
impl_query_tuple!(Q1, Q2, Q3, Q4);
impl_query_tuple!(Q1, Q2, Q3, Q4, Q5);
impl_query_tuple!(Q1, Q2, Q3, Q4, Q5, Q6);
impl_query_tuple!(Q1, Q2, Q3, Q4, Q5, Q6, Q7);
impl_query_tuple!(Q1, Q2, Q3, Q4, Q5, Q6, Q7, Q8);

// -------------------------- //
// ---- QueryEngine Part ---- //
// -------------------------- //

/// Tracks the structural version of a scene.
///
/// The version is bumped whenever an entity is created or destroyed or a component is
/// added or removed. Writes to component values never bump it. A [`CompiledQuery`]
/// compares the version it last matched against with the current one to decide
/// whether its cached entity list is stale.
#[derive(Debug, Default)]
pub struct QueryEngine {
    version: u64,
}

impl QueryEngine {
    /// Creates an engine at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current structural version.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn notify_structural_change(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Returns the ids of every entity whose signature contains `required`, in ascending
    /// id order.
    pub(crate) fn matching<'a>(
        entities: impl Iterator<Item = &'a Entity>,
        required: &Bitmask,
    ) -> Vec<EntityId> {
        entities
            .filter(|entity| entity.mask().is_superset_of(required))
            .map(Entity::id)
            .collect()
    }
}

// ---------------------------- //
// ---- CompiledQuery Part ---- //
// ---------------------------- //

/// A query whose component set and bitmask are resolved once and whose matching
/// entities are cached until the scene's structure changes.
///
/// Obtain one from [`Scene::compile`] and keep it across frames:
///
/// ```rust
/// use tessera_data::ecs::{Component, ComponentRegistry, Scene};
///
/// #[derive(Component)]
/// struct Position(f32);
/// #[derive(Component)]
/// struct Velocity(f32);
///
/// let mut scene = Scene::new(&ComponentRegistry::new());
/// let e = scene.spawn().unwrap();
/// scene.add_component(e, Position(0.0)).unwrap();
/// scene.add_component(e, Velocity(1.5)).unwrap();
///
/// let mut movers = scene.compile::<(&Position, &Velocity)>().unwrap();
/// let mut seen = 0;
/// movers.for_each(&scene, |_, (_pos, vel)| {
///     assert_eq!(vel.0, 1.5);
///     seen += 1;
/// });
/// assert_eq!(seen, 1);
/// ```
pub struct CompiledQuery<Q: QueryFetch> {
    keys: Vec<ComponentKey>,
    mask: Bitmask,
    matches: Vec<EntityId>,
    /// The scene version `matches` was computed against, `None` before the first run.
    seen_version: Option<u64>,
    recomputes: usize,
    _marker: PhantomData<fn() -> Q>,
}

impl<Q: QueryFetch> CompiledQuery<Q> {
    pub(crate) fn new(keys: Vec<ComponentKey>, mask: Bitmask) -> Self {
        Self {
            keys,
            mask,
            matches: Vec::new(),
            seen_version: None,
            recomputes: 0,
            _marker: PhantomData,
        }
    }

    /// Returns the required component types in declaration order.
    pub fn keys(&self) -> &[ComponentKey] {
        &self.keys
    }

    /// Returns the combined mask of the required component types.
    pub fn mask(&self) -> &Bitmask {
        &self.mask
    }

    /// Returns the scene version the cached match list was computed against.
    pub fn version(&self) -> Option<u64> {
        self.seen_version
    }

    /// Returns true if the cached match list no longer reflects `scene`.
    pub fn is_stale(&self, scene: &Scene) -> bool {
        self.seen_version != Some(scene.query_version())
    }

    /// Returns how many times the match list has been recomputed.
    pub fn recompute_count(&self) -> usize {
        self.recomputes
    }

    fn refresh(&mut self, scene: &Scene) {
        if !self.is_stale(scene) {
            return;
        }
        self.matches = scene.matching(&self.mask);
        self.seen_version = Some(scene.query_version());
        self.recomputes += 1;
    }

    /// Returns the ids of all matching entities in ascending order.
    pub fn entities(&mut self, scene: &Scene) -> &[EntityId] {
        self.refresh(scene);
        &self.matches
    }

    /// Calls `f` for every matching entity with its requested components.
    pub fn for_each<'s, F>(&mut self, scene: &'s Scene, mut f: F)
    where
        F: FnMut(EntityId, Q::Item<'s>),
    {
        self.refresh(scene);
        for &id in &self.matches {
            if let Some(item) = Q::fetch(scene, id) {
                f(id, item);
            }
        }
    }

    /// Calls `f` for every matching entity at least one of whose requested components
    /// was written after `since`.
    ///
    /// Each qualifying entity is visited once, with all of its requested components.
    pub fn for_each_changed<'s, F>(&mut self, scene: &'s Scene, since: Epoch, mut f: F)
    where
        F: FnMut(EntityId, Q::Item<'s>),
    {
        self.refresh(scene);
        for &id in &self.matches {
            if !Q::changed_since(scene, id, since) {
                continue;
            }
            if let Some(item) = Q::fetch(scene, id) {
                f(id, item);
            }
        }
    }

    /// Returns the first match in id order.
    pub fn first<'s>(&mut self, scene: &'s Scene) -> Option<(EntityId, Q::Item<'s>)> {
        self.find(scene, |_, _| true)
    }

    /// Returns the first match satisfying `predicate`.
    pub fn find<'s, P>(
        &mut self,
        scene: &'s Scene,
        mut predicate: P,
    ) -> Option<(EntityId, Q::Item<'s>)>
    where
        P: FnMut(EntityId, &Q::Item<'s>) -> bool,
    {
        self.refresh(scene);
        self.matches.iter().find_map(|&id| {
            Q::fetch(scene, id)
                .filter(|item| predicate(id, item))
                .map(|item| (id, item))
        })
    }

    /// Collects every match satisfying `predicate`.
    pub fn filter<'s, P>(&mut self, scene: &'s Scene, mut predicate: P) -> Vec<(EntityId, Q::Item<'s>)>
    where
        P: FnMut(EntityId, &Q::Item<'s>) -> bool,
    {
        let mut out = Vec::new();
        self.for_each(scene, |id, item| {
            if predicate(id, &item) {
                out.push((id, item));
            }
        });
        out
    }

    /// Maps every match through `f`.
    pub fn map<'s, R, F>(&mut self, scene: &'s Scene, mut f: F) -> Vec<R>
    where
        F: FnMut(EntityId, Q::Item<'s>) -> R,
    {
        let mut out = Vec::new();
        self.for_each(scene, |id, item| out.push(f(id, item)));
        out
    }

    /// Collects every match.
    pub fn to_vec<'s>(&mut self, scene: &'s Scene) -> Vec<(EntityId, Q::Item<'s>)> {
        self.map(scene, |id, item| (id, item))
    }

    /// Returns true if any match satisfies `predicate`.
    pub fn any<'s, P>(&mut self, scene: &'s Scene, predicate: P) -> bool
    where
        P: FnMut(EntityId, &Q::Item<'s>) -> bool,
    {
        self.find(scene, predicate).is_some()
    }

    /// Returns true if nothing matches.
    pub fn is_empty(&mut self, scene: &Scene) -> bool {
        self.entities(scene).is_empty()
    }

    /// Returns the number of matching entities.
    pub fn count(&mut self, scene: &Scene) -> usize {
        self.entities(scene).len()
    }
}

impl<Q: QueryFetch> std::fmt::Debug for CompiledQuery<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledQuery")
            .field(
                "components",
                &self.keys.iter().map(|key| key.rust_name).collect::<Vec<_>>(),
            )
            .field("mask", &self.mask)
            .field("matches", &self.matches.len())
            .field("seen_version", &self.seen_version)
            .finish()
    }
}
