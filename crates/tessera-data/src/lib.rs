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

//! # Tessera Data
//!
//! The data layer of the Tessera runtime: component registration and bitmasks,
//! generational entity handles, epoch-stamped component storage, compiled queries,
//! and the [`Scene`](ecs::Scene) host container that ties them together.

#![warn(missing_docs)]

// Lets `#[derive(Component)]` expand to `::tessera_data::...` inside this crate too.
extern crate self as tessera_data;

pub mod ecs;

pub use ecs::{EcsError, Scene};
