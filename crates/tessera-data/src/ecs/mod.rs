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

//! Implements Tessera's bitmask-indexed Entity-Component-System.
//!
//! Every component type receives a bit index from the [`ComponentRegistry`], every
//! entity carries a [`Bitmask`] of the components it holds, and component values live
//! in per-type columns owned by the [`Scene`]. Queries are compiled once into a
//! required mask and cache their matching entities until the scene's structure
//! changes. Every write is stamped with the current [`Epoch`] so systems can visit only
//! what changed since they last ran.
//!
//! The primary entry point is the [`Scene`] struct.

mod bitmask;
mod bundle;
mod commands;
mod component;
mod entity;
mod epoch;
mod error;
mod handle_allocator;
mod hooks;
mod query;
mod registry;
mod scene;
pub mod storage;

pub use bitmask::Bitmask;
pub use bundle::ComponentBundle;
pub use commands::{Command, CommandQueue};
pub use component::{Component, ComponentTicks};
pub use entity::{Entity, EntityId};
pub use epoch::{Epoch, EpochManager, MAX_SAFE_EPOCH};
pub use error::EcsError;
pub use handle_allocator::HandleAllocator;
pub use hooks::AddedCallback;
pub use query::{CompiledQuery, QueryEngine, QueryFetch};
pub use registry::{ComponentInfo, ComponentKey, ComponentRegistry, ComponentTypeId};
pub use scene::Scene;
pub use tessera_core::EntityHandle;
pub use tessera_macros::Component;

#[cfg(test)]
mod tests;
