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

//! System scheduling and the tick loop of the Tessera runtime.
//!
//! Systems declare a [`Stage`] and optional before/after/set constraints through their
//! [`SystemMeta`]. The [`SystemScheduler`] turns those constraints into one execution
//! order per stage, and the [`Runner`] drives a [`Scene`](tessera_data::Scene)
//! through it one tick at a time.

#![warn(missing_docs)]

pub mod runner;
pub mod scheduler;

pub use runner::Runner;
pub use scheduler::{
    FnSystem, ScheduleError, Stage, System, SystemMeta, SystemScheduler, TickContext,
};
