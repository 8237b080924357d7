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

//! Ordering of systems within fixed stages.

mod error;
mod schedule;
mod stage;
mod system;

pub use error::ScheduleError;
pub use schedule::SystemScheduler;
pub use stage::Stage;
pub use system::{FnSystem, System, SystemMeta, TickContext};
