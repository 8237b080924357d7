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

use tessera_data::ecs::EcsError;

use crate::scheduler::Stage;

/// An error raised while building or running a schedule.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The constraints of a stage form a cycle. The schedule stays unbuilt.
    #[error("Dependency cycle in stage {stage}: {}", nodes.join(" -> "))]
    Cycle {
        /// The stage whose graph is cyclic.
        stage: Stage,
        /// The systems and sets forming the cycle, in edge order.
        nodes: Vec<String>,
    },
    /// A system's update returned an error.
    #[error("System '{name}' failed: {source}")]
    System {
        /// The failing system.
        name: String,
        /// What the system reported.
        #[source]
        source: anyhow::Error,
    },
    /// Flushing deferred commands failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),
}
