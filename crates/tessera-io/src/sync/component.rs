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

use tessera_data::ecs::Component;

use crate::{
    sync::{ChangeTracker, SyncError, SyncField},
    wire::{ByteReader, ByteWriter},
};

/// A component whose fields can be carried by sync messages.
///
/// Implemented by `#[derive(Synced)]`; writing it by hand is possible but the field
/// table, the field accessors and the tracker must agree on indices.
///
/// Decoding clones the current value (or starts from `Default` for a new component),
/// reads the received fields into the copy, and swaps it in once the whole message
/// parsed, which is why both bounds are required.
pub trait SyncComponent: Component + Clone + Default {
    /// The field table, in index order.
    fn sync_fields() -> &'static [SyncField];

    /// Writes the value of field `index`. Returns false if there is no such field.
    fn write_field(&self, index: u8, writer: &mut ByteWriter) -> bool;

    /// Reads a value into field `index`. Does not mark the field dirty.
    fn read_field(&mut self, index: u8, reader: &mut ByteReader<'_>) -> Result<(), SyncError>;

    /// Returns the change tracker.
    fn tracker(&self) -> &ChangeTracker;

    /// Returns the change tracker mutably.
    fn tracker_mut(&mut self) -> &mut ChangeTracker;
}
