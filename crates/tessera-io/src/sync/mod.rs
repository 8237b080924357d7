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

//! Component state synchronization.
//!
//! A synchronized component derives [`Synced`] to get a field table and per-field
//! setters, is registered once with a [`SyncRegistry`], and is then carried by the
//! messages of [`SyncEncoder`] and [`SyncDecoder`]:
//!
//! ```text
//! FULL | DELTA   op:u8, entity count:varint,
//!                  { id:u32, component count:varint,
//!                    { type name:string, field count:varint, { index:u8, value }* }* }*
//! SPAWN          op:u8, id:u32, prefab:string, component count:varint, { component }*
//! DESPAWN        op:u8, id:u32                      (exactly four bytes follow)
//!                op:u8, count:varint, { id:u32 }*   (otherwise)
//! ```

mod component;
mod decoder;
mod encoder;
mod error;
mod field;
mod registry;
mod tracker;

pub use component::SyncComponent;
pub use decoder::{DecodeOutcome, DecodeStats, SyncDecoder};
pub use encoder::SyncEncoder;
pub use error::SyncError;
pub use field::{SyncField, VarintValue, WireType, WireValue};
pub use registry::{SyncEntry, SyncRegistry};
pub use tessera_macros::Synced;
pub use tracker::ChangeTracker;

/// The first byte of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    /// Every synchronized field of the listed entities.
    Full = 0,
    /// Only the fields changed since the previous encode.
    Delta = 1,
    /// One new entity, its prefab type and its full component state.
    Spawn = 2,
    /// One or more removed entities.
    Despawn = 3,
}

impl MessageKind {
    /// Parses an operation byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Full),
            1 => Some(Self::Delta),
            2 => Some(Self::Spawn),
            3 => Some(Self::Despawn),
            _ => None,
        }
    }
}
