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

//! # Tessera IO
//!
//! Binary synchronization of component state between peers.
//!
//! - [`wire`]: the byte-level primitives: an auto-growing [`ByteWriter`](wire::ByteWriter),
//!   a bounds-checked [`ByteReader`](wire::ByteReader) and LEB128 varints.
//! - [`sync`]: field tables generated by `#[derive(Synced)]`, per-instance change
//!   tracking, and the encoder/decoder for FULL, DELTA, SPAWN and DESPAWN messages.

#![warn(missing_docs)]

// Lets `#[derive(Synced)]` expand to `::tessera_io::...` inside this crate too.
extern crate self as tessera_io;

pub mod sync;
pub mod wire;

pub use sync::{SyncDecoder, SyncEncoder, SyncError, SyncRegistry};
pub use wire::WireError;
