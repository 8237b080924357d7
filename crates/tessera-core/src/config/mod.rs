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

//! Runtime configuration.
//!
//! Every section implements `Default`, and every field is optional in the RON source,
//! so a host only spells out what it wants to change:
//!
//! ```rust
//! use tessera_core::config::{StorageKind, TesseraConfig};
//!
//! let config = TesseraConfig::from_ron_str("(storage: (kind: Dense))").unwrap();
//! assert_eq!(config.storage.kind, StorageKind::Dense);
//! assert!(config.scheduler.dependency_sort);
//! ```

use serde::{Deserialize, Serialize};

/// An error raised while loading a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The RON text could not be parsed into a [`TesseraConfig`].
    #[error("Invalid configuration: {0}")]
    Parse(String),
}

/// Selects the backend used for newly created component columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageKind {
    /// A slot pool with a free list; slots are recycled in place.
    #[default]
    Pooled,
    /// Struct-of-arrays dense columns with swap-remove.
    Dense,
}

/// Component registry settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// When set, a type registered under an existing name replaces the old type and
    /// inherits its bit index.
    pub hot_reload: bool,
}

/// Component storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend for new columns.
    pub kind: StorageKind,
    /// Number of slots reserved when a column is created.
    pub initial_capacity: usize,
    /// Registers unknown component types on first insertion instead of failing.
    pub auto_register: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Pooled,
            initial_capacity: 64,
            auto_register: true,
        }
    }
}

/// System scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Orders systems by their stage and before/after/set constraints. When disabled,
    /// systems run in declared update order only.
    pub dependency_sort: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            dependency_sort: true,
        }
    }
}

/// Synchronization codec settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Initial capacity in bytes of every encoder buffer.
    pub initial_buffer_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_buffer_capacity: 256,
        }
    }
}

/// The full runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    /// Component registry settings.
    pub registry: RegistryConfig,
    /// Component storage settings.
    pub storage: StorageConfig,
    /// System scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Synchronization codec settings.
    pub sync: SyncConfig,
}

impl TesseraConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        log::debug!("Loaded configuration: {config:?}");
        Ok(config)
    }

    /// Renders the configuration as pretty RON text.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TesseraConfig::default();
        assert!(!config.registry.hot_reload);
        assert_eq!(config.storage.kind, StorageKind::Pooled);
        assert!(config.storage.auto_register);
        assert!(config.scheduler.dependency_sort);
        assert_eq!(config.sync.initial_buffer_capacity, 256);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config =
            TesseraConfig::from_ron_str("(registry: (hot_reload: true), scheduler: (dependency_sort: false))")
                .unwrap();
        assert!(config.registry.hot_reload);
        assert!(!config.scheduler.dependency_sort);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_round_trip_through_ron() {
        let mut config = TesseraConfig::default();
        config.storage.kind = StorageKind::Dense;
        config.sync.initial_buffer_capacity = 1024;

        let text = config.to_ron_string().unwrap();
        let parsed = TesseraConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        assert!(TesseraConfig::from_ron_str("(storage: (kind: Sideways))").is_err());
    }
}
