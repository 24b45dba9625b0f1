//! World configuration.
//!
//! Limits and initial capacities of a [`super::World`], loadable from TOML.
//! Every field is optional in the file; missing fields take their defaults.
//! A missing capacity is clamped to its limit, so a file that only lowers a
//! limit stays valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{EcsError, EcsResult};
use super::id::Entity;

/// Default maximum number of live entities.
pub const DEFAULT_MAX_ENTITIES: usize = 1_000_000;

/// Default maximum number of archetype tables, root included.
pub const DEFAULT_MAX_TABLES: usize = 4096;

const DEFAULT_ENTITY_CAPACITY: usize = 1024;
const DEFAULT_TABLE_CAPACITY: usize = 64;

/// Limits and preallocation sizes of a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct WorldConfig {
    /// Maximum number of live entities (default: 1,000,000)
    pub max_entities: usize,
    /// Maximum number of archetype tables, root included (default: 4096)
    pub max_tables: usize,
    /// Rows preallocated in the root table (default: 1024)
    pub initial_entity_capacity: usize,
    /// Table slots preallocated in the archetype arena (default: 64)
    pub initial_table_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: DEFAULT_MAX_ENTITIES,
            max_tables: DEFAULT_MAX_TABLES,
            initial_entity_capacity: DEFAULT_ENTITY_CAPACITY,
            initial_table_capacity: DEFAULT_TABLE_CAPACITY,
        }
    }
}

/// On-disk form of [`WorldConfig`], telling set fields from missing ones.
#[derive(Deserialize)]
struct ConfigFile {
    max_entities: Option<usize>,
    max_tables: Option<usize>,
    initial_entity_capacity: Option<usize>,
    initial_table_capacity: Option<usize>,
}

impl From<ConfigFile> for WorldConfig {
    fn from(file: ConfigFile) -> Self {
        let max_entities = file.max_entities.unwrap_or(DEFAULT_MAX_ENTITIES);
        let max_tables = file.max_tables.unwrap_or(DEFAULT_MAX_TABLES);
        Self {
            max_entities,
            max_tables,
            initial_entity_capacity: file
                .initial_entity_capacity
                .unwrap_or(DEFAULT_ENTITY_CAPACITY.min(max_entities)),
            initial_table_capacity: file
                .initial_table_capacity
                .unwrap_or(DEFAULT_TABLE_CAPACITY.min(max_tables)),
        }
    }
}

impl WorldConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the file cannot be read, is not
    /// valid TOML, or fails [`WorldConfig::validate`].
    pub fn from_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EcsError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the string is not valid TOML or
    /// fails [`WorldConfig::validate`].
    pub fn from_toml(toml_str: &str) -> EcsResult<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| EcsError::InvalidConfig(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if serialization fails.
    pub fn to_toml(&self) -> EcsResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| EcsError::InvalidConfig(format!("failed to serialize config: {e}")))
    }

    /// Checks that the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> EcsResult<()> {
        let max_slots = Entity::MAX_INDEX as usize + 1;
        if self.max_entities == 0 {
            return Err(EcsError::InvalidConfig("max_entities must be positive".into()));
        }
        if self.max_entities > max_slots {
            return Err(EcsError::InvalidConfig(format!(
                "max_entities {} exceeds the identifier space of {max_slots}",
                self.max_entities
            )));
        }
        if self.max_tables == 0 {
            return Err(EcsError::InvalidConfig(
                "max_tables must leave room for the root table".into(),
            ));
        }
        if self.initial_table_capacity > self.max_tables {
            return Err(EcsError::InvalidConfig(format!(
                "initial_table_capacity {} exceeds max_tables {}",
                self.initial_table_capacity, self.max_tables
            )));
        }
        if self.initial_entity_capacity > self.max_entities {
            return Err(EcsError::InvalidConfig(format!(
                "initial_entity_capacity {} exceeds max_entities {}",
                self.initial_entity_capacity, self.max_entities
            )));
        }
        Ok(())
    }
}
