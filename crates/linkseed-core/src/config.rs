//! # Configuration File Parser
//!
//! Reads and parses `linkseed.toml`, the optional configuration file that
//! tunes a generation run. Supports:
//!
//! - `[generate]`: default row count, seed, cardinality modes
//! - `[entities.<id>]`: per-entity row count overrides
//! - `[patterns]`: the collection-name table used for cardinality decisions
//! - `[unique]`: unique allocator limits
//!
//! Example `linkseed.toml`:
//!
//! ```toml
//! [generate]
//! rows = 50
//! seed = 42
//! auto_cardinality = true
//! expand_one_to_many = false
//!
//! [entities.user]
//! rows = 200
//!
//! [patterns]
//! collection_suffixes = ["ids", "uuids", "_list"]
//! singular_exceptions = ["ss", "us", "is", "status"]
//!
//! [unique]
//! max_attempts = 500
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::classify::names::NamePatterns;
use crate::error::{LinkSeedError, Result};
use crate::generate::engine::GenerationOptions;
use crate::schema::types::Schema;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "linkseed.toml";

/// Top-level linkseed.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkSeedConfig {
    pub generate: GenerateConfig,
    /// Per-entity overrides, keyed by entity id.
    pub entities: BTreeMap<String, EntityConfig>,
    /// Replaces the built-in name patterns when present.
    pub patterns: Option<NamePatterns>,
    pub unique: UniqueConfig,
}

/// Default generation settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Default number of rows per entity.
    pub rows: Option<usize>,
    /// Fixed random seed for deterministic generation.
    pub seed: Option<u64>,
    /// Skew many-to-one links into 2–3 clusters.
    pub auto_cardinality: Option<bool>,
    /// Replicate "one" rows before spreading one-to-many references.
    pub expand_one_to_many: Option<bool>,
}

/// Per-entity configuration override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntityConfig {
    pub rows: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UniqueConfig {
    /// Suffix attempts before the allocator gives up on a candidate.
    pub max_attempts: Option<usize>,
}

/// Read and parse a linkseed.toml file from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed or is invalid.
pub fn read_config(dir: &Path) -> Result<Option<LinkSeedConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| LinkSeedError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let config: LinkSeedConfig =
        toml::from_str(&content).map_err(|e| LinkSeedError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

    config.validate()?;

    Ok(Some(config))
}

impl LinkSeedConfig {
    /// Build per-entity row overrides from the [entities] section.
    pub fn entity_row_overrides(&self) -> BTreeMap<String, usize> {
        let mut map = BTreeMap::new();
        for (id, ec) in &self.entities {
            if let Some(rows) = ec.rows {
                map.insert(id.clone(), rows);
            }
        }
        map
    }

    /// Validate semantic constraints that serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.generate.rows == Some(0) {
            return Err(config_error(
                "[generate] rows must be greater than 0".to_string(),
            ));
        }

        for (id, ec) in &self.entities {
            if ec.rows == Some(0) {
                return Err(config_error(format!(
                    "[entities.{}] rows must be greater than 0. \
                     Remove the entry to use the default row count.",
                    id
                )));
            }
        }

        if self.unique.max_attempts == Some(0) {
            return Err(config_error(
                "[unique] max_attempts must be greater than 0".to_string(),
            ));
        }

        if let Some(ref patterns) = self.patterns {
            let entries = patterns
                .collection_suffixes
                .iter()
                .map(|e| ("collection_suffixes", e))
                .chain(
                    patterns
                        .singular_exceptions
                        .iter()
                        .map(|e| ("singular_exceptions", e)),
                );
            for (field, entry) in entries {
                if entry.is_empty() {
                    return Err(config_error(format!(
                        "[patterns] {} contains an empty entry",
                        field
                    )));
                }
                if entry.to_lowercase() != *entry {
                    return Err(config_error(format!(
                        "[patterns] {} entry '{}' must be lowercase. \
                         Names are matched in snake_case lowercase form.",
                        field, entry
                    )));
                }
            }
        }

        Ok(())
    }

    /// Report entity overrides that name entities missing from the schema.
    ///
    /// Returns warning messages; stale entries are ignored at generation time.
    pub fn validate_against_schema(&self, schema: &Schema) -> Vec<String> {
        let mut warnings = Vec::new();
        for id in self.entities.keys() {
            if !schema.entities.contains_key(id) {
                tracing::warn!("linkseed.toml: unknown entity '{}' in [entities]", id);
                warnings.push(format!(
                    "linkseed.toml: [entities.{}] references entity '{}' \
                     which does not exist in schema",
                    id, id
                ));
            }
        }
        warnings
    }

    /// Generation options with every configured value applied over the defaults.
    pub fn generation_options(&self) -> GenerationOptions {
        let defaults = GenerationOptions::default();
        GenerationOptions {
            rows: self.generate.rows.unwrap_or(defaults.rows),
            entity_rows: self.entity_row_overrides(),
            seed: self.generate.seed.unwrap_or(defaults.seed),
            auto_cardinality: self
                .generate
                .auto_cardinality
                .unwrap_or(defaults.auto_cardinality),
            expand_one_to_many: self
                .generate
                .expand_one_to_many
                .unwrap_or(defaults.expand_one_to_many),
            patterns: self.patterns.clone().unwrap_or(defaults.patterns),
            max_attempts: self.unique.max_attempts.unwrap_or(defaults.max_attempts),
        }
    }
}

fn config_error(message: String) -> LinkSeedError {
    LinkSeedError::Config { message }
}
