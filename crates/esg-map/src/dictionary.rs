//! Alias dictionary: target entity → field → known header spellings.
//!
//! The built-in dictionary is embedded at compile time using `include_str!()`
//! and parsed once by [`AliasDictionary::builtin`]. Dictionaries are plain
//! values; callers share them behind an `Arc` and layer company overrides on
//! top with [`AliasDictionary::merged_with`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DictionaryError;

/// Built-in alias data for the supported import entities.
pub const BUILTIN_ALIASES: &str = include_str!("../data/aliases.json");

/// Field name → ordered alias list for a single entity.
pub type EntityAliases = BTreeMap<String, Vec<String>>;

/// Immutable alias dictionary for all target entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasDictionary {
    entities: BTreeMap<String, EntityAliases>,
}

impl AliasDictionary {
    /// Creates a dictionary from already-built entity tables.
    pub fn new(entities: BTreeMap<String, EntityAliases>) -> Self {
        Self { entities }
    }

    /// Returns the dictionary shipped with the binary.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded data is not valid JSON, which is covered by
    /// the unit tests.
    pub fn builtin() -> Result<Self, DictionaryError> {
        Self::from_json(BUILTIN_ALIASES)
    }

    /// Parses a dictionary from JSON of the form `{entity: {field: [alias]}}`.
    pub fn from_json(json: &str) -> Result<Self, DictionaryError> {
        let dictionary: Self = serde_json::from_str(json)?;
        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Loads a dictionary from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, DictionaryError> {
        let contents = fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    fn validate(&self) -> Result<(), DictionaryError> {
        for (entity, fields) in &self.entities {
            if entity.trim().is_empty() {
                return Err(DictionaryError::Invalid("empty entity name".to_string()));
            }
            if fields.keys().any(|f| f.trim().is_empty()) {
                return Err(DictionaryError::Invalid(format!(
                    "entity '{entity}' has an empty field name"
                )));
            }
        }
        Ok(())
    }

    /// Returns the field table for an entity, if it is known.
    pub fn entity(&self, name: &str) -> Option<&EntityAliases> {
        self.entities.get(name)
    }

    /// Returns the field names of an entity in dictionary order.
    ///
    /// Unknown entities have no fields.
    pub fn field_names(&self, entity: &str) -> Vec<String> {
        self.entity(entity)
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Iterates over entity names in dictionary order.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Iterates over `(entity, fields)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityAliases)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns a new dictionary with `overrides` layered on top of `self`.
    ///
    /// Override aliases are appended after the existing aliases of a field,
    /// skipping exact duplicates. Entities and fields that only exist in the
    /// overrides are added as they are.
    #[must_use]
    pub fn merged_with(&self, overrides: &AliasDictionary) -> AliasDictionary {
        let mut merged = self.entities.clone();
        for (entity, fields) in &overrides.entities {
            let target = merged.entry(entity.clone()).or_default();
            for (field, aliases) in fields {
                let existing = target.entry(field.clone()).or_default();
                for alias in aliases {
                    if !existing.contains(alias) {
                        existing.push(alias.clone());
                    }
                }
            }
        }
        AliasDictionary { entities: merged }
    }
}
