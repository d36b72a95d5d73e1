//! Alias override repository for per-company dictionaries.
//!
//! Companies can teach the mapper their own header spellings. Overrides are
//! stored as JSON files with the naming convention `{COMPANY_ID}_aliases.json`
//! and layered on top of the built-in dictionary at request time.
//!
//! The repository supports:
//! - Saving a company's overrides
//! - Loading overrides by company
//! - Listing stored overrides
//! - Deleting overrides
//!
//! File names are derived from the company id by upper-casing it and
//! replacing non-alphanumerics with `_`, so distinct ids such as `acme-01`
//! and `acme_01` share a file name. Each file records the exact id that
//! saved it: a company never sees another company's file, and saving over a
//! file owned by a different id is refused.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dictionary::AliasDictionary;

const FILE_SUFFIX: &str = "_aliases.json";

/// Repository for storing and retrieving alias overrides.
#[derive(Debug, Clone)]
pub struct AliasRepository {
    /// Base directory for override files.
    base_dir: PathBuf,
}

/// Metadata about a stored override file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideMetadata {
    /// Company the overrides belong to.
    pub company_id: String,
    /// File path where the overrides are stored.
    pub file_path: PathBuf,
    /// Number of entities touched by the overrides.
    pub entity_count: usize,
    /// Total number of override aliases.
    pub alias_count: usize,
}

/// Override dictionary with repository metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredOverrides {
    /// Company the overrides belong to.
    pub company_id: String,
    /// The override aliases.
    pub aliases: AliasDictionary,
    /// When the overrides were saved.
    pub saved_at: Option<DateTime<Utc>>,
    /// Version of the file format.
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl StoredOverrides {
    pub fn new(company_id: impl Into<String>, aliases: AliasDictionary) -> Self {
        Self {
            company_id: company_id.into(),
            aliases,
            saved_at: Some(Utc::now()),
            version: default_version(),
        }
    }

    fn alias_count(&self) -> usize {
        self.aliases
            .iter()
            .map(|(_, fields)| fields.values().map(Vec::len).sum::<usize>())
            .sum()
    }
}

impl AliasRepository {
    /// Create a repository at the given directory.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).with_context(|| {
            format!(
                "Failed to create alias repository: {}",
                base_dir.display()
            )
        })?;
        Ok(Self { base_dir })
    }

    /// Get the base directory of this repository.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Save a company's overrides, replacing any previous file.
    ///
    /// Fails if the file name is already taken by a different company id. An
    /// unreadable file is overwritten.
    pub fn save(&self, company_id: &str, aliases: &AliasDictionary) -> Result<PathBuf> {
        let path = self.path_for(company_id);
        if let Ok(Some(existing)) = read_stored(&path)
            && !same_company(&existing.company_id, company_id)
        {
            bail!(
                "company id '{company_id}' collides with '{}' stored at {}",
                existing.company_id,
                path.display()
            );
        }
        let stored = StoredOverrides::new(company_id, aliases.clone());
        let json = serde_json::to_string_pretty(&stored)
            .with_context(|| format!("Failed to serialize aliases for {company_id}"))?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write aliases to {}", path.display()))?;
        tracing::info!(company_id, path = %path.display(), "saved alias overrides");
        Ok(path)
    }

    /// Load a company's overrides.
    ///
    /// Returns `None` if the company has none.
    pub fn load(&self, company_id: &str) -> Result<Option<AliasDictionary>> {
        Ok(self.load_stored(company_id)?.map(|s| s.aliases))
    }

    /// Load a company's overrides with metadata.
    ///
    /// A file saved under a different company id that maps to the same file
    /// name is treated as absent.
    pub fn load_stored(&self, company_id: &str) -> Result<Option<StoredOverrides>> {
        let path = self.path_for(company_id);
        match read_stored(&path)? {
            Some(stored) if same_company(&stored.company_id, company_id) => Ok(Some(stored)),
            Some(stored) => {
                tracing::warn!(
                    company_id,
                    owner = %stored.company_id,
                    path = %path.display(),
                    "alias file belongs to another company"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Returns `base` with the company's overrides applied, or `base` itself
    /// when the company has none.
    pub fn resolve(&self, company_id: &str, base: &AliasDictionary) -> Result<AliasDictionary> {
        Ok(match self.load(company_id)? {
            Some(overrides) => base.merged_with(&overrides),
            None => base.clone(),
        })
    }

    /// List all stored overrides, sorted by company.
    ///
    /// Files that fail to parse are skipped.
    pub fn list(&self) -> Result<Vec<OverrideMetadata>> {
        let mut metadata = Vec::new();

        for entry in fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read repository: {}", self.base_dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if !filename.ends_with(FILE_SUFFIX) {
                continue;
            }

            let contents = fs::read_to_string(&path)?;
            match serde_json::from_str::<StoredOverrides>(&contents) {
                Ok(stored) => metadata.push(OverrideMetadata {
                    company_id: stored.company_id.clone(),
                    entity_count: stored.aliases.len(),
                    alias_count: stored.alias_count(),
                    file_path: path,
                }),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable alias file");
                }
            }
        }

        metadata.sort_by(|a, b| a.company_id.cmp(&b.company_id));
        Ok(metadata)
    }

    /// Delete a company's overrides. Returns whether a file was removed.
    pub fn delete(&self, company_id: &str) -> Result<bool> {
        let path = self.path_for(company_id);
        if self.load_stored(company_id)?.is_some() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete aliases: {}", path.display()))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Check if a company has overrides.
    pub fn exists(&self, company_id: &str) -> bool {
        matches!(self.load_stored(company_id), Ok(Some(_)))
    }

    fn path_for(&self, company_id: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}{FILE_SUFFIX}", normalize_id(company_id)))
    }
}

fn read_stored(path: &Path) -> Result<Option<StoredOverrides>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read aliases from {}", path.display()))?;
    let stored = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse aliases from {}", path.display()))?;
    Ok(Some(stored))
}

fn same_company(stored: &str, requested: &str) -> bool {
    stored.trim() == requested.trim()
}

/// Normalize an ID for use in filenames.
fn normalize_id(id: &str) -> String {
    id.trim()
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
