use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use litscope_core::write_atomic;

use crate::error::{Result, ScienceError};
use crate::sources::CitationInfo;

/// On-disk citation lookup cache keyed by identifier display string
/// (`DOI:10.1/x`).
///
/// A `None` value records a confirmed not-found answer.
#[derive(Debug)]
pub struct CitationCache {
    path: PathBuf,
    entries: BTreeMap<String, Option<CitationInfo>>,
    flush_each_update: bool,
    dirty: bool,
}

impl CitationCache {
    /// Load the cache file; a missing file yields an empty cache.
    pub fn load(path: &Path, flush_each_update: bool) -> Result<Self> {
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents).map_err(|e| {
                ScienceError::Cache(format!("corrupt cache file {}: {e}", path.display()))
            })?
        } else {
            tracing::info!("citation cache {} not found, starting empty", path.display());
            BTreeMap::new()
        };

        let cache = Self {
            path: path.to_path_buf(),
            entries,
            flush_each_update,
            dirty: false,
        };
        tracing::debug!("citation cache loaded ({} entries)", cache.len());
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Some(None)` when the key is cached as not found.
    pub fn get(&self, key: &str) -> Option<Option<&CitationInfo>> {
        self.entries.get(key).map(Option::as_ref)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Option<CitationInfo>) -> Result<()> {
        self.entries.insert(key.into(), value);
        self.dirty = true;
        if self.flush_each_update {
            self.flush()?;
        }
        Ok(())
    }

    /// Write the cache to disk if it changed since the last flush.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_vec_pretty(&self.entries)?;
        write_atomic(&self.path, &json)?;
        self.dirty = false;
        tracing::debug!("saved citation cache ({} entries)", self.entries.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
