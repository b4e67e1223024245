//! Persisted response store.
//!
//! One JSON record per key, `<key>.json`, in a directory created on first
//! write. Records are replaced wholesale: written to a temporary sibling and
//! renamed into place, so a reader sees either the old record or the new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::cache::key::CacheKey;
use crate::cache::CacheError;
use crate::observability::metrics;

const RECORD_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// A stored response and the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub request_hash: String,
    pub response: String,
    pub original_request: String,
    pub instructions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Content-addressable cache of generated bodies on disk.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `dir`. Nothing touches the disk until the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Key for (ordered instructions, canonical request description).
    pub fn derive_key(&self, instructions: &[String], request_description: &str) -> CacheKey {
        CacheKey::derive(instructions, request_description)
    }

    /// Location of the record for `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key.as_str(), RECORD_EXTENSION))
    }

    /// Body stored under `key`, if any.
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let hit = self.entry(key).await.map(|entry| entry.response);
        metrics::record_cache_lookup(hit.is_some());
        hit
    }

    /// Full record stored under `key`. Missing, unreadable or corrupt records are misses.
    pub async fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.path_for(key);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(key = %key.short(), error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(key = %key.short(), error = %e, "Corrupt cache record, treating as miss");
                None
            }
        }
    }

    /// Store `body` under `key`, replacing any previous record.
    pub async fn put(
        &self,
        key: &CacheKey,
        body: &str,
        request_description: &str,
        instructions: &[String],
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            request_hash: key.as_str().to_string(),
            response: body.to_string(),
            original_request: request_description.to_string(),
            instructions: instructions.to_vec(),
            timestamp: Utc::now(),
        };
        let serialized = serde_json::to_vec_pretty(&entry)?;

        fs::create_dir_all(&self.dir).await?;

        let temp = self.dir.join(format!(
            "{}.{}.{}",
            key.as_str(),
            uuid::Uuid::new_v4().simple(),
            TEMP_EXTENSION
        ));
        fs::write(&temp, &serialized).await?;
        if let Err(e) = fs::rename(&temp, self.path_for(key)).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::debug!(key = %key.short(), bytes = body.len(), "Cache record written");
        Ok(())
    }

    /// Delete every record. Best effort: failures are logged and skipped.
    /// Returns the number of files removed.
    pub async fn clear(&self) -> usize {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "Cache directory unreadable");
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Cache directory listing interrupted");
                    break;
                }
            };

            let path = entry.path();
            let is_cache_file = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == RECORD_EXTENSION || ext == TEMP_EXTENSION);
            let is_regular_file = entry.file_type().await.is_ok_and(|kind| kind.is_file());
            if !is_cache_file || !is_regular_file {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to delete cache record"),
            }
        }

        tracing::info!(removed, dir = %self.dir.display(), "Cache cleared");
        removed
    }
}
