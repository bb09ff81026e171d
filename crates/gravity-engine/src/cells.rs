//! Loading precomputed travel-time cells.
//!
//! Cells for an origin live in `<origin_id>.json`, either under a local
//! directory or under an HTTP base URL. Loaded sets are kept in a small LRU
//! cache keyed by origin id.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::travel_time::TravelTimeCell;

/// Where travel-time files are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellStoreRoot {
    Directory(PathBuf),
    BaseUrl(String),
}

/// Accepted file layouts: a bare array or `{"cells": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CellFile {
    Bare(Vec<TravelTimeCell>),
    Wrapped { cells: Vec<TravelTimeCell> },
}

impl From<CellFile> for Vec<TravelTimeCell> {
    fn from(file: CellFile) -> Self {
        match file {
            CellFile::Bare(cells) | CellFile::Wrapped { cells } => cells,
        }
    }
}

/// Parse a travel-time cell file.
pub fn parse_cells(bytes: &[u8]) -> Result<Vec<TravelTimeCell>> {
    let file: CellFile = serde_json::from_slice(bytes)?;
    Ok(file.into())
}

/// Origin ids become file names, so only a conservative character set is
/// accepted.
fn validate_origin_id(origin_id: &str) -> Result<()> {
    let valid = !origin_id.is_empty()
        && origin_id.len() <= 128
        && origin_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !origin_id.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(EngineError::invalid(format!("invalid origin id '{}'", origin_id)))
    }
}

/// Cached loader for per-origin travel-time cells.
pub struct CellStore {
    root: CellStoreRoot,
    client: reqwest::Client,
    cache: Mutex<LruCache<String, Arc<Vec<TravelTimeCell>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CellStore {
    /// Create a store keeping up to `capacity` origins in memory.
    pub fn new(root: CellStoreRoot, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            root,
            client: reqwest::Client::new(),
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cells for `origin_id`, from cache or storage.
    pub async fn load(&self, origin_id: &str) -> Result<Arc<Vec<TravelTimeCell>>> {
        validate_origin_id(origin_id)?;

        if let Some(cells) = self.cache.lock().await.get(origin_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(cells));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let cells = Arc::new(self.fetch(origin_id).await?);
        info!(origin = origin_id, cells = cells.len(), "Loaded travel-time cells");

        self.cache
            .lock()
            .await
            .put(origin_id.to_string(), Arc::clone(&cells));
        Ok(cells)
    }

    async fn fetch(&self, origin_id: &str) -> Result<Vec<TravelTimeCell>> {
        let file_name = format!("{}.json", origin_id);
        match &self.root {
            CellStoreRoot::Directory(dir) => {
                let path = dir.join(&file_name);
                debug!(path = %path.display(), "Reading travel-time file");
                let bytes = tokio::fs::read(&path).await.map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        EngineError::CellsNotFound(format!("no data for origin '{}'", origin_id))
                    } else {
                        EngineError::from(e)
                    }
                })?;
                parse_cells(&bytes)
            }
            CellStoreRoot::BaseUrl(base) => {
                let url = format!("{}/{}", base.trim_end_matches('/'), file_name);
                debug!(url = %url, "Fetching travel-time file");
                let response = self.client.get(&url).send().await?.error_for_status()?;
                let bytes = response.bytes().await?;
                parse_cells(&bytes)
            }
        }
    }

    /// (hits, misses) of the cell cache.
    pub fn cache_stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
