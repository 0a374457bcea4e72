use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Get the platform-appropriate cache directory for scorebook
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("scorebook/http-cache"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/scorebook/http-cache",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Clear the HTTP cache directory
pub fn clear_cache() -> Result<()> {
    let cache_path = get_cache_path();
    match std::fs::remove_dir_all(&cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// A cached GET response, revalidated with `If-None-Match`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub etag: String,
    pub body: Vec<u8>,
}

/// Disk-persistent response cache
///
/// Uses cacache for disk persistence and an in-memory HashMap for fast access.
/// Entries are keyed by full request URL. A cached body is only served after
/// the server answers 304 Not Modified for its ETag.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Mutex<HashMap<String, CachedResponse>>>,
    cache_path: PathBuf,
}

impl ResponseCache {
    pub fn new(cache_path: PathBuf) -> Self {
        // Disk entries are loaded on demand
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            cache_path,
        }
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, CachedResponse>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn lookup(&self, url: &str) -> Option<CachedResponse> {
        if let Some(hit) = self.memory().get(url) {
            return Some(hit.clone());
        }

        let bytes = cacache::read_sync(&self.cache_path, url).ok()?;
        let entry: CachedResponse = serde_json::from_slice(&bytes).ok()?;
        self.memory().insert(url.to_string(), entry.clone());
        Some(entry)
    }

    pub fn store(&self, url: &str, etag: String, body: Vec<u8>) {
        let entry = CachedResponse { etag, body };

        // Disk errors only cost a future cache miss
        match serde_json::to_vec(&entry) {
            Ok(serialized) => {
                if let Err(e) = cacache::write_sync(&self.cache_path, url, &serialized) {
                    tracing::debug!("Failed to persist cache entry for {}: {}", url, e);
                }
            }
            Err(e) => tracing::debug!("Failed to serialize cache entry for {}: {}", url, e),
        }

        self.memory().insert(url.to_string(), entry);
    }

    /// Clear the in-memory cache. Disk entries stay until `clear_cache`.
    pub fn clear_memory(&self) {
        self.memory().clear();
    }
}
