//! Per-profile artifact cache.
//!
//! JSON blobs keyed by file name (`images.json`) in one directory per
//! profile. The cache is advisory: a stale, missing or corrupt entry is a
//! miss, corrupt files are removed, and write failures are logged and
//! dropped. File access goes through `tokio::fs`; the temp-file write and
//! rename run on the blocking pool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, warn};
use triton_cloudapi::{Profile, cache_dir};

/// Cache key of the full image listing.
pub const IMAGES_KEY: &str = "images.json";

/// How long cached image listings stay fresh.
pub const DEFAULT_IMAGE_TTL: Duration = Duration::from_secs(5 * 60);

/// A cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    /// Cache rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache for `profile` under `config_dir`.
    #[must_use]
    pub fn for_profile(config_dir: &Path, profile: &Profile) -> Self {
        Self::new(cache_dir(config_dir, profile))
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Cached value for `key` if it was written no more than `ttl` ago.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let path = self.path(key);
        let modified = fs::metadata(&path).await.and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > ttl {
            debug!(key, age_secs = age.as_secs(), "cache entry stale");
            return None;
        }

        let content = fs::read(&path).await.ok()?;
        match serde_json::from_slice(&content) {
            Ok(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "removing corrupt cache entry");
                if let Err(e) = fs::remove_file(&path).await {
                    debug!(path = %path.display(), error = %e, "failed to remove cache entry");
                }
                None
            }
        }
    }

    /// Stores `value` under `key`, replacing the file atomically. Failures
    /// are logged, never returned.
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_put(key, value).await {
            warn!(key, dir = %self.dir.display(), error = %e, "failed to write cache entry");
        }
    }

    async fn try_put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> std::io::Result<()> {
        let data = serde_json::to_vec(value)?;
        let bytes = data.len();
        fs::create_dir_all(&self.dir).await?;
        let (dir, dest) = (self.dir.clone(), self.path(key));
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&data)?;
            tmp.as_file().sync_all()?;
            tmp.persist(dest).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;
        debug!(key, bytes, "cache entry written");
        Ok(())
    }

    /// Drops the entry for `key`.
    pub async fn remove(&self, key: &str) {
        match fs::remove_file(self.path(key)).await {
            Ok(()) => debug!(key, "cache entry removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(key, error = %e, "failed to remove cache entry"),
        }
    }
}
