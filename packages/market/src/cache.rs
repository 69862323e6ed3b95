//! On-disk image cache for listing enrichment.
//!
//! Check-then-write: an existence check, then fetch-and-store. Two
//! concurrent identical requests can both miss the check and fetch
//! redundantly; that race is tolerated. Writes go to a unique temp
//! file and are `rename`d into place, so the cache never holds a torn
//! file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{CacheError, FetchError};

static WRITE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Whole-file-atomic image cache keyed by source URL.
pub struct ImageCache {
    dir: PathBuf,
    client: reqwest::Client,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Cache path for a source URL.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{}.img", hex::encode(digest)))
    }

    /// Ensure the image behind `url` is cached, fetching it on a miss.
    ///
    /// Returns the cache path. Best-effort: callers log failures and
    /// continue, a listing is never dropped over its image.
    pub async fn ensure_cached(&self, url: &str) -> Result<PathBuf, CacheError> {
        let path = self.path_for(url);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(url = %url, "image cache hit");
            return Ok(path);
        }

        debug!(url = %url, "image cache miss, fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                source: Box::new(e),
            })?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            }
            .into());
        }
        let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: Box::new(e),
        })?;

        self.store(&path, &bytes).await?;
        Ok(path)
    }

    /// Atomically place `bytes` at `path` (temp file + rename).
    async fn store(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension(format!(
            "tmp.{}.{}",
            std::process::id(),
            WRITE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}
