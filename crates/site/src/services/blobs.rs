//! Upload blob store.
//!
//! Uploaded files are kept on disk, one directory per cart, so the cart
//! metadata in the session only carries keys. Layout:
//!
//! ```text
//! <root>/<cart-id>/<key>
//! ```
//!
//! Cart ids and keys are UUIDs generated by the server; anything else is
//! refused before it touches the filesystem. Each cart has a byte quota.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use uuid::Uuid;

/// Errors from the blob store.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Storing the blob would push the cart past its quota.
    #[error("blob quota exceeded: {used} + {requested} bytes > {quota}")]
    QuotaExceeded {
        used: u64,
        requested: u64,
        quota: u64,
    },

    /// The key or cart id is not a UUID.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    /// Filesystem failure.
    #[error("blob io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Disk-backed store of uploaded files, partitioned by cart.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    quota: u64,
}

impl BlobStore {
    /// Create a store rooted at `root` with a per-cart byte quota.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, quota: u64) -> Self {
        Self {
            root: root.into(),
            quota,
        }
    }

    /// Create the root directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn ensure_root(&self) -> Result<(), BlobError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The blobs of one cart.
    #[must_use]
    pub fn cart(&self, cart_id: Uuid) -> CartBlobs {
        CartBlobs {
            dir: self.root.join(cart_id.to_string()),
            quota: self.quota,
        }
    }

    /// Delete cart directories not modified within `max_age`.
    ///
    /// Sessions expire without telling us, so their uploads are reclaimed
    /// here. Returns the number of cart directories removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be listed. Failures on individual
    /// directories are logged and skipped.
    pub async fn sweep_stale(&self, max_age: Duration) -> Result<usize, BlobError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_cart_dir = entry
                .file_name()
                .to_str()
                .is_some_and(|name| Uuid::parse_str(name).is_ok());
            if !is_cart_dir {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot stat cart upload dir");
                    continue;
                }
            };

            let age = now.duration_since(modified).unwrap_or_default();
            if age < max_age {
                continue;
            }

            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to sweep cart uploads");
                }
            }
        }

        Ok(removed)
    }
}

/// Blob storage scoped to a single cart.
#[derive(Debug, Clone)]
pub struct CartBlobs {
    dir: PathBuf,
    quota: u64,
}

impl CartBlobs {
    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        let key = Uuid::parse_str(key).map_err(|_| BlobError::InvalidKey(key.to_string()))?;
        Ok(self.dir.join(key.to_string()))
    }

    /// Generate a fresh key.
    #[must_use]
    pub fn new_key() -> String {
        Uuid::new_v4().to_string()
    }

    /// Bytes currently stored for this cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart directory cannot be listed.
    pub async fn usage(&self) -> Result<u64, BlobError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0;
        while let Some(entry) = entries.next_entry().await? {
            total += entry.metadata().await?.len();
        }
        Ok(total)
    }

    /// Store `bytes` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `QuotaExceeded` if the cart would go over its quota, or an
    /// I/O error if the write fails.
    pub async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        let requested = bytes.len() as u64;
        let used = self.usage().await?;
        if used + requested > self.quota {
            return Err(BlobError::QuotaExceeded {
                used,
                requested,
                quota: self.quota,
            });
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    /// Fetch the blob under `key`, or `None` if it is gone.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or unreadable files.
    pub async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the blob under `key`. Missing blobs are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or failed deletes.
    pub async fn remove(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove several blobs, logging failures instead of stopping.
    pub async fn remove_all(&self, keys: Vec<String>) {
        for key in keys {
            if let Err(e) = self.remove(&key).await {
                tracing::warn!(key = %key, error = %e, "Failed to remove cart upload");
            }
        }
    }

    /// Remove every blob of this cart whose key is not in `keep`.
    ///
    /// Returns the number of blobs removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart directory cannot be listed or a file
    /// cannot be removed.
    pub async fn retain_only(&self, keep: &[String]) -> Result<usize, BlobError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let referenced = entry
                .file_name()
                .to_str()
                .is_some_and(|name| keep.iter().any(|key| key == name));
            if !referenced {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove every blob of this cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), BlobError> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(quota: u64) -> (tempfile::TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path(), quota);
        (dir, store)
    }

    #[tokio::test]
    async fn test_store_fetch_remove() {
        let (_dir, store) = store(1024);
        let blobs = store.cart(Uuid::new_v4());
        let key = CartBlobs::new_key();

        blobs.store(&key, b"%PDF-1.7").await.unwrap();
        assert_eq!(blobs.fetch(&key).await.unwrap().unwrap(), b"%PDF-1.7");
        assert_eq!(blobs.usage().await.unwrap(), 8);

        blobs.remove(&key).await.unwrap();
        assert!(blobs.fetch(&key).await.unwrap().is_none());
        blobs.remove(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_unknown_cart_is_absent() {
        let (_dir, store) = store(1024);
        let blobs = store.cart(Uuid::new_v4());
        assert!(blobs.fetch(&CartBlobs::new_key()).await.unwrap().is_none());
        assert_eq!(blobs.usage().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_key_is_refused() {
        let (_dir, store) = store(1024);
        let blobs = store.cart(Uuid::new_v4());
        assert!(matches!(
            blobs.store("../../etc/passwd", b"x").await,
            Err(BlobError::InvalidKey(_))
        ));
        assert!(matches!(
            blobs.fetch("not-a-uuid").await,
            Err(BlobError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_quota_is_per_cart() {
        let (_dir, store) = store(10);
        let first = store.cart(Uuid::new_v4());
        let second = store.cart(Uuid::new_v4());

        first.store(&CartBlobs::new_key(), &[0; 8]).await.unwrap();
        let err = first.store(&CartBlobs::new_key(), &[0; 3]).await.unwrap_err();
        assert!(matches!(
            err,
            BlobError::QuotaExceeded {
                used: 8,
                requested: 3,
                quota: 10
            }
        ));

        second.store(&CartBlobs::new_key(), &[0; 10]).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let (_dir, store) = store(1024);
        let blobs = store.cart(Uuid::new_v4());
        let key = CartBlobs::new_key();
        blobs.store(&key, b"data").await.unwrap();

        blobs.clear().await.unwrap();
        assert!(blobs.fetch(&key).await.unwrap().is_none());
        blobs.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_stale_removes_old_cart_dirs_only() {
        let (dir, store) = store(1024);
        let blobs = store.cart(Uuid::new_v4());
        blobs.store(&CartBlobs::new_key(), b"data").await.unwrap();
        std::fs::create_dir_all(dir.path().join("not-a-cart")).unwrap();

        assert_eq!(store.sweep_stale(Duration::from_secs(3600)).await.unwrap(), 0);
        assert_eq!(store.sweep_stale(Duration::ZERO).await.unwrap(), 1);
        assert_eq!(blobs.usage().await.unwrap(), 0);
        assert!(dir.path().join("not-a-cart").exists());
    }

    #[tokio::test]
    async fn test_remove_all_takes_owned_keys() {
        let (_dir, store) = store(1024);
        let blobs = store.cart(Uuid::new_v4());
        let keys: Vec<String> = (0..3).map(|_| CartBlobs::new_key()).collect();
        for key in &keys {
            blobs.store(key, b"doc").await.unwrap();
        }

        blobs.remove_all(keys.clone()).await;
        assert_eq!(blobs.usage().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_retain_only_drops_unreferenced_blobs() {
        let (_dir, store) = store(1024);
        let blobs = store.cart(Uuid::new_v4());
        let kept = CartBlobs::new_key();
        let orphan = CartBlobs::new_key();
        blobs.store(&kept, b"keep").await.unwrap();
        blobs.store(&orphan, b"orphan").await.unwrap();

        assert_eq!(blobs.retain_only(&[kept.clone()]).await.unwrap(), 1);
        assert!(blobs.fetch(&kept).await.unwrap().is_some());
        assert!(blobs.fetch(&orphan).await.unwrap().is_none());
        assert_eq!(blobs.usage().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_retain_only_on_missing_cart() {
        let (_dir, store) = store(1024);
        let blobs = store.cart(Uuid::new_v4());
        assert_eq!(blobs.retain_only(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_missing_root() {
        let store = BlobStore::new("/nonexistent/signpress/uploads", 10);
        assert_eq!(store.sweep_stale(Duration::ZERO).await.unwrap(), 0);
    }
}
