//! `FileStore` — the per-process, per-role storage directory.
//!
//! Final blobs and temp files live side by side under one directory but
//! never share a namespace: `blob_<hex>` for promoted content, `tmp-<n>` for
//! everything in flight. Promotion is a single `rename`, which is the only
//! way a final name ever comes into existence — this is what makes
//! concurrent readers of the same key safe without a lock file.

use std::path::{Path, PathBuf};

use rand::Rng;
use tokio::sync::Mutex;

use blobcache_core::constants::{BLOB_PREFIX, TEMP_NAME_SPACE, TEMP_PREFIX};
use blobcache_core::{BlobKey, Error, Result};

/// A directory holding one role's blobs.
///
/// Layout: `<base>/blob-<user>-<pid>/{blob_<hex>,tmp-<n>}`.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    /// Serializes the random-probe loop in `alloc_temp`.
    temp_alloc: Mutex<()>,
}

/// A temp file allocated by [`FileStore::alloc_temp`].
///
/// Its contents are never visible at a final name until
/// [`FileStore::promote`] renames it. Dropping the guard without promoting
/// it removes the temp file — every put/fetch error path gets this for
/// free by simply letting the guard fall out of scope.
pub struct TempFile {
    path: PathBuf,
    file: tokio::fs::File,
    armed: bool,
}

impl TempFile {
    /// The temp file's current path, for callers that need to open it
    /// again (e.g. to compute a size) before promotion.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A mutable handle to the open file, for streaming writes.
    pub fn file_mut(&mut self) -> &mut tokio::fs::File {
        &mut self.file
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            // Best-effort: Drop can't await, and cleanup errors here are
            // swallowed the same way shutdown swallows them.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl FileStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub async fn open(root: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            temp_alloc: Mutex::new(()),
        })
    }

    /// The storage directory's path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh temp file: pick a random `n` in `[0, 10_000)`,
    /// retrying until `tmp-<n>` doesn't already exist.
    pub async fn alloc_temp(&self) -> Result<TempFile> {
        let _guard = self.temp_alloc.lock().await;
        loop {
            let n: u32 = rand::thread_rng().gen_range(0..TEMP_NAME_SPACE);
            let path = self.root.join(format!("{TEMP_PREFIX}{n}"));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    return Ok(TempFile {
                        path,
                        file,
                        armed: true,
                    })
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Promote a temp file to its final name, `blob_<hex(key)>`.
    ///
    /// A rename that fails because the destination already exists is
    /// treated as success: two concurrent puts of identical content
    /// converge on one final file, since the final name is a pure function
    /// of the (verified) content.
    pub async fn promote(&self, mut temp: TempFile, key: &BlobKey) -> Result<PathBuf> {
        let dest = self.final_path(key);
        temp.armed = false; // we own cleanup from here regardless of outcome
        match tokio::fs::rename(&temp.path, &dest).await {
            Ok(()) => Ok(dest),
            Err(_) if tokio::fs::try_exists(&dest).await.unwrap_or(false) => {
                let _ = tokio::fs::remove_file(&temp.path).await;
                Ok(dest)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp.path).await;
                Err(Error::Io(e))
            }
        }
    }

    /// The final path a key would promote to, regardless of whether it exists.
    pub fn final_path(&self, key: &BlobKey) -> PathBuf {
        self.root.join(key.storage_filename())
    }

    /// Look up a key's final path, if it has been promoted.
    pub async fn lookup(&self, key: &BlobKey) -> Result<Option<PathBuf>> {
        let path = self.final_path(key);
        if tokio::fs::try_exists(&path).await? {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    /// Delete every `blob_`-prefixed entry, then best-effort remove the
    /// directory itself. Per-file deletion errors are swallowed.
    pub async fn wipe(&self) -> Result<()> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(BLOB_PREFIX) {
                if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                    tracing::warn!(path = %entry.path().display(), error = %e, "failed to remove blob during wipe");
                }
            }
        }

        let _ = tokio::fs::remove_dir(&self.root).await;
        Ok(())
    }

    /// `(blob_count, total_bytes)` over every promoted blob. Used by
    /// `blobcache-ctl status` and by tests.
    pub async fn stats(&self) -> Result<(usize, u64)> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((0, 0)),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut count = 0usize;
        let mut bytes = 0u64;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(BLOB_PREFIX) {
                count += 1;
                bytes += entry.metadata().await?.len();
            }
        }
        Ok((count, bytes))
    }
}

/// The storage folder name for a role: `blob-<user>-<pid>`.
///
/// `<user>` falls back to `"default"` if `$USER`/`$LOGNAME` are unset.
/// `std::process::id()` is infallible, so `<pid>` has no fallback to apply.
pub fn storage_dir_name() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "default".to_string());
    let pid = std::process::id();
    format!("blob-{user}-{pid}")
}

/// Resolve the full storage directory path under `base`.
pub fn storage_dir_path(base: &Path) -> PathBuf {
    base.join(storage_dir_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobcache_core::digest::digest_bytes;

    async fn open_tmp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn alloc_promote_lookup_round_trip() {
        let (_dir, store) = open_tmp_store().await;
        let data = b"hello world";
        let key = digest_bytes(data);

        let mut temp = store.alloc_temp().await.unwrap();
        use tokio::io::AsyncWriteExt;
        temp.file_mut().write_all(data).await.unwrap();
        temp.file_mut().flush().await.unwrap();

        let final_path = store.promote(temp, &key).await.unwrap();
        assert_eq!(tokio::fs::read(&final_path).await.unwrap(), data);

        let looked_up = store.lookup(&key).await.unwrap().unwrap();
        assert_eq!(looked_up, final_path);
        assert!(final_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("blob_"));
    }

    #[tokio::test]
    async fn lookup_miss_returns_none() {
        let (_dir, store) = open_tmp_store().await;
        let key = digest_bytes(b"never stored");
        assert!(store.lookup(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dropping_unpromoted_temp_file_removes_it() {
        let (_dir, store) = open_tmp_store().await;
        let temp = store.alloc_temp().await.unwrap();
        let path = temp.path().to_path_buf();
        assert!(tokio::fs::try_exists(&path).await.unwrap());
        drop(temp);
        assert!(!tokio::fs::try_exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_promotion_of_identical_content_converges() {
        let (_dir, store) = open_tmp_store().await;
        let data = b"same bytes";
        let key = digest_bytes(data);

        let mut temp_a = store.alloc_temp().await.unwrap();
        let mut temp_b = store.alloc_temp().await.unwrap();
        use tokio::io::AsyncWriteExt;
        temp_a.file_mut().write_all(data).await.unwrap();
        temp_b.file_mut().write_all(data).await.unwrap();

        let path_a = store.promote(temp_a, &key).await.unwrap();
        let path_b = store.promote(temp_b, &key).await.unwrap();
        assert_eq!(path_a, path_b);
        assert_eq!(tokio::fs::read(&path_a).await.unwrap(), data);
    }

    #[tokio::test]
    async fn wipe_removes_blobs_and_directory() {
        let (_dir, store) = open_tmp_store().await;
        let data = b"to be wiped";
        let key = digest_bytes(data);
        let mut temp = store.alloc_temp().await.unwrap();
        use tokio::io::AsyncWriteExt;
        temp.file_mut().write_all(data).await.unwrap();
        store.promote(temp, &key).await.unwrap();

        store.wipe().await.unwrap();
        assert!(!tokio::fs::try_exists(store.root()).await.unwrap());
    }

    #[tokio::test]
    async fn stats_counts_blobs_and_bytes() {
        let (_dir, store) = open_tmp_store().await;
        let data = b"twelve bytes";
        let key = digest_bytes(data);
        let mut temp = store.alloc_temp().await.unwrap();
        use tokio::io::AsyncWriteExt;
        temp.file_mut().write_all(data).await.unwrap();
        store.promote(temp, &key).await.unwrap();

        let (count, bytes) = store.stats().await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(bytes, data.len() as u64);
    }
}
