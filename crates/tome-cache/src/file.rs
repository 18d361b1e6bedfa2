//! File-backed cache.
//!
//! Layout:
//!
//! ```text
//! {root}/
//! +-- VERSION          # cache format version
//! +-- samples/         # one directory per bucket
//!     +-- 3f2a...      # one file per key
//! ```
//!
//! Each entry file is `[etag_len: u32 LE][etag][payload]`. A `VERSION`
//! mismatch on open wipes the whole root.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::{Cache, CacheBucket};

/// [`Cache`] rooted at a directory.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open the cache at `root`, resetting it if its version differs.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        reset_on_version_change(&root, version);
        Self { root }
    }

    /// Directory the cache lives in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileBucket {
            dir: self.root.join(name),
        })
    }
}

struct FileBucket {
    dir: PathBuf,
}

impl FileBucket {
    fn read_entry(path: &Path, etag: &str) -> io::Result<Option<Vec<u8>>> {
        let mut file = File::open(path)?;

        let mut len = [0u8; 4];
        file.read_exact(&mut len)?;
        let mut stored = vec![0u8; u32::from_le_bytes(len) as usize];
        file.read_exact(&mut stored)?;
        if stored != etag.as_bytes() {
            return Ok(None);
        }

        let mut payload = Vec::new();
        file.read_to_end(&mut payload)?;
        Ok(Some(payload))
    }

    /// Write through a temporary sibling so concurrent readers never see a
    /// half-written entry.
    fn write_entry(&self, key: &str, etag: &str, value: &[u8]) -> io::Result<()> {
        let path = self.dir.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let etag_len = u32::try_from(etag.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "etag too long"))?;

        let tmp = path.with_extension("tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(&etag_len.to_le_bytes())?;
        file.write_all(etag.as_bytes())?;
        file.write_all(value)?;
        file.sync_all()?;
        fs::rename(&tmp, &path)
    }
}

impl CacheBucket for FileBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        Self::read_entry(&self.dir.join(key), etag).ok().flatten()
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        if let Err(e) = self.write_entry(key, etag, value) {
            tracing::debug!(key, error = %e, "Failed to write cache entry");
        }
    }
}

fn reset_on_version_change(root: &Path, version: &str) {
    let version_file = root.join("VERSION");
    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => return,
        Ok(stored) => tracing::info!(stored = %stored, current = version, "Cache version changed, resetting"),
        Err(_) => tracing::debug!(root = %root.display(), "Initializing cache"),
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!(error = %e, "Failed to remove cache directory");
    }
    if let Err(e) = fs::create_dir_all(root).and_then(|()| fs::write(&version_file, version)) {
        tracing::warn!(error = %e, "Failed to initialize cache directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(tmp: &TempDir, version: &str) -> FileCache {
        FileCache::new(tmp.path().join("cache"), version)
    }

    #[test]
    fn test_hit_requires_matching_etag() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp, "1").bucket("samples");

        bucket.set("sample", "rustc-1.91", b"passed");
        assert_eq!(bucket.get("sample", "rustc-1.91"), Some(b"passed".to_vec()));
        assert_eq!(bucket.get("sample", "rustc-1.92"), None);
    }

    #[test]
    fn test_missing_key_misses() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp, "1").bucket("samples");
        assert_eq!(bucket.get("nothing", "etag"), None);
    }

    #[test]
    fn test_set_replaces_previous_entry() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp, "1").bucket("samples");

        bucket.set("sample", "a", b"first");
        bucket.set("sample", "b", b"second");
        assert_eq!(bucket.get("sample", "a"), None);
        assert_eq!(bucket.get("sample", "b"), Some(b"second".to_vec()));
        assert!(!tmp.path().join("cache/samples/sample.tmp").exists());
    }

    #[test]
    fn test_buckets_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let cache = open(&tmp, "1");
        cache.bucket("samples").set("key", "e", b"sample");
        cache.bucket("pages").set("key", "e", b"page");

        assert_eq!(cache.bucket("samples").get("key", "e"), Some(b"sample".to_vec()));
        assert_eq!(cache.bucket("pages").get("key", "e"), Some(b"page".to_vec()));
    }

    #[test]
    fn test_same_version_keeps_entries() {
        let tmp = TempDir::new().unwrap();
        open(&tmp, "1").bucket("samples").set("key", "e", b"kept");
        assert_eq!(
            open(&tmp, "1").bucket("samples").get("key", "e"),
            Some(b"kept".to_vec())
        );
    }

    #[test]
    fn test_new_version_wipes_entries() {
        let tmp = TempDir::new().unwrap();
        open(&tmp, "1").bucket("samples").set("key", "e", b"stale");

        let cache = open(&tmp, "2");
        assert_eq!(cache.bucket("samples").get("key", "e"), None);
        assert_eq!(
            fs::read_to_string(cache.root().join("VERSION")).unwrap(),
            "2"
        );
    }

    #[test]
    fn test_truncated_entry_misses() {
        let tmp = TempDir::new().unwrap();
        let cache = open(&tmp, "1");
        fs::create_dir_all(cache.root().join("samples")).unwrap();
        fs::write(cache.root().join("samples/broken"), [9u8, 0]).unwrap();
        assert_eq!(cache.bucket("samples").get("broken", ""), None);
    }
}
