//! On-disk cache for Tome build artifacts.
//!
//! Two object-safe traits form the API:
//!
//! - [`Cache`]: hands out named buckets
//! - [`CacheBucket`]: byte store where every entry is tagged with an etag
//!
//! A lookup only hits when the stored etag equals the requested one, so
//! callers encode "what produced this value" (a toolchain fingerprint, a
//! crate version) in the etag and the content identity in the key.
//!
//! [`CacheBucketExt`] adds JSON helpers on top of raw bytes.
//!
//! # Example
//!
//! ```
//! use tome_cache::{Cache, NullCache};
//!
//! let bucket = NullCache.bucket("samples");
//! bucket.set("3f2a", "rustc 1.91", b"passed");
//! assert_eq!(bucket.get("3f2a", "rustc 1.91"), None);
//! ```

mod file;

pub use file::FileCache;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A named partition within a [`Cache`].
pub trait CacheBucket: Send + Sync {
    /// Fetch the value stored under `key` with exactly this `etag`.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// Failures are swallowed: a cache that cannot be written only costs a
    /// recomputation on the next build.
    fn set(&self, key: &str, etag: &str, value: &[u8]);
}

/// Factory for isolated [`CacheBucket`]s.
pub trait Cache: Send + Sync {
    /// Open or create the bucket called `name`.
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// Bucket that stores nothing.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}
}

/// [`Cache`] used when caching is disabled; every lookup misses.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

/// JSON convenience methods for any [`CacheBucket`].
pub trait CacheBucketExt: CacheBucket {
    /// Fetch and deserialize; a payload that no longer parses is a miss.
    fn get_json<T: DeserializeOwned>(&self, key: &str, etag: &str) -> Option<T> {
        let bytes = self.get(key, etag)?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Serialize and store.
    fn set_json<T: Serialize>(&self, key: &str, etag: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set(key, etag, &bytes),
            Err(e) => tracing::debug!(key, error = %e, "Failed to serialize cache entry"),
        }
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Verdict {
        passed: bool,
    }

    #[test]
    fn test_null_cache_never_hits() {
        let bucket = NullCache.bucket("samples");
        bucket.set("key", "etag", b"value");
        assert_eq!(bucket.get("key", "etag"), None);
    }

    #[test]
    fn test_null_cache_json_never_hits() {
        let bucket = NullCache.bucket("samples");
        bucket.set_json("key", "etag", &Verdict { passed: true });
        assert_eq!(bucket.get_json::<Verdict>("key", "etag"), None);
    }

    #[test]
    fn test_json_round_trip_through_file_cache() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().join("cache"), "1");
        let bucket = cache.bucket("samples");

        bucket.set_json("abc", "rustc", &Verdict { passed: true });
        assert_eq!(
            bucket.get_json::<Verdict>("abc", "rustc"),
            Some(Verdict { passed: true })
        );
    }

    #[test]
    fn test_json_garbage_is_a_miss() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().join("cache"), "1");
        let bucket = cache.bucket("samples");

        bucket.set("abc", "rustc", b"not json");
        assert_eq!(bucket.get_json::<Verdict>("abc", "rustc"), None);
    }
}
