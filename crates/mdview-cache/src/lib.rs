//! Cache abstraction layer for mdview.
//!
//! Rendering is a pure function of its input, so rendered output can be
//! memoized anywhere. This crate decouples the consumers (the viewer's render
//! memo and the Kroki diagram engine) from where entries live:
//!
//! - [`Cache`]: factory for named cache buckets
//! - [`CacheBucket`]: key-value store with etag-based invalidation
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: always miss
//! - [`MemoryCache`]: process-local, shared between bucket handles
//! - [`FileCache`]: versioned directory on disk
//!
//! # Example
//!
//! ```
//! use mdview_cache::{Cache, MemoryCache};
//!
//! let cache = MemoryCache::default();
//! let bucket = cache.bucket("renders");
//! bucket.set("3f2a", "gfm", b"<p>hi</p>");
//! assert_eq!(bucket.get("3f2a", "gfm"), Some(b"<p>hi</p>".to_vec()));
//! assert_eq!(bucket.get("3f2a", "commonmark"), None);
//! ```

mod ext;
mod file;
mod memory;

pub use ext::CacheBucketExt;
pub use file::FileCache;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// A hit requires both the key and the etag to match. The etag is an opaque
/// string chosen by the caller, such as a fingerprint of render options.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `None` on miss or etag mismatch. An empty `etag` skips
    /// validation and returns whatever is stored under `key`.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store a value, replacing any previous entry for `key`.
    fn set(&self, key: &str, etag: &str, value: &[u8]);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// Buckets with different names never see each other's entries.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket (e.g., "renders", "diagrams").
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`].
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}
}

/// No-op [`Cache`] used when caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let bucket = NullCache.bucket("renders");
        bucket.set("key", "etag", b"hello");
        assert_eq!(bucket.get("key", "etag"), None);
        assert_eq!(bucket.get("key", ""), None);
    }
}
