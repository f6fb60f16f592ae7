//! Typed helpers on top of raw-byte [`CacheBucket`]s.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// JSON and string access for any [`CacheBucket`].
///
/// Kept as an extension trait so [`CacheBucket`] stays object-safe.
///
/// # Example
///
/// ```
/// use mdview_cache::{Cache, CacheBucketExt, MemoryCache};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Fragment { html: String }
///
/// let bucket = MemoryCache::default().bucket("renders");
/// bucket.set_json("k", "v1", &Fragment { html: "<p>a</p>".into() });
/// let hit: Option<Fragment> = bucket.get_json("k", "v1");
/// assert_eq!(hit, Some(Fragment { html: "<p>a</p>".into() }));
/// ```
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a JSON-deserialized value.
    ///
    /// Undecodable entries count as a miss.
    fn get_json<T: DeserializeOwned>(&self, key: &str, etag: &str) -> Option<T> {
        let bytes = self.get(key, etag)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store a value as JSON. Serialization failures are logged and skipped.
    fn set_json<T: Serialize>(&self, key: &str, etag: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set(key, etag, &bytes),
            Err(e) => tracing::debug!(key, error = %e, "Failed to serialize cache entry"),
        }
    }

    /// Retrieve a cached UTF-8 string.
    fn get_string(&self, key: &str, etag: &str) -> Option<String> {
        String::from_utf8(self.get(key, etag)?).ok()
    }

    /// Store a string value.
    fn set_string(&self, key: &str, etag: &str, value: &str) {
        self.set(key, etag, value.as_bytes());
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cache, MemoryCache};

    #[test]
    fn test_get_json_rejects_garbage() {
        let bucket = MemoryCache::default().bucket("renders");
        bucket.set("k", "", b"not json");
        let value: Option<Vec<String>> = bucket.get_json("k", "");
        assert_eq!(value, None);
    }

    #[test]
    fn test_string_roundtrip_respects_etag() {
        let bucket = MemoryCache::default().bucket("diagrams");
        bucket.set_string("svg", "theme=default", "<svg/>");
        assert_eq!(
            bucket.get_string("svg", "theme=default").as_deref(),
            Some("<svg/>")
        );
        assert_eq!(bucket.get_string("svg", "theme=dark"), None);
    }

    #[test]
    fn test_get_string_rejects_invalid_utf8() {
        let bucket = MemoryCache::default().bucket("diagrams");
        bucket.set("bin", "", &[0xff, 0xfe]);
        assert_eq!(bucket.get_string("bin", ""), None);
    }
}
