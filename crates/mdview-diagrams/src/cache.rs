//! Content hashes used as cache keys and view identities.
//!
//! Provides [`DiagramKey`] for drawn diagrams and [`content_hash`] for
//! arbitrary text such as mounted HTML.

use sha2::{Digest, Sha256};

/// Diagram parameters for cache key computation.
///
/// Contains all parameters that affect the drawn diagram.
#[derive(Debug)]
pub struct DiagramKey<'a> {
    /// Diagram source as written in the fence.
    pub source: &'a str,
    /// Kroki endpoint (e.g., "mermaid").
    pub endpoint: &'a str,
    /// Output format ("svg").
    pub format: &'a str,
    /// Engine theme.
    pub theme: &'a str,
}

impl DiagramKey<'_> {
    /// Compute a content hash for this diagram key.
    ///
    /// SHA-256 of `"{endpoint}:{format}:{theme}:{source}"`, hex encoded. Any
    /// parameter change results in a cache miss.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        content_hash(&format!(
            "{}:{}:{}:{}",
            self.endpoint, self.format, self.theme, self.source
        ))
    }
}

/// Hex-encoded SHA-256 of `text`.
#[must_use]
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
