//! Process-local cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{Cache, CacheBucket};

/// Stored value with the etag it was written under.
type Entry = (String, Vec<u8>);

/// Entries of every bucket, by bucket name then key.
type Store = HashMap<String, HashMap<String, Entry>>;

/// In-memory [`Cache`].
///
/// Bucket handles returned by [`bucket`](Cache::bucket) share storage, so a
/// value written through one handle is visible through every handle for the
/// same bucket name. Cloning the cache shares storage too.
#[derive(Clone, Default)]
pub struct MemoryCache {
    store: Arc<RwLock<Store>>,
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(MemoryCacheBucket {
            name: name.to_owned(),
            store: Arc::clone(&self.store),
        })
    }
}

struct MemoryCacheBucket {
    name: String,
    store: Arc<RwLock<Store>>,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        // A poisoned lock only means a writer panicked mid-insert; treat as miss
        let store = self.store.read().ok()?;
        let (stored_etag, value) = store.get(&self.name)?.get(key)?;
        if !etag.is_empty() && stored_etag != etag {
            return None;
        }
        Some(value.clone())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        let Ok(mut store) = self.store.write() else {
            return;
        };
        store
            .entry(self.name.clone())
            .or_default()
            .insert(key.to_owned(), (etag.to_owned(), value.to_vec()));
    }
}
