//! File-based cache implementation.
//!
//! Each bucket is a subdirectory of the cache root and each entry a single
//! file named after its key:
//!
//! ```text
//! {root}/
//! +-- VERSION            # cache format/application version
//! +-- renders/
//! |   +-- 9f86d081...    # "{etag}\n{data}"
//! +-- diagrams/
//! ```
//!
//! Entries are written to a temporary file private to the writer (hidden,
//! named after the key, process id and a counter) and renamed into place, so
//! a concurrent reader sees either the old or the new entry. A `VERSION`
//! mismatch on construction wipes the root.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Cache, CacheBucket};

/// Distinguishes temporary files of concurrent writers within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-based [`Cache`] rooted at a directory on disk.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open the cache at `root`, wiping it when its `VERSION` differs.
    ///
    /// Failures are logged and leave a cache that simply misses.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        ensure_version(&root, version);
        Self { root }
    }

    /// Root directory of this cache.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            dir: self.root.join(name),
        })
    }
}

struct FileCacheBucket {
    dir: PathBuf,
}

impl FileCacheBucket {
    /// Path for `key`, or `None` when the key is not a plain file name.
    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        let plain = !key.is_empty()
            && !key.starts_with('.')
            && !key.contains(['/', '\\'])
            && !key.contains('\0');
        plain.then(|| self.dir.join(key))
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(key)?;
        let mut reader = BufReader::new(fs::File::open(path).ok()?);

        let mut header = Vec::new();
        reader.read_until(b'\n', &mut header).ok()?;
        if header.pop() != Some(b'\n') {
            return None;
        }
        if !etag.is_empty() && header != etag.as_bytes() {
            return None;
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).ok()?;
        Some(data)
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        let Some(path) = self.entry_path(key) else {
            tracing::debug!(key, "Refusing cache key that is not a plain file name");
            return;
        };
        if etag.contains('\n') {
            tracing::debug!(key, "Refusing cache etag containing a newline");
            return;
        }
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::debug!(dir = %self.dir.display(), error = %e, "Failed to create cache bucket");
            return;
        }

        let mut buf = Vec::with_capacity(etag.len() + 1 + value.len());
        buf.extend_from_slice(etag.as_bytes());
        buf.push(b'\n');
        buf.extend_from_slice(value);

        let tmp = self.dir.join(format!(
            ".{key}.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let written = fs::write(&tmp, &buf).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            tracing::debug!(path = %path.display(), error = %e, "Failed to write cache entry");
            let _ = fs::remove_file(&tmp);
        }
    }
}

/// Make sure `root` holds a cache of `version`, starting fresh otherwise.
fn ensure_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!(version, "Cache version matches");
            return;
        }
        Ok(stored) => {
            tracing::info!(stored = %stored, current = version, "Cache version changed, wiping cache");
        }
        Err(_) => tracing::info!(root = %root.display(), "Initializing cache"),
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!(root = %root.display(), error = %e, "Failed to remove cache directory");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!(root = %root.display(), error = %e, "Failed to create cache directory");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!(error = %e, "Failed to write cache VERSION file");
    }
}
