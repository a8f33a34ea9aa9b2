//! Side cache of parsed index snapshots
//!
//! Parsing a large index takes seconds, so snapshots are kept keyed by the
//! SHA-1 of the whole index file. A changed index gets a new key; stale
//! entries are simply never read again.

use crate::error::Result;
use parking_lot::RwLock;
use sqpack_crypto::Sha1Digest;
use sqpack_formats::IndexSnapshot;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Store of index snapshots keyed by index file digest
pub trait IndexCache: Send + Sync {
    /// Snapshot stored for `key`, if any
    fn get(&self, key: &Sha1Digest) -> Result<Option<IndexSnapshot>>;

    /// Store `snapshot` under `key`, replacing any previous entry
    fn put(&self, key: &Sha1Digest, snapshot: &IndexSnapshot) -> Result<()>;
}

impl<T: IndexCache + ?Sized> IndexCache for Arc<T> {
    fn get(&self, key: &Sha1Digest) -> Result<Option<IndexSnapshot>> {
        (**self).get(key)
    }

    fn put(&self, key: &Sha1Digest, snapshot: &IndexSnapshot) -> Result<()> {
        (**self).put(key, snapshot)
    }
}

/// Cache that never stores anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl IndexCache for NoCache {
    fn get(&self, _key: &Sha1Digest) -> Result<Option<IndexSnapshot>> {
        Ok(None)
    }

    fn put(&self, _key: &Sha1Digest, _snapshot: &IndexSnapshot) -> Result<()> {
        Ok(())
    }
}

/// Process-local cache
#[derive(Debug, Default)]
pub struct MemoryIndexCache {
    entries: RwLock<HashMap<Sha1Digest, IndexSnapshot>>,
}

impl MemoryIndexCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached snapshots
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl IndexCache for MemoryIndexCache {
    fn get(&self, key: &Sha1Digest) -> Result<Option<IndexSnapshot>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &Sha1Digest, snapshot: &IndexSnapshot) -> Result<()> {
        self.entries.write().insert(*key, snapshot.clone());
        Ok(())
    }
}

/// One `<digest>.json` file per snapshot under a directory
#[derive(Debug, Clone)]
pub struct JsonIndexCache {
    dir: PathBuf,
}

impl JsonIndexCache {
    /// Cache rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the snapshot for `key`
    pub fn path_for(&self, key: &Sha1Digest) -> PathBuf {
        self.dir.join(format!("{}.json", key.to_hex()))
    }
}

impl IndexCache for JsonIndexCache {
    fn get(&self, key: &Sha1Digest) -> Result<Option<IndexSnapshot>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read(&path)?;
        match serde_json::from_slice(&content) {
            Ok(snapshot) => {
                debug!("Loaded cached index snapshot {:?}", path);
                Ok(Some(snapshot))
            }
            Err(e) => {
                warn!("Ignoring unreadable cache file {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    fn put(&self, key: &Sha1Digest, snapshot: &IndexSnapshot) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        // Write to temporary file first for atomicity
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, serde_json::to_vec(snapshot)?)?;
        fs::rename(&temp_path, &path)?;

        debug!("Stored index snapshot {:?}", path);
        Ok(())
    }
}
