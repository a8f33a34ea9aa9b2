//! Access to the archives of one game installation

use crate::cache::IndexCache;
use crate::error::{Result, StorageError};
use crate::path::ArchivePath;
use sqpack_crypto::Sha1Digest;
use sqpack_formats::{DataReader, FileEntry, IndexReader, IndexSnapshot};
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Where a path resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Index file that listed the path
    pub index_path: PathBuf,
    /// Data file holding the payload
    pub data_path: PathBuf,
    /// Entry from the index
    pub entry: FileEntry,
}

/// Archives under `<game>/game/sqpack` plus the cache for their indexes
///
/// Every read opens its own data file handle, so one repository can serve
/// concurrent reads.
pub struct Repository {
    root: PathBuf,
    cache: Box<dyn IndexCache>,
}

impl Repository {
    /// Open the installation at `game_dir`
    pub fn open(game_dir: impl AsRef<Path>, cache: Box<dyn IndexCache>) -> Result<Self> {
        let root = game_dir.as_ref().join("game").join("sqpack");
        if !root.is_dir() {
            return Err(StorageError::RootNotFound(root));
        }

        debug!("Opened SqPack root {:?}", root);
        Ok(Self { root, cache })
    }

    /// `game/sqpack` directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Index files below the root, sorted by path
    ///
    /// With `archive`, only indexes of that archive are returned and finding
    /// none is an error.
    pub fn index_files(&self, archive: Option<&str>) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("index")
            {
                continue;
            }
            if archive.is_some_and(|name| archive_name(path) != Some(name)) {
                continue;
            }
            found.push(path.to_path_buf());
        }

        found.sort();
        match archive {
            Some(name) if found.is_empty() => Err(StorageError::IndexNotFound(name.to_string())),
            _ => Ok(found),
        }
    }

    /// Snapshot of one index, from the cache when its digest is known
    pub fn load_index(&self, index_path: &Path) -> Result<IndexSnapshot> {
        let bytes = fs::read(index_path)?;
        let key = Sha1Digest::from_data(&bytes);

        match self.cache.get(&key) {
            Ok(Some(snapshot)) => return Ok(snapshot),
            Ok(None) => {}
            Err(e) => warn!("Index cache lookup failed for {:?}: {}", index_path, e),
        }

        info!("Parsing {:?}, this may take a while...", index_path);
        let snapshot = IndexReader::new(Cursor::new(bytes))?.snapshot()?;
        if let Err(e) = self.cache.put(&key, &snapshot) {
            warn!("Failed to cache index {:?}: {}", index_path, e);
        }

        Ok(snapshot)
    }

    /// Resolve `path`; the first index in path order that lists it wins
    pub fn locate(&self, path: &ArchivePath) -> Result<Option<Location>> {
        let hashes = path.hashes();

        for index_path in self.index_files(path.archive())? {
            let snapshot = self.load_index(&index_path)?;
            if let Some(entry) = snapshot.lookup(hashes.folder, hashes.file) {
                let data_path = index_path.with_extension(entry.data_file_extension());
                debug!("{} found in {:?} at offset {}", path, data_path, entry.offset);
                return Ok(Some(Location {
                    index_path,
                    data_path,
                    entry,
                }));
            }
        }

        Ok(None)
    }

    /// Decode the payload at `path`, or `None` if no index lists it
    pub fn read(&self, path: &ArchivePath) -> Result<Option<Vec<u8>>> {
        let Some(location) = self.locate(path)? else {
            return Ok(None);
        };

        let file = File::open(&location.data_path)?;
        let mut reader = DataReader::new(BufReader::new(file))?;
        Ok(Some(reader.get_file_data(location.entry.offset)?))
    }
}

/// Archive name of an index file: its file name up to the first `.`
pub fn archive_name(index_path: &Path) -> Option<&str> {
    let name = index_path.file_name()?.to_str()?;
    Some(name.split_once('.').map_or(name, |(stem, _)| stem))
}
