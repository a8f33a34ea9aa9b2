//! Immutable folder → file → offset map built from one index file
//!
//! A snapshot is what callers keep after the index stream is gone. It
//! serializes to JSON as nested objects keyed by decimal hash strings, which
//! is the form the side cache persists.

use super::entry::{FileEntry, FolderEntry};
use serde::{Deserialize, Serialize};
use sqpack_crypto::{NameHash, hash_path};
use std::collections::HashMap;

/// Materialized two-level hash map of one index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexSnapshot {
    folders: HashMap<NameHash, HashMap<NameHash, u64>>,
}

impl IndexSnapshot {
    /// Build a snapshot from materialized folders
    pub fn from_folders(folders: impl IntoIterator<Item = FolderEntry>) -> Self {
        let folders = folders
            .into_iter()
            .map(|folder| {
                let files = folder
                    .files
                    .into_values()
                    .map(|file| (file.hash, file.offset))
                    .collect();
                (folder.hash, files)
            })
            .collect();
        Self { folders }
    }

    /// Resolve a folder/file hash pair; `None` when either level is absent
    pub fn lookup(&self, folder: NameHash, file: NameHash) -> Option<FileEntry> {
        self.folders
            .get(&folder)?
            .get(&file)
            .map(|&offset| FileEntry::new(file, offset))
    }

    /// Resolve a path, normalizing and hashing it first
    pub fn lookup_path(&self, path: &str) -> Option<FileEntry> {
        let hashes = hash_path(path);
        self.lookup(hashes.folder, hashes.file)
    }

    /// Folder with the given hash, files included
    pub fn folder(&self, hash: NameHash) -> Option<FolderEntry> {
        let files = self.folders.get(&hash)?;
        let mut folder = FolderEntry::new(hash);
        for (&file, &offset) in files {
            folder.insert(FileEntry::new(file, offset));
        }
        Some(folder)
    }

    /// Number of folders, empty ones included
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Number of files across all folders
    pub fn file_count(&self) -> usize {
        self.folders.values().map(HashMap::len).sum()
    }

    /// Whether the snapshot holds no folders
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Iterate folder hashes with their file maps, in no particular order
    pub fn folders(&self) -> impl Iterator<Item = (NameHash, &HashMap<NameHash, u64>)> {
        self.folders.iter().map(|(&hash, files)| (hash, files))
    }
}

impl FromIterator<FolderEntry> for IndexSnapshot {
    fn from_iter<I: IntoIterator<Item = FolderEntry>>(iter: I) -> Self {
        Self::from_folders(iter)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn sample() -> IndexSnapshot {
        let mut exd = FolderEntry::new(NameHash::of("exd"));
        exd.insert(FileEntry::new(NameHash::of("root.exl"), 640));
        let empty = FolderEntry::new(NameHash::of("music/ffxiv"));
        IndexSnapshot::from_folders([exd, empty])
    }

    #[test]
    fn test_lookup_levels() {
        let snapshot = sample();
        assert_eq!(
            snapshot.lookup_path("EXD/Root.exl"),
            Some(FileEntry::new(NameHash::of("root.exl"), 640))
        );
        assert_eq!(snapshot.lookup_path("exd/missing.exh"), None);
        assert_eq!(snapshot.lookup_path("nowhere/root.exl"), None);
        assert_eq!(snapshot.folder_count(), 2);
        assert_eq!(snapshot.file_count(), 1);
        assert!(snapshot.folder(NameHash::of("music/ffxiv")).unwrap().files.is_empty());
    }

    #[test]
    fn test_json_keys_are_decimal_hashes() {
        let mut folder = FolderEntry::new(NameHash::new(7));
        folder.insert(FileEntry::new(NameHash::new(9), 128));
        let snapshot = IndexSnapshot::from_folders([folder]);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"7":{"9":128}}"#);

        let back: IndexSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    proptest! {
        #[test]
        fn lookup_resolves_every_inserted_pair(
            entries in prop::collection::hash_map((any::<u32>(), any::<u32>()), any::<u32>(), 1..64),
            probe in (any::<u32>(), any::<u32>()),
        ) {
            let mut folders: HashMap<u32, FolderEntry> = HashMap::new();
            for (&(folder, file), &raw) in &entries {
                folders
                    .entry(folder)
                    .or_insert_with(|| FolderEntry::new(NameHash::new(folder)))
                    .insert(FileEntry::new(NameHash::new(file), u64::from(raw) * 8));
            }
            let snapshot: IndexSnapshot = folders.into_values().collect();

            for (&(folder, file), &raw) in &entries {
                let found = snapshot.lookup(NameHash::new(folder), NameHash::new(file));
                prop_assert_eq!(found.map(|f| f.offset), Some(u64::from(raw) * 8));
            }

            let found = snapshot.lookup(NameHash::new(probe.0), NameHash::new(probe.1));
            prop_assert_eq!(found.is_some(), entries.contains_key(&probe));
        }
    }
}
