//! Folder and file entries materialized from an index

use sqpack_crypto::NameHash;
use std::collections::HashMap;

/// Number of physical data files an offset can select between
pub const DATA_FILE_COUNT: u64 = 2;

/// One file of a folder: name hash and where its payload lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileEntry {
    /// Hash of the lower-cased file name
    pub hash: NameHash,
    /// True byte offset inside the data file
    pub offset: u64,
}

impl FileEntry {
    /// Create an entry from a name hash and true offset
    pub const fn new(hash: NameHash, offset: u64) -> Self {
        Self { hash, offset }
    }

    /// Which data file holds the payload: `(offset & 0xF) % 2`
    pub const fn data_file_id(&self) -> u8 {
        ((self.offset & 0xF) % DATA_FILE_COUNT) as u8
    }

    /// File extension of the data file holding the payload
    pub fn data_file_extension(&self) -> String {
        format!("dat{}", self.data_file_id())
    }
}

/// One folder of an index with all of its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    /// Hash of the lower-cased, `/`-joined folder path
    pub hash: NameHash,
    /// Files keyed by name hash
    pub files: HashMap<NameHash, FileEntry>,
}

impl FolderEntry {
    /// Create a folder without files
    pub fn new(hash: NameHash) -> Self {
        Self {
            hash,
            files: HashMap::new(),
        }
    }

    /// Add a file, replacing any earlier entry with the same hash
    pub fn insert(&mut self, file: FileEntry) {
        self.files.insert(file.hash, file);
    }

    /// File with the given name hash
    pub fn file(&self, hash: NameHash) -> Option<&FileEntry> {
        self.files.get(&hash)
    }
}
