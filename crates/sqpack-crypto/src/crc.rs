//! Path hash used as the SqPack index key space
//!
//! Index files never store names, only 32-bit hashes of them. The scheme is
//! CRC-32 with the reflected polynomial `0xEDB88320` and initial value
//! `0xFFFFFFFF` but without the final XOR (CRC-32/JAMCRC), which makes it the
//! bitwise complement of the zlib CRC-32.
//!
//! Hashing is case-sensitive. Callers hashing paths must lower-case them
//! first; [`hash_path`] does this for full archive paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash a name exactly as given
///
/// # Examples
///
/// ```
/// use sqpack_crypto::crc::hash;
///
/// assert_eq!(hash("123456789"), 0x340b_c6d9);
/// ```
pub fn hash(name: &str) -> u32 {
    hash_bytes(name.as_bytes())
}

/// Hash raw bytes
pub fn hash_bytes(data: &[u8]) -> u32 {
    !crc32fast::hash(data)
}

/// Incremental form of [`hash_bytes`]
///
/// Cloning a hasher that has already consumed a common prefix is the cheap
/// way to hash many names sharing that prefix.
#[derive(Debug, Clone, Default)]
pub struct NameHasher(crc32fast::Hasher);

impl NameHasher {
    /// Create an empty hasher
    pub fn new() -> Self {
        Self(crc32fast::Hasher::new())
    }

    /// Feed more bytes
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Produce the hash of everything fed so far
    pub fn finalize(self) -> u32 {
        !self.0.finalize()
    }
}

/// Hash of one folder path or file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameHash(u32);

impl NameHash {
    /// Wrap a raw hash value
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Hash a name exactly as given
    pub fn of(name: &str) -> Self {
        Self(hash(name))
    }

    /// Raw hash value
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for NameHash {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Folder and file hash pair identifying one archive path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathHash {
    /// Hash of the `/`-joined folder segments
    pub folder: NameHash,
    /// Hash of the last segment
    pub file: NameHash,
}

impl fmt::Display for PathHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder, self.file)
    }
}

/// Hash a full archive path into its folder and file components
///
/// The path is lower-cased and split on `/`; empty segments are ignored, so
/// `"/Exd//root.exl"` hashes the same as `"exd/root.exl"`. A path without a
/// folder hashes an empty folder string.
pub fn hash_path(path: &str) -> PathHash {
    let lowered = path.to_lowercase();
    let segments: Vec<&str> = lowered.split('/').filter(|s| !s.is_empty()).collect();

    let (file, folders) = match segments.split_last() {
        Some((file, folders)) => (*file, folders),
        None => ("", &[][..]),
    };

    PathHash {
        folder: NameHash::of(&folders.join("/")),
        file: NameHash::of(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_vectors() {
        let test_cases = [
            ("", 0xffff_ffff),
            ("a", 0x1748_41bc),
            ("abc", 0xcadb_be3d),
            ("123456789", 0x340b_c6d9),
            ("The quick brown fox jumps over the lazy dog", 0xbeb0_5cc6),
            ("exd", 0xe39b_7999),
            ("root.exl", 0x51b5_7ebc),
            ("chara/equipment/e0001/model", 0x2aa8_b6af),
        ];

        for (name, expected) in test_cases {
            let result = hash(name);
            assert_eq!(
                result, expected,
                "Hash mismatch for {name:?}: got 0x{result:08x}, expected 0x{expected:08x}"
            );
        }
    }

    #[test]
    fn test_hash_is_case_sensitive() {
        assert_ne!(hash("EXD"), hash("exd"));
    }

    #[test]
    fn test_hash_path_splits_folder_and_file() {
        let hashes = hash_path("exd/root.exl");
        assert_eq!(hashes.folder.get(), 0xe39b_7999);
        assert_eq!(hashes.file.get(), 0x51b5_7ebc);
    }

    #[test]
    fn test_hash_path_normalizes() {
        assert_eq!(hash_path("/EXD//Root.exl"), hash_path("exd/root.exl"));
        assert_eq!(
            hash_path("chara/equipment/e0001/model/file.mdl").folder,
            NameHash::of("chara/equipment/e0001/model")
        );
    }

    #[test]
    fn test_hash_path_without_folder() {
        let hashes = hash_path("root.exl");
        assert_eq!(hashes.folder, NameHash::of(""));
        assert_eq!(hashes.file, NameHash::of("root.exl"));
    }

    #[test]
    fn test_name_hash_display() {
        assert_eq!(NameHash::new(0x0000_00ab).to_string(), "000000ab");
        assert_eq!(
            hash_path("exd/root.exl").to_string(),
            "e39b7999/51b57ebc"
        );
    }

    #[test]
    fn test_name_hash_serializes_as_number() {
        let json = serde_json::to_string(&NameHash::new(42)).unwrap_or_default();
        assert_eq!(json, "42");
    }

    proptest! {
        #[test]
        fn incremental_hash_matches_one_shot(prefix in "[a-z_/]{0,16}", rest in "[a-z0-9.]{0,16}") {
            let mut hasher = NameHasher::new();
            hasher.update(prefix.as_bytes());
            hasher.update(rest.as_bytes());
            prop_assert_eq!(hasher.finalize(), hash(&format!("{prefix}{rest}")));
        }
    }
}
