//! `archive:folder/file` addressing

use crate::error::{Result, StorageError};
use sqpack_crypto::{PathHash, hash_path};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Path of one file inside the archives, optionally pinned to one archive
///
/// Segments keep the case they were given in, so output files are named
/// the way the user typed them; hashing lower-cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchivePath {
    archive: Option<String>,
    segments: Vec<String>,
}

impl ArchivePath {
    /// Parse `archive:folder/file` or `folder/file`
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason| StorageError::InvalidPath {
            path: input.to_string(),
            reason,
        };

        let (archive, path) = match input.split_once(':') {
            Some(("", _)) => return Err(invalid("empty archive name")),
            Some((archive, path)) => (Some(archive.to_string()), path),
            None => (None, input),
        };

        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return Err(invalid("no file name"));
        }
        if segments.iter().any(|s| s == "." || s == "..") {
            return Err(invalid("relative segments are not allowed"));
        }

        Ok(Self { archive, segments })
    }

    /// Archive the path is pinned to, if any
    pub fn archive(&self) -> Option<&str> {
        self.archive.as_deref()
    }

    /// Folder segments, file name excluded
    pub fn folders(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Last segment
    pub fn file_name(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// `/`-joined path without the archive prefix
    pub fn relative(&self) -> String {
        self.segments.join("/")
    }

    /// Folder and file hashes of the lower-cased path
    pub fn hashes(&self) -> PathHash {
        hash_path(&self.relative())
    }

    /// Where an extracted copy goes under `base`
    pub fn output_path(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

impl FromStr for ArchivePath {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(archive) = &self.archive {
            write!(f, "{archive}:")?;
        }
        f.write_str(&self.relative())
    }
}
