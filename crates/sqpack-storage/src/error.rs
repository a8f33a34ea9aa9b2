//! Error types for archive storage operations

use sqpack_formats::SqPackError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive format error: {0}")]
    Format(#[from] SqPackError),

    #[error("SqPack directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Can not find index file of \"{0}\"")]
    IndexNotFound(String),

    #[error("Invalid archive path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
