//! Game directory access for SqPack archives
//!
//! Ties the format parsers to an installation on disk: resolves
//! `archive:folder/file` paths against every index under `game/sqpack`,
//! keeps parsed indexes in a side cache keyed by the index file's SHA-1, and
//! persists the game location between runs.
//!
//! ```no_run
//! use sqpack_storage::{ArchivePath, JsonIndexCache, Repository};
//!
//! let cache = JsonIndexCache::new("/tmp/sqpack-cache");
//! let repo = Repository::open("/games/ffxiv", Box::new(cache))?;
//! let path = ArchivePath::parse("0a0000:exd/root.exl")?;
//! if let Some(bytes) = repo.read(&path)? {
//!     println!("{} bytes", bytes.len());
//! }
//! # Ok::<(), sqpack_storage::StorageError>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod path;
pub mod repository;

pub use cache::{IndexCache, JsonIndexCache, MemoryIndexCache, NoCache};
pub use config::{ConfigManager, StorageConfig, default_cache_dir, default_config_path};
pub use error::{Result, StorageError};
pub use path::ArchivePath;
pub use repository::{Location, Repository, archive_name};
