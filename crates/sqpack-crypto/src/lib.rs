//! Hashing primitives for SqPack archives
//!
//! This crate provides the hash functions used throughout the SqPack
//! system for path lookup, integrity verification, and offline name
//! recovery.
//!
//! # Components
//!
//! - **Path hashing**: CRC-32/JAMCRC over lower-cased folder and file names,
//!   the key space of every index file
//! - **Integrity**: SHA-1 digests stored next to headers and segments
//! - **Preimage search**: bounded brute-force recovery of short names from a
//!   known path hash
//!
//! # Examples
//!
//! ## Path Hashing
//!
//! ```
//! use sqpack_crypto::crc::{hash, hash_path};
//!
//! let hashes = hash_path("exd/root.exl");
//! assert_eq!(hashes.folder.get(), hash("exd"));
//! assert_eq!(hashes.file.get(), hash("root.exl"));
//! ```
//!
//! ## Integrity Digests
//!
//! ```
//! use sqpack_crypto::Sha1Digest;
//!
//! let digest = Sha1Digest::from_data(b"abc");
//! assert_eq!(digest.to_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
//! ```
//!
//! ## Preimage Search
//!
//! ```
//! use sqpack_crypto::{crc, preimage};
//!
//! let target = crc::hash("abc");
//! assert_eq!(preimage::guess(target, 3, None, None).as_deref(), Some("abc"));
//! ```

#![warn(missing_docs)]

pub mod crc;
pub mod digest;
pub mod error;
pub mod preimage;

pub use crc::{NameHash, PathHash, hash, hash_path};
pub use digest::{Sha1Digest, Sha1Hasher};
pub use error::CryptoError;
pub use preimage::{PreimageSearch, guess};
