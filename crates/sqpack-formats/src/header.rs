//! Archive header shared by index and data files
//!
//! Layout (little-endian):
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 12 | signature `SqPack\0\0\0\0\0\0` |
//! | 12 | 4 | header length, padding included |
//! | 16 | 4 | reserved |
//! | 20 | 4 | file kind |
//! | 24 | 936 | reserved |
//! | 960 | 20 | SHA-1 over bytes 0..960 |
//!
//! Padding follows the digest up to the declared length.

use crate::error::{DigestRegion, Result, SqPackError};
use crate::record::RecordReader;
use sqpack_crypto::Sha1Digest;
use std::fmt;
use std::io::{Read, Seek};
use tracing::debug;

/// Magic bytes opening every SqPack file
pub const SIGNATURE: [u8; 12] = *b"SqPack\0\0\0\0\0\0";

/// Bytes covered by the header digest
pub const HASHED_LENGTH: u64 = 960;

/// Smallest header length that still holds the digest
pub const MIN_HEADER_LENGTH: u64 = HASHED_LENGTH + 20;

/// Kind tag stored in the archive header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FileKind {
    /// `.dat*` payload file
    Data = 1,
    /// `.index` hash table
    Index = 2,
}

impl FileKind {
    /// Numeric tag as stored on disk
    pub const fn tag(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => f.write_str("data"),
            Self::Index => f.write_str("index"),
        }
    }
}

/// Validated archive header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Declared header length; the next structure starts here
    pub length: u32,
    /// File kind the header was validated against
    pub kind: FileKind,
    /// Stored header digest
    pub digest: Sha1Digest,
}

impl ArchiveHeader {
    /// Parse and verify the header at the current stream position
    ///
    /// Checks run in order: signature, file kind, digest, then the declared
    /// length. On success the stream sits at the end of that length.
    pub fn parse_and_verify<R: Read + Seek>(reader: &mut R, expected: FileKind) -> Result<Self> {
        let mut records = RecordReader::at_current(reader)?;
        records.begin_digest();

        let signature = records.read_array::<12>()?;
        if signature != SIGNATURE {
            return Err(SqPackError::CorruptArchive(signature));
        }

        let length = records.read_u32()?;
        records.read_array::<4>()?;
        let kind = records.read_u32()?;
        if kind != expected.tag() {
            return Err(SqPackError::UnexpectedFileKind {
                expected: expected.tag(),
                actual: kind,
            });
        }

        records.skip_to(HASHED_LENGTH, "archive header")?;
        let digest = records.verify_digest(DigestRegion::ArchiveHeader)?;
        if u64::from(length) < MIN_HEADER_LENGTH {
            return Err(SqPackError::InvalidLength {
                field: "archive header",
                declared: u64::from(length),
                minimum: MIN_HEADER_LENGTH,
            });
        }
        records.skip_to(u64::from(length), "archive header")?;

        debug!("Validated {} header, length {}", expected, length);
        Ok(Self {
            length,
            kind: expected,
            digest,
        })
    }
}
