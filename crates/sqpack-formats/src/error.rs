//! Error types for SqPack parsing

use sqpack_crypto::Sha1Digest;
use std::fmt;
use thiserror::Error;

/// Result type for SqPack parsing operations
pub type Result<T> = std::result::Result<T, SqPackError>;

/// Region of an archive guarded by a SHA-1 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestRegion {
    /// Archive header shared by index and data files
    ArchiveHeader,
    /// Data-section header of a data file
    DataSection,
    /// Segment descriptor table of an index file
    SegmentTable,
    /// Payload of the segment with the given id
    SegmentPayload(u32),
}

impl fmt::Display for DigestRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArchiveHeader => f.write_str("archive header"),
            Self::DataSection => f.write_str("data section header"),
            Self::SegmentTable => f.write_str("segment table"),
            Self::SegmentPayload(id) => write!(f, "segment {id} payload"),
        }
    }
}

/// Errors raised while decoding SqPack archives
///
/// Every variant is fatal for the operation that produced it. A lookup that
/// simply finds nothing is reported as `None`, never as an error.
#[derive(Debug, Error)]
pub enum SqPackError {
    /// Signature bytes do not identify a SqPack file
    #[error("invalid SqPack signature: {0:02x?}")]
    CorruptArchive([u8; 12]),

    /// File-kind tag does not match the reader in use
    #[error("unexpected file kind: expected {expected}, got {actual}")]
    UnexpectedFileKind {
        /// Tag required by the reader
        expected: u32,
        /// Tag found in the header
        actual: u32,
    },

    /// Recomputed digest disagrees with the stored one
    #[error("{region} digest mismatch: stored {expected}, computed {actual}")]
    IntegrityMismatch {
        /// Region the digest covers
        region: DigestRegion,
        /// Digest stored in the archive
        expected: Sha1Digest,
        /// Digest computed over the bytes read
        actual: Sha1Digest,
    },

    /// Stream ended before a field or payload was complete
    #[error(
        "unexpected end of stream at offset {offset}: requested {requested} bytes, {available} available"
    )]
    UnexpectedEndOfStream {
        /// Stream offset where the read started
        offset: u64,
        /// Bytes requested
        requested: usize,
        /// Bytes actually available
        available: usize,
    },

    /// Data entry uses a content type other than block-compressed binary
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(u32),

    /// Reconstructed payload length differs from the block table total
    #[error("size mismatch: expected {expected} bytes, reconstructed {actual}")]
    SizeMismatch {
        /// Sum of declared decompressed block lengths
        expected: usize,
        /// Length actually reconstructed
        actual: usize,
    },

    /// Block payload could not be inflated
    #[error("decompression failed: {0}")]
    DecompressionFailure(String),

    /// Declared length is too small for the fields it must contain
    #[error("invalid {field} length: declared {declared}, need at least {minimum}")]
    InvalidLength {
        /// Structure whose length is invalid
        field: &'static str,
        /// Declared length
        declared: u64,
        /// Smallest acceptable length
        minimum: u64,
    },

    /// Index file lacks a segment required for lookups
    #[error("segment {0} missing from index")]
    MissingSegment(u32),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SqPackError::UnsupportedContentType(3);
        assert_eq!(err.to_string(), "unsupported content type: 3");

        let err = SqPackError::UnexpectedFileKind {
            expected: 2,
            actual: 1,
        };
        assert!(err.to_string().contains("expected 2, got 1"));

        let err = SqPackError::IntegrityMismatch {
            region: DigestRegion::SegmentPayload(4),
            expected: Sha1Digest::from_data(b"a"),
            actual: Sha1Digest::from_data(b"b"),
        };
        assert!(err.to_string().starts_with("segment 4 payload digest mismatch"));

        let err = SqPackError::SizeMismatch {
            expected: 10,
            actual: 9,
        };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains('9'));
    }
}
