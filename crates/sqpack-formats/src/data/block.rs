//! Block framing and decompression
//!
//! Each block starts with a 16-byte sub-header (length, reserved, compressed
//! length, decompressed length) padded to its declared length. A compressed
//! length below [`COMPRESSION_THRESHOLD`] means the payload is raw DEFLATE;
//! anything else marks a stored block of `decompressed` bytes.

use crate::error::{Result, SqPackError};
use crate::record::{FixedRecord, RecordReader};
use binrw::{BinRead, BinResult};
use flate2::read::DeflateDecoder;
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::trace;

/// Compressed lengths at or above this value mark a stored block
pub const COMPRESSION_THRESHOLD: u32 = 32000;

/// Upper bound on the bytes a single block may produce
pub const MAX_BLOCK_SIZE: usize = 1 << 20;

/// Fixed part of a block sub-header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct BlockHeader {
    /// Sub-header length, padding included
    pub header_length: u32,
    /// Payload length when compressed
    #[br(pad_before = 4)]
    pub compressed_length: u32,
    /// Length after decompression
    pub decompressed_length: u32,
}

impl FixedRecord for BlockHeader {
    const SIZE: usize = 16;

    fn parse(bytes: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(bytes))
    }
}

impl BlockHeader {
    /// Whether the payload must be inflated
    pub const fn is_compressed(&self) -> bool {
        self.compressed_length < COMPRESSION_THRESHOLD
    }

    /// Bytes stored on disk after the sub-header
    pub const fn stored_length(&self) -> u32 {
        if self.is_compressed() {
            self.compressed_length
        } else {
            self.decompressed_length
        }
    }
}

/// Decodes blocks at absolute offsets of a data stream
pub struct BlockDecompressor<'a, R> {
    stream: &'a mut R,
}

impl<'a, R: Read + Seek> BlockDecompressor<'a, R> {
    /// Borrow `stream` for the duration of a decode
    pub fn new(stream: &'a mut R) -> Self {
        Self { stream }
    }

    /// Decode the block whose sub-header starts at `start`
    pub fn decode(&mut self, start: u64) -> Result<Vec<u8>> {
        self.stream.seek(SeekFrom::Start(start))?;
        let mut records = RecordReader::new(&mut *self.stream, start);

        let header: BlockHeader = records.read_record()?;
        records.skip_to(u64::from(header.header_length), "block header")?;

        let stored = header.stored_length() as usize;
        if stored > MAX_BLOCK_SIZE {
            return Err(SqPackError::DecompressionFailure(format!(
                "block at {start} declares {stored} bytes, limit is {MAX_BLOCK_SIZE}"
            )));
        }

        let payload = records.read_vec(stored)?;
        trace!(
            "Block at {}: {} stored bytes, compressed: {}",
            start,
            stored,
            header.is_compressed()
        );

        if header.is_compressed() {
            inflate(&payload)
        } else {
            Ok(payload)
        }
    }
}

/// Inflate a raw DEFLATE buffer, refusing output beyond [`MAX_BLOCK_SIZE`]
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    DeflateDecoder::new(compressed)
        .take(MAX_BLOCK_SIZE as u64 + 1)
        .read_to_end(&mut output)
        .map_err(|e| SqPackError::DecompressionFailure(e.to_string()))?;

    if output.len() > MAX_BLOCK_SIZE {
        return Err(SqPackError::DecompressionFailure(format!(
            "inflated block exceeds {MAX_BLOCK_SIZE} bytes"
        )));
    }
    Ok(output)
}
