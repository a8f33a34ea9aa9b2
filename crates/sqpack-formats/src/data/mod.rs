//! Data file reader
//!
//! A data file holds the payloads an index points at. After the archive
//! header comes a data-section header guarded by its own SHA-1; payloads
//! follow at 128-byte aligned offsets. Each payload is a data entry header,
//! a block table, then independently framed blocks.

mod block;
mod entry;

pub use block::{BlockDecompressor, BlockHeader, COMPRESSION_THRESHOLD, MAX_BLOCK_SIZE, inflate};
pub use entry::{BlockTableEntry, CONTENT_TYPE_BINARY, DataEntry, DataEntryHeader};

use crate::error::{DigestRegion, Result, SqPackError};
use crate::header::{ArchiveHeader, FileKind};
use crate::record::{FixedRecord, RecordReader, TRAILING_DIGEST_DISTANCE};
use binrw::{BinRead, BinResult};
use sqpack_crypto::Sha1Digest;
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::debug;

/// Fixed fields opening the data-section header
#[derive(Debug, Clone, Copy, BinRead)]
#[br(little)]
struct DataSectionFields {
    length: u32,
    #[br(pad_before = 8)]
    data_size: u32,
    spanned: u32,
    #[br(pad_before = 4)]
    max_file_size: u32,
    #[br(pad_before = 4)]
    data_digest: [u8; 20],
}

impl FixedRecord for DataSectionFields {
    const SIZE: usize = 52;

    fn parse(bytes: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(bytes))
    }
}

/// Validated data-section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSectionHeader {
    /// Declared header length
    pub length: u32,
    /// Size of the data section in bytes (stored in units of 8)
    pub data_size: u64,
    /// Spanning indicator for multi-file data sets
    pub spanned: u32,
    /// Largest payload size hint
    pub max_file_size: u32,
    /// Stored SHA-1 of the data section
    pub data_digest: Sha1Digest,
    /// Stored SHA-1 of this header
    pub digest: Sha1Digest,
}

impl DataSectionHeader {
    /// Smallest length that still holds the fields and trailing digest
    pub const MIN_LENGTH: u64 = DataSectionFields::SIZE as u64 + TRAILING_DIGEST_DISTANCE;

    /// Parse and verify the data-section header at the current position
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut records = RecordReader::at_current(reader)?;
        records.begin_digest();

        let fields: DataSectionFields = records.read_record()?;
        let length = u64::from(fields.length);
        if length < Self::MIN_LENGTH {
            return Err(SqPackError::InvalidLength {
                field: "data section header",
                declared: length,
                minimum: Self::MIN_LENGTH,
            });
        }

        let digest =
            records.finish_guarded_block(length, DigestRegion::DataSection, "data section header")?;

        Ok(Self {
            length: fields.length,
            data_size: u64::from(fields.data_size) * 8,
            spanned: fields.spanned,
            max_file_size: fields.max_file_size,
            data_digest: Sha1Digest::from_bytes(fields.data_digest),
            digest,
        })
    }
}

/// Reader over one data file
///
/// Like [`IndexReader`](crate::index::IndexReader), the reader owns its
/// stream and repositions it on every call; it is not for concurrent use.
#[derive(Debug)]
pub struct DataReader<R> {
    stream: R,
    header: ArchiveHeader,
    section: DataSectionHeader,
}

impl<R: Read + Seek> DataReader<R> {
    /// Validate the archive header and data-section header of a data stream
    pub fn new(mut stream: R) -> Result<Self> {
        stream.seek(SeekFrom::Start(0))?;
        let header = ArchiveHeader::parse_and_verify(&mut stream, FileKind::Data)?;
        let section = DataSectionHeader::parse(&mut stream)?;
        debug!(
            "Data section: {} bytes, spanned {}, max file size {}",
            section.data_size, section.spanned, section.max_file_size
        );

        Ok(Self {
            stream,
            header,
            section,
        })
    }

    /// Validated archive header
    pub const fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Validated data-section header
    pub const fn section(&self) -> &DataSectionHeader {
        &self.section
    }

    /// Entry header and block table of the payload at `offset`
    pub fn entry(&mut self, offset: u64) -> Result<DataEntry> {
        self.stream.seek(SeekFrom::Start(offset))?;
        let mut records = RecordReader::new(&mut self.stream, offset);
        DataEntry::parse(&mut records)
    }

    /// Decode the payload whose entry header starts at `offset`
    ///
    /// Blocks are decoded in table order and concatenated. The result must
    /// be exactly as long as the block table's decompressed lengths add up to.
    pub fn get_file_data(&mut self, offset: u64) -> Result<Vec<u8>> {
        let entry = self.entry(offset)?;
        let blocks_start = offset + u64::from(entry.header.header_length);

        // Table lengths are unverified until decoded; reserve at most one block
        let expected = entry.declared_size();
        let mut data = Vec::with_capacity(expected.min(MAX_BLOCK_SIZE));
        let mut decompressor = BlockDecompressor::new(&mut self.stream);
        for block in &entry.blocks {
            let decoded = decompressor.decode(blocks_start + u64::from(block.offset))?;
            data.extend_from_slice(&decoded);
        }

        if data.len() != expected {
            return Err(SqPackError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        debug!(
            "Decoded {} bytes from {} blocks at offset {}",
            data.len(),
            entry.blocks.len(),
            offset
        );
        Ok(data)
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> R {
        self.stream
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqpack_test_utils::{Block, DataImage};

    #[test]
    fn test_section_header_fields() {
        let image = DataImage::new().with_spanned(1).build();
        let reader = DataReader::new(Cursor::new(image)).unwrap();

        assert_eq!(reader.header().length, 1024);
        assert_eq!(reader.section().length, 1024);
        assert_eq!(reader.section().spanned, 1);
        assert_eq!(reader.section().data_size % 8, 0);
    }

    #[test]
    fn test_section_digest_mismatch() {
        let mut image = DataImage::new().build();
        // Byte inside the hashed padding of the data-section header
        image[1024 + 200] ^= 0x01;
        assert!(matches!(
            DataReader::new(Cursor::new(image)),
            Err(SqPackError::IntegrityMismatch {
                region: DigestRegion::DataSection,
                ..
            })
        ));
    }

    #[test]
    fn test_index_file_rejected() {
        let image = sqpack_test_utils::IndexImage::new().build();
        assert!(matches!(
            DataReader::new(Cursor::new(image)),
            Err(SqPackError::UnexpectedFileKind {
                expected: 1,
                actual: 2,
            })
        ));
    }

    #[test]
    fn test_single_block_entry() {
        let mut image = DataImage::new();
        let raw = image.add_entry(&[Block::Compressed(b"hello sqpack".to_vec())]);
        let mut reader = DataReader::new(Cursor::new(image.build())).unwrap();

        let data = reader.get_file_data(u64::from(raw) * 8).unwrap();
        assert_eq!(data, b"hello sqpack");
    }

    #[test]
    fn test_repeated_reads_on_one_reader() {
        let mut image = DataImage::new();
        let first = image.add_entry(&[Block::Stored(vec![1; 10])]);
        let second = image.add_entry(&[Block::Compressed(vec![2; 5000])]);
        let mut reader = DataReader::new(Cursor::new(image.build())).unwrap();

        assert_eq!(reader.get_file_data(u64::from(second) * 8).unwrap(), vec![2; 5000]);
        assert_eq!(reader.get_file_data(u64::from(first) * 8).unwrap(), vec![1; 10]);
        assert_eq!(reader.get_file_data(u64::from(second) * 8).unwrap(), vec![2; 5000]);
    }

    #[test]
    fn test_size_mismatch_against_table() {
        let mut image = DataImage::new();
        let raw = image.add_entry_with_declared(&[Block::Stored(vec![9; 100])], &[99]);
        let mut reader = DataReader::new(Cursor::new(image.build())).unwrap();

        assert!(matches!(
            reader.get_file_data(u64::from(raw) * 8),
            Err(SqPackError::SizeMismatch {
                expected: 99,
                actual: 100,
            })
        ));
    }

    #[test]
    fn test_unsupported_content_type() {
        let mut image = DataImage::new();
        let raw = image.add_entry_with_content_type(3, &[Block::Stored(vec![0; 4])]);
        let mut reader = DataReader::new(Cursor::new(image.build())).unwrap();

        assert!(matches!(
            reader.get_file_data(u64::from(raw) * 8),
            Err(SqPackError::UnsupportedContentType(3))
        ));
    }

    #[test]
    fn test_huge_block_table_fails_without_reserving() {
        let mut image = DataImage::new().build();
        let offset = image.len() as u64;
        let rows: u32 = 1 << 21;

        for field in [24 + 8 * rows, CONTENT_TYPE_BINARY, 0, 0, 16000, rows] {
            image.extend_from_slice(&field.to_le_bytes());
        }
        for _ in 0..rows {
            image.extend_from_slice(&0u32.to_le_bytes());
            image.extend_from_slice(&16u16.to_le_bytes());
            image.extend_from_slice(&u16::MAX.to_le_bytes());
        }

        let mut reader = DataReader::new(Cursor::new(image)).unwrap();
        assert_eq!(reader.entry(offset).unwrap().declared_size(), 65_535 << 21);
        assert!(matches!(
            reader.get_file_data(offset),
            Err(SqPackError::UnexpectedEndOfStream { available: 0, .. })
        ));
    }

    #[test]
    fn test_offset_past_end() {
        let image = DataImage::new().build();
        let len = image.len() as u64;
        let mut reader = DataReader::new(Cursor::new(image)).unwrap();
        assert!(matches!(
            reader.get_file_data(len + 128),
            Err(SqPackError::UnexpectedEndOfStream { available: 0, .. })
        ));
    }
}
