//! Data entry header and block table

use crate::error::{Result, SqPackError};
use crate::record::{FixedRecord, RecordReader};
use binrw::{BinRead, BinResult};
use std::io::{Cursor, Read};

/// Content type of block-compressed binary entries, the only one supported
pub const CONTENT_TYPE_BINARY: u32 = 2;

/// Fixed 24-byte part of a data entry header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct DataEntryHeader {
    /// Header length including block table and padding
    pub header_length: u32,
    /// Content type code
    pub content_type: u32,
    /// Size of the reconstructed payload
    #[br(pad_after = 4)]
    pub uncompressed_size: u32,
    /// Buffer size hint for block decoding
    pub block_buffer_size: u32,
    /// Number of block table entries
    pub block_count: u32,
}

impl FixedRecord for DataEntryHeader {
    const SIZE: usize = 24;

    fn parse(bytes: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(bytes))
    }
}

/// One row of the block table
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct BlockTableEntry {
    /// Block start relative to the end of the entry header
    pub offset: u32,
    /// Compressed length as listed in the table
    pub compressed_length: u16,
    /// Decompressed length as listed in the table
    pub decompressed_length: u16,
}

impl FixedRecord for BlockTableEntry {
    const SIZE: usize = 8;

    fn parse(bytes: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(bytes))
    }
}

/// Entry header with its block table, ready for block decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    /// Fixed header fields
    pub header: DataEntryHeader,
    /// Block table in decode order
    pub blocks: Vec<BlockTableEntry>,
}

impl DataEntry {
    /// Parse an entry header at the current position of `reader`
    ///
    /// Content types other than [`CONTENT_TYPE_BINARY`] are rejected as soon
    /// as the fixed fields are read. On success the reader sits at the end of
    /// the declared header length.
    pub fn parse<R: Read>(records: &mut RecordReader<'_, R>) -> Result<Self> {
        let header: DataEntryHeader = records.read_record()?;
        if header.content_type != CONTENT_TYPE_BINARY {
            return Err(SqPackError::UnsupportedContentType(header.content_type));
        }

        let table_end = DataEntryHeader::SIZE as u64
            + u64::from(header.block_count) * BlockTableEntry::SIZE as u64;
        if u64::from(header.header_length) < table_end {
            return Err(SqPackError::InvalidLength {
                field: "data entry header",
                declared: u64::from(header.header_length),
                minimum: table_end,
            });
        }

        let blocks = (0..header.block_count)
            .map(|_| records.read_record())
            .collect::<Result<Vec<BlockTableEntry>>>()?;
        records.skip_to(u64::from(header.header_length), "data entry header")?;

        Ok(Self { header, blocks })
    }

    /// Sum of the decompressed lengths listed in the block table
    pub fn declared_size(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| usize::from(block.decompressed_length))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn header_bytes(length: u32, content_type: u32, blocks: &[(u32, u16, u16)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for field in [length, content_type, 300, 0, 16000, blocks.len() as u32] {
            bytes.extend_from_slice(&field.to_le_bytes());
        }
        for &(offset, compressed, decompressed) in blocks {
            bytes.extend_from_slice(&offset.to_le_bytes());
            bytes.extend_from_slice(&compressed.to_le_bytes());
            bytes.extend_from_slice(&decompressed.to_le_bytes());
        }
        bytes.resize(length as usize, 0);
        bytes
    }

    #[test]
    fn test_parse_block_table() {
        let bytes = header_bytes(128, 2, &[(0, 100, 200), (128, 50, 100)]);
        let mut cursor = Cursor::new(bytes);
        let mut records = RecordReader::new(&mut cursor, 0);
        let entry = DataEntry::parse(&mut records).unwrap();

        assert_eq!(entry.header.uncompressed_size, 300);
        assert_eq!(entry.header.block_buffer_size, 16000);
        assert_eq!(entry.blocks.len(), 2);
        assert_eq!(entry.blocks[1].offset, 128);
        assert_eq!(entry.declared_size(), 300);
        assert_eq!(records.position(), 128);
    }

    #[test]
    fn test_unsupported_content_types_carry_code() {
        for code in [0u32, 1, 3, 4, 0xFFFF_FFFF] {
            let bytes = header_bytes(128, code, &[]);
            let mut cursor = Cursor::new(bytes);
            let mut records = RecordReader::new(&mut cursor, 0);
            let err = DataEntry::parse(&mut records).unwrap_err();
            assert!(matches!(err, SqPackError::UnsupportedContentType(c) if c == code));
        }
    }

    #[test]
    fn test_header_too_short_for_table() {
        let mut bytes = header_bytes(128, 2, &[(0, 1, 1); 4]);
        bytes[0..4].copy_from_slice(&40u32.to_le_bytes());
        let mut cursor = Cursor::new(bytes);
        let mut records = RecordReader::new(&mut cursor, 0);
        assert!(matches!(
            DataEntry::parse(&mut records),
            Err(SqPackError::InvalidLength {
                declared: 40,
                minimum: 56,
                ..
            })
        ));
    }
}
