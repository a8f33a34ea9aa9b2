//! Segment descriptor table and segment payload records
//!
//! The table starts right after the archive header. It opens with a 4-byte
//! length, followed by `length / 72 - 1` descriptors. The first descriptor
//! carries 44 reserved bytes, every later one 40. Everything up to
//! `length - 64` is covered by the trailing SHA-1.

use crate::error::{DigestRegion, Result, SqPackError};
use crate::record::{FixedRecord, RecordReader, TRAILING_DIGEST_DISTANCE};
use binrw::{BinRead, BinResult};
use sqpack_crypto::{NameHash, Sha1Digest};
use std::fmt;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Stride used to derive the descriptor count from the table length
pub const DESCRIPTOR_STRIDE: u32 = 72;

/// Smallest table length that still holds the trailing digest
pub const MIN_TABLE_LENGTH: u64 = 4 + TRAILING_DIGEST_DISTANCE;

/// Width of one folder or file record
pub const SEGMENT_RECORD_SIZE: usize = 16;

/// Ordinal identifying a segment by its position in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub u32);

impl SegmentId {
    /// File records
    pub const FILES: Self = Self(1);
    /// Folder records
    pub const FOLDERS: Self = Self(4);
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location and digest of one segment payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// 1-based position in the table
    pub id: SegmentId,
    /// Absolute stream offset of the descriptor itself
    pub start: u64,
    /// Absolute stream offset of the payload
    pub offset: u64,
    /// Payload length in bytes
    pub size: u32,
    /// SHA-1 of the payload
    pub digest: Sha1Digest,
}

/// The 32 meaningful bytes of a descriptor; reserved bytes follow
#[derive(Debug, Clone, Copy, BinRead)]
#[br(little)]
struct DescriptorFields {
    _leading: u32,
    offset: u32,
    size: u32,
    digest: [u8; 20],
}

impl FixedRecord for DescriptorFields {
    const SIZE: usize = 32;

    fn parse(bytes: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(bytes))
    }
}

/// Parsed descriptor table; unused slots are already dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    /// Declared table length
    pub length: u32,
    /// Descriptors in table order
    pub descriptors: Vec<SegmentDescriptor>,
    /// Stored table digest
    pub digest: Sha1Digest,
}

impl SegmentTable {
    /// Parse and verify the table at the current stream position
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut records = RecordReader::at_current(reader)?;
        records.begin_digest();

        let length = records.read_u32()?;
        if u64::from(length) < MIN_TABLE_LENGTH {
            return Err(SqPackError::InvalidLength {
                field: "segment table",
                declared: u64::from(length),
                minimum: MIN_TABLE_LENGTH,
            });
        }

        let total = (length / DESCRIPTOR_STRIDE).saturating_sub(1);
        let mut descriptors = Vec::new();
        for ordinal in 1..=total {
            let start = records.stream_offset();
            let fields: DescriptorFields = records.read_record()?;
            let reserved = if ordinal == 1 { 44 } else { 40 };
            records.read_vec(reserved)?;

            if fields.offset == 0 && fields.size == 0 {
                trace!("Segment {} unused", ordinal);
                continue;
            }

            descriptors.push(SegmentDescriptor {
                id: SegmentId(ordinal),
                start,
                offset: u64::from(fields.offset),
                size: fields.size,
                digest: Sha1Digest::from_bytes(fields.digest),
            });
        }

        let digest = records.finish_guarded_block(
            u64::from(length),
            DigestRegion::SegmentTable,
            "segment table",
        )?;

        debug!(
            "Parsed segment table: {} of {} slots in use",
            descriptors.len(),
            total
        );
        Ok(Self {
            length,
            descriptors,
            digest,
        })
    }

    /// Descriptor for `id`, if the slot is in use
    pub fn get(&self, id: SegmentId) -> Option<&SegmentDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Descriptor for `id`, failing with [`SqPackError::MissingSegment`]
    pub fn require(&self, id: SegmentId) -> Result<&SegmentDescriptor> {
        self.get(id).ok_or(SqPackError::MissingSegment(id.0))
    }
}

/// Read a segment payload and verify it against its descriptor
pub fn read_payload<R: Read + Seek>(
    reader: &mut R,
    descriptor: &SegmentDescriptor,
) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(descriptor.offset))?;
    let mut records = RecordReader::new(reader, descriptor.offset);
    records.begin_digest();
    let data = records.read_vec(descriptor.size as usize)?;
    let actual = records.finish_digest();

    if actual != descriptor.digest {
        return Err(SqPackError::IntegrityMismatch {
            region: DigestRegion::SegmentPayload(descriptor.id.0),
            expected: descriptor.digest,
            actual,
        });
    }
    Ok(data)
}

/// Folder segment record: hash plus 12 reserved bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct FolderRecord {
    /// Hash of the folder path
    #[br(map = |raw: u32| NameHash::new(raw), pad_after = 12)]
    pub folder_hash: NameHash,
}

impl FixedRecord for FolderRecord {
    const SIZE: usize = SEGMENT_RECORD_SIZE;

    fn parse(bytes: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(bytes))
    }
}

/// File segment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct FileRecord {
    /// Hash of the file name
    #[br(map = |raw: u32| NameHash::new(raw))]
    pub file_hash: NameHash,
    /// Hash of the owning folder path
    #[br(map = |raw: u32| NameHash::new(raw))]
    pub folder_hash: NameHash,
    /// True data offset; stored on disk in units of 8 bytes
    #[br(map = |raw: u32| u64::from(raw) * 8, pad_after = 4)]
    pub offset: u64,
}

impl FixedRecord for FileRecord {
    const SIZE: usize = SEGMENT_RECORD_SIZE;

    fn parse(bytes: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(bytes))
    }
}

/// Forward-only sequence of records decoded from a verified payload
///
/// The sequence owns the payload it was built from and cannot be restarted;
/// reading the segment again means going back to the index stream.
#[derive(Debug)]
pub struct SegmentRecords<T> {
    data: Vec<u8>,
    position: usize,
    _record: PhantomData<T>,
}

/// Records of the folder segment
pub type FolderRecords = SegmentRecords<FolderRecord>;

/// Records of the file segment
pub type FileRecords = SegmentRecords<FileRecord>;

impl<T: FixedRecord> SegmentRecords<T> {
    /// Wrap a payload whose length is a multiple of the record width
    pub fn new(data: Vec<u8>) -> Result<Self> {
        if data.len() % T::SIZE != 0 {
            return Err(SqPackError::InvalidLength {
                field: "segment payload",
                declared: data.len() as u64,
                minimum: (data.len().div_ceil(T::SIZE) * T::SIZE) as u64,
            });
        }
        Ok(Self {
            data,
            position: 0,
            _record: PhantomData,
        })
    }
}

impl<T: FixedRecord> Iterator for SegmentRecords<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.data.get(self.position..self.position + T::SIZE)?;
        self.position += T::SIZE;
        Some(T::parse(bytes).map_err(SqPackError::from))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.data.len() - self.position) / T::SIZE;
        (remaining, Some(remaining))
    }
}

impl<T: FixedRecord> ExactSizeIterator for SegmentRecords<T> {}
