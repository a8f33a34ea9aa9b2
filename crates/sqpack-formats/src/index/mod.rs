//! Index file reader
//!
//! An index file maps path hashes to data offsets. After the archive header
//! comes a segment descriptor table; segment 4 lists folder hashes and
//! segment 1 lists `(file hash, folder hash, offset)` triples. Joining the two
//! yields the folder → file → offset map.
//!
//! # Example
//!
//! ```no_run
//! use sqpack_formats::index::IndexReader;
//! use std::fs::File;
//!
//! let file = File::open("000000.win32.index")?;
//! let mut reader = IndexReader::new(file)?;
//! let snapshot = reader.snapshot()?;
//! if let Some(entry) = snapshot.lookup_path("exd/root.exl") {
//!     println!("offset {} in dat{}", entry.offset, entry.data_file_id());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod entry;
mod segment;
mod snapshot;

pub use entry::{DATA_FILE_COUNT, FileEntry, FolderEntry};
pub use segment::{
    FileRecord, FileRecords, FolderRecord, FolderRecords, SEGMENT_RECORD_SIZE, SegmentDescriptor,
    SegmentId, SegmentRecords, SegmentTable, read_payload,
};
pub use snapshot::IndexSnapshot;

use crate::error::Result;
use crate::header::{ArchiveHeader, FileKind};
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, warn};

/// Reader over one index file
///
/// The reader owns its stream; every operation repositions it, so one
/// reader must not be shared between concurrent operations.
#[derive(Debug)]
pub struct IndexReader<R> {
    stream: R,
    header: ArchiveHeader,
    segments: Option<SegmentTable>,
}

impl<R: Read + Seek> IndexReader<R> {
    /// Validate the archive header of an index stream
    pub fn new(mut stream: R) -> Result<Self> {
        stream.seek(SeekFrom::Start(0))?;
        let header = ArchiveHeader::parse_and_verify(&mut stream, FileKind::Index)?;
        Ok(Self {
            stream,
            header,
            segments: None,
        })
    }

    /// Validated archive header
    pub const fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Segment descriptor table, parsed on first use and kept afterwards
    pub fn segments(&mut self) -> Result<&SegmentTable> {
        let table = match self.segments.take() {
            Some(table) => table,
            None => {
                self.stream
                    .seek(SeekFrom::Start(u64::from(self.header.length)))?;
                SegmentTable::parse(&mut self.stream)?
            }
        };
        Ok(self.segments.insert(table))
    }

    /// Verified folder records of the segment described by `descriptor`
    pub fn read_folder_segment(&mut self, descriptor: &SegmentDescriptor) -> Result<FolderRecords> {
        FolderRecords::new(read_payload(&mut self.stream, descriptor)?)
    }

    /// Verified file records of the segment described by `descriptor`
    pub fn read_file_segment(&mut self, descriptor: &SegmentDescriptor) -> Result<FileRecords> {
        FileRecords::new(read_payload(&mut self.stream, descriptor)?)
    }

    /// Join the folder and file segments
    ///
    /// Folders keep folder-segment order, including folders without files.
    /// Files whose owning folder is not listed are dropped.
    pub fn folders(&mut self) -> Result<Vec<FolderEntry>> {
        let table = self.segments()?;
        let folder_segment = *table.require(SegmentId::FOLDERS)?;
        let file_segment = *table.require(SegmentId::FILES)?;

        let mut folders = Vec::new();
        let mut positions = HashMap::new();
        for record in self.read_folder_segment(&folder_segment)? {
            let hash = record?.folder_hash;
            positions.entry(hash).or_insert_with(|| {
                folders.push(FolderEntry::new(hash));
                folders.len() - 1
            });
        }

        let mut orphans = 0usize;
        for record in self.read_file_segment(&file_segment)? {
            let record = record?;
            match positions.get(&record.folder_hash) {
                Some(&position) => {
                    folders[position].insert(FileEntry::new(record.file_hash, record.offset));
                }
                None => orphans += 1,
            }
        }

        if orphans > 0 {
            warn!("Dropped {} file records without a listed folder", orphans);
        }
        debug!("Materialized {} folders from index", folders.len());
        Ok(folders)
    }

    /// Materialize the index into a lookup snapshot
    pub fn snapshot(&mut self) -> Result<IndexSnapshot> {
        Ok(IndexSnapshot::from_folders(self.folders()?))
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
    use crate::error::{DigestRegion, SqPackError};
    use pretty_assertions::assert_eq;
    use sqpack_crypto::{NameHash, hash_path};
    use sqpack_test_utils::IndexImage;
    use std::io::Cursor;

    #[test]
    fn test_single_file_offset_and_data_file() {
        let image = IndexImage::new().add_file("exd", "root.exl", 80).build();
        let mut reader = IndexReader::new(Cursor::new(image)).unwrap();

        let folders = reader.folders().unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].hash, NameHash::of("exd"));

        let file = folders[0].file(NameHash::of("root.exl")).unwrap();
        assert_eq!(file.offset, 640);
        assert_eq!(file.offset & 0xF, 0);
        assert_eq!(file.data_file_id(), 0);
    }

    #[test]
    fn test_segments_are_memoized() {
        let image = IndexImage::new().add_file("exd", "root.exl", 80).build();
        let mut reader = IndexReader::new(Cursor::new(image)).unwrap();

        let first = reader.segments().unwrap().clone();
        reader.stream.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(reader.segments().unwrap(), &first);
        assert_eq!(reader.stream.position(), 0);
    }

    #[test]
    fn test_folders_can_be_read_twice() {
        let image = IndexImage::new()
            .add_file("exd", "root.exl", 80)
            .add_file("exd", "action.exh", 96)
            .build();
        let mut reader = IndexReader::new(Cursor::new(image)).unwrap();
        assert_eq!(reader.folders().unwrap(), reader.folders().unwrap());
    }

    #[test]
    fn test_empty_folder_kept_and_orphan_dropped() {
        let image = IndexImage::new()
            .add_folder("music/ffxiv")
            .add_orphan_file("ghost", "boo.scd", 16)
            .add_file("exd", "root.exl", 80)
            .build();
        let snapshot = IndexReader::new(Cursor::new(image))
            .unwrap()
            .snapshot()
            .unwrap();

        assert_eq!(snapshot.folder_count(), 2);
        assert_eq!(snapshot.file_count(), 1);
        assert!(snapshot.lookup_path("ghost/boo.scd").is_none());
        assert_eq!(snapshot.lookup_path("exd/root.exl").map(|f| f.offset), Some(640));
    }

    #[test]
    fn test_corrupt_table_digest_fails_before_records() {
        let mut image = IndexImage::new().add_file("exd", "root.exl", 80).build();
        // Stored table digest sits 64 bytes before the end of the table
        image[1024 + 1024 - 64] ^= 0x01;
        let mut reader = IndexReader::new(Cursor::new(image)).unwrap();

        assert!(matches!(
            reader.folders(),
            Err(SqPackError::IntegrityMismatch {
                region: DigestRegion::SegmentTable,
                ..
            })
        ));
    }

    #[test]
    fn test_corrupt_folder_payload() {
        let image = IndexImage::new().add_file("exd", "root.exl", 80);
        let folder_offset = image.folder_segment_offset();
        let mut bytes = image.build();
        bytes[folder_offset] ^= 0xFF;

        let mut reader = IndexReader::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            reader.folders(),
            Err(SqPackError::IntegrityMismatch {
                region: DigestRegion::SegmentPayload(4),
                ..
            })
        ));
    }

    #[test]
    fn test_missing_folder_segment() {
        let image = IndexImage::new()
            .add_file("exd", "root.exl", 80)
            .without_folder_segment()
            .build();
        let mut reader = IndexReader::new(Cursor::new(image)).unwrap();
        assert!(matches!(reader.folders(), Err(SqPackError::MissingSegment(4))));
    }

    #[test]
    fn test_data_file_rejected() {
        let image = sqpack_test_utils::DataImage::new().build();
        assert!(matches!(
            IndexReader::new(Cursor::new(image)),
            Err(SqPackError::UnexpectedFileKind {
                expected: 2,
                actual: 1,
            })
        ));
    }

    #[test]
    fn test_lookup_through_path_hash() {
        let image = IndexImage::new()
            .add_file("chara/equipment/e0001/model", "c0101e0001_top.mdl", 4098)
            .build();
        let snapshot = IndexReader::new(Cursor::new(image))
            .unwrap()
            .snapshot()
            .unwrap();

        let hashes = hash_path("chara/equipment/e0001/model/c0101e0001_top.mdl");
        let entry = snapshot.lookup(hashes.folder, hashes.file).unwrap();
        assert_eq!(entry.offset, 4098 * 8);
        assert_eq!(entry.data_file_id(), 0);
    }
}
