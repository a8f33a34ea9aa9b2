//! Binary format parsers for SqPack archives
//!
//! An archive is one `.index` file plus one or more `.datN` files. The
//! index maps folder and file path hashes to data offsets; the data files
//! hold block-compressed payloads. Every header and index segment carries a
//! SHA-1 digest that is recomputed and checked while parsing.
//!
//! # Modules
//!
//! - [`record`]: offset-tracking field reader with digest accumulation
//! - [`header`]: archive header shared by both file kinds
//! - [`index`]: segment table, folder and file records, lookup snapshot
//! - [`data`]: data-section header, entry headers, block decompression
//!
//! # Example
//!
//! ```no_run
//! use sqpack_formats::{DataReader, IndexReader};
//! use std::fs::File;
//!
//! let mut index = IndexReader::new(File::open("000000.win32.index")?)?;
//! let snapshot = index.snapshot()?;
//!
//! if let Some(entry) = snapshot.lookup_path("exd/root.exl") {
//!     let path = format!("000000.win32.{}", entry.data_file_extension());
//!     let mut data = DataReader::new(File::open(path)?)?;
//!     let bytes = data.get_file_data(entry.offset)?;
//!     println!("{} bytes", bytes.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod data;
pub mod error;
pub mod header;
pub mod index;
pub mod record;

pub use data::{BlockDecompressor, DataReader, DataSectionHeader};
pub use error::{DigestRegion, Result, SqPackError};
pub use header::{ArchiveHeader, FileKind};
pub use index::{FileEntry, FolderEntry, IndexReader, IndexSnapshot, SegmentId};
pub use record::{FixedRecord, RecordReader};
