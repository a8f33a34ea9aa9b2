//! In-memory SqPack images with valid digests
//!
//! Layouts mirror what the game ships: a 1024-byte archive header, a
//! 1024-byte segment table or data-section header, then payloads.

use flate2::Compression;
use flate2::write::DeflateEncoder;
use sqpack_crypto::{NameHash, Sha1Digest};
use std::io::Write;

/// Header length used by every image
pub const HEADER_LENGTH: usize = 1024;

/// Offset where index payloads and data entries begin
pub const PAYLOAD_START: usize = 2 * HEADER_LENGTH;

/// Alignment of data entries and blocks
pub const ENTRY_ALIGNMENT: usize = 128;

const SIGNATURE: &[u8; 12] = b"SqPack\0\0\0\0\0\0";
const HASHED_HEADER_LENGTH: usize = 960;
const BLOCK_HEADER_LENGTH: u32 = 16;
const STORED_MARKER: u32 = 32000;

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn pad_to(out: &mut Vec<u8>, len: usize) {
    if out.len() < len {
        out.resize(len, 0);
    }
}

fn align(len: usize) -> usize {
    len.div_ceil(ENTRY_ALIGNMENT) * ENTRY_ALIGNMENT
}

/// Archive header of `length` bytes with a valid digest
///
/// `kind` is written as-is so tests can forge unexpected values.
pub fn archive_header(kind: u32, length: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(length as usize);
    out.extend_from_slice(SIGNATURE);
    push_u32(&mut out, length);
    push_u32(&mut out, 0);
    push_u32(&mut out, kind);
    pad_to(&mut out, HASHED_HEADER_LENGTH);
    let digest = Sha1Digest::from_data(&out);
    out.extend_from_slice(digest.as_bytes());
    pad_to(&mut out, length as usize);
    out
}

/// Close a guarded block: pad to `length - 64`, append the digest of
/// everything so far, pad to `length`
fn seal_block(mut block: Vec<u8>, length: usize) -> Vec<u8> {
    pad_to(&mut block, length - 64);
    let digest = Sha1Digest::from_data(&block);
    block.extend_from_slice(digest.as_bytes());
    pad_to(&mut block, length);
    block
}

/// Builder for an index file
#[derive(Debug, Clone)]
pub struct IndexImage {
    folders: Vec<u32>,
    files: Vec<(u32, u32, u32)>,
    with_folder_segment: bool,
}

impl Default for IndexImage {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexImage {
    /// Empty index with both segments present
    pub fn new() -> Self {
        Self {
            folders: Vec::new(),
            files: Vec::new(),
            with_folder_segment: true,
        }
    }

    /// Add a folder with no files
    #[must_use]
    pub fn add_folder(mut self, folder: &str) -> Self {
        let hash = NameHash::of(&folder.to_lowercase()).get();
        if !self.folders.contains(&hash) {
            self.folders.push(hash);
        }
        self
    }

    /// Add a file whose raw (divided by 8) offset is `raw_offset`
    #[must_use]
    pub fn add_file(self, folder: &str, file: &str, raw_offset: u32) -> Self {
        self.add_folder(folder).add_orphan_file(folder, file, raw_offset)
    }

    /// Add a file record without listing its folder
    #[must_use]
    pub fn add_orphan_file(mut self, folder: &str, file: &str, raw_offset: u32) -> Self {
        self.files.push((
            NameHash::of(&file.to_lowercase()).get(),
            NameHash::of(&folder.to_lowercase()).get(),
            raw_offset,
        ));
        self
    }

    /// Leave the folder segment slot unused
    #[must_use]
    pub const fn without_folder_segment(mut self) -> Self {
        self.with_folder_segment = false;
        self
    }

    /// Absolute offset of the folder segment payload
    pub fn folder_segment_offset(&self) -> usize {
        PAYLOAD_START + self.files.len() * 16
    }

    fn file_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for &(file, folder, raw) in &self.files {
            push_u32(&mut out, file);
            push_u32(&mut out, folder);
            push_u32(&mut out, raw);
            push_u32(&mut out, 0);
        }
        out
    }

    fn folder_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for &folder in &self.folders {
            push_u32(&mut out, folder);
            out.extend_from_slice(&[0; 12]);
        }
        out
    }

    /// Serialize the index
    pub fn build(&self) -> Vec<u8> {
        let files = self.file_payload();
        let folders = self.folder_payload();
        let folder_offset = self.folder_segment_offset();

        let mut slots = vec![(0u32, 0u32, [0u8; 20]); 13];
        slots[0] = (
            PAYLOAD_START as u32,
            files.len() as u32,
            *Sha1Digest::from_data(&files).as_bytes(),
        );
        if self.with_folder_segment {
            slots[3] = (
                folder_offset as u32,
                folders.len() as u32,
                *Sha1Digest::from_data(&folders).as_bytes(),
            );
        }

        let mut table = Vec::with_capacity(HEADER_LENGTH);
        push_u32(&mut table, HEADER_LENGTH as u32);
        for (position, (offset, size, digest)) in slots.iter().enumerate() {
            push_u32(&mut table, position as u32 + 1);
            push_u32(&mut table, *offset);
            push_u32(&mut table, *size);
            table.extend_from_slice(digest);
            let reserved = if position == 0 { 44 } else { 40 };
            table.extend(std::iter::repeat_n(0u8, reserved));
        }

        let mut out = archive_header(2, HEADER_LENGTH as u32);
        out.extend_from_slice(&seal_block(table, HEADER_LENGTH));
        out.extend_from_slice(&files);
        out.extend_from_slice(&folders);
        out
    }
}

/// One block of a data entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Raw DEFLATE payload; must compress below 32000 bytes
    Compressed(Vec<u8>),
    /// Payload stored verbatim behind the 32000 marker
    Stored(Vec<u8>),
}

impl Block {
    /// Bytes the block decodes to
    pub fn content(&self) -> &[u8] {
        match self {
            Self::Compressed(data) | Self::Stored(data) => data,
        }
    }
}

/// Frame a block: 16-byte sub-header followed by its payload
pub fn encode_block(block: &Block) -> Vec<u8> {
    let (compressed_length, payload) = match block {
        Block::Compressed(data) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(data)
                .and_then(|()| encoder.finish())
                .map(|payload| (payload.len() as u32, payload))
                .unwrap_or_default()
        }
        Block::Stored(data) => (STORED_MARKER, data.clone()),
    };

    let mut out = Vec::with_capacity(16 + payload.len());
    push_u32(&mut out, BLOCK_HEADER_LENGTH);
    push_u32(&mut out, 0);
    push_u32(&mut out, compressed_length);
    push_u32(&mut out, block.content().len() as u32);
    out.extend_from_slice(&payload);
    out
}

/// Builder for a data file
#[derive(Debug, Clone, Default)]
pub struct DataImage {
    entries: Vec<u8>,
    spanned: u32,
    max_file_size: u32,
}

impl DataImage {
    /// Data file without entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spanning indicator of the data-section header
    #[must_use]
    pub const fn with_spanned(mut self, spanned: u32) -> Self {
        self.spanned = spanned;
        self
    }

    /// Append an entry of `blocks`; returns its raw (divided by 8) offset
    pub fn add_entry(&mut self, blocks: &[Block]) -> u32 {
        let declared: Vec<u16> = blocks
            .iter()
            .map(|b| u16::try_from(b.content().len()).unwrap_or(u16::MAX))
            .collect();
        self.push_entry(2, blocks, &declared)
    }

    /// Append an entry whose block table lists `declared` decompressed lengths
    pub fn add_entry_with_declared(&mut self, blocks: &[Block], declared: &[u16]) -> u32 {
        self.push_entry(2, blocks, declared)
    }

    /// Append an entry with an arbitrary content type code
    pub fn add_entry_with_content_type(&mut self, content_type: u32, blocks: &[Block]) -> u32 {
        let declared = vec![0; blocks.len()];
        self.push_entry(content_type, blocks, &declared)
    }

    fn push_entry(&mut self, content_type: u32, blocks: &[Block], declared: &[u16]) -> u32 {
        let offset = PAYLOAD_START + self.entries.len();

        let mut body = Vec::new();
        let mut table = Vec::with_capacity(blocks.len());
        for (block, &decompressed) in blocks.iter().zip(declared) {
            let encoded = encode_block(block);
            table.push((
                body.len() as u32,
                u16::try_from(encoded.len()).unwrap_or(u16::MAX),
                decompressed,
            ));
            body.extend_from_slice(&encoded);
            let aligned = align(body.len());
            pad_to(&mut body, aligned);
        }

        let header_length = align(24 + 8 * blocks.len());
        let total: usize = blocks.iter().map(|b| b.content().len()).sum();

        let mut entry = Vec::new();
        push_u32(&mut entry, header_length as u32);
        push_u32(&mut entry, content_type);
        push_u32(&mut entry, total as u32);
        push_u32(&mut entry, 0);
        push_u32(&mut entry, 16000);
        push_u32(&mut entry, blocks.len() as u32);
        for (relative, compressed, decompressed) in table {
            push_u32(&mut entry, relative);
            entry.extend_from_slice(&compressed.to_le_bytes());
            entry.extend_from_slice(&decompressed.to_le_bytes());
        }
        pad_to(&mut entry, header_length);
        entry.extend_from_slice(&body);

        self.max_file_size = self.max_file_size.max(total as u32);
        self.entries.extend_from_slice(&entry);
        let aligned = align(self.entries.len());
        pad_to(&mut self.entries, aligned);
        (offset / 8) as u32
    }

    /// Serialize the data file
    pub fn build(&self) -> Vec<u8> {
        let mut section = Vec::with_capacity(HEADER_LENGTH);
        push_u32(&mut section, HEADER_LENGTH as u32);
        section.extend_from_slice(&[0; 8]);
        push_u32(&mut section, (self.entries.len() / 8) as u32);
        push_u32(&mut section, self.spanned);
        push_u32(&mut section, 0);
        push_u32(&mut section, self.max_file_size);
        push_u32(&mut section, 0);
        section.extend_from_slice(Sha1Digest::from_data(&self.entries).as_bytes());

        let mut out = archive_header(1, HEADER_LENGTH as u32);
        out.extend_from_slice(&seal_block(section, HEADER_LENGTH));
        out.extend_from_slice(&self.entries);
        out
    }
}

/// Split `content` into compressed blocks of at most 16000 bytes
pub fn chunked_blocks(content: &[u8]) -> Vec<Block> {
    if content.is_empty() {
        return vec![Block::Compressed(Vec::new())];
    }
    content
        .chunks(16000)
        .map(|chunk| Block::Compressed(chunk.to_vec()))
        .collect()
}

/// Index and `dat0` images holding `files`, each addressed by its full path
pub fn sample_archive(files: &[(&str, &[u8])]) -> (Vec<u8>, Vec<u8>) {
    let mut index = IndexImage::new();
    let mut data = DataImage::new();

    for (path, content) in files {
        let (folder, file) = path.rsplit_once('/').unwrap_or(("", path));
        let raw = data.add_entry(&chunked_blocks(content));
        index = index.add_file(folder, file, raw);
    }

    (index.build(), data.build())
}
