//! Sequential reader for fixed-size binary fields
//!
//! SqPack headers are read field by field while a SHA-1 digest accumulates
//! over the guarded bytes. [`RecordReader`] tracks how many bytes it has
//! consumed, so padding can be skipped to a declared length, and it turns
//! short reads into [`SqPackError::UnexpectedEndOfStream`] with the offending
//! offset.

use crate::error::{DigestRegion, Result, SqPackError};
use binrw::BinResult;
use sqpack_crypto::{Sha1Digest, Sha1Hasher, digest::SHA1_DIGEST_SIZE};
use std::io::{ErrorKind, Read, Seek};
use tracing::trace;

/// Distance from the end of a guarded block to its trailing digest
pub const TRAILING_DIGEST_DISTANCE: u64 = 64;

/// Chunk size used when discarding padding
const SKIP_CHUNK: usize = 4096;

/// Little-endian record with a fixed on-disk width
pub trait FixedRecord: Sized {
    /// On-disk width in bytes
    const SIZE: usize;

    /// Decode from exactly [`Self::SIZE`] bytes
    fn parse(bytes: &[u8]) -> BinResult<Self>;
}

/// Offset-tracking reader with optional digest accumulation
pub struct RecordReader<'a, R> {
    inner: &'a mut R,
    base: u64,
    position: u64,
    digest: Option<Sha1Hasher>,
}

impl<'a, R: Read> RecordReader<'a, R> {
    /// Wrap `inner`, whose current absolute position is `base`
    pub fn new(inner: &'a mut R, base: u64) -> Self {
        Self {
            inner,
            base,
            position: 0,
            digest: None,
        }
    }

    /// Bytes consumed since construction
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Absolute stream offset of the next read
    pub const fn stream_offset(&self) -> u64 {
        self.base + self.position
    }

    /// Start accumulating every byte read into a SHA-1 digest
    pub fn begin_digest(&mut self) {
        self.digest = Some(Sha1Hasher::new());
    }

    /// Stop accumulating and return the digest of the bytes read since
    /// [`begin_digest`](Self::begin_digest)
    pub fn finish_digest(&mut self) -> Sha1Digest {
        self.digest.take().unwrap_or_default().finalize()
    }

    /// Read exactly `N` bytes
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Read a little-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read one fixed-size record
    pub fn read_record<T: FixedRecord>(&mut self) -> Result<T> {
        let bytes = self.read_vec(T::SIZE)?;
        Ok(T::parse(&bytes)?)
    }

    /// Read a stored digest; these bytes never enter the running digest
    pub fn read_digest(&mut self) -> Result<Sha1Digest> {
        let running = self.digest.take();
        let stored = self.read_array::<SHA1_DIGEST_SIZE>();
        self.digest = running;
        Ok(Sha1Digest::from_bytes(stored?))
    }

    /// Compare the running digest against the stored one that follows
    pub fn verify_digest(&mut self, region: DigestRegion) -> Result<Sha1Digest> {
        let actual = self.finish_digest();
        let expected = self.read_digest()?;
        if expected != actual {
            return Err(SqPackError::IntegrityMismatch {
                region,
                expected,
                actual,
            });
        }
        trace!("{} digest verified: {}", region, actual);
        Ok(expected)
    }

    /// Discard bytes until `target` bytes have been consumed in total
    ///
    /// Discarded bytes still enter a running digest.
    pub fn skip_to(&mut self, target: u64, field: &'static str) -> Result<()> {
        if target < self.position {
            return Err(SqPackError::InvalidLength {
                field,
                declared: target,
                minimum: self.position,
            });
        }

        let mut remaining = target - self.position;
        let mut scratch = [0u8; SKIP_CHUNK];
        while remaining > 0 {
            let chunk = remaining.min(SKIP_CHUNK as u64) as usize;
            self.fill(&mut scratch[..chunk])?;
            remaining -= chunk as u64;
        }
        Ok(())
    }

    /// Finish a block whose digest sits [`TRAILING_DIGEST_DISTANCE`] bytes
    /// before its declared end: hash the padding up to the digest, verify,
    /// then discard the rest
    pub fn finish_guarded_block(
        &mut self,
        length: u64,
        region: DigestRegion,
        field: &'static str,
    ) -> Result<Sha1Digest> {
        self.skip_to(length.saturating_sub(TRAILING_DIGEST_DISTANCE), field)?;
        let digest = self.verify_digest(region)?;
        self.skip_to(length, field)?;
        Ok(digest)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(SqPackError::UnexpectedEndOfStream {
                        offset: self.stream_offset(),
                        requested: buf.len(),
                        available: filled,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.position += buf.len() as u64;
        if let Some(digest) = self.digest.as_mut() {
            digest.update(buf);
        }
        Ok(())
    }
}

impl<'a, R: Read + Seek> RecordReader<'a, R> {
    /// Wrap `inner` at its current position
    pub fn at_current(inner: &'a mut R) -> Result<Self> {
        let base = inner.stream_position()?;
        Ok(Self::new(inner, base))
    }
}
