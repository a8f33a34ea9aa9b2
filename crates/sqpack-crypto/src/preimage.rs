//! Brute-force recovery of names from their path hash
//!
//! Index files only carry hashes, so names that are not listed anywhere can
//! only be recovered by trying candidates. The search enumerates every string
//! over a fixed 37-symbol alphabet, shortest first, optionally wrapped in a
//! literal prefix and suffix. Cost grows as `37^length`; this is an offline
//! reverse-engineering aid and never part of a lookup.
//!
//! Within one length the space is partitioned by the first symbol. With the
//! `parallel` feature the partitions run on the rayon pool; the first
//! partition to match raises a shared flag that every other partition polls,
//! so the remaining work stops promptly and exactly one result is reported.

use crate::crc::NameHasher;
use crate::error::CryptoError;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Symbols tried at every position, in enumeration order
pub const ALPHABET: &[u8; 37] = b"abcdefghijklmnopqrstuvwxyz1234567890_";

/// Default longest candidate length
pub const DEFAULT_MAX_LENGTH: usize = 6;

/// Candidates between two polls of the cancellation flag
const CANCEL_POLL_INTERVAL: u32 = 4096;

/// Counter over all candidates of one length
///
/// Each position holds an index into [`ALPHABET`]; advancing increments the
/// last position and carries leftwards. Positions before `fixed` never move,
/// which is how a partition pins its first symbol.
#[derive(Debug, Clone)]
pub struct Odometer {
    digits: Vec<usize>,
    candidate: Vec<u8>,
    fixed: usize,
    exhausted: bool,
}

impl Odometer {
    /// Enumerate every candidate of `length` symbols
    pub fn new(length: usize) -> Self {
        Self::with_fixed(vec![0; length], 0)
    }

    /// Enumerate candidates of `length` symbols starting with `ALPHABET[first]`
    ///
    /// # Panics
    ///
    /// Panics if `length` is zero or `first` is outside the alphabet.
    pub fn starting_with(first: usize, length: usize) -> Self {
        assert!(length > 0, "a partition needs at least one position");
        assert!(first < ALPHABET.len(), "first symbol outside the alphabet");
        let mut digits = vec![0; length];
        digits[0] = first;
        Self::with_fixed(digits, 1)
    }

    fn with_fixed(digits: Vec<usize>, fixed: usize) -> Self {
        let candidate = digits.iter().map(|&d| ALPHABET[d]).collect();
        Self {
            digits,
            candidate,
            fixed,
            exhausted: false,
        }
    }

    /// Current candidate, or `None` once every candidate has been produced
    pub fn current(&self) -> Option<&[u8]> {
        (!self.exhausted).then_some(self.candidate.as_slice())
    }

    /// Move to the next candidate
    pub fn advance(&mut self) {
        for position in (self.fixed..self.digits.len()).rev() {
            let next = self.digits[position] + 1;
            if next < ALPHABET.len() {
                self.digits[position] = next;
                self.candidate[position] = ALPHABET[next];
                return;
            }
            self.digits[position] = 0;
            self.candidate[position] = ALPHABET[0];
        }
        self.exhausted = true;
    }

    /// Number of candidates this odometer produces in total
    pub fn len(&self) -> u64 {
        let free = self.digits.len() - self.fixed;
        (ALPHABET.len() as u64).saturating_pow(free as u32)
    }

    /// Whether the odometer produces no candidates at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every candidate has been produced
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Bounded exhaustive search for a name hashing to `target`
#[derive(Debug, Clone)]
pub struct PreimageSearch {
    target: u32,
    max_length: usize,
    prefix: String,
    suffix: String,
}

impl PreimageSearch {
    /// Search for `target` with the default length bound and no affixes
    pub fn new(target: u32) -> Self {
        Self {
            target,
            max_length: DEFAULT_MAX_LENGTH,
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    /// Longest candidate length to try (affixes not counted)
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Literal text placed before every candidate
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Literal text placed after every candidate
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Run the search and return the first match, affixes included
    pub fn find(&self) -> Option<String> {
        let mut base = NameHasher::new();
        base.update(self.prefix.as_bytes());

        for length in 1..=self.max_length {
            info!("Trying length {}/{}...", length, self.max_length);
            if let Some(candidate) = self.find_length(&base, length) {
                debug!("Found preimage of {:08x} at length {}", self.target, length);
                let middle = String::from_utf8_lossy(&candidate);
                return Some(format!("{}{}{}", self.prefix, middle, self.suffix));
            }
        }

        None
    }

    /// Run the search, treating an exhausted space as an error
    pub fn find_or_err(&self) -> Result<String, CryptoError> {
        self.find().ok_or(CryptoError::PreimageNotFound {
            target: self.target,
            max_length: self.max_length,
        })
    }

    #[cfg(feature = "parallel")]
    fn find_length(&self, base: &NameHasher, length: usize) -> Option<Vec<u8>> {
        use rayon::prelude::*;

        let found = AtomicBool::new(false);
        (0..ALPHABET.len())
            .into_par_iter()
            .find_map_any(|first| self.scan_partition(base, first, length, &found))
    }

    #[cfg(not(feature = "parallel"))]
    fn find_length(&self, base: &NameHasher, length: usize) -> Option<Vec<u8>> {
        let found = AtomicBool::new(false);
        (0..ALPHABET.len()).find_map(|first| self.scan_partition(base, first, length, &found))
    }

    fn scan_partition(
        &self,
        base: &NameHasher,
        first: usize,
        length: usize,
        found: &AtomicBool,
    ) -> Option<Vec<u8>> {
        let mut odometer = Odometer::starting_with(first, length);
        let mut since_poll = 0u32;

        while let Some(candidate) = odometer.current() {
            since_poll += 1;
            if since_poll == CANCEL_POLL_INTERVAL {
                if found.load(Ordering::Relaxed) {
                    return None;
                }
                since_poll = 0;
            }

            let mut hasher = base.clone();
            hasher.update(candidate);
            hasher.update(self.suffix.as_bytes());
            if hasher.finalize() == self.target {
                found.store(true, Ordering::Relaxed);
                return Some(candidate.to_vec());
            }

            odometer.advance();
        }

        None
    }
}

/// Search for a name of at most `max_length` symbols hashing to `target`
///
/// Returns the full matching string including `prefix` and `suffix`.
pub fn guess(
    target: u32,
    max_length: usize,
    prefix: Option<&str>,
    suffix: Option<&str>,
) -> Option<String> {
    PreimageSearch::new(target)
        .max_length(max_length)
        .prefix(prefix.unwrap_or_default())
        .suffix(suffix.unwrap_or_default())
        .find()
}
