//! SHA-1 digests guarding SqPack headers and segments

use crate::error::CryptoError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::fmt;

/// Size of a SHA-1 digest in bytes
pub const SHA1_DIGEST_SIZE: usize = 20;

/// SHA-1 digest as stored in archive headers
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha1Digest([u8; SHA1_DIGEST_SIZE]);

impl Sha1Digest {
    /// Create digest from raw bytes
    pub const fn from_bytes(bytes: [u8; SHA1_DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Compute the digest of `data`
    pub fn from_data(data: &[u8]) -> Self {
        let mut hasher = Sha1Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Parse digest from a 40-character hex string
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let mut bytes = [0u8; SHA1_DIGEST_SIZE];
        hex::decode_to_slice(hex, &mut bytes)
            .map_err(|e| CryptoError::InvalidDigest(format!("{hex:?}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; SHA1_DIGEST_SIZE] {
        &self.0
    }

    /// Convert to lower-case hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Sha1Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Sha1Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha1Digest({})", self.to_hex())
    }
}

impl Serialize for Sha1Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Sha1Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Incremental SHA-1 computation
#[derive(Clone, Default)]
pub struct Sha1Hasher(Sha1);

impl Sha1Hasher {
    /// Create an empty hasher
    pub fn new() -> Self {
        Self(Sha1::new())
    }

    /// Feed more bytes
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Produce the digest of everything fed so far
    pub fn finalize(self) -> Sha1Digest {
        let mut bytes = [0u8; SHA1_DIGEST_SIZE];
        bytes.copy_from_slice(&self.0.finalize());
        Sha1Digest(bytes)
    }
}

impl fmt::Debug for Sha1Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sha1Hasher")
    }
}
