//! Error types for hashing operations

use thiserror::Error;

/// Errors that can occur during hashing operations
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Digest hex string has the wrong length or characters
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// Brute-force search exhausted its bound without a match
    #[error("No preimage of {target:08x} found up to length {max_length}")]
    PreimageNotFound {
        /// Hash that was searched for
        target: u32,
        /// Longest candidate length that was tried
        max_length: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CryptoError::PreimageNotFound {
            target: 0xcadb_be3d,
            max_length: 2,
        };
        assert_eq!(
            err.to_string(),
            "No preimage of cadbbe3d found up to length 2"
        );

        let err = CryptoError::InvalidDigest("too short".to_string());
        assert!(err.to_string().contains("too short"));
    }
}
