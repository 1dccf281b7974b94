//! # Hashing Utilities
//!
//! loglink commits every block with SHA-256. The digest is pinned so that two
//! independent implementations can reproduce each other's block hashes from
//! the same committed fields.
//!
//! Block hashing feeds several fields into one digest with no separators, so
//! the streaming form [`sha256_multi`] is the one the chain uses. The
//! single-buffer helpers exist for callers hashing one blob.

use sha2::{Digest, Sha256};

use crate::config::HASH_OUTPUT_LENGTH;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use loglink_protocol::crypto::sha256;
///
/// let hash = sha256(b"loglink");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// Hash several byte slices as if they were concatenated.
///
/// `sha256_multi(&[a, b])` equals `sha256(&[a, b].concat())` without
/// building the intermediate buffer.
pub fn sha256_multi(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

/// Lowercase hex rendering of a digest, for logs and CLI output.
pub fn to_hex(hash: &[u8]) -> String {
    hex::encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // NIST test vector for "abc".
        let hash = sha256(b"abc");
        assert_eq!(
            hex::encode(hash),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_deterministic() {
        let a = sha256(b"same input");
        let b = sha256(b"same input");
        assert_eq!(a, b);
    }

    #[test]
    fn test_sha256_array_matches_vec() {
        let data = b"block payload";
        assert_eq!(sha256(data), sha256_array(data).to_vec());
    }

    #[test]
    fn test_sha256_multi_matches_concatenation() {
        let parts: [&[u8]; 3] = [b"index", b"", b"payload"];
        assert_eq!(sha256_multi(&parts), sha256(&parts.concat()));
    }

    #[test]
    fn test_sha256_multi_of_nothing_is_empty_digest() {
        assert_eq!(sha256_multi(&[]), sha256(b""));
    }

    #[test]
    fn to_hex_is_lowercase() {
        assert_eq!(to_hex(&[0xAB, 0x01]), "ab01");
    }
}
