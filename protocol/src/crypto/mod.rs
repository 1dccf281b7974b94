//! # Cryptographic Primitives
//!
//! Thin wrappers over audited hash implementations. Nothing here is
//! hand-rolled; the chain only needs a fixed 256-bit digest.

pub mod hash;

pub use hash::{sha256, sha256_array, sha256_multi, to_hex};
