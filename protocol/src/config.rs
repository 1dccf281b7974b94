//! # Protocol Configuration & Constants
//!
//! Every fixed value loglink relies on lives here. The hashing parameters are
//! part of the on-chain format: changing them invalidates every stored chain.

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// Crate version, reported by the node's `version` subcommand.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Digest used for block content hashes.
pub const HASH_ALGORITHM: &str = "SHA-256";

/// Digest length in bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Width of the encoded block index, both in the hash preimage and as a
/// storage key.
pub const INDEX_KEY_LENGTH: usize = 8;

/// Width of an L1 record key: L1 block number then log index.
pub const L1_INFO_KEY_LENGTH: usize = 2 * INDEX_KEY_LENGTH;

// ---------------------------------------------------------------------------
// Ingestion defaults
// ---------------------------------------------------------------------------

/// Contract whose logs the original deployment tracked on Sepolia.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x761d53b47334bee6612c0bd1467fb881435375b2";

/// Event signature topic matched in the first topic slot.
pub const DEFAULT_EVENT_TOPIC: &str =
    "0x3e54d0825ed78523037d00a81759237eb436ce774bd546993ee67a1b67b6e766";

/// First L1 block scanned when no range is given.
pub const DEFAULT_FROM_BLOCK: u64 = 1_000_000;

/// Last L1 block scanned (inclusive) when no range is given.
pub const DEFAULT_TO_BLOCK: u64 = 1_005_000;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Directory name of the block store inside the node data directory.
pub const DEFAULT_DB_DIR: &str = "blockstore.db";
