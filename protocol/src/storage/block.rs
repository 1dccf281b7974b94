//! # Block Structure
//!
//! A block is one immutable link in the chain. It carries an opaque payload
//! and commits to its predecessor by embedding the predecessor's hash.
//!
//! ## Block Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  index: u64             (genesis = 0)        │
//! │  timestamp: DateTime<Utc>                    │
//! │  payload: Vec<u8>       (caller bytes)       │
//! │  previous_hash: Vec<u8> (empty for genesis)  │
//! │  hash: Vec<u8>          (SHA-256, 32 bytes)  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! The block hash is SHA-256 over
//! `index (8B BE) || unix_seconds(timestamp) (8B BE, signed) || payload ||
//! previous_hash`, with no separators. Sub-second precision of the
//! timestamp is stored but not committed.
//!
//! ## Validation
//!
//! A block is valid relative to a reference block (its predecessor) when:
//!
//! 1. its stored hash equals the recomputed hash,
//! 2. its index is exactly one past the reference index,
//! 3. its `previous_hash` equals the reference hash byte for byte.
//!
//! The stored hash is never trusted; it is always recomputed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::hash::{sha256_multi, to_hex};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The specific chain invariant a rejected block broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("stored hash does not match recomputed hash")]
    HashMismatch,

    #[error("expected index {expected}, found {found}")]
    IndexGap { expected: u64, found: u64 },

    #[error("previous_hash does not match predecessor hash")]
    PreviousHashMismatch,
}

/// A candidate block failed one of the chain invariants against its
/// reference block. This is the only error the chain core reports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid block at index {index}: {violation}")]
pub struct InvalidBlock {
    /// Index carried by the rejected block.
    pub index: u64,
    /// First invariant found broken.
    pub violation: Violation,
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One hash-committed record in the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain. Genesis is 0.
    pub index: u64,
    /// Construction time. Only whole Unix seconds are committed to the hash.
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied bytes, stored verbatim.
    pub payload: Vec<u8>,
    /// Hash of the preceding block. Empty for genesis.
    pub previous_hash: Vec<u8>,
    /// Content hash over the four fields above.
    pub hash: Vec<u8>,
}

impl Block {
    /// Construct the genesis block, stamped with the current time.
    pub fn genesis() -> Self {
        Self::genesis_at(Utc::now())
    }

    /// Construct a genesis block with an explicit timestamp.
    pub fn genesis_at(timestamp: DateTime<Utc>) -> Self {
        Self::seal(0, timestamp, Vec::new(), Vec::new())
    }

    /// Derive the candidate that would follow `self` in a chain.
    ///
    /// The payload is copied exactly as given. The result is not validated
    /// here; the chain checks it on append.
    pub fn successor(&self, payload: &[u8]) -> Self {
        self.successor_at(payload, Utc::now())
    }

    /// [`Block::successor`] with an explicit timestamp.
    pub fn successor_at(&self, payload: &[u8], timestamp: DateTime<Utc>) -> Self {
        Self::seal(
            self.index.saturating_add(1),
            timestamp,
            payload.to_vec(),
            self.hash.clone(),
        )
    }

    fn seal(
        index: u64,
        timestamp: DateTime<Utc>,
        payload: Vec<u8>,
        previous_hash: Vec<u8>,
    ) -> Self {
        let hash = compute_block_hash(index, &timestamp, &payload, &previous_hash);
        Block {
            index,
            timestamp,
            payload,
            previous_hash,
            hash,
        }
    }

    /// Recompute the content hash from the committed fields.
    pub fn compute_hash(&self) -> Vec<u8> {
        compute_block_hash(
            self.index,
            &self.timestamp,
            &self.payload,
            &self.previous_hash,
        )
    }

    /// Whether the stored hash matches the committed fields.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Check `candidate` against `reference`, its would-be predecessor.
    ///
    /// Returns true iff all three chain invariants hold. Pure; neither block
    /// is modified.
    pub fn is_valid(candidate: &Block, reference: &Block) -> bool {
        candidate.validate_against(reference).is_ok()
    }

    /// Like [`Block::is_valid`], but reports which invariant failed.
    ///
    /// Checks run in order: hash, index, previous hash.
    pub fn validate_against(&self, reference: &Block) -> Result<(), InvalidBlock> {
        let reject = |violation| InvalidBlock {
            index: self.index,
            violation,
        };

        if !self.has_valid_hash() {
            return Err(reject(Violation::HashMismatch));
        }

        if reference.index.checked_add(1) != Some(self.index) {
            return Err(reject(Violation::IndexGap {
                expected: reference.index.saturating_add(1),
                found: self.index,
            }));
        }

        if self.previous_hash != reference.hash {
            return Err(reject(Violation::PreviousHashMismatch));
        }

        Ok(())
    }

    /// Whether this block sits at the root position.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash.is_empty()
    }

    /// Return the block hash as a hex string.
    pub fn hash_hex(&self) -> String {
        to_hex(&self.hash)
    }

    /// Return the previous hash as a hex string (empty for genesis).
    pub fn previous_hash_hex(&self) -> String {
        to_hex(&self.previous_hash)
    }
}

// ---------------------------------------------------------------------------
// Hash Computation
// ---------------------------------------------------------------------------

/// Compute a block content hash from its committed fields.
pub fn compute_block_hash(
    index: u64,
    timestamp: &DateTime<Utc>,
    payload: &[u8],
    previous_hash: &[u8],
) -> Vec<u8> {
    let index_bytes = index.to_be_bytes();
    let time_bytes = timestamp.timestamp().to_be_bytes();
    sha256_multi(&[&index_bytes[..], &time_bytes[..], payload, previous_hash])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[test]
    fn genesis_block_properties() {
        let genesis = Block::genesis();
        assert_eq!(genesis.index, 0);
        assert!(genesis.payload.is_empty());
        assert!(genesis.previous_hash.is_empty());
        assert_eq!(genesis.hash.len(), 32);
        assert!(genesis.is_genesis());
    }

    #[test]
    fn genesis_hash_known_answer() {
        // index 0 and timestamp 0 are sixteen zero bytes; nothing else is fed.
        let genesis = Block::genesis_at(at(0));
        assert_eq!(
            genesis.hash_hex(),
            "374708fff7719dd5979ec875d56cd2286f6d3cf7ec317a3b25632aab28ec37bb"
        );
    }

    #[test]
    fn successor_hash_known_answer() {
        let genesis = Block::genesis_at(at(1_700_000_000));
        assert_eq!(
            genesis.hash_hex(),
            "1eb5e14a950c47248c26a2ab067883558ad39b6ca8a7738f88094c69e7c56f1e"
        );

        let next = genesis.successor_at(b"abc", at(1_700_000_001));
        assert_eq!(
            next.hash_hex(),
            "2bddcaba9f133df26385ea3012f3eaeca6aedac76c7faceb6e0430ba5d4c25f8"
        );
    }

    #[test]
    fn hash_is_deterministic() {
        let genesis = Block::genesis();
        let block = genesis.successor(b"payload");
        assert_eq!(block.compute_hash(), block.hash);
        assert_eq!(block.compute_hash(), block.compute_hash());
    }

    #[test]
    fn hash_ignores_sub_second_precision() {
        let whole = Block::genesis_at(at(42));
        let fractional = Block::genesis_at(
            Utc.timestamp_opt(42, 999_000_000).single().expect("valid timestamp"),
        );
        assert_eq!(whole.hash, fractional.hash);
    }

    #[test]
    fn hash_covers_every_committed_field() {
        let genesis = Block::genesis_at(at(10));
        let base = genesis.successor_at(b"data", at(11));

        let mut other_index = base.clone();
        other_index.index += 1;
        let mut other_time = base.clone();
        other_time.timestamp = at(12);
        let mut other_payload = base.clone();
        other_payload.payload = b"date".to_vec();
        let mut other_prev = base.clone();
        other_prev.previous_hash[0] ^= 0x01;

        for changed in [other_index, other_time, other_payload, other_prev] {
            assert_ne!(changed.compute_hash(), base.hash);
        }
    }

    #[test]
    fn successor_links_to_parent() {
        let genesis = Block::genesis();
        let next = genesis.successor(b"abc");

        assert_eq!(next.index, 1);
        assert_eq!(next.previous_hash, genesis.hash);
        assert!(!next.is_genesis());
        assert!(Block::is_valid(&next, &genesis));
    }

    #[test]
    fn successor_payload_is_not_sized_from_first_byte() {
        // Payloads are stored verbatim. A first byte of 3 does not turn the
        // payload into three zero bytes, and longer payloads are not cut.
        let genesis = Block::genesis();
        let input = [3u8, 0xAA, 0xBB, 0xCC, 0xDD];
        let next = genesis.successor(&input);
        assert_eq!(next.payload, input.to_vec());
        assert_ne!(next.payload, vec![0u8; 3]);
    }

    #[test]
    fn successor_accepts_empty_payload() {
        let genesis = Block::genesis();
        let next = genesis.successor(&[]);
        assert!(next.payload.is_empty());
        assert!(Block::is_valid(&next, &genesis));
    }

    #[test]
    fn tampered_hash_is_rejected() {
        let genesis = Block::genesis();
        let mut next = genesis.successor(b"abc");
        next.hash[0] ^= 0xFF;

        assert_eq!(
            next.validate_against(&genesis),
            Err(InvalidBlock {
                index: 1,
                violation: Violation::HashMismatch,
            })
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let genesis = Block::genesis();
        let mut next = genesis.successor(b"abc");
        next.payload[0] = b'x';
        assert!(!Block::is_valid(&next, &genesis));
    }

    #[test]
    fn skipped_index_is_rejected() {
        let genesis = Block::genesis();
        let mut next = genesis.successor(b"abc");
        next.index = 2;
        next.hash = next.compute_hash();

        assert_eq!(
            next.validate_against(&genesis).map_err(|e| e.violation),
            Err(Violation::IndexGap {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn wrong_previous_hash_is_rejected() {
        let genesis = Block::genesis();
        let unrelated = Block::genesis_at(at(1));
        let next = unrelated.successor(b"abc");

        // Index lines up, hash is self-consistent, linkage is not.
        assert_eq!(
            next.validate_against(&genesis).map_err(|e| e.violation),
            Err(Violation::PreviousHashMismatch)
        );
    }

    #[test]
    fn validation_is_pure() {
        let genesis = Block::genesis();
        let next = genesis.successor(b"abc");
        let (g, n) = (genesis.clone(), next.clone());

        let _ = Block::is_valid(&next, &genesis);
        assert_eq!(genesis, g);
        assert_eq!(next, n);
    }

    #[test]
    fn block_chain_of_three() {
        let b0 = Block::genesis();
        let b1 = b0.successor(b"one");
        let b2 = b1.successor(b"two");

        assert_eq!(b2.index, 2);
        assert_eq!(b2.previous_hash, b1.hash);
        assert!(Block::is_valid(&b1, &b0));
        assert!(Block::is_valid(&b2, &b1));
        assert!(!Block::is_valid(&b2, &b0));
    }

    #[test]
    fn block_serialization_roundtrip() {
        let block = Block::genesis().successor(b"\x00\x01binary\xff");
        let json = serde_json::to_string(&block).expect("serialize");
        let recovered: Block = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(block, recovered);
        assert!(recovered.has_valid_hash());
    }
}
