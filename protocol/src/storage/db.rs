//! # BlockStore — Persistent Storage
//!
//! The persistence collaborator for loglink, built on sled's embedded
//! key-value store. The chain core never touches disk; this module copies
//! its blocks out and reads them back.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                                | Value             |
//! |------------|------------------------------------|-------------------|
//! | `blocks`   | `index` (8B BE)                    | `bincode(Block)`  |
//! | `l1_info`  | `l1 block ‖ log index` (8B BE each) | `bincode(L1Info)` |
//! | `metadata` | key (UTF-8)                        | value (bytes)     |
//!
//! Indices are big-endian so that sled's lexicographic key order matches
//! numeric order, which makes a full scan of `blocks` come back in chain
//! order.
//!
//! Ingested L1 records get their own tree. Keying them into `blocks` would
//! let a log index overwrite the block stored at the same number. A log
//! index only counts within its L1 block, so the L1 block number is part of
//! the key too.

use std::path::Path;

use sled::{Db, Tree};
use tracing::debug;

use super::block::Block;
use super::chain::Chain;
use crate::config::{INDEX_KEY_LENGTH, L1_INFO_KEY_LENGTH};
use crate::ingest::L1Info;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt store: {0}")]
    Corrupt(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Well-known key in the `metadata` tree for the latest block index.
const META_LATEST_INDEX: &[u8] = b"latest_block_index";

/// Encode a block index as a storage key.
pub fn index_key(index: u64) -> [u8; INDEX_KEY_LENGTH] {
    index.to_be_bytes()
}

/// Encode an L1 record's position as a storage key.
pub fn l1_info_key(block_number: u64, log_index: u64) -> [u8; L1_INFO_KEY_LENGTH] {
    let mut key = [0u8; L1_INFO_KEY_LENGTH];
    key[..INDEX_KEY_LENGTH].copy_from_slice(&block_number.to_be_bytes());
    key[INDEX_KEY_LENGTH..].copy_from_slice(&log_index.to_be_bytes());
    key
}

fn decode_index(bytes: &[u8]) -> DbResult<u64> {
    let raw: [u8; INDEX_KEY_LENGTH] = bytes
        .try_into()
        .map_err(|_| DbError::Corrupt(format!("index key of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}

fn encode<T: serde::Serialize>(value: &T) -> DbResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// BlockStore
// ---------------------------------------------------------------------------

/// sled-backed store for chain blocks and ingested L1 records.
///
/// sled trees are safe to share across threads, so a `BlockStore` can sit
/// behind an `Arc` without extra locking.
#[derive(Debug, Clone)]
pub struct BlockStore {
    db: Db,
    /// Blocks indexed by chain index.
    blocks: Tree,
    /// L1 records indexed by L1 block number, then log index.
    l1_info: Tree,
    metadata: Tree,
}

impl BlockStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// In-memory store discarded on drop. Used by tests.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let blocks = db.open_tree("blocks")?;
        let l1_info = db.open_tree("l1_info")?;
        let metadata = db.open_tree("metadata")?;

        Ok(Self {
            db,
            blocks,
            l1_info,
            metadata,
        })
    }

    // -- Raw key-value -----------------------------------------------------

    /// Store an arbitrary value in the `metadata` tree.
    pub fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()> {
        self.metadata.insert(key, value)?;
        Ok(())
    }

    /// Read a value from the `metadata` tree.
    pub fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.metadata.get(key)?.map(|v| v.to_vec()))
    }

    // -- Block operations ---------------------------------------------------

    /// Store a block under its index.
    ///
    /// The latest index only moves forward, so writers that finish out of
    /// order cannot roll it back.
    pub fn put_block(&self, block: &Block) -> DbResult<()> {
        let key = index_key(block.index);
        self.blocks.insert(key, encode(block)?)?;
        self.metadata
            .fetch_and_update(META_LATEST_INDEX, |current| {
                let advance = match current {
                    Some(bytes) => decode_index(bytes).map_or(true, |c| block.index > c),
                    None => true,
                };
                if advance {
                    Some(key.to_vec())
                } else {
                    current.map(<[u8]>::to_vec)
                }
            })?;
        self.db.flush()?;
        Ok(())
    }

    /// Retrieve a block by index. `None` if nothing is stored there.
    pub fn get_block(&self, index: u64) -> DbResult<Option<Block>> {
        self.blocks
            .get(index_key(index))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Blocks in `start..=end`, ascending.
    pub fn get_block_range(&self, start: u64, end: u64) -> DbResult<Vec<Block>> {
        if start > end {
            return Ok(Vec::new());
        }
        self.blocks
            .range(index_key(start)..=index_key(end))
            .map(|entry| {
                let (_key, value) = entry?;
                decode::<Block>(&value)
            })
            .collect()
    }

    /// Index of the most recently stored block, if any.
    pub fn latest_index(&self) -> DbResult<Option<u64>> {
        self.metadata
            .get(META_LATEST_INDEX)?
            .map(|bytes| decode_index(&bytes))
            .transpose()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    // -- Chain operations ---------------------------------------------------

    /// Write every block of `chain` past the stored latest index.
    ///
    /// The stored tail must be the same block the chain holds at that index;
    /// otherwise the store belongs to a different chain and nothing is
    /// written. Returns how many blocks were written.
    pub fn persist_chain(&self, chain: &Chain) -> DbResult<usize> {
        let start = match self.latest_index()? {
            Some(latest) => {
                let stored = self.get_block(latest)?;
                let held = chain.get(latest);
                match (stored, held) {
                    (Some(stored), Some(held)) if stored.hash == held.hash => latest + 1,
                    _ => {
                        return Err(DbError::Corrupt(format!(
                            "stored block {latest} does not match the chain"
                        )))
                    }
                }
            }
            None => 0,
        };

        let mut written = 0;
        for block in chain.iter().skip_while(|b| b.index < start) {
            self.put_block(block)?;
            written += 1;
        }
        debug!(from = start, written, "persisted chain blocks");
        Ok(written)
    }

    /// Read every stored block back into a chain, in index order.
    ///
    /// Only the genesis root is checked; call [`Chain::verify`] on the
    /// result. Returns `None` when the store holds no blocks.
    pub fn load_chain(&self) -> DbResult<Option<Chain>> {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for entry in self.blocks.iter() {
            let (key, value) = entry?;
            let index = decode_index(&key)?;
            let block: Block = decode(&value)?;
            if block.index != index {
                return Err(DbError::Corrupt(format!(
                    "block stored under key {index} carries index {}",
                    block.index
                )));
            }
            blocks.push(block);
        }
        let Some(first) = blocks.first() else {
            return Ok(None);
        };
        if !first.is_genesis() {
            return Err(DbError::Corrupt(format!(
                "stored chain starts at block {} instead of genesis",
                first.index
            )));
        }
        debug!(blocks = blocks.len(), "loaded chain from store");
        Ok(Chain::restore(blocks))
    }

    // -- L1 record operations -----------------------------------------------

    /// Store an ingested L1 record under its L1 block number and log index.
    pub fn put_l1_info(&self, info: &L1Info) -> DbResult<()> {
        self.l1_info
            .insert(l1_info_key(info.block_number, info.index), encode(info)?)?;
        Ok(())
    }

    pub fn get_l1_info(&self, block_number: u64, log_index: u64) -> DbResult<Option<L1Info>> {
        self.l1_info
            .get(l1_info_key(block_number, log_index))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Whether the record for this log has already been ingested.
    pub fn has_l1_info(&self, block_number: u64, log_index: u64) -> DbResult<bool> {
        Ok(self
            .l1_info
            .contains_key(l1_info_key(block_number, log_index))?)
    }

    pub fn l1_info_count(&self) -> usize {
        self.l1_info.len()
    }

    /// Force pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
