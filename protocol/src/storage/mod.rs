//! # Storage Module
//!
//! The hash chain itself and the store it is persisted to.
//!
//! ## Architecture
//!
//! ```text
//! block.rs  — Block structure, genesis/successor construction, hashing, validation
//! chain.rs  — In-memory append-only chain: append, write, verify
//! db.rs     — sled persistence keyed by big-endian block index
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! payload → Block::successor → Chain::append → BlockStore::put_block
//!                                   ↑                   │
//!                             Chain::verify ← BlockStore::load_chain
//! ```
//!
//! `block.rs` and `chain.rs` never do I/O. Everything that touches disk
//! lives in `db.rs`, and a chain read back from disk is only trusted after
//! `verify`.

pub mod block;
pub mod chain;
pub mod db;

pub use block::{compute_block_hash, Block, InvalidBlock, Violation};
pub use chain::Chain;
pub use db::{index_key, l1_info_key, BlockStore, DbError, DbResult};
