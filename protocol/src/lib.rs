// Copyright (c) 2026 loglink contributors. MIT License.
// See LICENSE for details.

//! # loglink — Core Library
//!
//! An append-only, tamper-evident chain of records. Every block commits to
//! its predecessor's SHA-256 hash, so rewriting any stored block breaks the
//! linkage of every block after it, and a full `verify` pass catches it.
//!
//! ## Architecture
//!
//! - **storage** — The chain core (`Block`, `Chain`) and its sled-backed
//!   persistence (`BlockStore`).
//! - **ingest** — Turns ledger events matching an address/topic filter into
//!   block payloads.
//! - **crypto** — The pinned digest.
//! - **config** — Constants and defaults.
//!
//! ## Example
//!
//! ```
//! use loglink_protocol::storage::Chain;
//!
//! let mut chain = Chain::genesis();
//! chain.write(b"abc").unwrap();
//! chain.write(b"def").unwrap();
//!
//! assert_eq!(chain.len(), 3);
//! assert_eq!(chain.tail().index, 2);
//! assert!(chain.verify());
//! ```

pub mod config;
pub mod crypto;
pub mod ingest;
pub mod storage;
