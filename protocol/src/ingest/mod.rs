//! # Log Ingestion
//!
//! Moves ledger events into the chain. A [`LogSource`] supplies candidate
//! events, a [`LogFilter`] picks the ones emitted by the tracked contract
//! under the tracked topic, and the [`Ingestor`] converts each match into an
//! [`L1Info`] record whose encoding becomes the payload of a new block.
//!
//! ```text
//! event.rs    — LogFilter, LogEvent, L1Info
//! source.rs   — LogSource trait, JSON file and in-memory sources
//! pipeline.rs — Ingestor and per-run IngestReport
//! ```

pub mod event;
pub mod pipeline;
pub mod source;

use std::path::PathBuf;

use crate::storage::{DbError, InvalidBlock};

pub use event::{L1Info, LogEvent, LogFilter};
pub use pipeline::{IngestReport, Ingestor};
pub use source::{JsonFileSource, LogSource, MemorySource};

/// Errors raised while fetching or ingesting events.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed event JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed hex log data: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("record encoding error: {0}")]
    Encoding(String),

    #[error("log {log_index} of L1 block {block_number} is already ingested")]
    Duplicate { block_number: u64, log_index: u64 },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("storage error: {0}")]
    Store(#[from] DbError),

    #[error(transparent)]
    Rejected(#[from] InvalidBlock),
}
