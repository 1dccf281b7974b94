//! Where ledger events come from.
//!
//! A [`LogSource`] hands the ingestor a batch of candidate events for a
//! filter. Sources may pre-filter, but they don't have to: the ingestor
//! applies the filter again before anything reaches the chain.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::event::{LogEvent, LogFilter};
use super::IngestError;

/// Producer of candidate events.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch events that may match `filter`.
    async fn fetch_logs(&self, filter: &LogFilter) -> Result<Vec<LogEvent>, IngestError>;
}

// ---------------------------------------------------------------------------
// JsonFileSource
// ---------------------------------------------------------------------------

/// Reads a JSON array of [`LogEvent`]s from disk, e.g. an `eth_getLogs`
/// export joined with block headers.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSource for JsonFileSource {
    async fn fetch_logs(&self, filter: &LogFilter) -> Result<Vec<LogEvent>, IngestError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| IngestError::Io {
                path: self.path.clone(),
                source,
            })?;
        let events: Vec<LogEvent> = serde_json::from_slice(&bytes)?;
        debug!(
            path = %self.path.display(),
            events = events.len(),
            from_block = filter.from_block,
            to_block = filter.to_block,
            "read log file"
        );
        Ok(events)
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// A fixed set of events held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    events: Vec<LogEvent>,
}

impl MemorySource {
    pub fn new(events: Vec<LogEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl LogSource for MemorySource {
    async fn fetch_logs(&self, _filter: &LogFilter) -> Result<Vec<LogEvent>, IngestError> {
        Ok(self.events.clone())
    }
}
