//! Fetched ledger events, the filter that selects them, and the record each
//! match becomes.

use serde::{Deserialize, Serialize};

use super::IngestError;
use crate::config::{
    DEFAULT_CONTRACT_ADDRESS, DEFAULT_EVENT_TOPIC, DEFAULT_FROM_BLOCK, DEFAULT_TO_BLOCK,
};

// ---------------------------------------------------------------------------
// LogFilter
// ---------------------------------------------------------------------------

/// Selects events emitted by one contract under one topic within an
/// inclusive range of L1 block numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    /// Emitting contract, `0x`-prefixed hex.
    pub address: String,
    /// Required first topic (the event signature hash), `0x`-prefixed hex.
    pub topic: String,
    pub from_block: u64,
    /// Inclusive.
    pub to_block: u64,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            topic: DEFAULT_EVENT_TOPIC.to_string(),
            from_block: DEFAULT_FROM_BLOCK,
            to_block: DEFAULT_TO_BLOCK,
        }
    }
}

impl LogFilter {
    /// Reject filters that can never match anything.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.from_block > self.to_block {
            return Err(IngestError::InvalidFilter(format!(
                "from_block {} is after to_block {}",
                self.from_block, self.to_block
            )));
        }
        Ok(())
    }

    /// Whether `event` passes this filter. Hex comparisons ignore case.
    pub fn matches(&self, event: &LogEvent) -> bool {
        let topic_matches = event
            .topics
            .first()
            .is_some_and(|t| t.eq_ignore_ascii_case(&self.topic));

        event.address.eq_ignore_ascii_case(&self.address)
            && topic_matches
            && (self.from_block..=self.to_block).contains(&event.block_number)
    }
}

// ---------------------------------------------------------------------------
// LogEvent
// ---------------------------------------------------------------------------

/// One contract log as delivered by a [`LogSource`](super::LogSource),
/// together with the header fields of the L1 block that contains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Log data, `0x`-prefixed hex.
    pub data: String,
    pub block_number: u64,
    pub block_hash: String,
    /// L1 block timestamp, Unix seconds.
    pub block_time: u64,
    pub parent_hash: String,
    /// Position of the log within its L1 block.
    pub log_index: u64,
}

// ---------------------------------------------------------------------------
// L1Info
// ---------------------------------------------------------------------------

/// The record derived from one matched event. Its bincode encoding is the
/// payload of the chain block that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1Info {
    pub block_time: u64,
    pub parent_hash: String,
    /// Raw log data.
    pub l1_info_root: Vec<u8>,
    pub block_number: u64,
    /// Log index within the L1 block. Together with `block_number` it
    /// forms the record's storage key.
    pub index: u64,
}

impl L1Info {
    /// Build the record for `event`, decoding its hex data.
    pub fn from_event(event: &LogEvent) -> Result<Self, IngestError> {
        let data = event.data.strip_prefix("0x").unwrap_or(&event.data);
        Ok(Self {
            block_time: event.block_time,
            parent_hash: event.parent_hash.clone(),
            l1_info_root: hex::decode(data)?,
            block_number: event.block_number,
            index: event.log_index,
        })
    }

    /// Encode as block payload bytes.
    pub fn to_payload(&self) -> Result<Vec<u8>, IngestError> {
        bincode::serialize(self).map_err(|e| IngestError::Encoding(e.to_string()))
    }

    /// Decode a block payload written by [`L1Info::to_payload`].
    pub fn from_payload(payload: &[u8]) -> Result<Self, IngestError> {
        bincode::deserialize(payload).map_err(|e| IngestError::Encoding(e.to_string()))
    }
}
