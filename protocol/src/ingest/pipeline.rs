//! # Ingestion Pipeline
//!
//! The `Ingestor` turns fetched ledger events into chain blocks:
//!
//! ```text
//! 1. FETCH   — ask the LogSource for candidate events
//! 2. FILTER  — drop anything outside the address/topic/range filter
//! 3. DEDUP   — skip logs whose L1Info is already stored
//! 4. APPEND  — write the encoded record to the chain under the lock
//! 5. RECORD  — store the L1Info under its L1 block and log index
//! 6. PERSIST — store the new tail block under its chain index
//! ```
//!
//! One bad event does not stop a run. Decode and storage failures are logged
//! and counted, and the pipeline moves on to the next event. Importing the
//! same events twice appends them once.
//!
//! The chain sits behind a single `parking_lot::Mutex`, held from the
//! duplicate check until the L1 record is stored, so two ingestors cannot
//! both append the same log. The lock is never held across an await.
//! If persisting a tail fails, the in-memory chain is ahead of the store
//! until the next `BlockStore::persist_chain`.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::event::{L1Info, LogEvent, LogFilter};
use super::source::LogSource;
use super::IngestError;
use crate::storage::{BlockStore, Chain};

/// Counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Events returned by the source.
    pub fetched: usize,
    /// Events that passed the filter.
    pub matched: usize,
    /// Blocks appended to the chain.
    pub appended: usize,
    /// Events whose block the chain refused.
    pub rejected: usize,
    /// Events already ingested by an earlier run.
    pub duplicates: usize,
    /// Events lost to decode or storage errors.
    pub failed: usize,
}

/// Feeds matched events into a shared chain and its store.
pub struct Ingestor {
    chain: Arc<Mutex<Chain>>,
    store: Arc<BlockStore>,
}

impl Ingestor {
    pub fn new(chain: Arc<Mutex<Chain>>, store: Arc<BlockStore>) -> Self {
        Self { chain, store }
    }

    /// The chain this ingestor appends to.
    pub fn chain(&self) -> &Arc<Mutex<Chain>> {
        &self.chain
    }

    /// Fetch from `source` and ingest every event that passes `filter`.
    ///
    /// Only an invalid filter or a failing source aborts the run; per-event
    /// problems end up in the report.
    pub async fn run<S>(&self, source: &S, filter: &LogFilter) -> Result<IngestReport, IngestError>
    where
        S: LogSource + ?Sized,
    {
        filter.validate()?;
        let events = source.fetch_logs(filter).await?;

        let mut report = IngestReport {
            fetched: events.len(),
            ..IngestReport::default()
        };

        for event in events.iter().filter(|e| filter.matches(e)) {
            report.matched += 1;
            match self.ingest_event(event) {
                Ok(index) => {
                    report.appended += 1;
                    debug!(
                        index,
                        block_number = event.block_number,
                        log_index = event.log_index,
                        "event appended"
                    );
                }
                Err(IngestError::Duplicate { .. }) => {
                    report.duplicates += 1;
                    debug!(
                        block_number = event.block_number,
                        log_index = event.log_index,
                        "event already ingested"
                    );
                }
                Err(IngestError::Rejected(e)) => {
                    report.rejected += 1;
                    warn!(error = %e, block_number = event.block_number, "block rejected");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        error = %e,
                        block_number = event.block_number,
                        log_index = event.log_index,
                        "failed to ingest event"
                    );
                }
            }
        }

        info!(
            fetched = report.fetched,
            matched = report.matched,
            appended = report.appended,
            rejected = report.rejected,
            duplicates = report.duplicates,
            failed = report.failed,
            "ingestion run finished"
        );
        Ok(report)
    }

    /// Ingest a single event. Returns the chain index of the new block.
    ///
    /// The L1 record is stored only once its block is on the chain.
    pub fn ingest_event(&self, event: &LogEvent) -> Result<u64, IngestError> {
        let info = L1Info::from_event(event)?;
        let payload = info.to_payload()?;

        let tail = {
            let mut chain = self.chain.lock();
            if self.store.has_l1_info(info.block_number, info.index)? {
                return Err(IngestError::Duplicate {
                    block_number: info.block_number,
                    log_index: info.index,
                });
            }
            chain.write(&payload)?;
            self.store.put_l1_info(&info)?;
            chain.tail().clone()
        };

        self.store.put_block(&tail)?;
        Ok(tail.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CONTRACT_ADDRESS, DEFAULT_EVENT_TOPIC};
    use crate::ingest::MemorySource;
    use crate::storage::Block;

    fn event(block_number: u64, log_index: u64) -> LogEvent {
        LogEvent {
            address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            topics: vec![DEFAULT_EVENT_TOPIC.to_string()],
            data: format!("0x{:064x}", block_number),
            block_number,
            block_hash: format!("0x{:064x}", block_number + 1),
            block_time: 1_700_000_000 + block_number,
            parent_hash: format!("0x{:064x}", block_number - 1),
            log_index,
        }
    }

    fn setup() -> (Ingestor, Arc<BlockStore>) {
        let store = Arc::new(BlockStore::open_temporary().expect("temp db"));
        let chain = Chain::genesis();
        store.persist_chain(&chain).expect("persist genesis");
        let ingestor = Ingestor::new(Arc::new(Mutex::new(chain)), Arc::clone(&store));
        (ingestor, store)
    }

    #[tokio::test]
    async fn run_appends_matching_events() {
        let (ingestor, store) = setup();
        let source = MemorySource::new(vec![event(1_000_001, 0), event(1_000_002, 1)]);

        let report = ingestor.run(&source, &LogFilter::default()).await.unwrap();

        assert_eq!(
            report,
            IngestReport {
                fetched: 2,
                matched: 2,
                appended: 2,
                ..IngestReport::default()
            }
        );
        let chain = ingestor.chain().lock();
        assert_eq!(chain.len(), 3);
        assert!(chain.verify());
        assert_eq!(store.block_count(), 3);
        assert_eq!(store.l1_info_count(), 2);
    }

    #[tokio::test]
    async fn run_skips_non_matching_events() {
        let (ingestor, _store) = setup();
        let mut foreign = event(1_000_003, 2);
        foreign.address = "0x0000000000000000000000000000000000000000".to_string();
        let out_of_range = event(2_000_000, 3);
        let source = MemorySource::new(vec![event(1_000_001, 0), foreign, out_of_range]);

        let report = ingestor.run(&source, &LogFilter::default()).await.unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.matched, 1);
        assert_eq!(report.appended, 1);
        assert_eq!(ingestor.chain().lock().len(), 2);
    }

    #[tokio::test]
    async fn run_counts_bad_events_and_continues() {
        let (ingestor, _store) = setup();
        let mut broken = event(1_000_001, 0);
        broken.data = "0xzz".to_string();
        let source = MemorySource::new(vec![broken, event(1_000_002, 1)]);

        let report = ingestor.run(&source, &LogFilter::default()).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.appended, 1);
        assert_eq!(ingestor.chain().lock().height(), 1);
    }

    #[tokio::test]
    async fn run_rejects_inverted_filter() {
        let (ingestor, _store) = setup();
        let filter = LogFilter {
            from_block: 10,
            to_block: 1,
            ..LogFilter::default()
        };
        let err = ingestor
            .run(&MemorySource::default(), &filter)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidFilter(_)));
    }

    #[test]
    fn ingested_payload_decodes_to_record() {
        let (ingestor, store) = setup();
        let e = event(1_000_005, 9);

        let index = ingestor.ingest_event(&e).unwrap();
        assert_eq!(index, 1);

        let block = store.get_block(index).unwrap().expect("block persisted");
        let info = L1Info::from_payload(&block.payload).unwrap();
        assert_eq!(info, L1Info::from_event(&e).unwrap());
        assert_eq!(store.get_l1_info(1_000_005, 9).unwrap(), Some(info));
    }

    #[test]
    fn shared_log_index_in_different_l1_blocks() {
        let (ingestor, store) = setup();

        ingestor.ingest_event(&event(1_000_001, 0)).unwrap();
        ingestor.ingest_event(&event(1_000_002, 0)).unwrap();

        assert_eq!(ingestor.chain().lock().len(), 3);
        assert_eq!(store.l1_info_count(), 2);
        assert_eq!(
            store.get_l1_info(1_000_001, 0).unwrap().map(|i| i.block_number),
            Some(1_000_001)
        );
        assert_eq!(
            store.get_l1_info(1_000_002, 0).unwrap().map(|i| i.block_number),
            Some(1_000_002)
        );
    }

    #[tokio::test]
    async fn rerun_skips_already_ingested_events() {
        let (ingestor, store) = setup();
        let source = MemorySource::new(vec![event(1_000_001, 0), event(1_000_002, 1)]);

        let first = ingestor.run(&source, &LogFilter::default()).await.unwrap();
        let second = ingestor.run(&source, &LogFilter::default()).await.unwrap();

        assert_eq!(first.appended, 2);
        assert_eq!(second.appended, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(ingestor.chain().lock().len(), 3);
        assert_eq!(store.block_count(), 3);
    }

    #[test]
    fn rejected_append_stores_no_record() {
        let store = Arc::new(BlockStore::open_temporary().expect("temp db"));
        let genesis = Block::genesis();
        // No valid successor exists past the last representable index.
        let mut last = genesis.successor(b"last");
        last.index = u64::MAX;
        let chain = Chain::restore(vec![genesis, last]).expect("rooted at genesis");
        let ingestor = Ingestor::new(Arc::new(Mutex::new(chain)), Arc::clone(&store));

        let err = ingestor.ingest_event(&event(1_000_001, 0)).unwrap_err();

        assert!(matches!(err, IngestError::Rejected(_)));
        assert_eq!(store.l1_info_count(), 0);
        assert!(!store.has_l1_info(1_000_001, 0).unwrap());
        assert_eq!(store.block_count(), 0);
    }

    #[test]
    fn concurrent_ingestors_share_one_chain() {
        let (ingestor, store) = setup();
        let ingestor = Arc::new(ingestor);

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let ingestor = Arc::clone(&ingestor);
                std::thread::spawn(move || {
                    for i in 0..10u64 {
                        ingestor
                            .ingest_event(&event(1_000_001 + i, t * 100 + i))
                            .expect("ingest");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("ingest thread should not panic");
        }

        let chain = ingestor.chain().lock();
        assert_eq!(chain.len(), 41);
        assert!(chain.verify());
        assert_eq!(store.l1_info_count(), 40);
    }
}
