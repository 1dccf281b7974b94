//! Walkthrough of the loglink chain lifecycle.
//!
//! Builds a chain, ingests a few events, persists it to a temporary store,
//! reloads it, then tampers with one block and shows verification failing.
//!
//! Run with:
//!   cargo run --example demo

use std::sync::Arc;

use parking_lot::Mutex;

use loglink_protocol::config::{DEFAULT_CONTRACT_ADDRESS, DEFAULT_EVENT_TOPIC};
use loglink_protocol::ingest::{Ingestor, LogEvent, LogFilter, MemorySource};
use loglink_protocol::storage::{BlockStore, Chain};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";

fn step(title: &str) {
    println!("\n{BOLD}== {title}{RESET}");
}

fn print_chain(chain: &Chain) {
    for block in chain {
        println!(
            "  {DIM}#{:<3}{RESET} {}  prev={}  payload={}B",
            block.index,
            &block.hash_hex()[..16],
            if block.previous_hash.is_empty() {
                "-".repeat(16)
            } else {
                block.previous_hash_hex()[..16].to_string()
            },
            block.payload.len()
        );
    }
}

fn verdict(chain: &Chain) {
    match chain.audit() {
        Ok(()) => println!("  {GREEN}verified{RESET} ({} blocks)", chain.len()),
        Err(e) => println!("  {RED}rejected{RESET}: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    step("Genesis");
    let mut chain = Chain::genesis();
    print_chain(&chain);

    step("Direct writes");
    chain.write(b"abc")?;
    chain.write(b"def")?;
    print_chain(&chain);
    verdict(&chain);

    step("Ingest events");
    let store = Arc::new(BlockStore::open_temporary()?);
    store.persist_chain(&chain)?;
    let events: Vec<LogEvent> = (0..3u64)
        .map(|i| LogEvent {
            address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            topics: vec![DEFAULT_EVENT_TOPIC.to_string()],
            data: format!("0x{:064x}", i + 1),
            block_number: 1_000_100 + i,
            block_hash: format!("0x{:064x}", 1_000_100 + i),
            block_time: 1_700_000_000 + 12 * i,
            parent_hash: format!("0x{:064x}", 1_000_099 + i),
            log_index: i,
        })
        .collect();
    let ingestor = Ingestor::new(Arc::new(Mutex::new(chain)), Arc::clone(&store));
    let report = ingestor
        .run(&MemorySource::new(events), &LogFilter::default())
        .await?;
    println!("  {report:?}");

    step("Reload from store");
    let reloaded = store.load_chain()?.ok_or("store is empty")?;
    print_chain(&reloaded);
    verdict(&reloaded);

    step("Tamper with block 2");
    let mut blocks = reloaded.into_blocks();
    blocks[2].payload = b"DEF".to_vec();
    let tampered = Chain::restore(blocks).ok_or("no blocks")?;
    verdict(&tampered);

    Ok(())
}
