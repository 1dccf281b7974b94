// Copyright (c) 2026 loglink contributors. MIT License.
// See LICENSE for details.

//! # loglink Node
//!
//! Entry point for the `loglink-node` binary. Parses CLI arguments,
//! initializes logging, and runs one subcommand against the block store in
//! the data directory:
//!
//! - `init`    — create the store with a genesis block
//! - `import`  — ingest a JSON log export, persist, then verify
//! - `verify`  — audit every stored block
//! - `show`    — print one block as JSON
//! - `version` — print build version information

mod cli;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use parking_lot::Mutex;

use loglink_protocol::config::{DEFAULT_DB_DIR, HASH_ALGORITHM, PROTOCOL_VERSION};
use loglink_protocol::ingest::{Ingestor, JsonFileSource, L1Info, LogFilter};
use loglink_protocol::storage::{Block, BlockStore, Chain};

use cli::{Commands, LoglinkCli};

const DEFAULT_LOG_LEVEL: &str = "loglink_node=info,loglink_protocol=info";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LoglinkCli::parse();

    if !matches!(cli.command, Commands::Version) {
        logging::init_logging(DEFAULT_LOG_LEVEL, cli.log_format);
    }

    match cli.command {
        Commands::Init => init_store(&cli.data_dir),
        Commands::Import(args) => {
            import_logs(&cli.data_dir, &args.logs, args.filter.into()).await
        }
        Commands::Verify => verify_store(&cli.data_dir),
        Commands::Show(args) => show_block(&cli.data_dir, args.index),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DEFAULT_DB_DIR)
}

fn open_store(data_dir: &Path) -> Result<BlockStore> {
    let path = db_path(data_dir);
    std::fs::create_dir_all(&path)
        .with_context(|| format!("failed to create database directory: {}", path.display()))?;
    let store = BlockStore::open(&path)
        .with_context(|| format!("failed to open block store at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "block store opened");
    Ok(store)
}

/// Load the stored chain, or start and persist a new one when the store is
/// empty. A stored chain that fails verification is never extended.
fn load_or_create_chain(store: &BlockStore) -> Result<Chain> {
    match store.load_chain().context("failed to read stored chain")? {
        Some(chain) => {
            chain
                .audit()
                .context("stored chain failed verification; refusing to extend it")?;
            tracing::info!(height = chain.height(), "loaded stored chain");
            Ok(chain)
        }
        None => {
            let chain = Chain::genesis();
            store
                .persist_chain(&chain)
                .context("failed to persist genesis block")?;
            tracing::info!(hash = %chain.genesis_block().hash_hex(), "created genesis block");
            Ok(chain)
        }
    }
}

fn load_chain(store: &BlockStore) -> Result<Chain> {
    store
        .load_chain()
        .context("failed to read stored chain")?
        .context("block store is empty; run `loglink-node init` first")
}

fn init_store(data_dir: &Path) -> Result<()> {
    tracing::info!(data_dir = %data_dir.display(), "initializing node");
    let store = open_store(data_dir)?;
    let chain = load_or_create_chain(&store)?;
    store.flush().context("failed to flush block store")?;

    println!("Node initialized.");
    println!("  Block store  : {}", db_path(data_dir).display());
    println!("  Height       : {}", chain.height());
    println!("  Genesis hash : {}", chain.genesis_block().hash_hex());
    Ok(())
}

async fn import_logs(data_dir: &Path, logs: &Path, filter: LogFilter) -> Result<()> {
    let store = Arc::new(open_store(data_dir)?);
    let chain = load_or_create_chain(&store)?;

    tracing::info!(
        logs = %logs.display(),
        address = %filter.address,
        topic = %filter.topic,
        from_block = filter.from_block,
        to_block = filter.to_block,
        "importing logs"
    );

    let ingestor = Ingestor::new(Arc::new(Mutex::new(chain)), Arc::clone(&store));
    let source = JsonFileSource::new(logs);
    let report = ingestor
        .run(&source, &filter)
        .await
        .with_context(|| format!("failed to import {}", logs.display()))?;

    let chain = ingestor.chain().lock().clone();
    store
        .persist_chain(&chain)
        .context("failed to persist chain")?;
    store.flush().context("failed to flush block store")?;

    if !chain.verify() {
        bail!("chain verification failed after import");
    }

    println!(
        "Imported {} of {} fetched events ({} matched, {} already present, {} rejected, {} failed).",
        report.appended,
        report.fetched,
        report.matched,
        report.duplicates,
        report.rejected,
        report.failed
    );
    println!("Chain height {} verified.", chain.height());
    Ok(())
}

fn verify_store(data_dir: &Path) -> Result<()> {
    let store = open_store(data_dir)?;
    let chain = load_chain(&store)?;

    match chain.audit() {
        Ok(()) => {
            tracing::info!(blocks = chain.len(), "chain verified");
            println!("Chain of {} blocks verified.", chain.len());
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "chain verification failed");
            bail!("chain verification failed: {e}")
        }
    }
}

fn show_block(data_dir: &Path, index: Option<u64>) -> Result<()> {
    let store = open_store(data_dir)?;
    let chain = load_chain(&store)?;

    let block = match index {
        Some(i) => chain
            .get(i)
            .with_context(|| format!("no block at index {i} (height {})", chain.height()))?,
        None => chain.tail(),
    };

    let rendered = serde_json::to_string_pretty(&block_json(block))
        .context("failed to render block")?;
    println!("{rendered}");
    Ok(())
}

fn block_json(block: &Block) -> serde_json::Value {
    let record = if block.is_genesis() {
        None
    } else {
        L1Info::from_payload(&block.payload).ok().map(|info| {
            serde_json::json!({
                "blockTime": info.block_time,
                "parentHash": info.parent_hash,
                "l1InfoRoot": format!("0x{}", hex::encode(&info.l1_info_root)),
                "blockNumber": info.block_number,
                "logIndex": info.index,
            })
        })
    };

    serde_json::json!({
        "index": block.index,
        "timestamp": block.timestamp.to_rfc3339(),
        "payload": hex::encode(&block.payload),
        "previousHash": block.previous_hash_hex(),
        "hash": block.hash_hex(),
        "hashValid": block.has_valid_hash(),
        "l1Info": record,
    })
}

/// Prints version information to stdout.
fn print_version() {
    println!("loglink-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol     {}", PROTOCOL_VERSION);
    println!("digest       {}", HASH_ALGORITHM);
}
