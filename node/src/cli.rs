//! # CLI Interface
//!
//! Command-line arguments for `loglink-node`, defined with `clap` derive.
//! Subcommands: `init`, `import`, `verify`, `show`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use loglink_protocol::config::{
    DEFAULT_CONTRACT_ADDRESS, DEFAULT_EVENT_TOPIC, DEFAULT_FROM_BLOCK, DEFAULT_TO_BLOCK,
};
use loglink_protocol::ingest::LogFilter;

use crate::logging::LogFormat;

/// loglink node.
///
/// Ingests ledger events into an append-only hash chain, persists it, and
/// audits it.
#[derive(Parser, Debug)]
#[command(
    name = "loglink-node",
    about = "Tamper-evident chain of ingested ledger events",
    version,
    propagate_version = true
)]
pub struct LoglinkCli {
    /// Node data directory holding the block store.
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "LOGLINK_DATA_DIR",
        default_value = ".loglink"
    )]
    pub data_dir: PathBuf,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "LOGLINK_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and store a genesis block.
    Init,
    /// Ingest events from a JSON log export into the chain. Events already
    /// ingested are skipped.
    Import(ImportArgs),
    /// Re-validate every stored block.
    Verify,
    /// Print a stored block as JSON.
    Show(ShowArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `import` subcommand.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file holding an array of log events.
    #[arg(long, short = 'l')]
    pub logs: PathBuf,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Event filter flags.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Contract address whose logs are ingested.
    #[arg(long, env = "LOGLINK_ADDRESS", default_value = DEFAULT_CONTRACT_ADDRESS)]
    pub address: String,

    /// Event topic required in the first topic slot.
    #[arg(long, env = "LOGLINK_TOPIC", default_value = DEFAULT_EVENT_TOPIC)]
    pub topic: String,

    /// First L1 block number to accept.
    #[arg(long, default_value_t = DEFAULT_FROM_BLOCK)]
    pub from_block: u64,

    /// Last L1 block number to accept (inclusive).
    #[arg(long, default_value_t = DEFAULT_TO_BLOCK)]
    pub to_block: u64,
}

impl From<FilterArgs> for LogFilter {
    fn from(args: FilterArgs) -> Self {
        LogFilter {
            address: args.address,
            topic: args.topic,
            from_block: args.from_block,
            to_block: args.to_block,
        }
    }
}

/// Arguments for the `show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Block index to print. Defaults to the tail.
    #[arg(long, short = 'i')]
    pub index: Option<u64>,
}
