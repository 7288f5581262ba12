//! # CLI Interface
//!
//! Defines the command-line argument structure for `tessera-node` using
//! `clap` derive. The batch subcommands (`validate`, `commit`, `rollback`)
//! replay a JSON batch through the processors against an on-disk ledger;
//! `seed` loads fixture data written by other subsystems; `version` prints
//! build information.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Tessera transaction processor node.
///
/// Replays batches of transactions through the order admission and fee
/// distribution processors. Results are printed to stdout as JSON; logs go
/// to stderr.
#[derive(Parser, Debug)]
#[command(
    name = "tessera-node",
    about = "Tessera transaction processor node",
    version,
    propagate_version = true
)]
pub struct TesseraNodeCli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "tessera_node=info,tessera_protocol=info")]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a candidate block and print which transactions may enter it.
    Validate(BatchArgs),
    /// Commit a finalized block.
    Commit(CommitArgs),
    /// Roll back a committed block.
    Rollback(BatchArgs),
    /// Load trading pairs, confirmed transactions, withdrawal confirmations
    /// and reward address mappings into the data directory.
    Seed(SeedArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments shared by every batch subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Ledger data directory. Created on first use.
    #[arg(long, short = 'd', env = "TESSERA_DATA_DIR", default_value = "./tessera-data")]
    pub data_dir: PathBuf,

    /// Chain the batch belongs to.
    #[arg(long, env = "TESSERA_CHAIN_ID", default_value_t = 1)]
    pub chain_id: u16,

    /// JSON chain config. Defaults apply when omitted.
    #[arg(long, short = 'c', env = "TESSERA_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON batch file: `{ "header": {...}, "transactions": [...] }`.
    #[arg(long, short = 'b')]
    pub batch: PathBuf,
}

/// Arguments for the `commit` subcommand.
#[derive(Args, Debug)]
pub struct CommitArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Whether the node is catching up or following the tip.
    #[arg(long, value_enum, default_value_t = SyncMode::Running)]
    pub sync_status: SyncMode,
}

/// Arguments for the `seed` subcommand.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Ledger data directory. Created on first use.
    #[arg(long, short = 'd', env = "TESSERA_DATA_DIR", default_value = "./tessera-data")]
    pub data_dir: PathBuf,

    /// JSON fixture file.
    #[arg(long, short = 'f')]
    pub fixture: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SyncMode {
    Syncing,
    Running,
}

impl From<SyncMode> for tessera_protocol::processor::SyncStatus {
    fn from(mode: SyncMode) -> Self {
        match mode {
            SyncMode::Syncing => Self::Syncing,
            SyncMode::Running => Self::Running,
        }
    }
}
