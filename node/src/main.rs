// Copyright (c) 2026 Tessera Contributors. MIT License.
// See LICENSE for details.

//! # Tessera Node
//!
//! Entry point for the `tessera-node` binary. Parses CLI arguments,
//! initializes logging and replays transaction batches through the
//! processors against an on-disk ledger.
//!
//! The binary supports five subcommands:
//!
//! - `validate` : filter a candidate block
//! - `commit`   : apply a finalized block
//! - `rollback` : undo a committed block
//! - `seed`     : load fixture data owned by other subsystems
//! - `version`  : print build version information

mod cli;
mod logging;
mod replay;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;

use cli::{Commands, TesseraNodeCli};
use replay::Session;

/// Envelope printed to stdout for every subcommand.
#[derive(Serialize)]
struct Report<T: Serialize> {
    command: &'static str,
    finished_at: DateTime<Utc>,
    result: T,
}

fn emit<T: Serialize>(command: &'static str, result: T) -> Result<()> {
    let report = Report {
        command,
        finished_at: Utc::now(),
        result,
    };
    let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = TesseraNodeCli::parse();

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Validate(args) => {
            let batch = replay::load_batch(&args.batch)?;
            let session = Session::open(&args.data_dir, args.chain_id, args.config.as_ref())?;
            emit("validate", session.validate(&batch))
        }
        Commands::Commit(args) => {
            let batch = replay::load_batch(&args.batch.batch)?;
            let session = Session::open(
                &args.batch.data_dir,
                args.batch.chain_id,
                args.batch.config.as_ref(),
            )?;
            let outcome = session.commit(&batch, args.sync_status.into())?;
            if !outcome.success {
                tracing::error!(height = outcome.block.height, "block commit failed");
            }
            emit("commit", outcome)
        }
        Commands::Rollback(args) => {
            let batch = replay::load_batch(&args.batch)?;
            let session = Session::open(&args.data_dir, args.chain_id, args.config.as_ref())?;
            let outcome = session.rollback(&batch)?;
            if !outcome.success {
                tracing::error!(height = outcome.block.height, "block rollback failed");
            }
            emit("rollback", outcome)
        }
        Commands::Seed(args) => emit("seed", replay::seed(&args.data_dir, &args.fixture)?),
        Commands::Version => Ok(()),
    }
}

/// Prints version and build information to stdout.
fn print_version() {
    println!("tessera-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol     {}", tessera_protocol::config::PROTOCOL_VERSION);
    println!("rustc        {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
