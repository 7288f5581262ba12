// Copyright (c) 2026 Tessera Contributors. MIT License.
// See LICENSE for details.

//! # Tessera Protocol: Transaction Processors
//!
//! The part of a node that decides whether business transactions may enter
//! a block, and that applies or undoes their side effects as blocks are
//! committed or reorganized.
//!
//! ## Architecture
//!
//! - **processor**: The validate / commit / rollback contract and the
//!   registry the block engine drives.
//! - **dex**: Admission of limit orders against their trading pair.
//! - **converter**: Payout of withdrawal fee subsidies to signers.
//! - **chain**: Per-chain handles; chains never share mutable state.
//! - **storage**: Collaborator traits and their sled implementation.
//! - **transaction**: Transactions, coin data and the payload codec.
//! - **crypto**: Hashes.
//! - **config**: Protocol constants and per-chain settings.
//!
//! ## Ground Rules
//!
//! 1. Money is `u128` in the smallest unit. No floats, no silent rounding
//!    in anyone's favour but the ledger's.
//! 2. A malformed transaction is rejected, never a reason to fail the block.
//!    A broken store is.
//! 3. Commit and rollback are idempotent per transaction.

pub mod chain;
pub mod config;
pub mod converter;
pub mod crypto;
pub mod dex;
pub mod processor;
pub mod storage;
pub mod transaction;

use std::sync::Arc;

use chain::ChainManager;
use processor::{ProcessorError, ProcessorRegistry};

/// A registry with every processor this crate provides, sharing `chains`.
pub fn default_registry(chains: Arc<ChainManager>) -> Result<ProcessorRegistry, ProcessorError> {
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(dex::OrderAdmissionValidator::new(Arc::clone(&chains))))?;
    registry.register(Arc::new(converter::FeeDistributionProcessor::new(chains)))?;
    Ok(registry)
}
