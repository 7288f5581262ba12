//! # Batch Replay
//!
//! Opens a chain on an on-disk ledger and drives JSON batches through the
//! processor registry. Also loads the fixture data the processors read but
//! never write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, ensure, Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use tessera_protocol::chain::{Chain, ChainManager};
use tessera_protocol::config::ChainConfig;
use tessera_protocol::default_registry;
use tessera_protocol::dex::TradingPairConfig;
use tessera_protocol::processor::{BlockValidation, ProcessorRegistry, SyncStatus};
use tessera_protocol::storage::{
    BlockHeader, ConfirmWithdrawalRecord, HeterogeneousAddress, LedgerDb,
};
use tessera_protocol::transaction::{NativeAddress, Transaction};

// ---------------------------------------------------------------------------
// File formats
// ---------------------------------------------------------------------------

/// A block's worth of transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchFile {
    /// Header of the block. Required for commit and rollback.
    #[serde(default)]
    pub header: Option<BlockHeader>,
    pub transactions: Vec<Transaction>,
}

/// One heterogeneous reward address and its native payout address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardAddressEntry {
    pub heterogeneous: HeterogeneousAddress,
    pub native: NativeAddress,
}

/// Records owned by other subsystems, loaded by `seed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub trading_pairs: Vec<TradingPairConfig>,
    pub confirmed_txs: Vec<Transaction>,
    pub confirm_withdrawals: Vec<ConfirmWithdrawalRecord>,
    pub reward_addresses: Vec<RewardAddressEntry>,
}

/// What `seed` wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub trading_pairs: usize,
    pub confirmed_txs: usize,
    pub confirm_withdrawals: usize,
    pub reward_addresses: usize,
}

/// Result of a commit or rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub success: bool,
    pub block: BlockHeader,
    pub transactions: usize,
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {what} file {}", path.display()))
}

/// Load a batch and check every transaction hash against its contents.
pub fn load_batch(path: &Path) -> Result<BatchFile> {
    let batch: BatchFile = read_json(path, "batch")?;
    for tx in &batch.transactions {
        ensure!(
            tx.has_valid_hash(),
            "transaction {} does not match its contents (expected {})",
            tx.hash,
            tx.compute_hash()
        );
    }
    Ok(batch)
}

fn open_ledger(data_dir: &Path) -> Result<LedgerDb> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    LedgerDb::open(data_dir)
        .with_context(|| format!("failed to open ledger at {}", data_dir.display()))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One chain on one ledger, with every processor registered.
pub struct Session {
    chain_id: u16,
    ledger: LedgerDb,
    registry: ProcessorRegistry,
}

impl Session {
    pub fn open(data_dir: &Path, chain_id: u16, config: Option<&PathBuf>) -> Result<Self> {
        let config = match config {
            Some(path) => {
                let config = ChainConfig::from_json_file(path)
                    .with_context(|| format!("failed to load chain config {}", path.display()))?;
                if config.chain_id != chain_id {
                    bail!(
                        "config is for chain {} but --chain-id is {}",
                        config.chain_id,
                        chain_id
                    );
                }
                config
            }
            None => ChainConfig::for_chain(chain_id),
        };

        let ledger = open_ledger(data_dir)?;
        let chains = Arc::new(ChainManager::new());
        chains.register(Chain::with_ledger(config, ledger.clone()));
        let registry = default_registry(chains).context("failed to register processors")?;

        tracing::info!(
            chain_id,
            data_dir = %data_dir.display(),
            processors = ?registry.tx_types(),
            "session opened"
        );
        Ok(Self {
            chain_id,
            ledger,
            registry,
        })
    }

    pub fn validate(&self, batch: &BatchFile) -> BlockValidation {
        let outcome =
            self.registry
                .validate_block(self.chain_id, &batch.transactions, batch.header.as_ref());
        tracing::info!(
            chain_id = self.chain_id,
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "batch validated"
        );
        outcome
    }

    pub fn commit(&self, batch: &BatchFile, sync_status: SyncStatus) -> Result<ApplyOutcome> {
        let header = batch
            .header
            .clone()
            .context("commit requires a block header in the batch file")?;
        let success =
            self.registry
                .commit_block(self.chain_id, &batch.transactions, &header, sync_status);
        self.ledger.flush().context("failed to flush ledger")?;
        Ok(ApplyOutcome {
            success,
            block: header,
            transactions: batch.transactions.len(),
        })
    }

    pub fn rollback(&self, batch: &BatchFile) -> Result<ApplyOutcome> {
        let header = batch
            .header
            .clone()
            .context("rollback requires a block header in the batch file")?;
        let success = self
            .registry
            .rollback_block(self.chain_id, &batch.transactions, &header);
        self.ledger.flush().context("failed to flush ledger")?;
        Ok(ApplyOutcome {
            success,
            block: header,
            transactions: batch.transactions.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Write a fixture file into the ledger at `data_dir`.
pub fn seed(data_dir: &Path, fixture_path: &Path) -> Result<SeedSummary> {
    let fixture: Fixture = read_json(fixture_path, "fixture")?;
    let ledger = open_ledger(data_dir)?;

    for pair in &fixture.trading_pairs {
        pair.validate()
            .with_context(|| format!("refusing trading pair {}", pair.pair_hash))?;
        ledger.put_trading_pair(pair)?;
    }
    for tx in &fixture.confirmed_txs {
        ensure!(
            tx.has_valid_hash(),
            "confirmed transaction {} does not match its contents",
            tx.hash
        );
        ledger.put_confirmed_tx(tx)?;
    }
    for record in &fixture.confirm_withdrawals {
        ledger.put_confirm_withdrawal(record)?;
    }
    for entry in &fixture.reward_addresses {
        ledger.put_reward_address(&entry.heterogeneous, &entry.native)?;
    }
    ledger.flush().context("failed to flush ledger")?;

    let summary = SeedSummary {
        trading_pairs: fixture.trading_pairs.len(),
        confirmed_txs: fixture.confirmed_txs.len(),
        confirm_withdrawals: fixture.confirm_withdrawals.len(),
        reward_addresses: fixture.reward_addresses.len(),
    };
    tracing::info!(data_dir = %data_dir.display(), ?summary, "fixture seeded");
    Ok(summary)
}
