//! # Chain Handles
//!
//! A node may serve several chains at once. Each chain gets a [`Chain`]
//! handle carrying its [`ChainConfig`] and the collaborators the processors
//! read and write through. Processors never hold chain state themselves:
//! they resolve the handle from the [`ChainManager`] at the start of every
//! call, so two chains processed concurrently share nothing mutable.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::ChainConfig;
use crate::storage::{
    AddressMapper, ConfirmWithdrawalStore, ConfirmedTxLookup, DistributionFeeStore, LedgerDb,
    TradingPairRegistry,
};

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Everything a processor needs to know about one chain.
#[derive(Clone)]
pub struct Chain {
    config: ChainConfig,
    trading_pairs: Arc<dyn TradingPairRegistry>,
    confirmed_txs: Arc<dyn ConfirmedTxLookup>,
    distribution_fees: Arc<dyn DistributionFeeStore>,
    confirm_withdrawals: Arc<dyn ConfirmWithdrawalStore>,
    addresses: Arc<dyn AddressMapper>,
}

impl Chain {
    /// A chain whose every collaborator is backed by the same [`LedgerDb`].
    pub fn with_ledger(config: ChainConfig, ledger: LedgerDb) -> Self {
        let ledger = Arc::new(ledger);
        Self {
            config,
            trading_pairs: ledger.clone(),
            confirmed_txs: ledger.clone(),
            distribution_fees: ledger.clone(),
            confirm_withdrawals: ledger.clone(),
            addresses: ledger,
        }
    }

    pub fn with_trading_pairs(mut self, registry: Arc<dyn TradingPairRegistry>) -> Self {
        self.trading_pairs = registry;
        self
    }

    pub fn with_confirmed_txs(mut self, lookup: Arc<dyn ConfirmedTxLookup>) -> Self {
        self.confirmed_txs = lookup;
        self
    }

    pub fn with_distribution_fees(mut self, store: Arc<dyn DistributionFeeStore>) -> Self {
        self.distribution_fees = store;
        self
    }

    pub fn with_confirm_withdrawals(mut self, store: Arc<dyn ConfirmWithdrawalStore>) -> Self {
        self.confirm_withdrawals = store;
        self
    }

    pub fn with_addresses(mut self, mapper: Arc<dyn AddressMapper>) -> Self {
        self.addresses = mapper;
        self
    }

    pub fn chain_id(&self) -> u16 {
        self.config.chain_id
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn trading_pairs(&self) -> &dyn TradingPairRegistry {
        self.trading_pairs.as_ref()
    }

    pub fn confirmed_txs(&self) -> &dyn ConfirmedTxLookup {
        self.confirmed_txs.as_ref()
    }

    pub fn distribution_fees(&self) -> &dyn DistributionFeeStore {
        self.distribution_fees.as_ref()
    }

    pub fn confirm_withdrawals(&self) -> &dyn ConfirmWithdrawalStore {
        self.confirm_withdrawals.as_ref()
    }

    pub fn addresses(&self) -> &dyn AddressMapper {
        self.addresses.as_ref()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ChainManager
// ---------------------------------------------------------------------------

/// Registry of the chains this node serves, keyed by chain id.
#[derive(Debug, Default)]
pub struct ChainManager {
    chains: DashMap<u16, Arc<Chain>>,
}

impl ChainManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chain, replacing any previous handle with the same id.
    /// Returns the replaced handle.
    pub fn register(&self, chain: Chain) -> Option<Arc<Chain>> {
        self.chains.insert(chain.chain_id(), Arc::new(chain))
    }

    pub fn get(&self, chain_id: u16) -> Option<Arc<Chain>> {
        self.chains.get(&chain_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, chain_id: u16) -> Option<Arc<Chain>> {
        self.chains.remove(&chain_id).map(|(_, chain)| chain)
    }

    /// Ids of every registered chain, ascending.
    pub fn chain_ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.chains.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }
}
