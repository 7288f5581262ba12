//! Coin data: the ledger-level inputs and outputs of a transaction.
//!
//! The ledger layer is authoritative for these values; processors only read
//! them. All amounts are `u128` in the smallest unit of their asset.

use serde::{Deserialize, Serialize};

use super::types::NativeAddress;

/// Identifies an asset by the chain that issued it and its id on that chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetKey {
    pub chain_id: u16,
    pub asset_id: u16,
}

impl AssetKey {
    pub const fn new(chain_id: u16, asset_id: u16) -> Self {
        Self { chain_id, asset_id }
    }
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.chain_id, self.asset_id)
    }
}

/// Funds spent by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInput {
    pub address: NativeAddress,
    pub asset_chain_id: u16,
    pub asset_id: u16,
    pub amount: u128,
    /// Nonce of the account spending the funds.
    pub nonce: u64,
}

/// Funds received (or locked) by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinOutput {
    pub address: NativeAddress,
    pub asset_chain_id: u16,
    pub asset_id: u16,
    pub amount: u128,
    /// Zero for freely spendable outputs; negative values are lock markers.
    pub lock_time: i64,
}

impl CoinOutput {
    pub fn new(address: NativeAddress, asset: AssetKey, amount: u128, lock_time: i64) -> Self {
        Self {
            address,
            asset_chain_id: asset.chain_id,
            asset_id: asset.asset_id,
            amount,
            lock_time,
        }
    }

    pub fn asset(&self) -> AssetKey {
        AssetKey::new(self.asset_chain_id, self.asset_id)
    }
}

/// The decoded `coin_data` section of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinData {
    pub from: Vec<CoinInput>,
    pub to: Vec<CoinOutput>,
}

impl CoinData {
    pub fn with_outputs(to: Vec<CoinOutput>) -> Self {
        Self {
            from: Vec::new(),
            to,
        }
    }

    /// First output, which carries the funds an order locks.
    pub fn first_output(&self) -> Option<&CoinOutput> {
        self.to.first()
    }
}
