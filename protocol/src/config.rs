//! # Protocol Configuration & Constants
//!
//! Every magic number the processors depend on lives here, together with
//! [`ChainConfig`], the per-chain knobs an operator may override.
//!
//! Constants that are part of consensus (order type discriminants, lock
//! markers) must match on every node. Changing them is a hard fork.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The crate's protocol rule-set version, reported by the node CLI.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Order Book
// ---------------------------------------------------------------------------

/// `TradingOrder::order_type` discriminant for a buy (bid) order.
pub const TRADING_ORDER_BUY_TYPE: u8 = 1;

/// `TradingOrder::order_type` discriminant for a sell (ask) order.
pub const TRADING_ORDER_SELL_TYPE: u8 = 2;

/// Lock time marking an output as held by the order book until the order is
/// filled or cancelled. Negative values are never reachable by block height
/// or timestamp, so the funds stay locked until the order book releases them.
pub const DEX_LOCK_TIME: i64 = -2;

/// Upper bound on asset decimal places accepted for a trading pair.
pub const MAX_ASSET_DECIMALS: u8 = 18;

// ---------------------------------------------------------------------------
// Fee Distribution
// ---------------------------------------------------------------------------

/// Default subsidy paid out for each confirmed withdrawal, in the smallest
/// unit of the native asset (8 decimals: 0.1 native coin).
pub const DEFAULT_WITHDRAWAL_DISTRIBUTION_FEE: u128 = 10_000_000;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// sled tree holding trading pair configurations, keyed by pair hash.
pub const TREE_TRADING_PAIRS: &str = "trading_pairs";

/// sled tree holding confirmed transactions, keyed by transaction hash.
pub const TREE_CONFIRMED_TXS: &str = "confirmed_txs";

/// sled tree holding distribution payout records, keyed by basis tx hash.
pub const TREE_DISTRIBUTION_FEES: &str = "distribution_fees";

/// sled tree holding withdrawal confirmation records, keyed by withdrawal hash.
pub const TREE_CONFIRM_WITHDRAWALS: &str = "confirm_withdrawals";

/// sled tree mapping heterogeneous reward addresses to native addresses.
pub const TREE_REWARD_ADDRESSES: &str = "reward_addresses";

// ---------------------------------------------------------------------------
// ChainConfig
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`ChainConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-chain processing parameters.
///
/// A node serving several chains holds one `ChainConfig` per chain; nothing
/// in here is shared between chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Identifier of the chain these settings apply to.
    pub chain_id: u16,

    /// Lock time every order-locked output must carry.
    pub order_lock_time: i64,

    /// Total fee split between the reward addresses of one confirmed
    /// withdrawal.
    pub withdrawal_distribution_fee: u128,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            order_lock_time: DEX_LOCK_TIME,
            withdrawal_distribution_fee: DEFAULT_WITHDRAWAL_DISTRIBUTION_FEE,
        }
    }
}

impl ChainConfig {
    /// Default settings for the given chain.
    pub fn for_chain(chain_id: u16) -> Self {
        Self {
            chain_id,
            ..Self::default()
        }
    }

    /// Load a config from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every distribution or order invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.withdrawal_distribution_fee == 0 {
            return Err(ConfigError::Invalid(
                "withdrawal_distribution_fee must be greater than zero".to_string(),
            ));
        }
        if self.order_lock_time >= 0 {
            return Err(ConfigError::Invalid(format!(
                "order_lock_time must be a negative lock marker, got {}",
                self.order_lock_time
            )));
        }
        Ok(())
    }
}
