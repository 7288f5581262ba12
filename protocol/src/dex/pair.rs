//! Trading pair configuration.

use serde::{Deserialize, Serialize};

use super::validator::OrderError;
use crate::config::MAX_ASSET_DECIMALS;
use crate::crypto::TxHash;
use crate::transaction::AssetKey;

/// The two assets of a market and the precision each side is quoted in.
///
/// Created by the order book subsystem when a pair is listed. Decimals are
/// fixed at creation; the order validator only reads pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPairConfig {
    /// Hash identifying the pair, referenced by every order on it.
    pub pair_hash: TxHash,

    /// Asset being bought or sold.
    pub base_asset: AssetKey,

    /// Asset prices are quoted in.
    pub quote_asset: AssetKey,

    pub base_decimals: u8,
    pub quote_decimals: u8,

    /// Smallest order size, in base asset units.
    pub min_trading_amount: u128,
}

impl TradingPairConfig {
    /// Reject pairs no order could ever be validated against.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.base_asset == self.quote_asset {
            return Err(OrderError::InvalidPair(format!(
                "base and quote are the same asset {}",
                self.base_asset
            )));
        }
        for (side, decimals) in [("base", self.base_decimals), ("quote", self.quote_decimals)] {
            if decimals > MAX_ASSET_DECIMALS {
                return Err(OrderError::InvalidPair(format!(
                    "{side} decimals {decimals} exceed {MAX_ASSET_DECIMALS}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TradingPairConfig {
        TradingPairConfig {
            pair_hash: TxHash::digest(b"pair"),
            base_asset: AssetKey::new(1, 1),
            quote_asset: AssetKey::new(1, 2),
            base_decimals: 8,
            quote_decimals: 8,
            min_trading_amount: 100_000_000,
        }
    }

    #[test]
    fn well_formed_pair_passes() {
        pair().validate().unwrap();
    }

    #[test]
    fn same_asset_on_both_sides_is_rejected() {
        let mut p = pair();
        p.quote_asset = p.base_asset;
        assert!(matches!(p.validate(), Err(OrderError::InvalidPair(_))));
    }

    #[test]
    fn excessive_decimals_are_rejected() {
        let mut p = pair();
        p.quote_decimals = MAX_ASSET_DECIMALS + 1;
        assert!(p.validate().is_err());
    }
}
