//! Core type definitions for ledger transactions.
//!
//! These types form the vocabulary the processors dispatch on. They are
//! intentionally small and `Copy` so that grouping a block by type does not
//! allocate per transaction.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TxType
// ---------------------------------------------------------------------------

/// Business type of a transaction.
///
/// The type decides which processor validates, commits and rolls back the
/// transaction. Each variant has a stable numeric code that is part of the
/// transaction's canonical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TxType {
    /// Plain value transfer.
    Transfer,
    /// Limit order placed on the decentralized exchange.
    TradingOrder,
    /// Withdrawal of assets to a heterogeneous chain.
    Withdrawal,
    /// Confirmation that a withdrawal was executed on the heterogeneous chain.
    ConfirmWithdrawal,
    /// Governance proposal.
    Proposal,
    /// Payout of an accrued subsidy fee to reward addresses.
    DistributionFee,
}

impl TxType {
    /// Stable numeric code used in canonical transaction bytes.
    pub fn code(self) -> u16 {
        match self {
            Self::Transfer => 2,
            Self::TradingOrder => 30,
            Self::Withdrawal => 43,
            Self::ConfirmWithdrawal => 44,
            Self::Proposal => 45,
            Self::DistributionFee => 46,
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "Transfer"),
            Self::TradingOrder => write!(f, "TradingOrder"),
            Self::Withdrawal => write!(f, "Withdrawal"),
            Self::ConfirmWithdrawal => write!(f, "ConfirmWithdrawal"),
            Self::Proposal => write!(f, "Proposal"),
            Self::DistributionFee => write!(f, "DistributionFee"),
        }
    }
}

// ---------------------------------------------------------------------------
// NativeAddress
// ---------------------------------------------------------------------------

/// An address on the native chain, as carried in coin data outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeAddress(pub String);

impl NativeAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_type_codes_are_unique() {
        let types = [
            TxType::Transfer,
            TxType::TradingOrder,
            TxType::Withdrawal,
            TxType::ConfirmWithdrawal,
            TxType::Proposal,
            TxType::DistributionFee,
        ];
        let mut codes: Vec<u16> = types.iter().map(|t| t.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), types.len());
    }

    #[test]
    fn tx_type_display() {
        assert_eq!(TxType::DistributionFee.to_string(), "DistributionFee");
        assert_eq!(TxType::TradingOrder.to_string(), "TradingOrder");
    }

    #[test]
    fn native_address_is_a_plain_json_string() {
        let addr = NativeAddress::new("TNVTdTSPRnXkDiagy7enti1KL75NU5AxC9sQA");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"TNVTdTSPRnXkDiagy7enti1KL75NU5AxC9sQA\"");
    }
}
