//! Persisted records the processors read or own.

use serde::{Deserialize, Serialize};

use crate::crypto::TxHash;

/// Proof that the fee subsidy of a basis transaction has been paid.
///
/// Owned exclusively by the fee distribution processor: created on commit,
/// deleted on rollback. At most one record exists per `basis_tx_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionFeeRecord {
    /// Transaction whose fee was distributed.
    pub basis_tx_hash: TxHash,
    /// Distribution transaction that paid it.
    pub distribution_tx_hash: TxHash,
}

impl DistributionFeeRecord {
    pub fn new(basis_tx_hash: TxHash, distribution_tx_hash: TxHash) -> Self {
        Self {
            basis_tx_hash,
            distribution_tx_hash,
        }
    }
}

/// An address on a heterogeneous (non-native) chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeterogeneousAddress {
    /// Id of the heterogeneous chain.
    pub chain_id: u16,
    /// Address in that chain's own format.
    pub address: String,
}

impl HeterogeneousAddress {
    pub fn new(chain_id: u16, address: impl Into<String>) -> Self {
        Self {
            chain_id,
            address: address.into(),
        }
    }
}

impl std::fmt::Display for HeterogeneousAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.address)
    }
}

/// Written by the withdrawal subsystem once a withdrawal is confirmed on
/// the heterogeneous chain. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmWithdrawalRecord {
    /// The confirmed withdrawal.
    pub withdrawal_tx_hash: TxHash,
    /// The confirm-withdrawal transaction that recorded it.
    pub confirm_tx_hash: TxHash,
    /// Signers entitled to a share of the distribution fee, in signing order.
    pub reward_addresses: Vec<HeterogeneousAddress>,
}
