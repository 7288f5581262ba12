//! Collaborator interfaces the processors consume.
//!
//! Each trait is one capability of the surrounding ledger. [`LedgerDb`]
//! implements all of them; tests substitute individual ones to inject
//! failures.
//!
//! [`LedgerDb`]: super::db::LedgerDb

use thiserror::Error;

use super::records::{ConfirmWithdrawalRecord, DistributionFeeRecord, HeterogeneousAddress};
use crate::crypto::TxHash;
use crate::dex::TradingPairConfig;
use crate::transaction::{CodecError, NativeAddress, Transaction};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Codec(#[from] CodecError),

    /// The basis transaction already has a payout recorded by another
    /// distribution transaction.
    #[error("basis tx {basis_tx_hash} already paid by {existing}")]
    Conflict {
        basis_tx_hash: TxHash,
        existing: TxHash,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Read access to trading pair configurations.
pub trait TradingPairRegistry: Send + Sync {
    fn trading_pair(&self, pair_hash: &TxHash) -> StoreResult<Option<TradingPairConfig>>;
}

/// Lookup of transactions already confirmed on chain.
pub trait ConfirmedTxLookup: Send + Sync {
    fn confirmed_tx(&self, hash: &TxHash) -> StoreResult<Option<Transaction>>;
}

/// Payout records of the fee distribution processor.
pub trait DistributionFeeStore: Send + Sync {
    fn find_by_basis(&self, basis_tx_hash: &TxHash) -> StoreResult<Option<DistributionFeeRecord>>;

    /// Insert a record if the basis transaction has none yet.
    ///
    /// Saving an identical record again succeeds without writing. A record
    /// for the same basis with a different distribution hash fails with
    /// [`StoreError::Conflict`].
    fn save(&self, record: &DistributionFeeRecord) -> StoreResult<()>;

    /// Remove the record of `basis_tx_hash` if it was written by
    /// `distribution_tx_hash`. Returns whether a record was removed; a
    /// missing record is not an error.
    fn delete(&self, basis_tx_hash: &TxHash, distribution_tx_hash: &TxHash) -> StoreResult<bool>;
}

/// Read access to withdrawal confirmations.
pub trait ConfirmWithdrawalStore: Send + Sync {
    fn find_by_withdrawal(
        &self,
        withdrawal_tx_hash: &TxHash,
    ) -> StoreResult<Option<ConfirmWithdrawalRecord>>;
}

/// Maps a heterogeneous reward address to the native address that receives
/// its payouts.
pub trait AddressMapper: Send + Sync {
    fn reward_address(&self, address: &HeterogeneousAddress) -> StoreResult<Option<NativeAddress>>;
}
