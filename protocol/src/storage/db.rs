//! # LedgerDb: Persistent Storage Engine
//!
//! The persistence layer behind every collaborator trait, built on sled's
//! embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree                  | Key                              | Value                            |
//! |-----------------------|----------------------------------|----------------------------------|
//! | `trading_pairs`       | pair hash (32B)                  | `bincode(TradingPairConfig)`     |
//! | `confirmed_txs`       | tx hash (32B)                    | `bincode(Transaction)`           |
//! | `distribution_fees`   | basis tx hash (32B)              | `bincode(DistributionFeeRecord)` |
//! | `confirm_withdrawals` | withdrawal tx hash (32B)         | `bincode(ConfirmWithdrawalRecord)` |
//! | `reward_addresses`    | `blake3(chain_id BE ‖ address)`  | native address (UTF-8)           |
//!
//! ## Atomicity
//!
//! Distribution records are written with compare-and-swap: an insert only
//! lands if the basis hash has no record, and a delete only removes the
//! record the caller wrote. Two distribution transactions can therefore
//! never both hold a payout record for the same basis transaction, even if
//! validation was skipped.

use std::path::Path;

use sled::{CompareAndSwapError, Db, IVec, Tree};

use super::records::{ConfirmWithdrawalRecord, DistributionFeeRecord, HeterogeneousAddress};
use super::service::{
    AddressMapper, ConfirmWithdrawalStore, ConfirmedTxLookup, DistributionFeeStore, StoreError,
    StoreResult, TradingPairRegistry,
};
use crate::config::{
    TREE_CONFIRMED_TXS, TREE_CONFIRM_WITHDRAWALS, TREE_DISTRIBUTION_FEES, TREE_REWARD_ADDRESSES,
    TREE_TRADING_PAIRS,
};
use crate::crypto::{blake3_hash_multi, TxHash};
use crate::dex::TradingPairConfig;
use crate::transaction::{decode_payload, encode_payload, NativeAddress, Transaction};

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent storage for one chain's processor state.
///
/// # Thread Safety
///
/// sled trees support lock-free concurrent reads and serialized writes, so
/// `LedgerDb` is shared across threads via `Arc<LedgerDb>` or cheap clones.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    trading_pairs: Tree,
    confirmed_txs: Tree,
    distribution_fees: Tree,
    confirm_withdrawals: Tree,
    reward_addresses: Tree,
}

impl LedgerDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    ///
    /// Used by unit tests; nothing is left on the filesystem.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        Ok(Self {
            trading_pairs: db.open_tree(TREE_TRADING_PAIRS)?,
            confirmed_txs: db.open_tree(TREE_CONFIRMED_TXS)?,
            distribution_fees: db.open_tree(TREE_DISTRIBUTION_FEES)?,
            confirm_withdrawals: db.open_tree(TREE_CONFIRM_WITHDRAWALS)?,
            reward_addresses: db.open_tree(TREE_REWARD_ADDRESSES)?,
            db,
        })
    }

    // -- Writes owned by other subsystems -----------------------------------

    /// Persist a trading pair configuration.
    pub fn put_trading_pair(&self, pair: &TradingPairConfig) -> StoreResult<()> {
        self.trading_pairs
            .insert(pair.pair_hash.as_bytes(), encode_payload(pair)?)?;
        Ok(())
    }

    /// Persist a confirmed transaction.
    pub fn put_confirmed_tx(&self, tx: &Transaction) -> StoreResult<()> {
        self.confirmed_txs
            .insert(tx.hash.as_bytes(), encode_payload(tx)?)?;
        Ok(())
    }

    /// Persist a withdrawal confirmation.
    pub fn put_confirm_withdrawal(&self, record: &ConfirmWithdrawalRecord) -> StoreResult<()> {
        self.confirm_withdrawals.insert(
            record.withdrawal_tx_hash.as_bytes(),
            encode_payload(record)?,
        )?;
        Ok(())
    }

    /// Register the native payout address of a heterogeneous reward address.
    pub fn put_reward_address(
        &self,
        address: &HeterogeneousAddress,
        native: &NativeAddress,
    ) -> StoreResult<()> {
        self.reward_addresses
            .insert(reward_key(address), native.as_str().as_bytes())?;
        Ok(())
    }

    // -- Utility operations -------------------------------------------------

    /// Number of payout records currently stored.
    pub fn distribution_fee_count(&self) -> usize {
        self.distribution_fees.len()
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }

    fn get_decoded<T: serde::de::DeserializeOwned>(
        tree: &Tree,
        key: &[u8],
    ) -> StoreResult<Option<T>> {
        match tree.get(key)? {
            Some(bytes) => Ok(Some(decode_payload(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn reward_key(address: &HeterogeneousAddress) -> [u8; 32] {
    blake3_hash_multi(&[
        address.chain_id.to_be_bytes().as_slice(),
        address.address.as_bytes(),
    ])
}

// ---------------------------------------------------------------------------
// Collaborator implementations
// ---------------------------------------------------------------------------

impl TradingPairRegistry for LedgerDb {
    fn trading_pair(&self, pair_hash: &TxHash) -> StoreResult<Option<TradingPairConfig>> {
        Self::get_decoded(&self.trading_pairs, pair_hash.as_bytes())
    }
}

impl ConfirmedTxLookup for LedgerDb {
    fn confirmed_tx(&self, hash: &TxHash) -> StoreResult<Option<Transaction>> {
        Self::get_decoded(&self.confirmed_txs, hash.as_bytes())
    }
}

impl ConfirmWithdrawalStore for LedgerDb {
    fn find_by_withdrawal(
        &self,
        withdrawal_tx_hash: &TxHash,
    ) -> StoreResult<Option<ConfirmWithdrawalRecord>> {
        Self::get_decoded(&self.confirm_withdrawals, withdrawal_tx_hash.as_bytes())
    }
}

impl AddressMapper for LedgerDb {
    fn reward_address(&self, address: &HeterogeneousAddress) -> StoreResult<Option<NativeAddress>> {
        Ok(self
            .reward_addresses
            .get(reward_key(address))?
            .map(|bytes| NativeAddress::new(String::from_utf8_lossy(&bytes).into_owned())))
    }
}

impl DistributionFeeStore for LedgerDb {
    fn find_by_basis(&self, basis_tx_hash: &TxHash) -> StoreResult<Option<DistributionFeeRecord>> {
        Self::get_decoded(&self.distribution_fees, basis_tx_hash.as_bytes())
    }

    fn save(&self, record: &DistributionFeeRecord) -> StoreResult<()> {
        let key = record.basis_tx_hash.as_bytes();
        let value = encode_payload(record)?;
        loop {
            match self
                .distribution_fees
                .compare_and_swap(key, None::<&[u8]>, Some(value.clone()))?
            {
                Ok(()) => return Ok(()),
                Err(CompareAndSwapError {
                    current: Some(current),
                    ..
                }) => {
                    let existing: DistributionFeeRecord = decode_payload(&current)?;
                    if existing == *record {
                        return Ok(());
                    }
                    return Err(StoreError::Conflict {
                        basis_tx_hash: record.basis_tx_hash,
                        existing: existing.distribution_tx_hash,
                    });
                }
                // Removed between the check and the swap; try again.
                Err(_) => continue,
            }
        }
    }

    fn delete(&self, basis_tx_hash: &TxHash, distribution_tx_hash: &TxHash) -> StoreResult<bool> {
        let key = basis_tx_hash.as_bytes();
        loop {
            let Some(current) = self.distribution_fees.get(key)? else {
                return Ok(false);
            };
            let existing: DistributionFeeRecord = decode_payload(&current)?;
            if existing.distribution_tx_hash != *distribution_tx_hash {
                return Ok(false);
            }
            if self
                .distribution_fees
                .compare_and_swap(key, Some(&current), None::<IVec>)?
                .is_ok()
            {
                return Ok(true);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
