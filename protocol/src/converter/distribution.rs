//! Processor for `DistributionFee` transactions.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::txdata::{BasisTx, DistributionFeeTxData};
use crate::chain::{Chain, ChainManager};
use crate::crypto::TxHash;
use crate::processor::{
    apply_in_order, BatchResult, Compensation, ErrorCode, ProcessorError, SiblingGroups,
    SyncStatus, TransactionProcessor,
};
use crate::storage::{BlockHeader, DistributionFeeRecord};
use crate::transaction::{NativeAddress, Transaction, TxType};

/// Validates, commits and rolls back fee distributions.
///
/// A distribution pays the subsidy of one confirmed basis transaction to
/// the reward addresses named for it. The payout record written on commit
/// is the only proof a basis has been paid; at most one exists per basis.
#[derive(Debug, Clone)]
pub struct FeeDistributionProcessor {
    chains: Arc<ChainManager>,
}

impl FeeDistributionProcessor {
    pub fn new(chains: Arc<ChainManager>) -> Self {
        Self { chains }
    }

    /// Check one distribution against its basis. `seen` holds the basis
    /// hashes accepted earlier in the same batch.
    fn check(
        &self,
        chain: &Chain,
        tx: &Transaction,
        basis_tx_hash: &TxHash,
        seen: &HashSet<TxHash>,
    ) -> Result<(), ProcessorError> {
        if seen.contains(basis_tx_hash) {
            return Err(ErrorCode::BlockTxDuplication.into());
        }
        if chain.distribution_fees().find_by_basis(basis_tx_hash)?.is_some() {
            return Err(ErrorCode::DistributionFeeIsDuplication.into());
        }
        let basis = chain
            .confirmed_txs()
            .confirmed_tx(basis_tx_hash)?
            .ok_or(ErrorCode::WithdrawalTxNotExist)?;

        match BasisTx::from(basis) {
            BasisTx::Withdrawal(withdrawal) => self.check_withdrawal(chain, tx, &withdrawal),
            BasisTx::Proposal(_) => Ok(()),
            BasisTx::Other(_) => Ok(()),
        }
    }

    /// The distribution must pay an equal share of the chain's withdrawal
    /// fee to exactly the reward addresses of the confirmed withdrawal.
    fn check_withdrawal(
        &self,
        chain: &Chain,
        tx: &Transaction,
        withdrawal: &Transaction,
    ) -> Result<(), ProcessorError> {
        let reward_addresses = chain
            .confirm_withdrawals()
            .find_by_withdrawal(&withdrawal.hash)?
            .map(|record| record.reward_addresses)
            .unwrap_or_default();
        if reward_addresses.is_empty() {
            return Err(ErrorCode::DistributionAddressListEmpty.into());
        }

        let mut expected = Vec::with_capacity(reward_addresses.len());
        for address in &reward_addresses {
            let Some(native) = chain.addresses().reward_address(address)? else {
                debug!(address = %address, "reward address has no native mapping");
                return Err(ErrorCode::DistributionAddressMismatch.into());
            };
            expected.push(native);
        }

        let coins = tx
            .coins()
            .map_err(|_| ProcessorError::Rejected(ErrorCode::DeserializeError))?;
        if coins.to.len() != expected.len() {
            return Err(ErrorCode::DistributionAddressMismatch.into());
        }

        // The remainder of the integer division stays undistributed.
        let share = chain.config().withdrawal_distribution_fee / expected.len() as u128;
        if share == 0 || coins.to.iter().any(|output| output.amount != share) {
            return Err(ErrorCode::DistributionFeeError.into());
        }

        let paid: HashSet<&NativeAddress> =
            coins.to.iter().map(|output| &output.address).collect();
        if let Some(missing) = expected.iter().find(|address| !paid.contains(address)) {
            debug!(address = %missing, "reward address not paid");
            return Err(ErrorCode::DistributionAddressMismatch.into());
        }
        Ok(())
    }

    fn commit_batch(
        &self,
        chain_id: u16,
        txs: &[Transaction],
        header: &BlockHeader,
        sync_status: SyncStatus,
        compensation: Compensation,
    ) -> bool {
        if txs.is_empty() {
            return true;
        }
        let Some(chain) = self.chains.get(chain_id) else {
            error!(chain_id, "distribution commit for unknown chain");
            return false;
        };

        let outcome = apply_in_order(txs, |tx| -> Result<(), ProcessorError> {
            let data: DistributionFeeTxData = tx.payload()?;
            chain
                .distribution_fees()
                .save(&DistributionFeeRecord::new(data.basis_tx_hash, tx.hash))?;
            debug!(
                chain_id,
                tx_hash = %tx.hash,
                basis_tx_hash = %data.basis_tx_hash,
                block = %header,
                ?sync_status,
                "distribution fee committed"
            );
            Ok(())
        });

        match outcome {
            Ok(()) => true,
            Err((tx_hash, err)) => {
                error!(chain_id, tx_hash = %tx_hash, error = %err, "distribution commit failed");
                if compensation == Compensation::Enabled {
                    self.rollback_batch(chain_id, txs, header, Compensation::Suppressed);
                }
                false
            }
        }
    }

    fn rollback_batch(
        &self,
        chain_id: u16,
        txs: &[Transaction],
        header: &BlockHeader,
        compensation: Compensation,
    ) -> bool {
        if txs.is_empty() {
            return true;
        }
        let Some(chain) = self.chains.get(chain_id) else {
            error!(chain_id, "distribution rollback for unknown chain");
            return false;
        };

        let outcome = apply_in_order(txs, |tx| -> Result<(), ProcessorError> {
            let data: DistributionFeeTxData = tx.payload()?;
            let removed = chain
                .distribution_fees()
                .delete(&data.basis_tx_hash, &tx.hash)?;
            debug!(
                chain_id,
                tx_hash = %tx.hash,
                basis_tx_hash = %data.basis_tx_hash,
                block = %header,
                removed,
                "distribution fee rolled back"
            );
            Ok(())
        });

        match outcome {
            Ok(()) => true,
            Err((tx_hash, err)) => {
                error!(chain_id, tx_hash = %tx_hash, error = %err, "distribution rollback failed");
                if compensation == Compensation::Enabled {
                    self.commit_batch(
                        chain_id,
                        txs,
                        header,
                        SyncStatus::Running,
                        Compensation::Suppressed,
                    );
                }
                false
            }
        }
    }
}

impl TransactionProcessor for FeeDistributionProcessor {
    fn tx_type(&self) -> TxType {
        TxType::DistributionFee
    }

    fn validate(
        &self,
        chain_id: u16,
        txs: &[Transaction],
        _siblings: &SiblingGroups,
        _header: Option<&BlockHeader>,
    ) -> BatchResult {
        if txs.is_empty() {
            return BatchResult::empty();
        }
        let Some(chain) = self.chains.get(chain_id) else {
            error!(chain_id, "distribution validation for unknown chain");
            return BatchResult::reject_all(txs, ErrorCode::ChainNotExist);
        };

        let mut seen = HashSet::new();
        let mut result = BatchResult::empty();
        for tx in txs {
            let data: DistributionFeeTxData = match tx.payload() {
                Ok(data) => data,
                Err(err) => {
                    warn!(
                        chain_id,
                        tx_hash = %tx.hash,
                        error_code = %ErrorCode::DataError,
                        error = %err,
                        "distribution payload undecodable"
                    );
                    result.reject(tx, ErrorCode::DataError);
                    continue;
                }
            };

            match self.check(&chain, tx, &data.basis_tx_hash, &seen) {
                Ok(()) => {
                    seen.insert(data.basis_tx_hash);
                }
                Err(err) if err.is_system() => {
                    error!(
                        chain_id,
                        tx_hash = %tx.hash,
                        basis_tx_hash = %data.basis_tx_hash,
                        error = %err,
                        "distribution validation failed, rejecting batch"
                    );
                    return BatchResult::reject_all(txs, ErrorCode::SysUnknownException);
                }
                Err(err) => {
                    warn!(
                        chain_id,
                        tx_hash = %tx.hash,
                        basis_tx_hash = %data.basis_tx_hash,
                        error_code = %err.code(),
                        "distribution fee rejected"
                    );
                    result.reject(tx, err.code());
                }
            }
        }
        result
    }

    fn commit(
        &self,
        chain_id: u16,
        txs: &[Transaction],
        header: &BlockHeader,
        sync_status: SyncStatus,
    ) -> bool {
        self.commit_batch(chain_id, txs, header, sync_status, Compensation::Enabled)
    }

    fn rollback(&self, chain_id: u16, txs: &[Transaction], header: &BlockHeader) -> bool {
        self.rollback_batch(chain_id, txs, header, Compensation::Enabled)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
