//! Dispatches a block's transactions to the processor registered for each
//! transaction type.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{
    without_rejected, ErrorCode, ProcessorError, SiblingGroups, SyncStatus, TransactionProcessor,
};
use crate::storage::BlockHeader;
use crate::transaction::{Transaction, TxType};

/// Per-block outcome of [`ProcessorRegistry::validate_block`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockValidation {
    /// Transactions that may enter the block, in block order.
    pub accepted: Vec<Transaction>,
    /// Rejected transactions, grouped by type in registration order.
    pub rejected: Vec<Transaction>,
    /// Last error code reported by each processor that rejected anything.
    pub error_codes: BTreeMap<TxType, ErrorCode>,
}

/// The set of processors a node runs, at most one per [`TxType`].
///
/// Commit runs the processors in registration order, rollback in reverse.
/// Transactions of a type with no registered processor pass through.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: Vec<Arc<dyn TransactionProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        processor: Arc<dyn TransactionProcessor>,
    ) -> Result<(), ProcessorError> {
        let tx_type = processor.tx_type();
        if self.get(tx_type).is_some() {
            return Err(ProcessorError::DuplicateProcessor(tx_type));
        }
        self.processors.push(processor);
        Ok(())
    }

    pub fn get(&self, tx_type: TxType) -> Option<&Arc<dyn TransactionProcessor>> {
        self.processors.iter().find(|p| p.tx_type() == tx_type)
    }

    /// Registered types, in registration order.
    pub fn tx_types(&self) -> Vec<TxType> {
        self.processors.iter().map(|p| p.tx_type()).collect()
    }

    /// Group `txs` by type, keeping block order within each group.
    pub fn group(txs: &[Transaction]) -> SiblingGroups {
        let mut groups = SiblingGroups::new();
        for tx in txs {
            groups.entry(tx.tx_type).or_default().push(tx.clone());
        }
        groups
    }

    /// Validate a candidate block, one processor call per type.
    pub fn validate_block(
        &self,
        chain_id: u16,
        txs: &[Transaction],
        header: Option<&BlockHeader>,
    ) -> BlockValidation {
        let groups = Self::group(txs);
        let mut outcome = BlockValidation::default();

        for processor in &self.processors {
            let Some(batch) = groups.get(&processor.tx_type()) else {
                continue;
            };
            let result = processor.validate(chain_id, batch, &groups, header);
            if let Some(code) = result.error_code {
                outcome.error_codes.insert(processor.tx_type(), code);
            }
            outcome.rejected.extend(result.rejected);
        }

        outcome.accepted = without_rejected(txs, &outcome.rejected)
            .into_iter()
            .cloned()
            .collect();
        outcome
    }

    /// Commit a finalized block. If a processor fails, the groups already
    /// committed are rolled back in reverse order and `false` is returned.
    pub fn commit_block(
        &self,
        chain_id: u16,
        txs: &[Transaction],
        header: &BlockHeader,
        sync_status: SyncStatus,
    ) -> bool {
        let groups = Self::group(txs);
        let mut committed: Vec<(&Arc<dyn TransactionProcessor>, &[Transaction])> = Vec::new();

        for processor in &self.processors {
            let Some(batch) = groups.get(&processor.tx_type()) else {
                continue;
            };
            if processor.commit(chain_id, batch, header, sync_status) {
                committed.push((processor, batch.as_slice()));
                continue;
            }

            error!(
                chain_id,
                tx_type = %processor.tx_type(),
                block = %header,
                "block commit failed, rolling back committed groups"
            );
            for (sibling, sibling_batch) in committed.iter().rev() {
                if !sibling.rollback(chain_id, sibling_batch, header) {
                    error!(
                        chain_id,
                        tx_type = %sibling.tx_type(),
                        "rollback of committed group failed"
                    );
                }
            }
            return false;
        }

        debug!(chain_id, block = %header, txs = txs.len(), "block committed");
        true
    }

    /// Roll back a block in reverse registration order. If a processor
    /// fails, the groups already rolled back are recommitted.
    pub fn rollback_block(&self, chain_id: u16, txs: &[Transaction], header: &BlockHeader) -> bool {
        let groups = Self::group(txs);
        let mut rolled_back: Vec<(&Arc<dyn TransactionProcessor>, &[Transaction])> = Vec::new();

        for processor in self.processors.iter().rev() {
            let Some(batch) = groups.get(&processor.tx_type()) else {
                continue;
            };
            if processor.rollback(chain_id, batch, header) {
                rolled_back.push((processor, batch.as_slice()));
                continue;
            }

            error!(
                chain_id,
                tx_type = %processor.tx_type(),
                block = %header,
                "block rollback failed, recommitting rolled back groups"
            );
            for (sibling, sibling_batch) in rolled_back.iter().rev() {
                if !sibling.commit(chain_id, sibling_batch, header, SyncStatus::Running) {
                    error!(
                        chain_id,
                        tx_type = %sibling.tx_type(),
                        "recommit of rolled back group failed"
                    );
                }
            }
            return false;
        }

        debug!(chain_id, block = %header, txs = txs.len(), "block rolled back");
        true
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("tx_types", &self.tx_types())
            .finish()
    }
}
