//! # Transaction Processors
//!
//! The three-phase contract every business processor implements, and the
//! registry the block engine drives them through.
//!
//! ## Lifecycle
//!
//! ```text
//!             ┌──────────┐  accepted  ┌──────────┐   reorg    ┌──────────┐
//! candidates ─► validate ├────────────►  commit  ├────────────► rollback │
//!             └────┬─────┘            └────┬─────┘            └────┬─────┘
//!                  │ rejected              │ failure               │ failure
//!                  ▼                       ▼                       ▼
//!            excluded from           rollback of the         recommit of the
//!                block                 whole batch             whole batch
//! ```
//!
//! All three calls are batch-oriented: one call per block per transaction
//! type, transactions handled in the order supplied.
//!
//! ## Failure Policy
//!
//! `validate` never aborts on an ordinary rejection; it collects the
//! rejected transactions and carries on. A system failure (storage I/O,
//! corrupted records) fails the remaining batch closed.
//!
//! `commit` and `rollback` stop at the first failing transaction and run
//! the opposite operation over the whole batch once, as best-effort
//! recovery. This is not an atomic transaction: if the compensating call
//! fails too, the block engine must treat the block as fatal.

pub mod error;
pub mod registry;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use error::{ErrorCode, ProcessorError};
pub use registry::{BlockValidation, ProcessorRegistry};

use crate::crypto::TxHash;
use crate::storage::BlockHeader;
use crate::transaction::{Transaction, TxType};

/// Transactions of the same block, grouped by type, in block order.
pub type SiblingGroups = HashMap<TxType, Vec<Transaction>>;

/// Whether the node is catching up with the network or following its tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Syncing,
    #[default]
    Running,
}

// ---------------------------------------------------------------------------
// BatchResult
// ---------------------------------------------------------------------------

/// Outcome of validating one batch.
///
/// Only the last error code seen is kept; per-transaction codes are logged
/// but not returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Rejected transactions, in batch order.
    pub rejected: Vec<Transaction>,
    pub error_code: Option<ErrorCode>,
}

impl BatchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every transaction of `txs` rejected with `code`.
    pub fn reject_all(txs: &[Transaction], code: ErrorCode) -> Self {
        Self {
            rejected: txs.to_vec(),
            error_code: (!txs.is_empty()).then_some(code),
        }
    }

    pub fn reject(&mut self, tx: &Transaction, code: ErrorCode) {
        self.rejected.push(tx.clone());
        self.error_code = Some(code);
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn is_rejected(&self, hash: &TxHash) -> bool {
        self.rejected.iter().any(|tx| tx.hash == *hash)
    }

    /// The transactions of `txs` this result did not reject, in order.
    pub fn accepted<'a>(&self, txs: &'a [Transaction]) -> Vec<&'a Transaction> {
        without_rejected(txs, &self.rejected)
    }
}

/// `txs` minus `rejected`, in order.
///
/// Identical transactions share a hash, so removal is counted: each
/// rejected copy removes one occurrence, starting from the last.
pub fn without_rejected<'a>(
    txs: &'a [Transaction],
    rejected: &[Transaction],
) -> Vec<&'a Transaction> {
    let mut keep: HashMap<TxHash, usize> = HashMap::new();
    for tx in txs {
        *keep.entry(tx.hash).or_default() += 1;
    }
    for tx in rejected {
        if let Some(count) = keep.get_mut(&tx.hash) {
            *count = count.saturating_sub(1);
        }
    }

    txs.iter()
        .filter(|tx| match keep.get_mut(&tx.hash) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// TransactionProcessor
// ---------------------------------------------------------------------------

/// A processor owns every transaction of one [`TxType`].
///
/// Implementations resolve their chain by id on each call and keep no
/// per-chain state between calls. The block engine never calls one
/// processor concurrently for the same chain.
pub trait TransactionProcessor: Send + Sync {
    /// The transaction type this processor owns.
    fn tx_type(&self) -> TxType;

    /// Decide which of `txs` may enter the block. `header` is `None` while
    /// the block is still being assembled.
    fn validate(
        &self,
        chain_id: u16,
        txs: &[Transaction],
        siblings: &SiblingGroups,
        header: Option<&BlockHeader>,
    ) -> BatchResult;

    /// Apply the side effects of a finalized block's transactions.
    fn commit(
        &self,
        chain_id: u16,
        txs: &[Transaction],
        header: &BlockHeader,
        sync_status: SyncStatus,
    ) -> bool;

    /// Undo the side effects of `txs`. Undoing a transaction that was never
    /// applied succeeds.
    fn rollback(&self, chain_id: u16, txs: &[Transaction], header: &BlockHeader) -> bool;
}

/// Whether a failing commit or rollback may run its opposite over the batch.
///
/// The compensating call itself runs with `Suppressed` so a failure there
/// cannot bounce back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compensation {
    Enabled,
    Suppressed,
}

/// Run `step` over `txs` in order, stopping at the first failure.
///
/// Returns the hash of the failing transaction along with its error.
pub fn apply_in_order<E>(
    txs: &[Transaction],
    mut step: impl FnMut(&Transaction) -> Result<(), E>,
) -> Result<(), (TxHash, E)> {
    for tx in txs {
        step(tx).map_err(|err| (tx.hash, err))?;
    }
    Ok(())
}
