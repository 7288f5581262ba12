//! Payloads of converter transactions and the basis transactions they
//! reference.

use serde::{Deserialize, Serialize};

use crate::crypto::TxHash;
use crate::transaction::{Transaction, TxType};

/// Payload of a `DistributionFee` transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionFeeTxData {
    /// The transaction whose fee subsidy this distribution pays out.
    pub basis_tx_hash: TxHash,
}

impl DistributionFeeTxData {
    pub fn new(basis_tx_hash: TxHash) -> Self {
        Self { basis_tx_hash }
    }
}

/// A confirmed basis transaction, by the kind of distribution it funds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasisTx {
    /// A withdrawal: reward addresses come from its confirmation record.
    Withdrawal(Transaction),
    /// A governance proposal. Vote subsidies are not checked yet.
    Proposal(Transaction),
    /// Any other type. Distributions against it are passed through unchecked.
    Other(Transaction),
}

impl From<Transaction> for BasisTx {
    fn from(tx: Transaction) -> Self {
        match tx.tx_type {
            TxType::Withdrawal => Self::Withdrawal(tx),
            TxType::Proposal => Self::Proposal(tx),
            _ => Self::Other(tx),
        }
    }
}

impl BasisTx {
    pub fn transaction(&self) -> &Transaction {
        match self {
            Self::Withdrawal(tx) | Self::Proposal(tx) | Self::Other(tx) => tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionBuilder;

    #[test]
    fn basis_kind_follows_tx_type() {
        let build = |tx_type| TransactionBuilder::new(tx_type).timestamp(1).build();

        assert!(matches!(
            BasisTx::from(build(TxType::Withdrawal)),
            BasisTx::Withdrawal(_)
        ));
        assert!(matches!(
            BasisTx::from(build(TxType::Proposal)),
            BasisTx::Proposal(_)
        ));
        let other = BasisTx::from(build(TxType::ConfirmWithdrawal));
        assert!(matches!(other, BasisTx::Other(_)));
        assert_eq!(other.transaction().tx_type, TxType::ConfirmWithdrawal);
    }

    #[test]
    fn payload_decodes_from_transaction() {
        let data = DistributionFeeTxData::new(TxHash::digest(b"basis"));
        let tx = TransactionBuilder::new(TxType::DistributionFee)
            .payload(&data)
            .unwrap()
            .build();
        assert_eq!(tx.payload::<DistributionFeeTxData>().unwrap(), data);
    }
}
