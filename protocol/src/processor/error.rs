//! Error codes reported to the block engine, and the processor error type
//! that carries them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StoreError;
use crate::transaction::{CodecError, TxType};

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Why a transaction was rejected.
///
/// Each variant has a stable string form used in batch results and logs.
/// The string forms are part of the node's external contract and must not
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed payload, invalid order type or lock time, zero price or amount.
    DataError,
    /// Referenced trading pair does not exist.
    DataNotFound,
    /// Locked asset or amount does not match the order.
    OrderCoinNotEqual,
    /// Order amount below the pair's minimum trading size.
    BelowTradingMinSize,
    /// Same basis transaction referenced twice in one batch.
    BlockTxDuplication,
    /// Basis transaction already paid in an earlier block.
    DistributionFeeIsDuplication,
    /// Basis transaction is not confirmed.
    WithdrawalTxNotExist,
    DistributionAddressListEmpty,
    DistributionAddressMismatch,
    DistributionFeeError,
    /// Coin data of a distribution transaction could not be decoded.
    DeserializeError,
    ChainNotExist,
    /// Unexpected failure; the remaining batch was failed closed.
    SysUnknownException,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DataError => "DATA_ERROR",
            Self::DataNotFound => "DATA_NOT_FOUND",
            Self::OrderCoinNotEqual => "ORDER_COIN_NOT_EQUAL",
            Self::BelowTradingMinSize => "BELOW_TRADING_MIN_SIZE",
            Self::BlockTxDuplication => "BLOCK_TX_DUPLICATION",
            Self::DistributionFeeIsDuplication => "DISTRIBUTION_FEE_IS_DUPLICATION",
            Self::WithdrawalTxNotExist => "WITHDRAWAL_TX_NOT_EXIST",
            Self::DistributionAddressListEmpty => "DISTRIBUTION_ADDRESS_LIST_EMPTY",
            Self::DistributionAddressMismatch => "DISTRIBUTION_ADDRESS_MISMATCH",
            Self::DistributionFeeError => "DISTRIBUTION_FEE_ERROR",
            Self::DeserializeError => "DESERIALIZE_ERROR",
            Self::ChainNotExist => "CHAIN_NOT_EXIST",
            Self::SysUnknownException => "SYS_UNKNOWN_EXCEPTION",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProcessorError
// ---------------------------------------------------------------------------

/// Failure while processing a transaction.
///
/// [`ProcessorError::Rejected`] is an ordinary, transaction-local rejection.
/// Every other variant is a system failure: during validation it fails the
/// rest of the batch closed, during commit or rollback it triggers the
/// compensating action.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("transaction rejected: {0}")]
    Rejected(ErrorCode),

    #[error("chain {0} is not registered")]
    ChainNotExist(u16),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("a processor for {0} is already registered")]
    DuplicateProcessor(TxType),
}

impl ProcessorError {
    /// The code reported to the block engine for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Rejected(code) => *code,
            Self::ChainNotExist(_) => ErrorCode::ChainNotExist,
            Self::Store(_) | Self::DuplicateProcessor(_) => ErrorCode::SysUnknownException,
        }
    }

    /// Whether this failure is unexpected rather than a verdict on the
    /// transaction itself.
    pub fn is_system(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

impl From<ErrorCode> for ProcessorError {
    fn from(code: ErrorCode) -> Self {
        Self::Rejected(code)
    }
}

impl From<CodecError> for ProcessorError {
    /// A payload that fails to decode is a malformed transaction.
    fn from(_: CodecError) -> Self {
        Self::Rejected(ErrorCode::DataError)
    }
}
