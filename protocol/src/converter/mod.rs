//! # Converter: Cross-Chain Fee Distribution
//!
//! Withdrawals to heterogeneous chains are executed by a set of signers.
//! Once a withdrawal is confirmed, its subsidy fee is paid out to the
//! signers' reward addresses by a `DistributionFee` transaction. This module
//! validates those payouts and keeps the record that makes each basis
//! transaction payable only once.
//!
//! ## Validation Order
//!
//! ```text
//! 1. decode payload                      DATA_ERROR
//! 2. basis already seen in this batch    BLOCK_TX_DUPLICATION
//! 3. basis already paid                  DISTRIBUTION_FEE_IS_DUPLICATION
//! 4. basis confirmed                     WITHDRAWAL_TX_NOT_EXIST
//! 5. withdrawal basis: reward addresses  DISTRIBUTION_ADDRESS_LIST_EMPTY
//!                      output count      DISTRIBUTION_ADDRESS_MISMATCH
//!                      equal shares      DISTRIBUTION_FEE_ERROR
//!                      every signer paid DISTRIBUTION_ADDRESS_MISMATCH
//! ```
//!
//! Proposal and other basis types are accepted without further checks.

pub mod distribution;
pub mod txdata;

pub use distribution::FeeDistributionProcessor;
pub use txdata::{BasisTx, DistributionFeeTxData};
