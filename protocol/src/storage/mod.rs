//! # Storage Module
//!
//! Persistent state the processors read and own.
//!
//! ## Architecture
//!
//! ```text
//! block.rs   : BlockHeader handed to every processor call
//! records.rs : DistributionFeeRecord, ConfirmWithdrawalRecord, HeterogeneousAddress
//! service.rs : collaborator traits and StoreError
//! db.rs      : sled persistence implementing every collaborator
//! ```
//!
//! ## Ownership
//!
//! Trading pairs, confirmed transactions, withdrawal confirmations and
//! reward address mappings are written by other subsystems and only read
//! here. Distribution records are written and deleted exclusively by the
//! fee distribution processor.

pub mod block;
pub mod db;
pub mod records;
pub mod service;

pub use block::BlockHeader;
pub use db::LedgerDb;
pub use records::{ConfirmWithdrawalRecord, DistributionFeeRecord, HeterogeneousAddress};
pub use service::{
    AddressMapper, ConfirmWithdrawalStore, ConfirmedTxLookup, DistributionFeeStore, StoreError,
    StoreResult, TradingPairRegistry,
};
