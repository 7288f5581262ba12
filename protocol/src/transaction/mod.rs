//! # Transaction Module
//!
//! The ledger vocabulary the processors operate on: a [`Transaction`] with
//! an opaque business payload and encoded [`CoinData`], the [`TxType`] used
//! for dispatch, and the bincode codec both are decoded with.
//!
//! ## Architecture
//!
//! ```text
//! types.rs   : TxType, NativeAddress
//! coin.rs    : CoinData, CoinInput, CoinOutput, AssetKey
//! codec.rs   : decode_payload / encode_payload, hex serde adapter
//! builder.rs : Transaction and its fluent TransactionBuilder
//! ```
//!
//! ## Design Decisions
//!
//! - Amounts are `u128` in the smallest unit of their asset. No floating
//!   point anywhere near monetary values.
//! - Payloads stay encoded until the owning processor decodes them, so a
//!   malformed payload is a per-transaction rejection, not a parse failure
//!   of the whole block.

pub mod builder;
pub mod codec;
pub mod coin;
pub mod types;

pub use builder::{Transaction, TransactionBuilder};
pub use codec::{decode_payload, encode_payload, CodecError};
pub use coin::{AssetKey, CoinData, CoinInput, CoinOutput};
pub use types::{NativeAddress, TxType};
