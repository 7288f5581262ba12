//! # DEX Order Admission
//!
//! Decides whether a limit order transaction may enter a block. Matching
//! orders into trades happens elsewhere; this module only guarantees that
//! every admitted order references a listed pair and locks enough of the
//! right asset to be filled.
//!
//! ## Checks
//!
//! ```text
//! structure   order type, lock time, non-zero price and amount
//! pair        trading pair hash resolves
//! buy side    locks quote asset, amount >= minimum, locked funds cover amount
//! sell side   locks base asset, amount >= minimum, locked amount == amount
//! ```
//!
//! The first failing check decides the rejection.

pub mod order;
pub mod pair;
pub mod validator;

pub use order::{OrderSide, TradingOrder};
pub use pair::TradingPairConfig;
pub use validator::{fillable_base_amount, OrderAdmissionValidator, OrderError};
