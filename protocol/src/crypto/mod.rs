//! # Hashing Primitives
//!
//! Transaction hashes, trading pair identifiers, and derived store keys all
//! come from here, as thin wrappers around `sha2` and `blake3`.

pub mod hash;

pub use hash::{blake3_hash_multi, double_sha256, sha256, HashParseError, TxHash};
