//! # Hashing Utilities
//!
//! Hash functions and the [`TxHash`] identifier used across the ledger.
//!
//! - **SHA-256**: transaction hashes are `double_sha256` of the canonical
//!   transaction bytes, so that hashes produced by external tooling line up
//!   with ours.
//! - **BLAKE3**: composite store keys (heterogeneous address lookups),
//!   where nothing outside this crate needs to reproduce the digest.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of every hash in the ledger, in bytes.
pub const HASH_LENGTH: usize = 32;

/// Compute the SHA-256 hash of the input data.
pub fn sha256(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HASH_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// # Example
///
/// ```
/// use tessera_protocol::crypto::double_sha256;
///
/// let tx_hash = double_sha256(b"raw transaction bytes");
/// assert_eq!(tx_hash.len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> [u8; HASH_LENGTH] {
    sha256(&sha256(data))
}

/// Hash multiple byte slices together without concatenating them first.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; HASH_LENGTH] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

// ---------------------------------------------------------------------------
// TxHash
// ---------------------------------------------------------------------------

/// Errors produced when parsing a [`TxHash`] from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 32-byte transaction (or trading pair) hash.
///
/// Renders as lowercase hex. In human-readable serde formats (JSON) it is a
/// hex string; in binary formats (bincode) it is the raw 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TxHash([u8; HASH_LENGTH]);

impl TxHash {
    /// Wrap raw hash bytes.
    pub const fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Hash arbitrary bytes into a transaction hash (double SHA-256).
    pub fn digest(data: &[u8]) -> Self {
        Self(double_sha256(data))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let bytes = hex::decode(s).map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        let array: [u8; HASH_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| HashParseError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl From<[u8; HASH_LENGTH]> for TxHash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for TxHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl FromStr for TxHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; HASH_LENGTH]>::deserialize(deserializer).map(Self)
        }
    }
}
