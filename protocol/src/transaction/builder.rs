//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] assembles the type, payload and coin data of a
//! [`Transaction`] and derives its hash on `.build()`. Processors never build
//! transactions; the builder exists for the surrounding node, tooling and
//! tests.

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::codec::{decode_payload, encode_payload, hex_bytes, CodecError};
use super::coin::{CoinData, CoinOutput};
use super::types::TxType;
use crate::crypto::TxHash;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A ledger transaction as seen by the processors.
///
/// `tx_data` is the business payload (a `TradingOrder`, a
/// `DistributionFeeTxData`, ...) and `coin_data` the encoded [`CoinData`].
/// Both stay as bytes until a processor decodes them, so a malformed payload
/// is detected by the processor that owns it.
///
/// # Canonical Byte Format
///
/// The hash is `double_sha256` over: type code (2 bytes LE), timestamp
/// (8 bytes LE), then `tx_data`, `coin_data` and `remark`, each prefixed with
/// its length as 4 bytes LE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction hash: `double_sha256(canonical_bytes)`.
    pub hash: TxHash,

    /// Business type; selects the processor.
    pub tx_type: TxType,

    /// Unix timestamp in milliseconds when the transaction was created.
    pub timestamp: u64,

    /// Encoded business payload.
    #[serde(with = "hex_bytes")]
    pub tx_data: Vec<u8>,

    /// Encoded [`CoinData`].
    #[serde(with = "hex_bytes")]
    pub coin_data: Vec<u8>,

    /// Free-form memo. Part of the hash, ignored by the processors.
    #[serde(default)]
    pub remark: String,
}

impl Transaction {
    /// Returns the canonical byte representation used for hashing.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(22 + self.tx_data.len() + self.coin_data.len() + self.remark.len());

        buf.extend_from_slice(&self.tx_type.code().to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        for section in [
            self.tx_data.as_slice(),
            self.coin_data.as_slice(),
            self.remark.as_bytes(),
        ] {
            buf.extend_from_slice(&(section.len() as u32).to_le_bytes());
            buf.extend_from_slice(section);
        }

        buf
    }

    /// Computes the hash from the current field values.
    pub fn compute_hash(&self) -> TxHash {
        TxHash::digest(&self.canonical_bytes())
    }

    /// Returns `true` if `hash` matches the transaction's contents.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Decode the business payload as `T`.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        decode_payload(&self.tx_data)
    }

    /// Decode the coin data section.
    pub fn coins(&self) -> Result<CoinData, CodecError> {
        decode_payload(&self.coin_data)
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Transaction`] instances.
///
/// # Usage
///
/// ```rust
/// use tessera_protocol::crypto::TxHash;
/// use tessera_protocol::converter::DistributionFeeTxData;
/// use tessera_protocol::transaction::{TransactionBuilder, TxType};
///
/// let tx = TransactionBuilder::new(TxType::DistributionFee)
///     .payload(&DistributionFeeTxData::new(TxHash::digest(b"withdrawal")))
///     .unwrap()
///     .timestamp(1_700_000_000_000)
///     .build();
/// assert!(tx.has_valid_hash());
/// ```
///
/// `timestamp` defaults to the current UTC time at build time.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx_type: TxType,
    timestamp: Option<u64>,
    tx_data: Vec<u8>,
    coin_data: Vec<u8>,
    remark: String,
}

impl TransactionBuilder {
    /// Creates a new builder for the given transaction type.
    pub fn new(tx_type: TxType) -> Self {
        Self {
            tx_type,
            timestamp: None,
            tx_data: Vec::new(),
            coin_data: Vec::new(),
            remark: String::new(),
        }
    }

    /// Sets the timestamp explicitly (Unix milliseconds).
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the raw, already encoded business payload.
    pub fn tx_data(mut self, bytes: Vec<u8>) -> Self {
        self.tx_data = bytes;
        self
    }

    /// Encodes `payload` as the business payload.
    pub fn payload<T: Serialize>(self, payload: &T) -> Result<Self, CodecError> {
        Ok(self.tx_data(encode_payload(payload)?))
    }

    /// Sets the raw, already encoded coin data.
    pub fn coin_data(mut self, bytes: Vec<u8>) -> Self {
        self.coin_data = bytes;
        self
    }

    /// Encodes `coins` as the coin data section.
    pub fn coins(self, coins: &CoinData) -> Result<Self, CodecError> {
        Ok(self.coin_data(encode_payload(coins)?))
    }

    /// Encodes a coin data section with no inputs and the given outputs.
    pub fn outputs(self, outputs: Vec<CoinOutput>) -> Result<Self, CodecError> {
        self.coins(&CoinData::with_outputs(outputs))
    }

    /// Attaches a memo.
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// Consumes the builder and produces a hashed [`Transaction`].
    pub fn build(self) -> Transaction {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis() as u64);

        let mut tx = Transaction {
            hash: TxHash::default(),
            tx_type: self.tx_type,
            timestamp,
            tx_data: self.tx_data,
            coin_data: self.coin_data,
            remark: self.remark,
        };

        tx.hash = tx.compute_hash();
        tx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
