//! Payload encoding.
//!
//! Business payloads (`tx_data`), coin data and stored records are all
//! bincode. Decoding is generic over the target type so every processor
//! parses its own payload with the same error surface.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Failure to encode or decode a binary payload.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode {payload}: {reason}")]
    Decode {
        payload: &'static str,
        reason: String,
    },

    #[error("failed to encode {payload}: {reason}")]
    Encode {
        payload: &'static str,
        reason: String,
    },
}

/// Decode a payload of type `T` from its bincode bytes.
///
/// Trailing bytes are rejected: a payload must decode exactly.
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    use bincode::Options;

    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
        .deserialize(bytes)
        .map_err(|e| CodecError::Decode {
            payload: short_type_name::<T>(),
            reason: e.to_string(),
        })
}

/// Encode a payload to bincode bytes.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|e| CodecError::Encode {
        payload: short_type_name::<T>(),
        reason: e.to_string(),
    })
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Serde adapter for byte fields: hex strings in JSON, raw bytes in bincode.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s).map_err(serde::de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
