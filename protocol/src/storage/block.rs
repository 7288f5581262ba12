//! # Block Header
//!
//! The processors never see a full block: the block engine hands them the
//! header of the block being assembled, committed or rolled back, together
//! with the slice of that block's transactions they own. The header is used
//! for logging and for recording where a record was written.

use serde::{Deserialize, Serialize};

use crate::crypto::TxHash;

/// Header of the block a processor call belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height (0-indexed, genesis = 0).
    pub height: u64,
    /// Hash of this block.
    pub hash: TxHash,
    /// Unix timestamp (milliseconds) when this block was produced.
    pub timestamp: u64,
}

impl BlockHeader {
    pub fn new(height: u64, hash: TxHash, timestamp: u64) -> Self {
        Self {
            height,
            hash,
            timestamp,
        }
    }
}

impl std::fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} ({})", self.height, self.hash)
    }
}
