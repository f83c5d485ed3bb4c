use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::block::Block;
use super::crypto::Hash;
use super::transaction::Transaction;

/// Errors that can occur while encoding or decoding block records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

/// The fields of a block that travel between processes.
///
/// The block hash is deliberately absent: a receiver always recomputes it
/// through `Block::reconstruct` and checks it against the validator and the
/// chain it is appended to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub index: u64,
    pub transaction: Transaction,
    pub previous_hash: Hash,
    pub nonce: u64,
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        BlockRecord {
            index: block.index(),
            transaction: block.transaction().clone(),
            previous_hash: block.previous_hash().clone(),
            nonce: block.nonce(),
        }
    }
}

impl From<BlockRecord> for Block {
    fn from(record: BlockRecord) -> Self {
        Block::reconstruct(record.index, record.transaction, record.previous_hash, record.nonce)
    }
}

impl BlockRecord {
    pub fn encode(&self) -> Result<Vec<u8>, RecordError> {
        bincode::serialize(self).map_err(|e| RecordError::SerializationError(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        bincode::deserialize(bytes).map_err(|e| RecordError::DeserializationError(e.to_string()))
    }
}

impl Block {
    /// Encodes the block's fields, without its hash
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        BlockRecord::from(self).encode()
    }

    /// Decodes a block, recomputing its hash from the decoded fields
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        BlockRecord::decode(bytes).map(Block::from)
    }
}
