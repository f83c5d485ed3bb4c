use log::debug;
use thiserror::Error;

use std::fmt;

use super::crypto::{FieldHasher, Hash};
use super::transaction::Transaction;
use super::validator::HashValidator;

/// Nonces tried by `Block::mine` before giving up
pub const DEFAULT_MAX_ATTEMPTS: u64 = 1_000_000;

/// Errors that can occur while building a block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("Mining block {index} exhausted {attempts} nonces without a valid hash")]
    MiningExhausted { index: u64, attempts: u64 },
}

/// Represents a block in the blockchain
///
/// A block never changes after construction. Its `hash` is always the
/// digest of the other four fields as computed by `Block::compute_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    index: u64,
    transaction: Transaction,
    previous_hash: Hash,
    nonce: u64,
    hash: Hash,
}

impl Block {
    /// Mines a block, searching nonces `1, 2, 3, ...` until `validator`
    /// accepts the resulting hash
    ///
    /// # Errors
    ///
    /// `BlockError::MiningExhausted` after `DEFAULT_MAX_ATTEMPTS` rejections
    pub fn mine<V>(
        index: u64,
        transaction: Transaction,
        previous_hash: Hash,
        validator: &V,
    ) -> Result<Self, BlockError>
    where
        V: HashValidator + ?Sized,
    {
        Self::mine_with_limit(index, transaction, previous_hash, validator, DEFAULT_MAX_ATTEMPTS)
    }

    /// Mines a block trying at most `max_attempts` nonces
    pub fn mine_with_limit<V>(
        index: u64,
        transaction: Transaction,
        previous_hash: Hash,
        validator: &V,
        max_attempts: u64,
    ) -> Result<Self, BlockError>
    where
        V: HashValidator + ?Sized,
    {
        for nonce in 1..=max_attempts {
            let hash = Self::compute_hash(index, &transaction, &previous_hash, nonce);

            if validator.is_valid(&hash) {
                debug!("Mined block {} with nonce {} ({})", index, nonce, hash);
                return Ok(Block {
                    index,
                    transaction,
                    previous_hash,
                    nonce,
                    hash,
                });
            }
        }

        Err(BlockError::MiningExhausted {
            index,
            attempts: max_attempts,
        })
    }

    /// Rebuilds a block from known fields, recomputing its hash instead of
    /// trusting one
    pub fn reconstruct(index: u64, transaction: Transaction, previous_hash: Hash, nonce: u64) -> Self {
        let hash = Self::compute_hash(index, &transaction, &previous_hash, nonce);

        Block {
            index,
            transaction,
            previous_hash,
            nonce,
            hash,
        }
    }

    /// The canonical block digest.
    ///
    /// SHA-256 over, in order: index, source, target, amount, previous hash
    /// and nonce. Strings and the previous hash are length-prefixed.
    pub fn compute_hash(index: u64, transaction: &Transaction, previous_hash: &Hash, nonce: u64) -> Hash {
        FieldHasher::new()
            .u64(index)
            .str(transaction.source())
            .str(transaction.target())
            .i64(transaction.amount())
            .bytes(previous_hash.as_bytes())
            .u64(nonce)
            .finish()
    }

    /// Checks that the stored hash matches a fresh recomputation
    pub fn is_consistent(&self) -> bool {
        self.hash == Self::compute_hash(self.index, &self.transaction, &self.previous_hash, self.nonce)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// Same block with its transaction swapped but the old hash kept.
    #[cfg(test)]
    pub(crate) fn tampered(&self, transaction: Transaction) -> Block {
        Block {
            transaction,
            ..self.clone()
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block #{}, Transaction: {}, Nonce: {}, Hash: {}",
            self.index, self.transaction, self.nonce, self.hash
        )
    }
}
