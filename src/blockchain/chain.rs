use log::{info, warn};
use thiserror::Error;

use std::collections::BTreeSet;
use std::fmt;
use std::iter::FusedIterator;
use std::slice;
use std::sync::Arc;

use super::account::{self, AccountError, Accounts};
use super::block::{Block, BlockError};
use super::config::MiningConfig;
use super::crypto::Hash;
use super::record::RecordError;
use super::transaction::Transaction;
use super::validator::HashValidator;

/// Why `Blockchain::append` refused a block, in the order the checks run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Insufficient balance for {user}: required {required}, available {available}")]
    InsufficientBalance {
        user: String,
        required: i64,
        available: i64,
    },

    #[error("Transaction amount cannot be negative: {0}")]
    NegativeAmount(i64),

    #[error("Crediting {amount} to {user} would overflow balance {balance}")]
    BalanceOverflow {
        user: String,
        balance: i64,
        amount: i64,
    },

    #[error("Previous hash {found} does not match tail hash {expected}")]
    PreviousHashMismatch { expected: Hash, found: Hash },

    #[error("Block hash {stored} does not match its contents ({computed})")]
    HashMismatch { stored: Hash, computed: Hash },

    #[error("Validator rejected hash {0}")]
    InvalidHash(Hash),
}

impl From<AccountError> for Rejection {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InsufficientFunds {
                user,
                required,
                available,
            } => Rejection::InsufficientBalance {
                user,
                required,
                available,
            },
            AccountError::NegativeAmount(amount) => Rejection::NegativeAmount(amount),
            AccountError::BalanceOverflow {
                user,
                balance,
                amount,
            } => Rejection::BalanceOverflow {
                user,
                balance,
                amount,
            },
        }
    }
}

/// A chain invariant found broken by `Blockchain::check`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("previous hash does not match the preceding block")]
    BrokenLink,

    #[error("stored hash does not match the block contents")]
    HashMismatch,

    #[error("hash rejected by the validator")]
    InvalidHash,

    #[error("replay leaves an account out of range: {0}")]
    Balance(AccountError),
}

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Append rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Invalid chain at block {index}: {violation}")]
    InvalidChain { index: usize, violation: Violation },

    #[error("Block error: {0}")]
    BlockError(#[from] BlockError),

    #[error("Record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("No more blocks in the chain")]
    EndOfChain,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("System error: {0}")]
    SystemError(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// An append-only chain of blocks, each carrying one transaction.
///
/// Block 0 is a genesis block holding `("", "", 0)` and linked to the empty
/// hash. Every later block must link to its predecessor's hash, carry a hash
/// the validator accepts, and never overdraw its source.
#[derive(Clone)]
pub struct Blockchain {
    /// The chain of blocks, genesis first
    blocks: Vec<Block>,

    /// Which hashes count as proof of work
    validator: Arc<dyn HashValidator>,

    /// Mining bound and difficulty
    config: MiningConfig,
}

impl Blockchain {
    /// Creates a blockchain with a genesis block mined under `validator`
    pub fn new<V>(validator: V) -> Result<Self>
    where
        V: HashValidator + 'static,
    {
        Self::with_config(validator, MiningConfig::default())
    }

    /// Creates a blockchain using the leading-zero-bytes validator that
    /// `config` describes
    pub fn from_config(config: MiningConfig) -> Result<Self> {
        let validator = config.validator();
        Self::with_config(validator, config)
    }

    /// Creates a blockchain with an explicit mining config
    ///
    /// # Errors
    ///
    /// `ConfigError` for an invalid config, `BlockError` if the genesis block
    /// cannot be mined within `config.max_attempts`
    pub fn with_config<V>(validator: V, config: MiningConfig) -> Result<Self>
    where
        V: HashValidator + 'static,
    {
        Self::from_shared(Arc::new(validator), config)
    }

    pub(crate) fn from_shared(validator: Arc<dyn HashValidator>, config: MiningConfig) -> Result<Self> {
        config.validate().map_err(LedgerError::ConfigError)?;

        let genesis = Block::mine_with_limit(
            0,
            Transaction::genesis(),
            Hash::empty(),
            validator.as_ref(),
            config.max_attempts,
        )?;
        info!("Created genesis block {}", genesis.hash());

        Ok(Blockchain {
            blocks: vec![genesis],
            validator,
            config,
        })
    }

    /// Number of blocks, including genesis
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn last_block(&self) -> &Block {
        // Never empty: the genesis block cannot be removed.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Hash of the last block
    pub fn tail_hash(&self) -> &Hash {
        self.last_block().hash()
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// The policy deciding which hashes count as proof of work
    pub fn validator(&self) -> &dyn HashValidator {
        self.validator.as_ref()
    }

    pub(crate) fn shared_validator(&self) -> Arc<dyn HashValidator> {
        Arc::clone(&self.validator)
    }

    /// Mines a candidate block for `transaction` on top of the current tail.
    ///
    /// The chain is not modified; pass the result to `append`.
    pub fn mine(&self, transaction: Transaction) -> Result<Block> {
        let block = Block::mine_with_limit(
            self.blocks.len() as u64,
            transaction,
            self.tail_hash().clone(),
            self.validator.as_ref(),
            self.config.max_attempts,
        )?;
        Ok(block)
    }

    /// Appends `block` as the new tail.
    ///
    /// Checks, in order: the source can afford the amount, the amount is not
    /// negative (and crediting it keeps the target's balance in range), the
    /// block links to the tail, its hash matches its contents,
    /// and the validator accepts its hash. A rejected block leaves the chain
    /// untouched.
    pub fn append(&mut self, block: Block) -> Result<()> {
        if let Err(rejection) = self.admit(&block) {
            warn!("Rejected block {}: {}", block.index(), rejection);
            return Err(rejection.into());
        }

        info!(
            "Appended block {} ({}) {}",
            block.index(),
            block.hash(),
            block.transaction()
        );
        self.blocks.push(block);
        Ok(())
    }

    fn admit(&self, block: &Block) -> std::result::Result<(), Rejection> {
        let accounts = Accounts::replay(self.transactions());
        accounts.check(block.transaction())?;

        let tail = self.tail_hash();
        if block.previous_hash() != tail {
            return Err(Rejection::PreviousHashMismatch {
                expected: tail.clone(),
                found: block.previous_hash().clone(),
            });
        }

        let computed = Block::compute_hash(
            block.index(),
            block.transaction(),
            block.previous_hash(),
            block.nonce(),
        );
        if block.hash() != &computed {
            return Err(Rejection::HashMismatch {
                stored: block.hash().clone(),
                computed,
            });
        }

        if !self.validator.is_valid(block.hash()) {
            return Err(Rejection::InvalidHash(block.hash().clone()));
        }

        Ok(())
    }

    /// Mines `transaction` and appends the result
    pub fn mine_and_append(&mut self, transaction: Transaction) -> Result<&Block> {
        let block = self.mine(transaction)?;
        self.append(block)?;
        Ok(self.last_block())
    }

    /// Removes the tail block. Returns `false`, changing nothing, when only
    /// the genesis block is left.
    pub fn remove_last(&mut self) -> bool {
        if self.blocks.len() <= 1 {
            return false;
        }

        if let Some(block) = self.blocks.pop() {
            info!("Removed block {} ({})", block.index(), block.hash());
        }
        true
    }

    /// Whether every block links to its predecessor, has a hash matching its
    /// contents that the validator accepts, and replays without overdraft or
    /// overflow
    pub fn is_correct(&self) -> bool {
        self.verify().is_ok()
    }

    /// Like `is_correct`, but reports the first offending block
    pub fn check(&self) -> Result<()> {
        self.verify().map_err(|(index, violation)| {
            warn!("Chain check failed at block {}: {}", index, violation);
            LedgerError::InvalidChain { index, violation }
        })
    }

    fn verify(&self) -> std::result::Result<(), (usize, Violation)> {
        let mut accounts = Accounts::new();
        let mut previous: Option<&Hash> = None;

        for (position, block) in self.blocks.iter().enumerate() {
            if let Some(expected) = previous {
                if block.previous_hash() != expected {
                    return Err((position, Violation::BrokenLink));
                }
            }

            if !block.is_consistent() {
                return Err((position, Violation::HashMismatch));
            }

            if !self.validator.is_valid(block.hash()) {
                return Err((position, Violation::InvalidHash));
            }

            accounts
                .transfer(block.transaction())
                .map_err(|err| (position, Violation::Balance(err)))?;

            previous = Some(block.hash());
        }

        Ok(())
    }

    /// Balance of `user`, replayed from genesis; 0 for unknown users
    pub fn balance(&self, user: &str) -> i64 {
        self.transactions()
            .fold(0i64, |balance, t| balance.saturating_add(account::delta(t, user)))
    }

    /// Every non-empty source or target in the chain
    pub fn users(&self) -> BTreeSet<String> {
        self.transactions()
            .flat_map(|t| [t.source(), t.target()])
            .filter(|user| !user.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Iterates blocks from genesis to tail
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            inner: self.blocks.iter(),
        }
    }

    /// Iterates transactions from genesis to tail
    pub fn transactions(&self) -> Transactions<'_> {
        Transactions {
            inner: self.blocks.iter(),
        }
    }

    /// Swaps the transaction of the block at `position`, keeping its hash.
    #[cfg(test)]
    pub(crate) fn tamper(&mut self, position: usize, transaction: Transaction) {
        let forged = self.blocks[position].tampered(transaction);
        self.blocks[position] = forged;
    }
}

impl fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blockchain")
            .field("blocks", &self.blocks)
            .field("config", &self.config)
            .finish()
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            writeln!(f, "{}", block)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Blockchain {
    type Item = &'a Block;
    type IntoIter = Blocks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks()
    }
}

/// Iterator over the blocks of a `Blockchain`
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    inner: slice::Iter<'a, Block>,
}

impl<'a> Blocks<'a> {
    /// Next block, or `EndOfChain` once the tail has been passed
    pub fn try_next(&mut self) -> Result<&'a Block> {
        self.inner.next().ok_or(LedgerError::EndOfChain)
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Blocks<'_> {}

impl FusedIterator for Blocks<'_> {}

/// Iterator over the transactions of a `Blockchain`
#[derive(Debug, Clone)]
pub struct Transactions<'a> {
    inner: slice::Iter<'a, Block>,
}

impl<'a> Transactions<'a> {
    /// Next transaction, or `EndOfChain` once the tail has been passed
    pub fn try_next(&mut self) -> Result<&'a Transaction> {
        self.next().ok_or(LedgerError::EndOfChain)
    }
}

impl<'a> Iterator for Transactions<'a> {
    type Item = &'a Transaction;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Block::transaction)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Transactions<'_> {}

impl FusedIterator for Transactions<'_> {}
