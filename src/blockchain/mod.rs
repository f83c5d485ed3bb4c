// Blockchain module
//
// This module contains the ledger implementation including:
// - Hash values and the block digest
// - Transaction structure
// - Hash validators (proof-of-work policy)
// - Block structure and mining
// - Balance replay
// - Blockchain structure and its shared, lock-guarded form

pub mod account;
pub mod block;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod record;
pub mod shared;
pub mod transaction;
pub mod validator;

// Re-export main components for easier access
pub use block::{Block, BlockError, DEFAULT_MAX_ATTEMPTS};
pub use chain::{Blockchain, Blocks, LedgerError, Rejection, Result, Transactions, Violation};
pub use config::MiningConfig;
pub use crypto::{Hash, HashError};
pub use record::{BlockRecord, RecordError};
pub use shared::SharedLedger;
pub use transaction::Transaction;
pub use validator::{AcceptAll, HashValidator, LeadingZeroBytes};
