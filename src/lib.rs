//! An in-memory, append-only ledger of transfers between named users.
//!
//! Each block holds one transaction and is chained to its predecessor by a
//! SHA-256 digest found through proof-of-work. The chain refuses any block
//! that would let a user spend more than they hold, and can re-verify its
//! whole history at any time.
//!
//! ```no_run
//! use chain_ledger::{Blockchain, LeadingZeroBytes, Transaction};
//!
//! # fn main() -> chain_ledger::Result<()> {
//! let mut chain = Blockchain::new(LeadingZeroBytes(1))?;
//! let block = chain.mine(Transaction::mint("Alice", 100))?;
//! chain.append(block)?;
//! assert_eq!(chain.balance("Alice"), 100);
//! # Ok(())
//! # }
//! ```

pub mod blockchain;

pub use blockchain::*;
