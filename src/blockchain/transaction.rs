use serde::{Deserialize, Serialize};

use std::fmt;

/// A transfer of `amount` from `source` to `target`.
///
/// An empty `source` marks a minting transaction, which debits nobody.
/// The sign of `amount` is not checked here; the ledger rejects negative
/// amounts when a block is appended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    source: String,
    target: String,
    amount: i64,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `source` - The user being debited, or `""` for a mint
    /// * `target` - The user being credited
    /// * `amount` - The amount transferred
    pub fn new(source: impl Into<String>, target: impl Into<String>, amount: i64) -> Self {
        Transaction {
            source: source.into(),
            target: target.into(),
            amount,
        }
    }

    /// Creates a minting transaction that credits `target` out of thin air
    pub fn mint(target: impl Into<String>, amount: i64) -> Self {
        Transaction::new("", target, amount)
    }

    /// The empty transaction carried by every genesis block
    pub fn genesis() -> Self {
        Transaction::new("", "", 0)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Checks if the transaction debits nobody
    pub fn is_mint(&self) -> bool {
        self.source.is_empty()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Source: {}, Target: {}, Amount: {}]",
            self.source, self.target, self.amount
        )
    }
}
