use thiserror::Error;

use std::collections::HashMap;

use super::transaction::Transaction;

/// Errors that can occur while applying a transaction to balances
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("Insufficient funds for {user}: required {required}, available {available}")]
    InsufficientFunds {
        user: String,
        required: i64,
        available: i64,
    },

    #[error("Negative amount: {0}")]
    NegativeAmount(i64),

    #[error("Crediting {amount} to {user} overflows balance {balance}")]
    BalanceOverflow {
        user: String,
        balance: i64,
        amount: i64,
    },
}

/// How much `transaction` changes the balance of `user`
pub fn delta(transaction: &Transaction, user: &str) -> i64 {
    if user.is_empty() {
        return 0;
    }

    let debited = transaction.source() == user;
    let credited = transaction.target() == user;
    match (debited, credited) {
        (true, false) => transaction.amount().saturating_neg(),
        (false, true) => transaction.amount(),
        _ => 0,
    }
}

/// Running balances built by replaying transactions in chain order.
///
/// A transaction debits its source first, then credits its target. Minting
/// transactions (empty source) only credit.
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    balances: HashMap<String, i64>,
}

impl Accounts {
    pub fn new() -> Self {
        Accounts::default()
    }

    /// Replays `transactions` without any checks
    pub fn replay<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut accounts = Accounts::new();
        for transaction in transactions {
            accounts.apply(transaction);
        }
        accounts
    }

    /// Current balance of `user`; unknown users hold 0
    pub fn balance(&self, user: &str) -> i64 {
        self.balances.get(user).copied().unwrap_or(0)
    }

    /// Checks that `transaction` could be applied without overdrawing its
    /// source or overflowing its target, without changing any balance
    pub fn check(&self, transaction: &Transaction) -> Result<(), AccountError> {
        if !transaction.is_mint() {
            let available = self.balance(transaction.source());
            if available < transaction.amount() {
                return Err(AccountError::InsufficientFunds {
                    user: transaction.source().to_string(),
                    required: transaction.amount(),
                    available,
                });
            }
        }

        if transaction.amount() < 0 {
            return Err(AccountError::NegativeAmount(transaction.amount()));
        }

        // A self-transfer is debited before it is credited, so it nets zero.
        let target = transaction.target();
        if !target.is_empty() && target != transaction.source() {
            let balance = self.balance(target);
            if balance.checked_add(transaction.amount()).is_none() {
                return Err(AccountError::BalanceOverflow {
                    user: target.to_string(),
                    balance,
                    amount: transaction.amount(),
                });
            }
        }

        Ok(())
    }

    /// Applies `transaction` after `check` accepts it
    pub fn transfer(&mut self, transaction: &Transaction) -> Result<(), AccountError> {
        self.check(transaction)?;
        self.apply(transaction);
        Ok(())
    }

    // Saturates rather than wraps; `check` keeps admitted chains in range.
    fn apply(&mut self, transaction: &Transaction) {
        let amount = transaction.amount();
        if !transaction.is_mint() {
            let source = self.balances.entry(transaction.source().to_string()).or_insert(0);
            *source = source.saturating_sub(amount);
        }
        if !transaction.target().is_empty() {
            let target = self.balances.entry(transaction.target().to_string()).or_insert(0);
            *target = target.saturating_add(amount);
        }
    }
}
