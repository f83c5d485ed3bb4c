use log::debug;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::block::Block;
use super::chain::{Blockchain, LedgerError, Result};
use super::crypto::Hash;
use super::transaction::Transaction;

/// A `Blockchain` behind one exclusive lock.
///
/// Proof-of-work runs on tokio's blocking pool without holding the lock, so
/// readers and other appends are not stalled by mining. The block is mined
/// against the tail seen when mining started; if the chain moved on in the
/// meantime, `append` rejects it with `PreviousHashMismatch`.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    chain: Arc<Mutex<Blockchain>>,
}

impl SharedLedger {
    pub fn new(chain: Blockchain) -> Self {
        SharedLedger {
            chain: Arc::new(Mutex::new(chain)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Blockchain> {
        // Appends validate before they mutate, so a panic cannot leave the
        // chain half-written.
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mines `transaction` on a worker thread against the current tail
    pub async fn mine(&self, transaction: Transaction) -> Result<Block> {
        let (index, previous_hash, validator, max_attempts) = {
            let chain = self.lock();
            (
                chain.size() as u64,
                chain.tail_hash().clone(),
                chain.shared_validator(),
                chain.config().max_attempts,
            )
        };
        debug!("Mining block {} on {}", index, previous_hash);

        let block = tokio::task::spawn_blocking(move || {
            Block::mine_with_limit(index, transaction, previous_hash, validator.as_ref(), max_attempts)
        })
        .await
        .map_err(|e| LedgerError::SystemError(e.to_string()))??;

        Ok(block)
    }

    pub fn append(&self, block: Block) -> Result<()> {
        self.lock().append(block)
    }

    /// Mines off-thread, then appends
    pub async fn mine_and_append(&self, transaction: Transaction) -> Result<Block> {
        let block = self.mine(transaction).await?;
        self.append(block.clone())?;
        Ok(block)
    }

    pub fn remove_last(&self) -> bool {
        self.lock().remove_last()
    }

    pub fn size(&self) -> usize {
        self.lock().size()
    }

    pub fn tail_hash(&self) -> Hash {
        self.lock().tail_hash().clone()
    }

    pub fn balance(&self, user: &str) -> i64 {
        self.lock().balance(user)
    }

    pub fn users(&self) -> BTreeSet<String> {
        self.lock().users()
    }

    pub fn is_correct(&self) -> bool {
        self.lock().is_correct()
    }

    pub fn check(&self) -> Result<()> {
        self.lock().check()
    }

    /// Runs `f` with the chain locked
    pub fn read<T>(&self, f: impl FnOnce(&Blockchain) -> T) -> T {
        f(&self.lock())
    }
}

impl From<Blockchain> for SharedLedger {
    fn from(chain: Blockchain) -> Self {
        SharedLedger::new(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::chain::Rejection;
    use crate::blockchain::validator::LeadingZeroBytes;

    fn ledger() -> SharedLedger {
        SharedLedger::new(Blockchain::new(LeadingZeroBytes(1)).unwrap())
    }

    #[tokio::test]
    async fn test_mine_and_append() {
        let ledger = ledger();
        ledger.mine_and_append(Transaction::mint("Alice", 100)).await.unwrap();
        ledger.mine_and_append(Transaction::new("Alice", "Bob", 40)).await.unwrap();

        assert_eq!(ledger.size(), 3);
        assert_eq!(ledger.balance("Alice"), 60);
        assert_eq!(ledger.balance("Bob"), 40);
        assert!(ledger.is_correct());
    }

    #[tokio::test]
    async fn test_offloaded_block_matches_inline_mining() {
        let ledger = ledger();
        let offloaded = ledger.mine(Transaction::mint("Alice", 1)).await.unwrap();
        let inline = ledger.read(|chain| chain.mine(Transaction::mint("Alice", 1))).unwrap();

        assert_eq!(offloaded, inline);
    }

    #[tokio::test]
    async fn test_stale_block_is_rejected() {
        let ledger = ledger();
        let stale = ledger.mine(Transaction::mint("Bob", 5)).await.unwrap();
        ledger.mine_and_append(Transaction::mint("Alice", 5)).await.unwrap();
        let tail = ledger.tail_hash();

        let err = ledger.append(stale).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected(Rejection::PreviousHashMismatch { .. })
        ));
        assert_eq!(ledger.size(), 2);
        assert_eq!(ledger.tail_hash(), tail);
    }

    #[tokio::test]
    async fn test_concurrent_miners_keep_chain_correct() {
        let ledger = ledger();
        let mut handles = Vec::new();

        for i in 0..4 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                // Retry until this miner's block lands on the current tail.
                loop {
                    match ledger.mine_and_append(Transaction::mint(format!("user{}", i), 10)).await {
                        Ok(_) => break,
                        Err(LedgerError::Rejected(Rejection::PreviousHashMismatch { .. })) => continue,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(ledger.size(), 5);
        assert_eq!(ledger.users().len(), 4);
        assert!(ledger.check().is_ok());
    }
}
