//! End-to-end scenarios for the ledger, driven through the public API only.

use anyhow::Result;
use chain_ledger::{
    Block, Blockchain, Hash, LeadingZeroBytes, LedgerError, MiningConfig, Rejection, Transaction,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Accepts every hash whose first byte is zero
fn first_byte_zero(hash: &Hash) -> bool {
    hash.get(0) == Ok(0)
}

#[test]
fn test_alice_pays_bob() -> Result<()> {
    init_logger();
    let mut chain = Blockchain::new(first_byte_zero)?;

    let block = chain.mine(Transaction::new("", "Alice", 100))?;
    chain.append(block)?;
    assert_eq!(chain.balance("Alice"), 100);

    let block = chain.mine(Transaction::new("Alice", "Bob", 40))?;
    chain.append(block)?;
    assert_eq!(chain.balance("Alice"), 60);
    assert_eq!(chain.balance("Bob"), 40);

    let size = chain.size();
    let tail = chain.tail_hash().clone();
    let block = chain.mine(Transaction::new("Alice", "Bob", 1000))?;
    let err = chain.append(block).unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Rejected(Rejection::InsufficientBalance { .. })
    ));
    assert_eq!(chain.size(), size);
    assert_eq!(chain.tail_hash(), &tail);
    assert_eq!(chain.balance("Alice"), 60);
    assert_eq!(chain.balance("Bob"), 40);
    assert!(chain.is_correct());
    Ok(())
}

#[test]
fn test_remove_and_remine() -> Result<()> {
    init_logger();
    let mut chain = Blockchain::new(first_byte_zero)?;
    chain.mine_and_append(Transaction::mint("Alice", 100))?;
    chain.mine_and_append(Transaction::new("Alice", "Bob", 40))?;
    assert_eq!(chain.size(), 3);

    assert!(chain.remove_last());
    let tail = chain.tail_hash().clone();

    let block = chain.mine(Transaction::new("Alice", "Carol", 10))?;
    assert_eq!(block.index(), 2);
    assert_eq!(block.previous_hash(), &tail);
    chain.append(block)?;

    assert_eq!(chain.size(), 3);
    assert!(chain.is_correct());
    chain.check()?;
    assert_eq!(chain.balance("Bob"), 0);
    assert_eq!(chain.balance("Carol"), 10);
    Ok(())
}

#[test]
fn test_genesis_is_permanent() -> Result<()> {
    let mut chain = Blockchain::new(LeadingZeroBytes(1))?;
    let genesis = chain.genesis().clone();

    assert!(!chain.remove_last());
    assert!(!chain.remove_last());
    assert_eq!(chain.size(), 1);
    assert_eq!(chain.genesis(), &genesis);
    assert_eq!(genesis.transaction(), &Transaction::genesis());
    Ok(())
}

#[test]
fn test_same_validator_gives_same_chain() -> Result<()> {
    let mut a = Blockchain::new(LeadingZeroBytes(1))?;
    let mut b = Blockchain::new(LeadingZeroBytes(1))?;
    assert_eq!(a.genesis(), b.genesis());

    a.mine_and_append(Transaction::mint("Alice", 7))?;
    b.mine_and_append(Transaction::mint("Alice", 7))?;
    assert_eq!(a.tail_hash(), b.tail_hash());
    Ok(())
}

#[test]
fn test_blocks_cross_ledgers_as_bytes() -> Result<()> {
    init_logger();
    let mut source = Blockchain::new(LeadingZeroBytes(1))?;
    source.mine_and_append(Transaction::mint("Alice", 50))?;
    source.mine_and_append(Transaction::new("Alice", "Bob", 20))?;

    let mut replica = Blockchain::new(LeadingZeroBytes(1))?;
    for block in source.blocks().skip(1) {
        let bytes = block.to_bytes()?;
        replica.append(Block::from_bytes(&bytes)?)?;
    }

    assert_eq!(replica.size(), source.size());
    assert_eq!(replica.tail_hash(), source.tail_hash());
    assert_eq!(replica.balance("Bob"), 20);
    assert!(replica.is_correct());
    Ok(())
}

#[test]
fn test_balances_never_negative_on_any_prefix() -> Result<()> {
    let mut chain = Blockchain::new(LeadingZeroBytes(1))?;
    let attempts = [
        Transaction::mint("Alice", 30),
        Transaction::new("Alice", "Bob", 20),
        Transaction::new("Bob", "Carol", 25),
        Transaction::new("Bob", "Carol", 15),
        Transaction::new("Alice", "Alice", 10),
        Transaction::new("Carol", "Alice", 16),
        Transaction::mint("Bob", -3),
    ];
    for transaction in attempts {
        let block = chain.mine(transaction)?;
        let _ = chain.append(block);
    }
    assert_eq!(chain.size(), 5);

    let mut prefix = Blockchain::new(LeadingZeroBytes(1))?;
    for block in chain.blocks().skip(1) {
        prefix.append(block.clone())?;
        for user in chain.users() {
            assert!(prefix.balance(&user) >= 0, "{} went negative", user);
        }
    }
    assert_eq!(chain.balance("Alice"), 10);
    assert_eq!(chain.balance("Bob"), 5);
    assert_eq!(chain.balance("Carol"), 15);
    Ok(())
}

#[test]
fn test_config_from_json() -> Result<()> {
    let config = MiningConfig::from_json(r#"{"max_attempts": 5000000, "difficulty": 1}"#)
        .map_err(anyhow::Error::msg)?;
    let mut chain = Blockchain::from_config(config)?;
    let block = chain.mine_and_append(Transaction::mint("Alice", 1))?;

    assert_eq!(block.hash().get(0)?, 0);
    Ok(())
}

#[test]
fn test_balances_stay_in_range_near_max() -> Result<()> {
    init_logger();
    let mut chain = Blockchain::new(LeadingZeroBytes(1))?;
    chain.mine_and_append(Transaction::mint("Alice", i64::MAX))?;

    let err = chain.mine_and_append(Transaction::mint("Alice", 1)).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Rejected(Rejection::BalanceOverflow { .. })
    ));
    assert_eq!(chain.size(), 2);
    assert_eq!(chain.balance("Alice"), i64::MAX);

    chain.mine_and_append(Transaction::new("Alice", "Bob", i64::MAX - 1))?;
    chain.mine_and_append(Transaction::mint("Alice", 1))?;
    let block = chain.mine(Transaction::new("Alice", "Bob", 2))?;
    assert!(chain.append(block).is_err());

    assert_eq!(chain.balance("Alice"), 2);
    assert_eq!(chain.balance("Bob"), i64::MAX - 1);
    for user in chain.users() {
        assert!(chain.balance(&user) >= 0);
    }
    assert!(chain.is_correct());
    Ok(())
}
