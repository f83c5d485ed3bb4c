use super::crypto::Hash;

/// Decides which hashes are acceptable as proof of work.
///
/// Implementations must be deterministic and free of side effects: the
/// ledger calls `is_valid` while mining, again on append, and again for
/// every block whenever the whole chain is checked.
pub trait HashValidator: Send + Sync {
    fn is_valid(&self, hash: &Hash) -> bool;
}

impl<F> HashValidator for F
where
    F: Fn(&Hash) -> bool + Send + Sync,
{
    fn is_valid(&self, hash: &Hash) -> bool {
        self(hash)
    }
}

/// Accepts hashes that start with at least `n` zero bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadingZeroBytes(pub usize);

impl HashValidator for LeadingZeroBytes {
    fn is_valid(&self, hash: &Hash) -> bool {
        hash.len() >= self.0 && hash.as_bytes()[..self.0].iter().all(|&b| b == 0)
    }
}

/// Accepts every hash
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl HashValidator for AcceptAll {
    fn is_valid(&self, _hash: &Hash) -> bool {
        true
    }
}
