use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when handling hashes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("Index {index} is out of range for a hash of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
}

/// An immutable sequence of digest bytes.
///
/// Bytes are copied in on construction and copied out by `to_bytes`, so the
/// internal storage is never shared with a caller.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash(Box<[u8]>);

impl Hash {
    /// Creates a hash holding a copy of `bytes`
    pub fn new(bytes: &[u8]) -> Self {
        Hash(bytes.into())
    }

    /// The zero-length hash used as the genesis block's predecessor
    pub fn empty() -> Self {
        Hash::default()
    }

    /// Parses a hex string (either case) into a hash
    pub fn from_hex(s: &str) -> Result<Self, HashError> {
        let bytes = hex::decode(s).map_err(|e| HashError::InvalidHex(e.to_string()))?;
        Ok(Hash(bytes.into_boxed_slice()))
    }

    /// Number of bytes in the hash
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets the byte at position `index`
    ///
    /// # Errors
    ///
    /// `HashError::IndexOutOfRange` if `index >= len()`
    pub fn get(&self, index: usize) -> Result<u8, HashError> {
        self.0.get(index).copied().ok_or(HashError::IndexOutOfRange {
            index,
            length: self.0.len(),
        })
    }

    /// Returns a fresh copy of the bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Borrows the bytes read-only
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Renders the hash as two uppercase hex digits per byte
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash::new(&bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Incremental SHA-256 over length-delimited fields.
///
/// Integers are written big-endian at fixed width and variable-length fields
/// are prefixed with their byte length, so no two distinct field sequences
/// feed the digest the same bytes.
pub struct FieldHasher {
    hasher: Sha256,
}

impl FieldHasher {
    pub fn new() -> Self {
        FieldHasher {
            hasher: Sha256::new(),
        }
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.hasher.update(value.to_be_bytes());
        self
    }

    pub fn i64(mut self, value: i64) -> Self {
        self.hasher.update(value.to_be_bytes());
        self
    }

    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.hasher.update((value.len() as u64).to_be_bytes());
        self.hasher.update(value);
        self
    }

    pub fn str(self, value: &str) -> Self {
        self.bytes(value.as_bytes())
    }

    pub fn finish(self) -> Hash {
        let digest: [u8; 32] = self.hasher.finalize().into();
        Hash::from(digest)
    }
}

impl Default for FieldHasher {
    fn default() -> Self {
        Self::new()
    }
}
