//! Identifier types for protocol entities
//!
//! Accounts and assets are both addressed by 32-byte digests. `TokenId`
//! ordering is the canonical total order used to give every unordered token
//! pair exactly one pool.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::errors::IdError;

/// Hash a domain tag followed by length-prefixed parts.
///
/// Length prefixes keep `("ab", "c")` and `("a", "bc")` from colliding.
pub fn domain_hash(domain: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update((domain.len() as u32).to_be_bytes());
    hasher.update(domain.as_bytes());
    for part in parts {
        hasher.update((part.len() as u32).to_be_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Ledger account address.
///
/// The all-zero address is the empty identity: nobody holds a key for it,
/// so balances sent there are permanently locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(#[serde(with = "hex::serde")] [u8; 32]);

impl Address {
    /// Unspendable address used for locked liquidity.
    pub const BURN: Address = Address([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive a deterministic address from a domain tag and parts.
    pub fn derive(domain: &str, parts: &[&[u8]]) -> Self {
        Self(domain_hash(domain, parts))
    }

    /// True for the empty identity.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex32(s).map(Self)
    }
}

/// Asset identifier.
///
/// `TokenId::BASE` is the chain's native asset. Every other token id is
/// derived from the address of the account that owns (mints) it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(#[serde(with = "hex::serde")] [u8; 32]);

impl TokenId {
    /// The native (base) asset.
    pub const BASE: TokenId = TokenId([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Token id of the asset minted by `owner`.
    pub fn derive(owner: &Address) -> Self {
        Self(domain_hash("token-id", &[owner.as_bytes()]))
    }

    pub fn is_base(&self) -> bool {
        *self == Self::BASE
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_base() {
            write!(f, "BASE")
        } else {
            write!(f, "{}", hex::encode(self.0))
        }
    }
}

impl FromStr for TokenId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "BASE" {
            return Ok(Self::BASE);
        }
        parse_hex32(s).map(Self)
    }
}

fn parse_hex32(s: &str) -> Result<[u8; 32], IdError> {
    let bytes = hex::decode(s.trim()).map_err(|_| IdError::InvalidHex(s.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| IdError::InvalidLength { expected: 32, actual: b.len() })
}
