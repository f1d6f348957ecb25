//! Sparse Merkle map over 256-bit keys
//!
//! Key bits (most significant first) select the path from root to leaf, so
//! every key has a fixed position and an empty map still has a well-defined
//! root. Absent leaves hash to zero and empty subtrees collapse to
//! precomputed zero hashes, which keeps root and witness computation
//! proportional to the number of occupied leaves.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::errors::MerkleError;

/// Tree height: one level per key bit.
pub const MAP_DEPTH: usize = 256;

/// Value stored in an absent leaf.
pub const EMPTY_LEAF: [u8; 32] = [0u8; 32];

/// SHA-256 of arbitrary data.
pub fn compute_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn hash_node(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// `zero_hashes()[h]` is the root of an empty subtree of height `h`.
fn zero_hashes() -> &'static [[u8; 32]] {
    static ZEROS: OnceLock<Vec<[u8; 32]>> = OnceLock::new();
    ZEROS.get_or_init(|| {
        let mut zeros = Vec::with_capacity(MAP_DEPTH + 1);
        zeros.push(EMPTY_LEAF);
        for h in 0..MAP_DEPTH {
            let z = zeros[h];
            zeros.push(hash_node(&z, &z));
        }
        zeros
    })
}

/// Bit `depth` of `key`, counted from the most significant bit.
fn key_bit(key: &[u8; 32], depth: usize) -> u8 {
    (key[depth / 8] >> (7 - depth % 8)) & 1
}

/// Root of the empty map.
pub fn empty_root() -> [u8; 32] {
    zero_hashes()[MAP_DEPTH]
}

/// Inclusion witness: sibling hashes from the leaf level up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleWitness {
    siblings: Vec<[u8; 32]>,
}

impl MerkleWitness {
    pub fn new(siblings: Vec<[u8; 32]>) -> Self {
        Self { siblings }
    }

    pub fn siblings(&self) -> &[[u8; 32]] {
        &self.siblings
    }

    /// Recompute the root implied by placing `value` at `key`.
    pub fn compute_root(&self, key: &[u8; 32], value: &[u8; 32]) -> Result<[u8; 32], MerkleError> {
        if self.siblings.len() != MAP_DEPTH {
            return Err(MerkleError::MalformedWitness {
                expected: MAP_DEPTH,
                actual: self.siblings.len(),
            });
        }

        let mut current = *value;
        for (level, sibling) in self.siblings.iter().enumerate() {
            let depth = MAP_DEPTH - 1 - level;
            current = if key_bit(key, depth) == 0 {
                hash_node(&current, sibling)
            } else {
                hash_node(sibling, &current)
            };
        }
        Ok(current)
    }
}

/// Authenticated key-value map.
#[derive(Debug, Clone, Default)]
pub struct MerkleMap {
    leaves: BTreeMap<[u8; 32], [u8; 32]>,
}

impl MerkleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`. Setting [`EMPTY_LEAF`] removes the key.
    pub fn set(&mut self, key: [u8; 32], value: [u8; 32]) {
        if value == EMPTY_LEAF {
            self.leaves.remove(&key);
        } else {
            self.leaves.insert(key, value);
        }
    }

    /// Leaf value at `key` ([`EMPTY_LEAF`] if absent).
    pub fn get(&self, key: &[u8; 32]) -> [u8; 32] {
        self.leaves.get(key).copied().unwrap_or(EMPTY_LEAF)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn root(&self) -> [u8; 32] {
        let leaves: Vec<([u8; 32], [u8; 32])> =
            self.leaves.iter().map(|(k, v)| (*k, *v)).collect();
        subtree_root(&leaves, 0)
    }

    /// Witness for `key`, valid whether or not the key is present.
    pub fn witness(&self, key: &[u8; 32]) -> MerkleWitness {
        let leaves: Vec<([u8; 32], [u8; 32])> =
            self.leaves.iter().map(|(k, v)| (*k, *v)).collect();

        let mut siblings = Vec::with_capacity(MAP_DEPTH);
        let mut slice = leaves.as_slice();
        for depth in 0..MAP_DEPTH {
            let split = slice.partition_point(|(k, _)| key_bit(k, depth) == 0);
            let (left, right) = slice.split_at(split);
            if key_bit(key, depth) == 0 {
                siblings.push(subtree_root(right, depth + 1));
                slice = left;
            } else {
                siblings.push(subtree_root(left, depth + 1));
                slice = right;
            }
        }
        // collected root-down; witnesses are stored leaf-up
        siblings.reverse();
        MerkleWitness::new(siblings)
    }
}

/// Root of the subtree at `depth` holding `leaves`, which must be sorted and
/// share the first `depth` key bits.
fn subtree_root(leaves: &[([u8; 32], [u8; 32])], depth: usize) -> [u8; 32] {
    if leaves.is_empty() {
        return zero_hashes()[MAP_DEPTH - depth];
    }
    if depth == MAP_DEPTH {
        return leaves[0].1;
    }
    let split = leaves.partition_point(|(k, _)| key_bit(k, depth) == 0);
    let (left, right) = leaves.split_at(split);
    hash_node(&subtree_root(left, depth + 1), &subtree_root(right, depth + 1))
}
