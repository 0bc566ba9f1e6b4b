//! Binary keccak merkle tree over an ordered leaf sequence.
//!
//! - A leaf hashes as keccak-256 of its canonical JSON.
//! - An internal node hashes as keccak-256 of `left || right`.
//! - A level with an odd number of nodes duplicates its last node.
//! - The empty tree has the all-zero root.

use serde::Serialize;

use crate::crypto::keccak256;
use crate::types::{hash_hex, CoreError};

/// One step of an inclusion proof: the sibling hash and which side it sits on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleSibling {
    pub hash: [u8; 32],
    pub is_left: bool,
}

/// A merkle tree that owns its leaf values alongside the hash levels, so a
/// block can hand back its ordered transactions and produce inclusion proofs
/// from the same structure.
#[derive(Clone, Debug)]
pub struct MerkleTree<T> {
    values: Vec<T>,
    levels: Vec<Vec<[u8; 32]>>,
}

/// Hashes a single leaf the way the tree does.
pub fn leaf_hash<T: Serialize>(value: &T) -> Result<[u8; 32], CoreError> {
    Ok(keccak256(&serde_json::to_vec(value)?))
}

fn hash_pair(left: [u8; 32], right: [u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&left);
    buf[32..].copy_from_slice(&right);
    keccak256(&buf)
}

fn build_levels(leaf_hashes: Vec<[u8; 32]>) -> Vec<Vec<[u8; 32]>> {
    if leaf_hashes.is_empty() {
        return Vec::new();
    }
    let mut levels = Vec::new();
    let mut current = leaf_hashes;
    while current.len() > 1 {
        let mut next = Vec::with_capacity(current.len().div_ceil(2));
        for pair in current.chunks(2) {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            next.push(hash_pair(left, right));
        }
        levels.push(current);
        current = next;
    }
    levels.push(current);
    levels
}

impl<T: Serialize> MerkleTree<T> {
    pub fn new(values: Vec<T>) -> Result<Self, CoreError> {
        let mut leaf_hashes = Vec::with_capacity(values.len());
        for value in &values {
            leaf_hashes.push(leaf_hash(value)?);
        }
        Ok(MerkleTree {
            values,
            levels: build_levels(leaf_hashes),
        })
    }
}

impl<T> MerkleTree<T> {
    /// A tree with no leaves; its root is the all-zero hash.
    pub fn empty() -> Self {
        MerkleTree {
            values: Vec::new(),
            levels: Vec::new(),
        }
    }

    /// The leaves, in the order they were committed.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn root(&self) -> [u8; 32] {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    pub fn root_hex(&self) -> String {
        hash_hex(self.root())
    }

    /// Sibling path from the leaf at `index` up to the root. `None` when the
    /// index is out of range.
    pub fn proof(&self, index: usize) -> Option<Vec<MerkleSibling>> {
        if index >= self.values.len() {
            return None;
        }
        let mut proof = Vec::new();
        let mut idx = index;
        for level in &self.levels[..self.levels.len().saturating_sub(1)] {
            let is_right_child = idx % 2 == 1;
            let pair_idx = if is_right_child { idx - 1 } else { idx + 1 };
            let sibling = if pair_idx < level.len() {
                level[pair_idx]
            } else {
                level[idx]
            };
            proof.push(MerkleSibling {
                hash: sibling,
                is_left: is_right_child,
            });
            idx /= 2;
        }
        Some(proof)
    }

    /// Walks a proof from `leaf` and checks it lands on `root`.
    pub fn verify(leaf: [u8; 32], proof: &[MerkleSibling], root: [u8; 32]) -> bool {
        let mut current = leaf;
        for sibling in proof {
            current = if sibling.is_left {
                hash_pair(sibling.hash, current)
            } else {
                hash_pair(current, sibling.hash)
            };
        }
        current == root
    }
}
