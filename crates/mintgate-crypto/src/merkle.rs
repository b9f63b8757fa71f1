//! Sorted-pair keccak-256 Merkle trees over 20-byte addresses.
//!
//! Leaves are `keccak256(address)`. Internal nodes hash the lexicographically
//! sorted concatenation of their children, so proofs carry no direction bits.
//! An odd node at any level is promoted unchanged.

use mintgate_core::types::{Address, Bytes32};

use crate::hash::keccak256;

/// Hash a 20-byte address into its allowlist leaf.
pub fn leaf_hash(address: &Address) -> Bytes32 {
    Bytes32::from_bytes(keccak256(address.as_bytes()))
}

/// Hash a sorted pair of 32-byte nodes: keccak256(lo || hi).
pub fn hash_pair(a: &Bytes32, b: &Bytes32) -> Bytes32 {
    let (lo, hi) = if a.as_bytes() <= b.as_bytes() {
        (a, b)
    } else {
        (b, a)
    };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_bytes());
    buf[32..].copy_from_slice(hi.as_bytes());
    Bytes32::from_bytes(keccak256(&buf))
}

/// Fold `proof` over the leaf for `address`. Valid iff the final hash equals
/// `root`. Callers decide separately whether an all-zero root skips the check.
pub fn verify_proof(root: &Bytes32, proof: &[Bytes32], address: &Address) -> bool {
    let mut node = leaf_hash(address);
    for sibling in proof {
        node = hash_pair(&node, sibling);
    }
    node == *root
}

// ── MerkleTree ───────────────────────────────────────────────────────────────

/// Full tree built from an allowlist, for operators and tests. Verification
/// only needs [`verify_proof`]; this side produces the matching roots and
/// proofs.
pub struct MerkleTree {
    addresses: Vec<Address>,
    /// levels[0] = leaf hashes, last level = [root].
    levels: Vec<Vec<Bytes32>>,
}

impl MerkleTree {
    /// Build a tree over `addresses` in the given order. Panics on an empty
    /// list: an empty allowlist is expressed as a zero root, not a tree.
    pub fn build(addresses: &[Address]) -> Self {
        assert!(!addresses.is_empty(), "allowlist must not be empty");
        let mut levels = vec![addresses.iter().map(leaf_hash).collect::<Vec<_>>()];
        while levels.last().map(Vec::len) != Some(1) {
            let prev = levels.last().expect("at least the leaf level exists");
            let mut next = Vec::with_capacity(prev.len().div_ceil(2));
            for pair in prev.chunks(2) {
                match pair {
                    [a, b] => next.push(hash_pair(a, b)),
                    [odd] => next.push(*odd),
                    _ => unreachable!("chunks(2) yields 1 or 2 elements"),
                }
            }
            levels.push(next);
        }
        Self {
            addresses: addresses.to_vec(),
            levels,
        }
    }

    pub fn root(&self) -> Bytes32 {
        self.levels[self.levels.len() - 1][0]
    }

    /// Sibling path for `address`, or None if it is not in the allowlist.
    pub fn proof_for(&self, address: &Address) -> Option<Vec<Bytes32>> {
        let mut index = self.addresses.iter().position(|a| a == address)?;
        let mut proof = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = index ^ 1;
            if sibling < level.len() {
                proof.push(level[sibling]);
            }
            index /= 2;
        }
        Some(proof)
    }
}
