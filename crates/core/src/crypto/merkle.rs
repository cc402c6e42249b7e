//! Append-only Merkle accumulator for deposit commitments
//!
//! Fixed-depth incremental Merkle tree hashed with Poseidon, matching the
//! withdrawal circuit's compiled depth. Internal node = `H2(left, right)`;
//! empty subtrees use a well-known zero value per level so paths alongside
//! empty siblings are well-defined.
//!
//! The accumulator retains all leaves, so it can answer a path query for any
//! index ever inserted even after later insertions have moved the root.
//! Withdrawal proofs are generated against the root at generation time; a
//! `(root, path)` pair only has to be self-consistent, not current.

use ark_bn254::Fr;
use thiserror::Error;

use super::poseidon::poseidon_hash2;

/// Merkle tree depth; bounds the anonymity set at 2^DEPTH deposits per
/// instance and must match the circuit's compiled depth exactly
pub const TREE_DEPTH: usize = 5;

/// Maximum number of leaves per tree instance
pub const MAX_LEAVES: u32 = 1 << TREE_DEPTH;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("merkle tree is full ({MAX_LEAVES} leaves)")]
    CapacityExceeded,
    #[error("unknown leaf index: {0}")]
    UnknownLeaf(u32),
}

/// Precomputed zero hashes per level
///
/// `zeros[0] = 0` (empty leaf), `zeros[i] = H2(zeros[i-1], zeros[i-1])`.
pub fn zero_hashes() -> [Fr; TREE_DEPTH + 1] {
    let mut zeros = [Fr::from(0u64); TREE_DEPTH + 1];
    for i in 1..=TREE_DEPTH {
        zeros[i] = poseidon_hash2(&zeros[i - 1], &zeros[i - 1]);
    }
    zeros
}

/// Authenticated path for one leaf
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath {
    /// Sibling hashes from leaf level to just below the root
    pub siblings: [Fr; TREE_DEPTH],
    /// Position bits; `true` means the leaf's ancestor is the right child
    pub indices: [bool; TREE_DEPTH],
    /// The leaf index this path authenticates
    pub leaf_index: u32,
}

impl MerklePath {
    /// Verify the path connects `leaf` to `expected_root`
    pub fn verify(&self, leaf: &Fr, expected_root: &Fr) -> bool {
        let mut current = *leaf;

        for (sibling, &is_right) in self.siblings.iter().zip(self.indices.iter()) {
            current = if is_right {
                poseidon_hash2(sibling, &current)
            } else {
                poseidon_hash2(&current, sibling)
            };
        }

        current == *expected_root
    }
}

/// Incremental Merkle accumulator
///
/// O(log n) insertion via the filled-subtrees technique; path queries rebuild
/// the level above the leaves on demand from the retained leaf set.
#[derive(Clone, Debug)]
pub struct MerkleAccumulator {
    next_index: u32,
    filled_subtrees: [Fr; TREE_DEPTH],
    current_root: Fr,
    leaves: Vec<Fr>,
    zeros: [Fr; TREE_DEPTH + 1],
}

impl Default for MerkleAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MerkleAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        let zeros = zero_hashes();

        let mut filled_subtrees = [Fr::from(0u64); TREE_DEPTH];
        filled_subtrees.copy_from_slice(&zeros[..TREE_DEPTH]);

        Self {
            next_index: 0,
            filled_subtrees,
            current_root: zeros[TREE_DEPTH],
            leaves: Vec::new(),
            zeros,
        }
    }

    /// Append a commitment, returning its assigned leaf index
    pub fn insert(&mut self, commitment: Fr) -> Result<u32, MerkleError> {
        if self.next_index >= MAX_LEAVES {
            return Err(MerkleError::CapacityExceeded);
        }

        let leaf_index = self.next_index;
        self.leaves.push(commitment);

        let mut current = commitment;
        let mut index = leaf_index;

        for level in 0..TREE_DEPTH {
            if index % 2 == 0 {
                // Left child: remember it, pair with the zero subtree
                self.filled_subtrees[level] = current;
                current = poseidon_hash2(&current, &self.zeros[level]);
            } else {
                current = poseidon_hash2(&self.filled_subtrees[level], &current);
            }
            index /= 2;
        }

        self.current_root = current;
        self.next_index += 1;

        Ok(leaf_index)
    }

    /// Current root
    pub fn root(&self) -> Fr {
        self.current_root
    }

    /// Authenticated path for a previously inserted leaf
    pub fn merkle_proof(&self, leaf_index: u32) -> Result<MerklePath, MerkleError> {
        if leaf_index >= self.next_index {
            return Err(MerkleError::UnknownLeaf(leaf_index));
        }

        let mut siblings = [Fr::from(0u64); TREE_DEPTH];
        let mut indices = [false; TREE_DEPTH];

        // Rebuild each level densely; fine at this depth
        let mut level_nodes = self.leaves.clone();
        level_nodes.resize(MAX_LEAVES as usize, self.zeros[0]);

        let mut current_index = leaf_index as usize;

        for level in 0..TREE_DEPTH {
            let is_right = current_index % 2 == 1;
            indices[level] = is_right;

            let sibling_index = if is_right {
                current_index - 1
            } else {
                current_index + 1
            };
            siblings[level] = level_nodes[sibling_index];

            let mut next_level = Vec::with_capacity(level_nodes.len() / 2);
            for pair in level_nodes.chunks_exact(2) {
                next_level.push(poseidon_hash2(&pair[0], &pair[1]));
            }
            level_nodes = next_level;

            current_index /= 2;
        }

        Ok(MerklePath {
            siblings,
            indices,
            leaf_index,
        })
    }

    /// Leaf at a given index, if inserted
    pub fn leaf(&self, index: u32) -> Option<Fr> {
        self.leaves.get(index as usize).copied()
    }

    /// Number of leaves inserted so far
    pub fn len(&self) -> u32 {
        self.next_index
    }

    /// True if no leaf has been inserted
    pub fn is_empty(&self) -> bool {
        self.next_index == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;
    use rand::rngs::OsRng;

    #[test]
    fn test_empty_tree_root() {
        let tree = MerkleAccumulator::new();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), zero_hashes()[TREE_DEPTH]);
    }

    #[test]
    fn test_insert_assigns_sequential_indices() {
        let mut tree = MerkleAccumulator::new();

        for expected in 0..4 {
            let index = tree.insert(Fr::from(expected as u64 + 100)).unwrap();
            assert_eq!(index, expected);
        }
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_root_is_pure_function_of_leaves() {
        let mut tree1 = MerkleAccumulator::new();
        let mut tree2 = MerkleAccumulator::new();

        for i in 0..5 {
            tree1.insert(Fr::from(i as u64)).unwrap();
            tree2.insert(Fr::from(i as u64)).unwrap();
        }

        assert_eq!(tree1.root(), tree2.root());
    }

    #[test]
    fn test_different_leaves_different_roots() {
        let mut tree1 = MerkleAccumulator::new();
        let mut tree2 = MerkleAccumulator::new();

        tree1.insert(Fr::from(1u64)).unwrap();
        tree2.insert(Fr::from(2u64)).unwrap();

        assert_ne!(tree1.root(), tree2.root());
    }

    #[test]
    fn test_path_round_trip_every_index() {
        let mut tree = MerkleAccumulator::new();

        let leaves: Vec<Fr> = (0..MAX_LEAVES).map(|_| Fr::rand(&mut OsRng)).collect();
        for leaf in &leaves {
            tree.insert(*leaf).unwrap();
        }

        for (i, leaf) in leaves.iter().enumerate() {
            let path = tree.merkle_proof(i as u32).unwrap();
            assert!(path.verify(leaf, &tree.root()), "index {}", i);
        }
    }

    #[test]
    fn test_tampered_sibling_fails() {
        let mut tree = MerkleAccumulator::new();
        for i in 0..6 {
            tree.insert(Fr::from(i as u64 + 1)).unwrap();
        }

        let leaf = tree.leaf(3).unwrap();
        let root = tree.root();

        for level in 0..TREE_DEPTH {
            let mut path = tree.merkle_proof(3).unwrap();
            path.siblings[level] += Fr::from(1u64);
            assert!(!path.verify(&leaf, &root), "tampered level {}", level);
        }
    }

    #[test]
    fn test_flipped_index_bit_fails() {
        let mut tree = MerkleAccumulator::new();
        for i in 0..6 {
            tree.insert(Fr::from(i as u64 + 1)).unwrap();
        }

        let leaf = tree.leaf(3).unwrap();
        let root = tree.root();

        for level in 0..TREE_DEPTH {
            let mut path = tree.merkle_proof(3).unwrap();
            path.indices[level] = !path.indices[level];
            assert!(!path.verify(&leaf, &root), "flipped bit {}", level);
        }
    }

    #[test]
    fn test_historical_paths_remain_answerable() {
        let mut tree = MerkleAccumulator::new();
        tree.insert(Fr::from(11u64)).unwrap();

        let old_root = tree.root();
        let old_path = tree.merkle_proof(0).unwrap();

        // Later insertions move the root
        tree.insert(Fr::from(22u64)).unwrap();
        assert_ne!(tree.root(), old_root);

        // The old (root, path) pair stays self-consistent, and a fresh path
        // for the same leaf verifies against the new root
        assert!(old_path.verify(&Fr::from(11u64), &old_root));
        let new_path = tree.merkle_proof(0).unwrap();
        assert!(new_path.verify(&Fr::from(11u64), &tree.root()));
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut tree = MerkleAccumulator::new();
        for i in 0..MAX_LEAVES {
            tree.insert(Fr::from(i as u64)).unwrap();
        }

        assert_eq!(
            tree.insert(Fr::from(999u64)),
            Err(MerkleError::CapacityExceeded)
        );
        assert_eq!(tree.len(), MAX_LEAVES);
    }

    #[test]
    fn test_unknown_leaf() {
        let mut tree = MerkleAccumulator::new();
        tree.insert(Fr::from(1u64)).unwrap();

        assert_eq!(tree.merkle_proof(1), Err(MerkleError::UnknownLeaf(1)));
        assert_eq!(tree.merkle_proof(7), Err(MerkleError::UnknownLeaf(7)));
    }
}
