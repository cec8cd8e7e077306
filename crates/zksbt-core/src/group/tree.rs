use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use zksbt_crypto::poseidon_hash2_fields;
use zksbt_types::{ZksbtError, ZksbtResult};

use crate::field::serde_fr_seq;

pub const MAX_TREE_DEPTH: usize = 32;

static EMPTY_HASHES: OnceLock<Vec<Fr>> = OnceLock::new();

/// `zeros[0]` is the empty leaf (0); `zeros[i + 1] = H(zeros[i], zeros[i])`.
fn empty_hashes() -> &'static [Fr] {
    EMPTY_HASHES.get_or_init(|| {
        let mut hashes = Vec::with_capacity(MAX_TREE_DEPTH + 1);
        let mut current = Fr::from(0u64);
        hashes.push(current);
        for _ in 0..MAX_TREE_DEPTH {
            current = poseidon_hash2_fields(current, current);
            hashes.push(current);
        }
        hashes
    })
}

/// Root of a tree of `depth` holding no leaves.
pub fn empty_root(depth: usize) -> ZksbtResult<Fr> {
    check_depth(depth)?;
    Ok(empty_hashes()[depth])
}

fn check_depth(depth: usize) -> ZksbtResult<()> {
    if depth == 0 || depth > MAX_TREE_DEPTH {
        return Err(ZksbtError::MerkleTree(format!(
            "depth {} outside 1..={}",
            depth, MAX_TREE_DEPTH
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_index: u64,
    #[serde(with = "serde_fr_seq")]
    pub siblings: Vec<Fr>,
    /// 0 when the running node is the left child, 1 when it is the right.
    pub path_indices: Vec<u8>,
}

impl MerkleProof {
    pub fn compute_root(&self, leaf: Fr) -> Fr {
        self.siblings
            .iter()
            .zip(&self.path_indices)
            .fold(leaf, |node, (sibling, bit)| {
                if *bit == 0 {
                    poseidon_hash2_fields(node, *sibling)
                } else {
                    poseidon_hash2_fields(*sibling, node)
                }
            })
    }
}

/// Append-only Poseidon Merkle tree. Insertion and path extraction touch one
/// node per level; untouched subtrees are the cached empty hashes.
#[derive(Clone, Debug)]
pub struct IncrementalMerkleTree {
    depth: usize,
    // levels[0] holds leaves, levels[depth] holds the root once non-empty.
    levels: Vec<Vec<Fr>>,
}

impl IncrementalMerkleTree {
    pub fn new(depth: usize) -> ZksbtResult<Self> {
        check_depth(depth)?;
        Ok(Self {
            depth,
            levels: vec![Vec::new(); depth + 1],
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    pub fn leaves(&self) -> &[Fr] {
        &self.levels[0]
    }

    pub fn root(&self) -> Fr {
        self.levels[self.depth]
            .first()
            .copied()
            .unwrap_or(empty_hashes()[self.depth])
    }

    fn node(&self, level: usize, index: usize) -> Fr {
        self.levels[level]
            .get(index)
            .copied()
            .unwrap_or(empty_hashes()[level])
    }

    /// Appends `leaf` and returns its index.
    pub fn insert(&mut self, leaf: Fr) -> ZksbtResult<usize> {
        let index = self.len();
        if index as u64 >= self.capacity() {
            return Err(ZksbtError::MerkleTree(format!(
                "tree of depth {} is full",
                self.depth
            )));
        }

        self.levels[0].push(leaf);
        let mut idx = index;
        let mut current = leaf;
        for level in 0..self.depth {
            let (left, right) = if idx % 2 == 0 {
                (current, self.node(level, idx + 1))
            } else {
                (self.node(level, idx - 1), current)
            };
            current = poseidon_hash2_fields(left, right);
            idx /= 2;

            let parent = &mut self.levels[level + 1];
            if idx < parent.len() {
                parent[idx] = current;
            } else {
                parent.push(current);
            }
        }
        Ok(index)
    }

    pub fn index_of(&self, leaf: &Fr) -> Option<usize> {
        self.levels[0].iter().position(|l| l == leaf)
    }

    pub fn proof(&self, index: usize) -> ZksbtResult<MerkleProof> {
        if index >= self.len() {
            return Err(ZksbtError::MerkleTree(format!(
                "leaf index {} out of range ({} leaves)",
                index,
                self.len()
            )));
        }

        let mut siblings = Vec::with_capacity(self.depth);
        let mut path_indices = Vec::with_capacity(self.depth);
        let mut idx = index;
        for level in 0..self.depth {
            siblings.push(self.node(level, idx ^ 1));
            path_indices.push((idx & 1) as u8);
            idx /= 2;
        }

        Ok(MerkleProof {
            leaf_index: index as u64,
            siblings,
            path_indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Full recomputation, used to cross-check the incremental updates.
    fn naive_root(leaves: &[Fr], depth: usize) -> Fr {
        let mut level: Vec<Fr> = leaves.to_vec();
        for zero in empty_hashes().iter().take(depth) {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                let right = pair.get(1).copied().unwrap_or(*zero);
                next.push(poseidon_hash2_fields(pair[0], right));
            }
            level = next;
        }
        level.first().copied().unwrap_or(empty_hashes()[depth])
    }

    #[test]
    fn test_empty_root() {
        let tree = IncrementalMerkleTree::new(16).unwrap();
        assert_eq!(tree.root(), empty_root(16).unwrap());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_invalid_depth() {
        assert!(IncrementalMerkleTree::new(0).is_err());
        assert!(IncrementalMerkleTree::new(MAX_TREE_DEPTH + 1).is_err());
        assert!(empty_root(33).is_err());
    }

    #[test]
    fn test_incremental_matches_naive() {
        let mut tree = IncrementalMerkleTree::new(4).unwrap();
        let mut leaves = Vec::new();
        for i in 1..=9u64 {
            let leaf = Fr::from(i * 1000);
            leaves.push(leaf);
            tree.insert(leaf).unwrap();
            assert_eq!(tree.root(), naive_root(&leaves, 4), "after {} leaves", i);
        }
    }

    #[test]
    fn test_proofs_verify() {
        let mut tree = IncrementalMerkleTree::new(5).unwrap();
        for i in 0..11u64 {
            tree.insert(Fr::from(i + 7)).unwrap();
        }
        for i in 0..11usize {
            let proof = tree.proof(i).unwrap();
            assert_eq!(proof.siblings.len(), 5);
            assert_eq!(proof.compute_root(Fr::from(i as u64 + 7)), tree.root());
        }
        assert!(tree.proof(11).is_err());
    }

    #[test]
    fn test_full_tree_rejects_insert() {
        let mut tree = IncrementalMerkleTree::new(1).unwrap();
        tree.insert(Fr::from(1u64)).unwrap();
        tree.insert(Fr::from(2u64)).unwrap();
        assert!(tree.insert(Fr::from(3u64)).is_err());
    }

    #[test]
    fn test_index_of() {
        let mut tree = IncrementalMerkleTree::new(3).unwrap();
        tree.insert(Fr::from(5u64)).unwrap();
        tree.insert(Fr::from(6u64)).unwrap();
        assert_eq!(tree.index_of(&Fr::from(6u64)), Some(1));
        assert_eq!(tree.index_of(&Fr::from(7u64)), None);
    }
}
