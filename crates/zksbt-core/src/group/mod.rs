mod reconstruct;
mod tree;

pub use reconstruct::{EventStream, GroupReconstructor, MerkleGroup};
pub use tree::{empty_root, IncrementalMerkleTree, MerkleProof, MAX_TREE_DEPTH};
