//! R1CS constraint gadgets mirroring the native crypto layer

pub mod merkle;
pub mod poseidon;

pub use merkle::MerklePathGadget;
pub use poseidon::{poseidon_hash1_gadget, poseidon_hash2_gadget, PoseidonGadget};
