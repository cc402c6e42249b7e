//! Cryptographic primitives for the swap protocol

pub mod derive;
pub mod merkle;
pub mod poseidon;
pub mod poseidon_constants;

pub use derive::{derive, DepositSecrets};
pub use merkle::{MerkleAccumulator, MerkleError, MerklePath, MAX_LEAVES, TREE_DEPTH};
pub use poseidon::{poseidon_hash1, poseidon_hash2};

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

/// Serialize a field element to 32 big-endian bytes
pub fn fr_to_bytes(value: &Fr) -> [u8; 32] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut result = [0u8; 32];
    result[32 - bytes.len()..].copy_from_slice(&bytes);
    result
}

/// Deserialize a field element from 32 big-endian bytes (mod the field order)
pub fn fr_from_bytes(bytes: &[u8; 32]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}
