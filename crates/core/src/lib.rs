//! Umbra - Privacy Swap Core
//!
//! Client-held cryptography for the commit → swap → withdraw protocol.
//!
//! # Modules
//! - `crypto`: hash layer, deposit secret derivation, Merkle accumulator
//! - `proof`: withdrawal circuit and Groth16 proof generation/verification
//! - `client`: withdrawal orchestration against an abstract ledger
//!
//! The ledger-side state machine lives in the `umbra-ledger` crate, which
//! depends on this crate so commitment, nullifier-hash, and Merkle
//! computations are bit-identical across the deposit, swap, and withdraw
//! phases.

pub mod client;
pub mod crypto;
pub mod error;
pub mod proof;

// Re-export common types
pub use client::{
    check_withdrawable, generate_withdrawal_proof, ClientError, DepositEntry, LedgerView,
    ScanConfig, WithdrawProof, WithdrawalStatus,
};
pub use crypto::{
    derive, fr_from_bytes, fr_to_bytes, poseidon_hash1, poseidon_hash2, DepositSecrets,
    MerkleAccumulator, MerkleError, MerklePath, MAX_LEAVES, TREE_DEPTH,
};
pub use error::{UmbraError, UmbraResult};
pub use proof::{
    ArtifactBundle, ContractProof, KeyManifest, ProofError, PublicSignals, SerializedProof,
    WithdrawCircuit, WithdrawProofSystem, WithdrawVerifier,
};
