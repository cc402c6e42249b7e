//! Ledger error taxonomy
//!
//! Validation and state-consistency checks always run before any value
//! transfer; an error from any of them means no funds moved. `TransferFailed`
//! is the one failure that can follow a state change (nullifier consumption
//! is not rolled back; atomicity across the two is the transaction
//! environment's guarantee).

use thiserror::Error;

use umbra_core::MerkleError;

use crate::asset::TransferError;
use crate::swap::AggregatorError;

#[derive(Error, Debug)]
pub enum LedgerError {
    // ===== Capacity =====
    /// Fatal for this ledger instance; a fresh instance must be deployed
    #[error("merkle tree is at capacity")]
    CapacityExceeded,

    // ===== State consistency =====
    #[error("unknown leaf index: {0}")]
    UnknownLeaf(u32),
    #[error("unknown swap config: {0}")]
    UnknownConfig(u64),
    #[error("swap already recorded for this nullifier hash")]
    AlreadySwapped,
    #[error("nullifier hash already consumed")]
    AlreadyWithdrawn,
    #[error("no swap result recorded for this nullifier hash")]
    NoSwapResult,

    // ===== Validation =====
    #[error("execution payload mismatch: {field}")]
    PayloadMismatch { field: &'static str },
    #[error("invalid amount")]
    InvalidAmount,

    // ===== Authorization =====
    #[error("caller is not the operator")]
    NotOperator,
    #[error("caller is not the owner")]
    NotOwner,

    // ===== Cryptographic =====
    #[error("invalid withdrawal proof")]
    InvalidProof,
    #[error("public signal mismatch: {signal}")]
    PublicSignalMismatch { signal: &'static str },

    // ===== External dependencies =====
    #[error("aggregator error")]
    Aggregator(#[from] AggregatorError),
    #[error("asset transfer failed")]
    TransferFailed(#[from] TransferError),
}

impl From<MerkleError> for LedgerError {
    fn from(err: MerkleError) -> Self {
        match err {
            MerkleError::CapacityExceeded => LedgerError::CapacityExceeded,
            MerkleError::UnknownLeaf(index) => LedgerError::UnknownLeaf(index),
        }
    }
}
