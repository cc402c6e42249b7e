//! Unified error types for the client-side crate

use thiserror::Error;

use crate::client::ClientError;
use crate::crypto::merkle::MerkleError;
use crate::crypto::poseidon::PoseidonError;
use crate::proof::ProofError;

/// Top-level error type for the Umbra core
#[derive(Error, Debug)]
pub enum UmbraError {
    /// Hash-layer error
    #[error("poseidon error: {0}")]
    Poseidon(#[from] PoseidonError),

    /// Merkle accumulator error
    #[error("merkle error: {0}")]
    Merkle(#[from] MerkleError),

    /// Proof generation/verification error
    #[error("proof error: {0}")]
    Proof(#[from] ProofError),

    /// Withdrawal orchestration error
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Invalid input error
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for core operations
pub type UmbraResult<T> = Result<T, UmbraError>;

/// Input validation utilities
pub mod validation {
    use super::*;
    use crate::crypto::merkle::TREE_DEPTH;
    use crate::proof::SerializedProof;

    /// Validate a serialized proof length before deserialization
    pub fn validate_proof_size(proof: &[u8]) -> Result<(), UmbraError> {
        if proof.len() != SerializedProof::SIZE {
            return Err(UmbraError::InvalidInput(format!(
                "invalid proof size: {} bytes (expected {})",
                proof.len(),
                SerializedProof::SIZE
            )));
        }
        Ok(())
    }

    /// Validate Merkle path component lengths
    pub fn validate_merkle_path(siblings: &[[u8; 32]], indices: &[bool]) -> Result<(), UmbraError> {
        if siblings.len() != TREE_DEPTH {
            return Err(UmbraError::InvalidInput(format!(
                "merkle path has wrong depth: {} != {}",
                siblings.len(),
                TREE_DEPTH
            )));
        }
        if indices.len() != TREE_DEPTH {
            return Err(UmbraError::InvalidInput(format!(
                "merkle indices have wrong length: {} != {}",
                indices.len(),
                TREE_DEPTH
            )));
        }
        Ok(())
    }

    /// Validate a decimal amount string from user input
    pub fn validate_amount_str(amount: &str) -> Result<u128, UmbraError> {
        let parsed: u128 = amount
            .parse()
            .map_err(|_| UmbraError::InvalidInput(format!("invalid amount: {:?}", amount)))?;
        if parsed == 0 {
            return Err(UmbraError::InvalidInput(
                "amount must be greater than zero".to_string(),
            ));
        }
        Ok(parsed)
    }
}
