//! Withdrawal circuit
//!
//! Proves knowledge of a `(nullifier, secret)` pair behind some commitment in
//! the accumulator without revealing which one:
//! 1. `commitment = H2(nullifier, secret)` is recomputed from the witness
//! 2. `H1(nullifier)` must equal the public nullifier hash
//! 3. The Merkle path from the commitment must reach the public root
//! 4. The recipient is bound arithmetically so a valid proof cannot be
//!    replayed with a different recipient
//!
//! Public inputs, in order: `merkle_root`, `nullifier_hash`, `recipient`.
//! This ordering is part of the verifier's external contract.
//!
//! Private inputs (witness): `nullifier`, `secret`, `siblings`, `indices`.

use ark_bn254::Fr;
use ark_r1cs_std::{eq::EqGadget, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::gadgets::merkle::MerklePathGadget;
use super::gadgets::poseidon::{poseidon_hash1_gadget, poseidon_hash2_gadget};
use crate::crypto::merkle::{MerklePath, TREE_DEPTH};
use crate::crypto::DepositSecrets;

/// Withdrawal circuit for the swap protocol
#[derive(Clone)]
pub struct WithdrawCircuit {
    // ===== Public Inputs =====
    /// Accumulator root the path is proven against
    pub merkle_root: Option<Fr>,
    /// `H1(nullifier)`, the registry key
    pub nullifier_hash: Option<Fr>,
    /// Recipient of the swapped proceeds, as a field element
    pub recipient: Option<Fr>,

    // ===== Private Inputs (Witness) =====
    /// Secret nullifier
    pub nullifier: Option<Fr>,
    /// Secret blinding value
    pub secret: Option<Fr>,
    /// Merkle path siblings
    pub siblings: Option<Vec<Fr>>,
    /// Merkle path position bits
    pub indices: Option<Vec<bool>>,
}

impl WithdrawCircuit {
    /// Number of public inputs: merkle_root, nullifier_hash, recipient
    pub const NUM_PUBLIC_INPUTS: usize = 3;

    /// Build a fully assigned circuit from derived secrets and a path
    pub fn new(
        merkle_root: Fr,
        recipient: Fr,
        secrets: &DepositSecrets,
        path: &MerklePath,
    ) -> Self {
        Self {
            merkle_root: Some(merkle_root),
            nullifier_hash: Some(secrets.nullifier_hash()),
            recipient: Some(recipient),
            nullifier: Some(secrets.nullifier),
            secret: Some(secrets.secret),
            siblings: Some(path.siblings.to_vec()),
            indices: Some(path.indices.to_vec()),
        }
    }

    /// A structurally complete circuit with zeroed assignments, used for key
    /// generation where only the constraint shape matters
    pub fn blank() -> Self {
        Self {
            merkle_root: Some(Fr::from(0u64)),
            nullifier_hash: Some(Fr::from(0u64)),
            recipient: Some(Fr::from(0u64)),
            nullifier: Some(Fr::from(0u64)),
            secret: Some(Fr::from(0u64)),
            siblings: Some(vec![Fr::from(0u64); TREE_DEPTH]),
            indices: Some(vec![false; TREE_DEPTH]),
        }
    }
}

impl ConstraintSynthesizer<Fr> for WithdrawCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // ===== Allocate Public Inputs (order is the external contract) =====
        let merkle_root_var = FpVar::new_input(cs.clone(), || {
            self.merkle_root.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let nullifier_hash_var = FpVar::new_input(cs.clone(), || {
            self.nullifier_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let recipient_var = FpVar::new_input(cs.clone(), || {
            self.recipient.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ===== Allocate Private Inputs =====
        let nullifier_var = FpVar::new_witness(cs.clone(), || {
            self.nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let secret_var = FpVar::new_witness(cs.clone(), || {
            self.secret.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let siblings = self.siblings.ok_or(SynthesisError::AssignmentMissing)?;
        let indices = self.indices.ok_or(SynthesisError::AssignmentMissing)?;

        // ===== Constraint 1: recompute the commitment =====
        let commitment_var = poseidon_hash2_gadget(cs.clone(), &nullifier_var, &secret_var)?;

        // ===== Constraint 2: nullifier hash matches the public input =====
        let computed_nullifier_hash = poseidon_hash1_gadget(cs.clone(), &nullifier_var)?;
        computed_nullifier_hash.enforce_equal(&nullifier_hash_var)?;

        // ===== Constraint 3: the commitment is in the tree =====
        let path_gadget = MerklePathGadget::new_witness(cs.clone(), &siblings, &indices)?;
        path_gadget.enforce_membership(cs.clone(), &commitment_var, &merkle_root_var)?;

        // ===== Constraint 4: bind the recipient =====
        // The squaring involves the recipient input in a constraint, so the
        // proof only verifies for the recipient it was generated for.
        let _recipient_square = &recipient_var * &recipient_var;

        Ok(())
    }
}
