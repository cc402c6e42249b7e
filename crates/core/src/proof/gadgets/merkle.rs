//! Merkle path verification gadget
//!
//! In-circuit recomputation of the accumulator root from a leaf and its
//! authenticated path, mirroring `crypto::merkle::MerklePath::verify`.

use ark_bn254::Fr;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::poseidon::poseidon_hash2_gadget;
use crate::crypto::merkle::TREE_DEPTH;

/// Merkle path as circuit witnesses
pub struct MerklePathGadget {
    /// Sibling hashes along the path
    pub siblings: Vec<FpVar<Fr>>,
    /// Position bits; `true` means the running node is the right child
    pub indices: Vec<Boolean<Fr>>,
}

impl MerklePathGadget {
    /// Allocate a path as witness variables
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        siblings: &[Fr],
        indices: &[bool],
    ) -> Result<Self, SynthesisError> {
        if siblings.len() != TREE_DEPTH || indices.len() != TREE_DEPTH {
            return Err(SynthesisError::AssignmentMissing);
        }

        let siblings: Result<Vec<FpVar<Fr>>, _> = siblings
            .iter()
            .map(|s| FpVar::new_witness(cs.clone(), || Ok(*s)))
            .collect();

        let indices: Result<Vec<Boolean<Fr>>, _> = indices
            .iter()
            .map(|&i| Boolean::new_witness(cs.clone(), || Ok(i)))
            .collect();

        Ok(Self {
            siblings: siblings?,
            indices: indices?,
        })
    }

    /// Enforce that the path connects `leaf` to `expected_root`
    pub fn enforce_membership(
        &self,
        cs: ConstraintSystemRef<Fr>,
        leaf: &FpVar<Fr>,
        expected_root: &FpVar<Fr>,
    ) -> Result<(), SynthesisError> {
        let computed_root = self.compute_root(cs, leaf)?;
        computed_root.enforce_equal(expected_root)
    }

    /// Compute the root from the leaf and path
    pub fn compute_root(
        &self,
        cs: ConstraintSystemRef<Fr>,
        leaf: &FpVar<Fr>,
    ) -> Result<FpVar<Fr>, SynthesisError> {
        let mut current = leaf.clone();

        for (sibling, is_right) in self.siblings.iter().zip(self.indices.iter()) {
            // If is_right, current hashes on the right: H2(sibling, current)
            let left = is_right.select(sibling, &current)?;
            let right = is_right.select(&current, sibling)?;

            current = poseidon_hash2_gadget(cs.clone(), &left, &right)?;
        }

        Ok(current)
    }
}
