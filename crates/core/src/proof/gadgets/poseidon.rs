//! Poseidon hash gadget for R1CS circuits
//!
//! In-circuit version of the Poseidon permutation, reading the same constants
//! module as the native hasher in `crypto::poseidon` so both instantiations
//! (`H1`, t=2 and `H2`, t=3) agree bit for bit between prover and ledger.

use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::crypto::poseidon_constants::{
    self, FULL_ROUNDS, WIDTH_T2, WIDTH_T3,
};

/// Poseidon gadget for one fixed width
pub struct PoseidonGadget {
    width: usize,
    partial_rounds: usize,
    /// Round constants as constraint constants
    round_constants: Vec<FpVar<Fr>>,
    /// MDS matrix as constraint constants
    mds_matrix: Vec<Vec<FpVar<Fr>>>,
}

impl PoseidonGadget {
    /// Create a gadget for the given width, loading the standard constants
    pub fn new(cs: ConstraintSystemRef<Fr>, width: usize) -> Result<Self, SynthesisError> {
        let rc = poseidon_constants::round_constants(width);
        let mds = poseidon_constants::mds_matrix(width);

        let round_constants: Result<Vec<FpVar<Fr>>, _> = rc
            .iter()
            .map(|c| FpVar::new_constant(cs.clone(), *c))
            .collect();

        let mds_matrix: Result<Vec<Vec<FpVar<Fr>>>, _> = mds
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| FpVar::new_constant(cs.clone(), *c))
                    .collect()
            })
            .collect();

        Ok(Self {
            width,
            partial_rounds: poseidon_constants::partial_rounds(width),
            round_constants: round_constants?,
            mds_matrix: mds_matrix?,
        })
    }

    /// Hash one field element variable (requires width 2)
    pub fn hash1(&self, x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        debug_assert_eq!(self.width, WIDTH_T2);
        let mut state = vec![FpVar::zero(), x.clone()];
        self.permute(&mut state)?;
        Ok(state[0].clone())
    }

    /// Hash two field element variables (requires width 3)
    pub fn hash2(&self, a: &FpVar<Fr>, b: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        debug_assert_eq!(self.width, WIDTH_T3);
        let mut state = vec![FpVar::zero(), a.clone(), b.clone()];
        self.permute(&mut state)?;
        Ok(state[0].clone())
    }

    /// Apply the Poseidon permutation to the state
    fn permute(&self, state: &mut [FpVar<Fr>]) -> Result<(), SynthesisError> {
        let t = self.width;
        let rf = FULL_ROUNDS;
        let rp = self.partial_rounds;

        let mut round_ctr = 0;

        for _ in 0..(rf / 2) {
            self.full_round(state, round_ctr)?;
            round_ctr += t;
        }

        for _ in 0..rp {
            self.partial_round(state, round_ctr)?;
            round_ctr += t;
        }

        for _ in 0..(rf / 2) {
            self.full_round(state, round_ctr)?;
            round_ctr += t;
        }

        Ok(())
    }

    /// Full round: S-box on all elements, then MDS
    fn full_round(&self, state: &mut [FpVar<Fr>], round_ctr: usize) -> Result<(), SynthesisError> {
        for (i, elem) in state.iter_mut().enumerate() {
            *elem = &*elem + &self.round_constants[round_ctr + i];
            *elem = sbox(elem)?;
        }
        self.mds_multiply(state)
    }

    /// Partial round: S-box on the first element only, then MDS
    fn partial_round(
        &self,
        state: &mut [FpVar<Fr>],
        round_ctr: usize,
    ) -> Result<(), SynthesisError> {
        for (i, elem) in state.iter_mut().enumerate() {
            *elem = &*elem + &self.round_constants[round_ctr + i];
        }
        state[0] = sbox(&state[0])?;
        self.mds_multiply(state)
    }

    /// Multiply state by the MDS matrix
    fn mds_multiply(&self, state: &mut [FpVar<Fr>]) -> Result<(), SynthesisError> {
        let mut new_state = Vec::with_capacity(self.width);

        for i in 0..self.width {
            let mut sum = FpVar::zero();
            for j in 0..self.width {
                sum = sum + &self.mds_matrix[i][j] * &state[j];
            }
            new_state.push(sum);
        }

        for (i, val) in new_state.into_iter().enumerate() {
            state[i] = val;
        }
        Ok(())
    }
}

/// S-box function: x^5
fn sbox(x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let x2 = x * x;
    let x4 = &x2 * &x2;
    Ok(&x4 * x)
}

/// Hash one field element variable with `H1`
pub fn poseidon_hash1_gadget(
    cs: ConstraintSystemRef<Fr>,
    x: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    PoseidonGadget::new(cs, WIDTH_T2)?.hash1(x)
}

/// Hash two field element variables with `H2`
pub fn poseidon_hash2_gadget(
    cs: ConstraintSystemRef<Fr>,
    a: &FpVar<Fr>,
    b: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    PoseidonGadget::new(cs, WIDTH_T3)?.hash2(a, b)
}
