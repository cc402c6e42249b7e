//! Poseidon hash layer
//!
//! Implements the two hash primitives the protocol is built on, both
//! instantiations of the Poseidon permutation over the BN254 scalar field
//! (https://eprint.iacr.org/2019/458):
//!
//! - `poseidon_hash1` (`H1`): 1-ary nullifier hash, width t=2
//! - `poseidon_hash2` (`H2`): 2-ary commitment/tree hash, width t=3
//!
//! The withdrawal circuit recomputes both hashes natively in-circuit, so the
//! parameters here must match `poseidon_constants` exactly. Substituting a
//! generic hash (keccak, sha2) here is a correctness bug, not an option.

use ark_bn254::Fr;
use ark_ff::Field;
use thiserror::Error;

use super::poseidon_constants::{self, FULL_ROUNDS, WIDTH_T2, WIDTH_T3};

#[derive(Error, Debug)]
pub enum PoseidonError {
    #[error("invalid input length: expected at most {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("empty input")]
    EmptyInput,
}

/// Fixed parameters for one Poseidon instantiation
pub struct PoseidonParams {
    /// Number of full rounds
    pub full_rounds: usize,
    /// Number of partial rounds
    pub partial_rounds: usize,
    /// Width of the state (t)
    pub width: usize,
    /// Round constants
    pub round_constants: Vec<Fr>,
    /// MDS matrix
    pub mds_matrix: Vec<Vec<Fr>>,
}

impl PoseidonParams {
    /// Parameters for a supported width (2 or 3)
    pub fn for_width(width: usize) -> Self {
        Self {
            full_rounds: FULL_ROUNDS,
            partial_rounds: poseidon_constants::partial_rounds(width),
            width,
            round_constants: poseidon_constants::round_constants(width),
            mds_matrix: poseidon_constants::mds_matrix(width),
        }
    }
}

/// Poseidon hasher instance for one fixed width
pub struct Poseidon {
    params: PoseidonParams,
}

impl Poseidon {
    /// Create a hasher for the given width
    pub fn new(width: usize) -> Self {
        Self {
            params: PoseidonParams::for_width(width),
        }
    }

    /// Hash one field element (requires width 2)
    pub fn hash1(&self, x: &Fr) -> Fr {
        debug_assert_eq!(self.params.width, WIDTH_T2);
        let mut state = vec![Fr::from(0u64), *x];
        self.permute(&mut state);
        state[0]
    }

    /// Hash two field elements (requires width 3)
    pub fn hash2(&self, a: &Fr, b: &Fr) -> Fr {
        debug_assert_eq!(self.params.width, WIDTH_T3);
        let mut state = vec![Fr::from(0u64), *a, *b];
        self.permute(&mut state);
        state[0]
    }

    /// Hash a variable number of field elements (at most width - 1)
    pub fn hash(&self, inputs: &[Fr]) -> Result<Fr, PoseidonError> {
        if inputs.is_empty() {
            return Err(PoseidonError::EmptyInput);
        }
        if inputs.len() > self.params.width - 1 {
            return Err(PoseidonError::InvalidLength {
                expected: self.params.width - 1,
                got: inputs.len(),
            });
        }

        // Capacity element is zero; inputs fill the rate portion
        let mut state = vec![Fr::from(0u64); self.params.width];
        for (i, input) in inputs.iter().enumerate() {
            state[i + 1] = *input;
        }

        self.permute(&mut state);
        Ok(state[0])
    }

    /// Apply the Poseidon permutation to the state
    fn permute(&self, state: &mut [Fr]) {
        let t = self.params.width;
        let rf = self.params.full_rounds;
        let rp = self.params.partial_rounds;

        let mut round_ctr = 0;

        // First half of full rounds
        for _ in 0..(rf / 2) {
            self.full_round(state, round_ctr);
            round_ctr += t;
        }

        // Partial rounds
        for _ in 0..rp {
            self.partial_round(state, round_ctr);
            round_ctr += t;
        }

        // Second half of full rounds
        for _ in 0..(rf / 2) {
            self.full_round(state, round_ctr);
            round_ctr += t;
        }
    }

    /// Full round: S-box on all elements, then MDS
    fn full_round(&self, state: &mut [Fr], round_ctr: usize) {
        for (i, elem) in state.iter_mut().enumerate() {
            *elem += self.params.round_constants[round_ctr + i];
            *elem = sbox(*elem);
        }
        self.mds_multiply(state);
    }

    /// Partial round: S-box on the first element only, then MDS
    fn partial_round(&self, state: &mut [Fr], round_ctr: usize) {
        for (i, elem) in state.iter_mut().enumerate() {
            *elem += self.params.round_constants[round_ctr + i];
        }
        state[0] = sbox(state[0]);
        self.mds_multiply(state);
    }

    /// Multiply state by the MDS matrix
    fn mds_multiply(&self, state: &mut [Fr]) {
        let t = self.params.width;
        let mut new_state = vec![Fr::from(0u64); t];

        for i in 0..t {
            for j in 0..t {
                new_state[i] += self.params.mds_matrix[i][j] * state[j];
            }
        }

        state.copy_from_slice(&new_state);
    }
}

/// S-box function: x^5
#[inline]
fn sbox(x: Fr) -> Fr {
    let x2 = x.square();
    let x4 = x2.square();
    x4 * x
}

// ============================================================================
// Public API
// ============================================================================

// Thread-local instances so repeated hashing skips constant regeneration
thread_local! {
    static POSEIDON_T2: Poseidon = Poseidon::new(WIDTH_T2);
    static POSEIDON_T3: Poseidon = Poseidon::new(WIDTH_T3);
}

/// `H1`: hash one field element (nullifier hash)
pub fn poseidon_hash1(x: &Fr) -> Fr {
    POSEIDON_T2.with(|p| p.hash1(x))
}

/// `H2`: hash two field elements (commitment and tree-node hash)
pub fn poseidon_hash2(a: &Fr, b: &Fr) -> Fr {
    POSEIDON_T3.with(|p| p.hash2(a, b))
}
