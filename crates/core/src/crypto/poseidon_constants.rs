//! Poseidon parameters for the two protocol hash instantiations
//!
//! The protocol uses exactly two fixed-parameter Poseidon instances over the
//! BN254 scalar field:
//! - `t = 2` (1 input + capacity): the 1-ary nullifier hash `H1`
//! - `t = 3` (2 inputs + capacity): the 2-ary commitment hash `H2`
//!
//! Round constants and MDS matrices are derived deterministically per width
//! from a fixed domain string. This module is the single source of truth for
//! both the native hasher and the R1CS gadgets; the withdrawal circuit reads
//! the same constants, so native and in-circuit hashing agree bit for bit.
//!
//! Parameters:
//! - Field: BN254 scalar field (Fr)
//! - S-box: x^5
//! - Full rounds: RF = 8 (4 at start, 4 at end)
//! - Partial rounds: RP = 56 (t=2), RP = 57 (t=3)

use ark_bn254::Fr;
use ark_ff::{Field, PrimeField};

/// Number of full rounds (RF = 8), shared by both widths
pub const FULL_ROUNDS: usize = 8;

/// Partial rounds for the t=2 instance (H1)
pub const PARTIAL_ROUNDS_T2: usize = 56;

/// Partial rounds for the t=3 instance (H2)
pub const PARTIAL_ROUNDS_T3: usize = 57;

/// State width of the 1-ary instance
pub const WIDTH_T2: usize = 2;

/// State width of the 2-ary instance
pub const WIDTH_T3: usize = 3;

/// Partial-round count for a supported width
pub fn partial_rounds(width: usize) -> usize {
    match width {
        WIDTH_T2 => PARTIAL_ROUNDS_T2,
        WIDTH_T3 => PARTIAL_ROUNDS_T3,
        _ => panic!("unsupported Poseidon width: {}", width),
    }
}

/// Domain string seeding the constant derivation for a width
fn derivation_domain(width: usize) -> &'static [u8] {
    match width {
        WIDTH_T2 => b"Poseidon_BN254_t2_RF8_RP56",
        WIDTH_T3 => b"Poseidon_BN254_t3_RF8_RP57",
        _ => panic!("unsupported Poseidon width: {}", width),
    }
}

/// Generate round constants deterministically for a width
///
/// Uses a hash-based derivation seeded by the width's domain string; every
/// constant is an independent hash-to-field output.
pub fn round_constants(width: usize) -> Vec<Fr> {
    let num_constants = width * (FULL_ROUNDS + partial_rounds(width));
    let domain = derivation_domain(width);

    let mut constants = Vec::with_capacity(num_constants);
    for i in 0..num_constants {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain);
        hasher.update(&(i as u64).to_le_bytes());
        hasher.update(b"round_constant");

        let hash = hasher.finalize();
        constants.push(Fr::from_le_bytes_mod_order(hash.as_bytes()));
    }

    constants
}

/// Generate the MDS matrix for a width
///
/// Cauchy construction M[i][j] = 1 / (x[i] + y[j]) with disjoint x and y
/// sequences, which is guaranteed to be maximum distance separable.
pub fn mds_matrix(width: usize) -> Vec<Vec<Fr>> {
    let x: Vec<Fr> = (0..width).map(|i| Fr::from(i as u64)).collect();
    let y: Vec<Fr> = (width..(2 * width)).map(|i| Fr::from(i as u64)).collect();

    let mut matrix = vec![vec![Fr::from(0u64); width]; width];
    for i in 0..width {
        for j in 0..width {
            let sum = x[i] + y[j];
            // x[i] + y[j] is never zero: the sequences are disjoint positive integers
            matrix[i][j] = sum.inverse().expect("Cauchy entries are nonzero");
        }
    }

    matrix
}
