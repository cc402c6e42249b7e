//! Deposit secret derivation
//!
//! Derives the `(nullifier, secret)` pair and its public commitment from a
//! user passphrase. The derivation is deterministic: a user can regenerate
//! the exact proof inputs from the passphrase alone, without storing raw
//! field elements.
//!
//! Rules:
//! - A purely numeric passphrase is interpreted directly: the secret is the
//!   decimal value as a field element and the nullifier is the value of the
//!   character-reversed digit string.
//! - Any other passphrase is mapped to the field through a domain-separated
//!   blake3 hash; the nullifier hashes the reversed passphrase.
//!
//! The commitment is `H2(nullifier, secret)`, exactly the expression the
//! withdrawal circuit recomputes from the private inputs.
//!
//! This is a client-side convenience derivation, not a timing-sensitive
//! comparison; constant-time execution is not required.

use ark_bn254::Fr;
use ark_ff::PrimeField;

use super::poseidon::{poseidon_hash1, poseidon_hash2};

/// Domain separator for the passphrase hash-to-field mapping
const PASSPHRASE_DOMAIN: &[u8] = b"UMBRA_PASSPHRASE_V1";

/// Secret material for one deposit, plus the derived public values
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositSecrets {
    /// Secret nullifier; its hash is revealed at swap time
    pub nullifier: Fr,
    /// Secret blinding value; never revealed
    pub secret: Fr,
    /// Public commitment inserted into the Merkle accumulator
    pub commitment: Fr,
}

impl DepositSecrets {
    /// The public nullifier hash `H1(nullifier)` keying the swap and
    /// withdrawal registries
    pub fn nullifier_hash(&self) -> Fr {
        poseidon_hash1(&self.nullifier)
    }
}

/// Derive `(nullifier, secret, commitment)` from a passphrase
///
/// Deterministic and side-effect-free; every passphrase yields a valid
/// field-element pair.
pub fn derive(passphrase: &str) -> DepositSecrets {
    let reversed: String = passphrase.chars().rev().collect();

    let (nullifier, secret) = if is_numeric(passphrase) {
        (field_from_digits(&reversed), field_from_digits(passphrase))
    } else {
        (hash_to_field(&reversed), hash_to_field(passphrase))
    };

    let commitment = poseidon_hash2(&nullifier, &secret);

    DepositSecrets {
        nullifier,
        secret,
        commitment,
    }
}

/// True if the passphrase is a non-empty ASCII digit string
fn is_numeric(passphrase: &str) -> bool {
    !passphrase.is_empty() && passphrase.bytes().all(|b| b.is_ascii_digit())
}

/// Interpret a decimal digit string as a field element (mod the field order)
fn field_from_digits(digits: &str) -> Fr {
    let ten = Fr::from(10u64);
    digits.bytes().fold(Fr::from(0u64), |acc, b| {
        acc * ten + Fr::from((b - b'0') as u64)
    })
}

/// Map an arbitrary string to a field element via the domain-separated hash
fn hash_to_field(input: &str) -> Fr {
    let mut hasher = blake3::Hasher::new();
    hasher.update(PASSPHRASE_DOMAIN);
    hasher.update(input.as_bytes());

    let hash = hasher.finalize();
    Fr::from_le_bytes_mod_order(hash.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::crypto::fr_to_bytes;

    #[test]
    fn test_derive_deterministic() {
        let a = derive("correct horse battery staple");
        let b = derive("correct horse battery staple");

        assert_eq!(a.nullifier, b.nullifier);
        assert_eq!(a.secret, b.secret);
        assert_eq!(a.commitment, b.commitment);
    }

    #[test]
    fn test_numeric_passphrase_direct_interpretation() {
        let secrets = derive("1234");

        assert_eq!(secrets.secret, Fr::from(1234u64));
        assert_eq!(secrets.nullifier, Fr::from(4321u64));
        assert_eq!(
            secrets.commitment,
            poseidon_hash2(&Fr::from(4321u64), &Fr::from(1234u64))
        );
    }

    #[test]
    fn test_numeric_leading_zeros() {
        // "100" reversed is "001", which is the value 1
        let secrets = derive("100");
        assert_eq!(secrets.secret, Fr::from(100u64));
        assert_eq!(secrets.nullifier, Fr::from(1u64));
    }

    #[test]
    fn test_mixed_passphrase_uses_hash_path() {
        // "abc123" is not purely numeric, so both values go through the hash
        let secrets = derive("abc123");

        assert_ne!(secrets.secret, Fr::from(123u64));
        assert_eq!(secrets.secret, hash_to_field("abc123"));
        assert_eq!(secrets.nullifier, hash_to_field("321cba"));
    }

    #[test]
    fn test_palindromic_numeric_passphrase() {
        // Reversal is the identity here; nullifier and secret coincide,
        // which is allowed (the commitment still binds both)
        let secrets = derive("777");
        assert_eq!(secrets.nullifier, secrets.secret);
    }

    #[test]
    fn test_nullifier_hash_matches_h1() {
        let secrets = derive("abc123");
        assert_eq!(secrets.nullifier_hash(), poseidon_hash1(&secrets.nullifier));
    }

    #[test]
    fn test_empty_passphrase_hash_fallback() {
        // Empty string is not numeric; it must still derive cleanly
        let secrets = derive("");
        assert_ne!(secrets.commitment, Fr::from(0u64));
    }

    #[test]
    fn test_commitment_collision_smoke() {
        // Collision-resistance smoke test over 10,000 distinct passphrases;
        // not a security proof
        let mut seen = HashSet::new();
        for i in 0..10_000u32 {
            let passphrase = format!("user-{}-passphrase", i);
            let commitment = fr_to_bytes(&derive(&passphrase).commitment);
            assert!(seen.insert(commitment), "collision at sample {}", i);
        }
    }
}
