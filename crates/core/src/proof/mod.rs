//! Groth16 proof subsystem for withdrawals
//!
//! Components:
//! - `circuit`: the withdrawal circuit (arkworks `ConstraintSynthesizer`)
//! - `gadgets`: R1CS gadgets (Poseidon, Merkle) shared with the circuit
//! - `artifacts`: versioned, checksum-verified proving/verification key blobs
//! - proof generation and verification using ark-groth16
//!
//! Proving is CPU-bound, single-shot and blocking; callers run it off their
//! UI or request thread. It is a pure function of its inputs: abandoning a
//! proof before submission has no side effects.

pub mod artifacts;
pub mod circuit;
pub mod gadgets;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use rand::rngs::OsRng;
use thiserror::Error;

pub use artifacts::{ArtifactBundle, KeyManifest};
pub use circuit::WithdrawCircuit;

use crate::crypto::fr_to_bytes;

#[derive(Error, Debug)]
pub enum ProofError {
    #[error("proof generation failed: {0}")]
    GenerationFailed(String),
    #[error("proof verification failed: {0}")]
    VerificationFailed(String),
    #[error("malformed proof bytes: {0}")]
    MalformedProof(String),
    #[error("serialization error: {0}")]
    SerializationError(String),
    #[error("setup error: {0}")]
    SetupError(String),
    #[error("invalid proving key")]
    InvalidProvingKey,
    #[error("invalid verifying key")]
    InvalidVerifyingKey,
    #[error("proof artifact missing: {0}")]
    ArtifactMissing(&'static str),
    #[error("proof artifact integrity failure for {component}: expected {expected}, got {actual}")]
    ArtifactIntegrity {
        component: &'static str,
        expected: String,
        actual: String,
    },
}

/// Public signals of a withdrawal proof
///
/// The ordering `[merkle_root, nullifier_hash, recipient]` is part of the
/// circuit's external contract and must match the verification key exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicSignals {
    /// Root the Merkle path was proven against (no freshness requirement)
    pub merkle_root: Fr,
    /// `H1(nullifier)`, the registry key
    pub nullifier_hash: Fr,
    /// Recipient of the proceeds, as a field element
    pub recipient: Fr,
}

impl PublicSignals {
    /// Signals in verifier order
    pub fn to_vec(&self) -> Vec<Fr> {
        vec![self.merkle_root, self.nullifier_hash, self.recipient]
    }

    /// Signals as big-endian 32-byte words, in verifier order
    pub fn to_bytes(&self) -> [[u8; 32]; 3] {
        [
            fr_to_bytes(&self.merkle_root),
            fr_to_bytes(&self.nullifier_hash),
            fr_to_bytes(&self.recipient),
        ]
    }
}

/// Serialized Groth16 proof (compressed points)
/// Format: A (32) || B (64) || C (32)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedProof {
    bytes: Vec<u8>,
}

impl SerializedProof {
    /// Size of a compressed BN254 Groth16 proof
    pub const SIZE: usize = 128; // 32 + 64 + 32

    /// Create from raw bytes, checking the length
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ProofError> {
        if bytes.len() != Self::SIZE {
            return Err(ProofError::MalformedProof(format!(
                "expected {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    /// Raw proof bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Proof in the verifier contract's calldata layout
///
/// `[a0, a1, b00, b01, b10, b11, c0, c1]` as big-endian 32-byte words. The
/// G2 coordinate pairs are swapped (c1 before c0), the ordering pairing
/// precompiles expect; a mathematically valid proof submitted in the wrong
/// order fails verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractProof {
    pub words: [[u8; 32]; 8],
}

impl ContractProof {
    /// Convert a serialized proof into the contract calldata layout
    pub fn from_serialized(proof: &SerializedProof) -> Result<Self, ProofError> {
        let proof = Proof::<Bn254>::deserialize_compressed(proof.as_bytes())
            .map_err(|e| ProofError::MalformedProof(e.to_string()))?;

        let mut a_bytes = Vec::new();
        proof
            .a
            .serialize_uncompressed(&mut a_bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;

        let mut b_bytes = Vec::new();
        proof
            .b
            .serialize_uncompressed(&mut b_bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;

        let mut c_bytes = Vec::new();
        proof
            .c
            .serialize_uncompressed(&mut c_bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;

        // arkworks uncompressed layout is little-endian:
        // G1 = x || y; G2 = x.c0 || x.c1 || y.c0 || y.c1
        let word = |bytes: &[u8], i: usize| -> [u8; 32] {
            let mut out = [0u8; 32];
            out.copy_from_slice(&bytes[i * 32..(i + 1) * 32]);
            out.reverse();
            out
        };

        Ok(Self {
            words: [
                word(&a_bytes, 0), // a.x
                word(&a_bytes, 1), // a.y
                word(&b_bytes, 1), // b.x.c1
                word(&b_bytes, 0), // b.x.c0
                word(&b_bytes, 3), // b.y.c1
                word(&b_bytes, 2), // b.y.c0
                word(&c_bytes, 0), // c.x
                word(&c_bytes, 1), // c.y
            ],
        })
    }
}

/// Verifier half of the proof system
///
/// Holds only the prepared verification key; this is what the ledger keeps.
#[derive(Clone)]
pub struct WithdrawVerifier {
    prepared_vk: PreparedVerifyingKey<Bn254>,
}

impl WithdrawVerifier {
    /// Build from a verification key
    pub fn new(vk: &VerifyingKey<Bn254>) -> Result<Self, ProofError> {
        let prepared_vk =
            Groth16::<Bn254>::process_vk(vk).map_err(|e| ProofError::SetupError(e.to_string()))?;
        Ok(Self { prepared_vk })
    }

    /// Build from serialized verification key bytes
    pub fn from_key_bytes(vk_bytes: &[u8]) -> Result<Self, ProofError> {
        let vk = VerifyingKey::deserialize_compressed(vk_bytes)
            .map_err(|_| ProofError::InvalidVerifyingKey)?;
        Self::new(&vk)
    }

    /// Verify a proof against public signals
    ///
    /// Fails closed: malformed bytes are an error, a well-formed proof that
    /// does not verify is `Ok(false)`.
    pub fn verify(
        &self,
        proof_bytes: &[u8],
        signals: &PublicSignals,
    ) -> Result<bool, ProofError> {
        let proof = Proof::deserialize_compressed(proof_bytes)
            .map_err(|e| ProofError::MalformedProof(e.to_string()))?;

        Groth16::<Bn254>::verify_with_processed_vk(&self.prepared_vk, &signals.to_vec(), &proof)
            .map_err(|e| ProofError::VerificationFailed(e.to_string()))
    }
}

/// Groth16 proof system for the withdrawal circuit
pub struct WithdrawProofSystem {
    proving_key: ProvingKey<Bn254>,
    verifying_key: VerifyingKey<Bn254>,
    prepared_vk: PreparedVerifyingKey<Bn254>,
}

impl WithdrawProofSystem {
    /// Generate proving and verifying keys for the withdrawal circuit
    ///
    /// WARNING: uses local randomness as toxic waste; suitable only for
    /// tests. Production keys come from a trusted setup ceremony and are
    /// loaded via `from_artifacts`.
    pub fn setup() -> Result<Self, ProofError> {
        let circuit = WithdrawCircuit::blank();

        let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, &mut OsRng)
            .map_err(|e| ProofError::SetupError(e.to_string()))?;

        let prepared_vk =
            Groth16::<Bn254>::process_vk(&vk).map_err(|e| ProofError::SetupError(e.to_string()))?;

        Ok(Self {
            proving_key: pk,
            verifying_key: vk,
            prepared_vk,
        })
    }

    /// Load from serialized keys
    pub fn from_keys(pk_bytes: &[u8], vk_bytes: &[u8]) -> Result<Self, ProofError> {
        let proving_key = ProvingKey::deserialize_compressed(pk_bytes)
            .map_err(|_| ProofError::InvalidProvingKey)?;

        let verifying_key = VerifyingKey::deserialize_compressed(vk_bytes)
            .map_err(|_| ProofError::InvalidVerifyingKey)?;

        let prepared_vk = Groth16::<Bn254>::process_vk(&verifying_key)
            .map_err(|e| ProofError::SetupError(e.to_string()))?;

        Ok(Self {
            proving_key,
            verifying_key,
            prepared_vk,
        })
    }

    /// Load from a checksum-verified artifact bundle
    ///
    /// Rejects missing or corrupted artifacts before attempting to
    /// deserialize either key.
    pub fn from_artifacts(bundle: &ArtifactBundle) -> Result<Self, ProofError> {
        bundle.verify_integrity()?;
        Self::from_keys(&bundle.proving_key, &bundle.verifying_key)
    }

    /// Serialize the proving key
    pub fn serialize_proving_key(&self) -> Result<Vec<u8>, ProofError> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize the verifying key
    pub fn serialize_verifying_key(&self) -> Result<Vec<u8>, ProofError> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;
        Ok(bytes)
    }

    /// Generate a proof for an assigned withdrawal circuit
    pub fn prove(&self, circuit: WithdrawCircuit) -> Result<SerializedProof, ProofError> {
        let proof = Groth16::<Bn254>::prove(&self.proving_key, circuit, &mut OsRng)
            .map_err(|e| ProofError::GenerationFailed(e.to_string()))?;

        let mut bytes = Vec::new();
        proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;

        SerializedProof::from_bytes(bytes)
    }

    /// Verify a proof against public signals (see `WithdrawVerifier::verify`)
    pub fn verify(
        &self,
        proof_bytes: &[u8],
        signals: &PublicSignals,
    ) -> Result<bool, ProofError> {
        let proof = Proof::deserialize_compressed(proof_bytes)
            .map_err(|e| ProofError::MalformedProof(e.to_string()))?;

        Groth16::<Bn254>::verify_with_processed_vk(&self.prepared_vk, &signals.to_vec(), &proof)
            .map_err(|e| ProofError::VerificationFailed(e.to_string()))
    }

    /// The verifier half, for handing to the ledger
    pub fn verifier(&self) -> Result<WithdrawVerifier, ProofError> {
        WithdrawVerifier::new(&self.verifying_key)
    }

    /// The verification key
    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.verifying_key
    }
}
