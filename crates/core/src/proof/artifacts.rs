//! Proof artifact handling
//!
//! The proving and verification keys are opaque, versioned blobs produced by
//! the circuit build. They are paired with a manifest carrying SHA-256
//! checksums; loading rejects missing or corrupted blobs before any prove or
//! verify attempt, never proceeding silently on a bad artifact.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ProofError;

/// Manifest describing one proving/verification key pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyManifest {
    /// Identifier of the compiled circuit the keys belong to
    pub circuit: String,
    /// Artifact version; bumped whenever the circuit is recompiled
    pub version: u32,
    /// Hex SHA-256 of the proving key blob
    pub proving_key_sha256: String,
    /// Hex SHA-256 of the verification key blob
    pub verifying_key_sha256: String,
}

impl KeyManifest {
    /// Compute a manifest for a key pair
    pub fn describe(circuit: &str, version: u32, pk: &[u8], vk: &[u8]) -> Self {
        Self {
            circuit: circuit.to_string(),
            version,
            proving_key_sha256: sha256_hex(pk),
            verifying_key_sha256: sha256_hex(vk),
        }
    }
}

/// A key pair plus its manifest, as loaded from the artifact store
#[derive(Clone, Debug)]
pub struct ArtifactBundle {
    pub manifest: KeyManifest,
    pub proving_key: Vec<u8>,
    pub verifying_key: Vec<u8>,
}

impl ArtifactBundle {
    /// Assemble a bundle, verifying integrity immediately
    pub fn new(
        manifest: KeyManifest,
        proving_key: Vec<u8>,
        verifying_key: Vec<u8>,
    ) -> Result<Self, ProofError> {
        let bundle = Self {
            manifest,
            proving_key,
            verifying_key,
        };
        bundle.verify_integrity()?;
        Ok(bundle)
    }

    /// Check both blobs against the manifest checksums
    pub fn verify_integrity(&self) -> Result<(), ProofError> {
        if self.proving_key.is_empty() {
            return Err(ProofError::ArtifactMissing("proving key"));
        }
        if self.verifying_key.is_empty() {
            return Err(ProofError::ArtifactMissing("verification key"));
        }

        let pk_digest = sha256_hex(&self.proving_key);
        if pk_digest != self.manifest.proving_key_sha256 {
            return Err(ProofError::ArtifactIntegrity {
                component: "proving key",
                expected: self.manifest.proving_key_sha256.clone(),
                actual: pk_digest,
            });
        }

        let vk_digest = sha256_hex(&self.verifying_key);
        if vk_digest != self.manifest.verifying_key_sha256 {
            return Err(ProofError::ArtifactIntegrity {
                component: "verification key",
                expected: self.manifest.verifying_key_sha256.clone(),
                actual: vk_digest,
            });
        }

        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
