//! Client-side withdrawal orchestration
//!
//! Drives the withdraw phase against an abstract ledger: re-derive the
//! deposit secrets from the passphrase, locate the commitment's leaf in the
//! ledger's deposit log, fetch the authenticated path, prove, and self-verify
//! before handing the proof back for submission.
//!
//! Each invocation owns its witness and proof buffers exclusively; there is
//! no shared mutable state between concurrent invocations, and abandoning an
//! invocation before submission has no side effects.

use ark_bn254::Fr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::crypto::merkle::{MerkleError, MerklePath};
use crate::crypto::{derive, DepositSecrets};
use crate::proof::{
    ContractProof, ProofError, PublicSignals, SerializedProof, WithdrawCircuit,
    WithdrawProofSystem,
};

#[derive(Error, Debug)]
pub enum ClientError {
    /// The locally derived commitment is not in the deposit log: the deposit
    /// is unconfirmed, or the passphrase is wrong
    #[error("commitment not found in the ledger deposit log")]
    CommitmentNotFound,
    #[error("merkle error: {0}")]
    Merkle(#[from] MerkleError),
    #[error("proof error: {0}")]
    Proof(#[from] ProofError),
    /// The freshly generated proof failed local verification; inputs are
    /// inconsistent and submission would only waste a ledger call
    #[error("generated proof failed local verification")]
    SelfCheckFailed,
}

/// One deposit as recorded in the ledger's event log
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositEntry {
    pub commitment: Fr,
    pub leaf_index: u32,
}

/// Withdrawal state of a nullifier hash, from the client's perspective
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WithdrawalStatus {
    /// No swap result recorded yet; withdrawal would fail
    NotSwapped,
    /// Swap recorded and not yet consumed; withdrawal can proceed
    Ready,
    /// Already withdrawn; any further attempt is permanently rejected
    AlreadyWithdrawn,
}

/// Read-only ledger queries the client needs
///
/// The concrete transport (RPC, in-process, test double) is the
/// implementor's concern.
pub trait LedgerView {
    /// Current accumulator root
    fn current_root(&self) -> Fr;

    /// Authenticated path for a previously inserted leaf
    fn merkle_proof(&self, leaf_index: u32) -> Result<MerklePath, MerkleError>;

    /// Deposit log in insertion order
    ///
    /// May trail the chain head; recent insertions are not guaranteed to be
    /// visible yet.
    fn deposits(&self) -> Vec<DepositEntry>;

    /// True once the nullifier hash has been consumed by a withdrawal
    fn is_consumed(&self, nullifier_hash: &Fr) -> bool;

    /// True once a swap result has been recorded for the nullifier hash
    fn has_swap_result(&self, nullifier_hash: &Fr) -> bool;
}

/// Retry budget for the deposit-log scan
#[derive(Clone, Copy, Debug)]
pub struct ScanConfig {
    /// Attempts before an absent commitment is treated as definitive
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt
    pub initial_backoff: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

impl ScanConfig {
    /// No retries; used where the ledger view is known to be synchronous
    pub fn immediate() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }
}

/// A withdrawal proof ready for submission
#[derive(Clone, Debug)]
pub struct WithdrawProof {
    /// Compressed Groth16 proof
    pub proof: SerializedProof,
    /// Public signals the proof was generated for
    pub signals: PublicSignals,
    /// The verifier contract's calldata layout
    pub contract: ContractProof,
}

/// Generate a withdrawal proof for `recipient` from a passphrase
///
/// Re-derives the deposit secrets, locates the commitment's leaf via the
/// ledger's deposit log (bounded retries with backoff: an empty scan near
/// the head is possibly-stale, not definitive), fetches the path, proves,
/// and verifies locally before returning. Blocking and CPU-bound; run off
/// the UI or request thread.
pub fn generate_withdrawal_proof(
    system: &WithdrawProofSystem,
    ledger: &impl LedgerView,
    passphrase: &str,
    recipient: Fr,
    scan: &ScanConfig,
) -> Result<WithdrawProof, ClientError> {
    let secrets = derive(passphrase);

    let leaf_index = locate_leaf(ledger, &secrets, scan)?;
    let path = ledger.merkle_proof(leaf_index)?;
    let merkle_root = ledger.current_root();

    debug_assert!(path.verify(&secrets.commitment, &merkle_root));

    let signals = PublicSignals {
        merkle_root,
        nullifier_hash: secrets.nullifier_hash(),
        recipient,
    };

    info!(leaf_index, "generating withdrawal proof");
    let circuit = WithdrawCircuit::new(merkle_root, recipient, &secrets, &path);
    let proof = system.prove(circuit)?;

    // Catching a bad proof here is strictly cheaper than a failed ledger call
    if !system.verify(proof.as_bytes(), &signals)? {
        return Err(ClientError::SelfCheckFailed);
    }

    let contract = ContractProof::from_serialized(&proof)?;

    Ok(WithdrawProof {
        proof,
        signals,
        contract,
    })
}

/// Withdrawal state of a nullifier hash
pub fn check_withdrawable(ledger: &impl LedgerView, nullifier_hash: &Fr) -> WithdrawalStatus {
    if ledger.is_consumed(nullifier_hash) {
        WithdrawalStatus::AlreadyWithdrawn
    } else if ledger.has_swap_result(nullifier_hash) {
        WithdrawalStatus::Ready
    } else {
        WithdrawalStatus::NotSwapped
    }
}

/// Scan the deposit log for the commitment, retrying with backoff
fn locate_leaf(
    ledger: &impl LedgerView,
    secrets: &DepositSecrets,
    scan: &ScanConfig,
) -> Result<u32, ClientError> {
    let mut backoff = scan.initial_backoff;

    for attempt in 1..=scan.max_attempts.max(1) {
        let found = ledger
            .deposits()
            .iter()
            .find(|entry| entry.commitment == secrets.commitment)
            .map(|entry| entry.leaf_index);

        if let Some(leaf_index) = found {
            debug!(leaf_index, attempt, "commitment located in deposit log");
            return Ok(leaf_index);
        }

        if attempt < scan.max_attempts {
            warn!(attempt, "commitment not yet visible, retrying");
            std::thread::sleep(backoff);
            backoff = backoff.saturating_mul(2);
        }
    }

    Err(ClientError::CommitmentNotFound)
}
