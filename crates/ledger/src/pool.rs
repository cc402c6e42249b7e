//! Privacy pool orchestration
//!
//! Composes the Merkle accumulator, swap-configuration registry, nullifier
//! registry, vault, and event log behind the Ledger interface: `deposit`,
//! `record_swap` (operator-only), `withdraw`, and the read-only probes.
//!
//! Callers serialize mutations (`&mut self`); within one call, registry
//! transitions are atomic check-then-set steps. Every cryptographic and
//! state-consistency check runs before any value transfer; the pool never
//! moves funds speculatively.

use ark_bn254::Fr;
use tracing::{info, instrument};

use umbra_core::client::{DepositEntry, LedgerView};
use umbra_core::{
    fr_from_bytes, fr_to_bytes, MerkleAccumulator, MerkleError, MerklePath, WithdrawProof,
    WithdrawVerifier, MAX_LEAVES,
};

use crate::asset::{Address, Amount, Asset, Vault};
use crate::error::LedgerError;
use crate::events::{EventLog, LedgerEvent};
use crate::registry::{NullifierRegistry, NullifierStatus, SwapResult};
use crate::swap::{
    authorization_digest, ExecutionPayload, SwapAggregator, SwapConfig, SwapConfigRegistry,
};

/// Pool deployment parameters
#[derive(Clone, Copy, Debug)]
pub struct PoolParams {
    /// Chain identifier bound into swap authorizations
    pub chain_id: u64,
    /// Identity allowed to register swap configurations
    pub owner: Address,
    /// Identity allowed to execute the swap phase
    pub operator: Address,
}

/// The ledger-side privacy pool
pub struct Pool<A: SwapAggregator, V: Vault> {
    params: PoolParams,
    tree: MerkleAccumulator,
    configs: SwapConfigRegistry,
    registry: NullifierRegistry,
    verifier: WithdrawVerifier,
    aggregator: A,
    vault: V,
    log: EventLog,
    slot: u64,
}

impl<A: SwapAggregator, V: Vault> Pool<A, V> {
    pub fn new(params: PoolParams, verifier: WithdrawVerifier, aggregator: A, vault: V) -> Self {
        Self {
            params,
            tree: MerkleAccumulator::new(),
            configs: SwapConfigRegistry::new(params.owner),
            registry: NullifierRegistry::new(),
            verifier,
            aggregator,
            vault,
            log: EventLog::new(),
            slot: 0,
        }
    }

    /// Register a swap configuration; owner-only, immutable once created
    pub fn register_swap_config(
        &mut self,
        caller: Address,
        config: SwapConfig,
    ) -> Result<u64, LedgerError> {
        self.configs.register(caller, config)
    }

    /// Deposit phase: collect the configured denomination and insert the
    /// commitment, returning its leaf index
    #[instrument(skip(self, commitment), fields(slot = self.slot))]
    pub fn deposit(
        &mut self,
        depositor: Address,
        commitment: Fr,
        swap_config_id: u64,
    ) -> Result<u32, LedgerError> {
        let config = *self
            .configs
            .get(swap_config_id)
            .ok_or(LedgerError::UnknownConfig(swap_config_id))?;

        if self.tree.len() >= MAX_LEAVES {
            return Err(LedgerError::CapacityExceeded);
        }

        self.vault
            .collect(config.token_in, depositor, config.fixed_amount)?;

        let leaf_index = self.tree.insert(commitment)?;

        self.slot += 1;
        self.log.append(LedgerEvent::Deposit {
            commitment: fr_to_bytes(&commitment),
            leaf_index,
            swap_config_id,
            slot: self.slot,
        });

        info!(leaf_index, swap_config_id, "deposit inserted");
        Ok(leaf_index)
    }

    /// Swap phase: validate the payload against the configuration, execute
    /// through the aggregator, and record the result; operator-only
    ///
    /// Execution and recording are one transaction from the protocol's
    /// perspective; the execution environment's atomicity covers them.
    #[instrument(skip(self, nullifier_hash, payload), fields(slot = self.slot))]
    pub fn record_swap(
        &mut self,
        caller: Address,
        nullifier_hash: Fr,
        swap_config_id: u64,
        token_out: Asset,
        payload: &ExecutionPayload,
    ) -> Result<Amount, LedgerError> {
        if caller != self.params.operator {
            return Err(LedgerError::NotOperator);
        }

        if self.registry.swap_result(&nullifier_hash).is_some() {
            return Err(LedgerError::AlreadySwapped);
        }

        let config = *self
            .configs
            .get(swap_config_id)
            .ok_or(LedgerError::UnknownConfig(swap_config_id))?;

        // A wrong asset or amount must never be attributed to this
        // nullifier hash, whatever the aggregator would have returned
        if payload.src_token != config.token_in {
            return Err(LedgerError::PayloadMismatch { field: "src_token" });
        }
        if payload.amount != config.fixed_amount {
            return Err(LedgerError::PayloadMismatch { field: "amount" });
        }
        if payload.dst_token != token_out {
            return Err(LedgerError::PayloadMismatch { field: "dst_token" });
        }

        let amount_out = self.aggregator.execute(payload)?;

        // Settle custody: input leaves to the executor, output joins the pool
        self.vault
            .transfer(config.token_in, payload.executor, config.fixed_amount)?;
        self.vault.credit_pool(token_out, amount_out);

        self.registry.record(
            &nullifier_hash,
            SwapResult {
                token_out,
                amount: amount_out,
            },
        )?;

        self.slot += 1;
        self.log.append(LedgerEvent::SwapResultRecorded {
            nullifier_hash: fr_to_bytes(&nullifier_hash),
            token_out,
            amount_out,
            slot: self.slot,
        });

        info!(swap_config_id, amount_out, "swap recorded");
        Ok(amount_out)
    }

    /// Withdraw phase: verify the proof, consume the nullifier hash, and
    /// pay the recorded proceeds to the recipient
    ///
    /// The proof's embedded Merkle root is accepted as-is: verification is a
    /// function of the proof and its public signals alone, with no freshness
    /// check against the current root.
    #[instrument(skip(self, nullifier_hash, proof), fields(slot = self.slot))]
    pub fn withdraw(
        &mut self,
        nullifier_hash: Fr,
        recipient: Address,
        proof: &WithdrawProof,
    ) -> Result<(Asset, Amount), LedgerError> {
        if proof.signals.nullifier_hash != nullifier_hash {
            return Err(LedgerError::PublicSignalMismatch {
                signal: "nullifier_hash",
            });
        }
        if proof.signals.recipient != recipient.as_field() {
            return Err(LedgerError::PublicSignalMismatch {
                signal: "recipient",
            });
        }

        let valid = self
            .verifier
            .verify(proof.proof.as_bytes(), &proof.signals)
            .map_err(|_| LedgerError::InvalidProof)?;
        if !valid {
            return Err(LedgerError::InvalidProof);
        }

        let result = self.registry.consume_and_get(&nullifier_hash)?;

        // Consumption is not rolled back if the transfer fails; atomicity
        // across the two is the transaction environment's guarantee
        self.vault
            .transfer(result.token_out, recipient, result.amount)?;

        self.slot += 1;
        self.log.append(LedgerEvent::Withdrawal {
            nullifier_hash: fr_to_bytes(&nullifier_hash),
            recipient,
            token_out: result.token_out,
            amount: result.amount,
            slot: self.slot,
        });

        info!(recipient = %recipient, amount = result.amount, "withdrawal paid");
        Ok((result.token_out, result.amount))
    }

    // ===== Read-only probes =====

    /// Current accumulator root
    pub fn current_root(&self) -> Fr {
        self.tree.root()
    }

    /// Authenticated path for a previously inserted leaf
    pub fn merkle_proof(&self, leaf_index: u32) -> Result<MerklePath, LedgerError> {
        Ok(self.tree.merkle_proof(leaf_index)?)
    }

    /// Look up a swap configuration
    pub fn swap_config(&self, id: u64) -> Option<&SwapConfig> {
        self.configs.get(id)
    }

    /// True once the nullifier hash has been consumed
    pub fn is_consumed(&self, nullifier_hash: &Fr) -> bool {
        self.registry.is_consumed(nullifier_hash)
    }

    /// The recorded swap result, if any
    pub fn swap_result(&self, nullifier_hash: &Fr) -> Option<SwapResult> {
        self.registry.swap_result(nullifier_hash)
    }

    /// Lifecycle state of a nullifier hash
    pub fn nullifier_status(&self, nullifier_hash: &Fr) -> NullifierStatus {
        self.registry.status(nullifier_hash)
    }

    /// The event log
    pub fn events(&self) -> &[LedgerEvent] {
        self.log.all()
    }

    /// Pool parameters
    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    /// Vault access for balance inspection
    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Aggregator access for quoting and payload construction
    pub fn aggregator(&self) -> &A {
        &self.aggregator
    }

    /// Digest a depositor signs to authorize an operator-driven swap on this
    /// pool's chain
    pub fn swap_authorization_digest(
        &self,
        swap_config_id: u64,
        nullifier_hash: &Fr,
        token_out: &Asset,
        depositor: &Address,
    ) -> [u8; 32] {
        authorization_digest(
            self.params.chain_id,
            swap_config_id,
            nullifier_hash,
            token_out,
            depositor,
        )
    }
}

impl<A: SwapAggregator, V: Vault> LedgerView for Pool<A, V> {
    fn current_root(&self) -> Fr {
        self.tree.root()
    }

    fn merkle_proof(&self, leaf_index: u32) -> Result<MerklePath, MerkleError> {
        self.tree.merkle_proof(leaf_index)
    }

    fn deposits(&self) -> Vec<DepositEntry> {
        self.log
            .deposits()
            .map(|(commitment, leaf_index, _)| DepositEntry {
                commitment: fr_from_bytes(commitment),
                leaf_index,
            })
            .collect()
    }

    fn is_consumed(&self, nullifier_hash: &Fr) -> bool {
        self.registry.is_consumed(nullifier_hash)
    }

    fn has_swap_result(&self, nullifier_hash: &Fr) -> bool {
        self.registry.swap_result(nullifier_hash).is_some()
    }
}
