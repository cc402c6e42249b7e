//! Swap configurations and the aggregator binding
//!
//! A swap configuration fixes the exact input asset and denomination a
//! deposit commits to; observers cannot distinguish depositors by amount.
//! The aggregator is an external quote/execution oracle reached through the
//! `SwapAggregator` trait; `record_swap` validates the execution payload's
//! declared tokens and amount against the configuration before anything is
//! executed or recorded.

use anyhow::anyhow;
use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use umbra_core::fr_to_bytes;

use crate::asset::{Address, Amount, Asset};
use crate::error::LedgerError;

/// Domain separator for the depositor's swap authorization digest
const SWAP_AUTH_DOMAIN: &[u8] = b"UMBRA_SWAP_AUTH_V1";

/// One fixed-denomination swap configuration; immutable once registered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Asset the deposit phase collects
    pub token_in: Asset,
    /// Exact amount the swap phase must consume
    pub fixed_amount: Amount,
}

/// Owner-gated registry of swap configurations
#[derive(Debug)]
pub struct SwapConfigRegistry {
    owner: Address,
    configs: BTreeMap<u64, SwapConfig>,
    next_id: u64,
}

impl SwapConfigRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            configs: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Register a new configuration; owner-only
    pub fn register(&mut self, caller: Address, config: SwapConfig) -> Result<u64, LedgerError> {
        if caller != self.owner {
            return Err(LedgerError::NotOwner);
        }
        if config.fixed_amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let id = self.next_id;
        self.configs.insert(id, config);
        self.next_id += 1;
        Ok(id)
    }

    /// Look up a configuration
    pub fn get(&self, id: u64) -> Option<&SwapConfig> {
        self.configs.get(&id)
    }
}

/// Decoded aggregator execution payload
///
/// Carries both the opaque execution data and the declared route the ledger
/// validates before attributing the swap to a nullifier hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    /// Declared input token; must equal the configuration's `token_in`
    pub src_token: Asset,
    /// Declared output token; must equal the `token_out` being recorded
    pub dst_token: Asset,
    /// Declared input amount; must equal the configuration's `fixed_amount`
    pub amount: Amount,
    /// Minimum acceptable return after slippage
    pub min_return: Amount,
    /// Executor contract the pooled input is released to
    pub executor: Address,
    /// Route descriptor, opaque to the ledger
    pub descriptor: Vec<u8>,
    /// Inner call data, opaque to the ledger
    pub calldata: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("no route from {src} to {dst}")]
    NoRoute { src: Asset, dst: Asset },
    /// Execution failed downstream; the cause is preserved so the operator
    /// can decide whether to retry with different parameters
    #[error("swap execution failed")]
    Execution(#[source] anyhow::Error),
}

/// External swap-liquidity aggregator
pub trait SwapAggregator {
    /// Expected output for a swap of `amount` from `src` to `dst`
    fn quote(&self, src: Asset, dst: Asset, amount: Amount) -> Result<Amount, AggregatorError>;

    /// Build an execution payload for the route
    fn build_execution(
        &self,
        src: Asset,
        dst: Asset,
        amount: Amount,
        slippage_bps: u16,
    ) -> Result<ExecutionPayload, AggregatorError>;

    /// Execute the payload, returning the amount actually received
    fn execute(&mut self, payload: &ExecutionPayload) -> Result<Amount, AggregatorError>;
}

/// Digest the depositor signs to authorize an operator-driven swap
///
/// Binds the chain, configuration, nullifier hash, output token, and the
/// depositor identity; the operator presents the signature alongside
/// `record_swap`. Signature verification itself belongs to the wallet layer.
pub fn authorization_digest(
    chain_id: u64,
    swap_config_id: u64,
    nullifier_hash: &Fr,
    token_out: &Asset,
    depositor: &Address,
) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(SWAP_AUTH_DOMAIN);
    hasher.update(&chain_id.to_le_bytes());
    hasher.update(&swap_config_id.to_le_bytes());
    hasher.update(&fr_to_bytes(nullifier_hash));
    hasher.update(&token_out.encode());
    hasher.update(&depositor.0);
    *hasher.finalize().as_bytes()
}

/// Fixed-rate aggregator for tests and local development
///
/// Rates are scaled by 10^18: `out = in * rate / 10^18`.
#[derive(Debug)]
pub struct FixedRateAggregator {
    executor: Address,
    rates: HashMap<(Asset, Asset), u128>,
}

/// Rate scaling factor
pub const RATE_SCALE: u128 = 1_000_000_000_000_000_000;

impl FixedRateAggregator {
    pub fn new(executor: Address) -> Self {
        Self {
            executor,
            rates: HashMap::new(),
        }
    }

    /// Set the rate for a pair (scaled by `RATE_SCALE`)
    pub fn set_rate(&mut self, src: Asset, dst: Asset, rate: u128) {
        self.rates.insert((src, dst), rate);
    }
}

impl SwapAggregator for FixedRateAggregator {
    fn quote(&self, src: Asset, dst: Asset, amount: Amount) -> Result<Amount, AggregatorError> {
        let rate = self
            .rates
            .get(&(src, dst))
            .ok_or(AggregatorError::NoRoute { src, dst })?;

        amount
            .checked_mul(*rate)
            .map(|scaled| scaled / RATE_SCALE)
            .ok_or_else(|| AggregatorError::Execution(anyhow!("quote overflow for {}", amount)))
    }

    fn build_execution(
        &self,
        src: Asset,
        dst: Asset,
        amount: Amount,
        slippage_bps: u16,
    ) -> Result<ExecutionPayload, AggregatorError> {
        let expected = self.quote(src, dst, amount)?;
        let min_return = expected - expected * slippage_bps as u128 / 10_000;

        // Route descriptor: an opaque fingerprint of the requested route
        let mut hasher = blake3::Hasher::new();
        hasher.update(&src.encode());
        hasher.update(&dst.encode());
        hasher.update(&amount.to_le_bytes());
        let descriptor = hasher.finalize().as_bytes()[..16].to_vec();

        Ok(ExecutionPayload {
            src_token: src,
            dst_token: dst,
            amount,
            min_return,
            executor: self.executor,
            descriptor,
            calldata: Vec::new(),
        })
    }

    fn execute(&mut self, payload: &ExecutionPayload) -> Result<Amount, AggregatorError> {
        let received = self.quote(payload.src_token, payload.dst_token, payload.amount)?;
        if received < payload.min_return {
            return Err(AggregatorError::Execution(anyhow!(
                "return {} below minimum {}",
                received,
                payload.min_return
            )));
        }
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    fn usdc() -> Asset {
        Asset::Fungible(addr(0xa0))
    }

    #[test]
    fn test_registry_owner_gate() {
        let owner = addr(1);
        let stranger = addr(2);
        let mut registry = SwapConfigRegistry::new(owner);

        let config = SwapConfig {
            token_in: Asset::Native,
            fixed_amount: 200_000_000_000_000,
        };

        assert!(matches!(
            registry.register(stranger, config),
            Err(LedgerError::NotOwner)
        ));

        let id = registry.register(owner, config).unwrap();
        assert_eq!(id, 1);
        assert_eq!(registry.get(id), Some(&config));
    }

    #[test]
    fn test_registry_sequential_ids() {
        let owner = addr(1);
        let mut registry = SwapConfigRegistry::new(owner);

        let config = SwapConfig {
            token_in: Asset::Native,
            fixed_amount: 1,
        };

        assert_eq!(registry.register(owner, config).unwrap(), 1);
        assert_eq!(registry.register(owner, config).unwrap(), 2);
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn test_registry_rejects_zero_amount() {
        let owner = addr(1);
        let mut registry = SwapConfigRegistry::new(owner);

        let config = SwapConfig {
            token_in: Asset::Native,
            fixed_amount: 0,
        };
        assert!(matches!(
            registry.register(owner, config),
            Err(LedgerError::InvalidAmount)
        ));
    }

    #[test]
    fn test_fixed_rate_quote() {
        let mut aggregator = FixedRateAggregator::new(addr(9));
        // 1 native unit = 3500 token units
        aggregator.set_rate(Asset::Native, usdc(), 3_500 * RATE_SCALE);

        let out = aggregator.quote(Asset::Native, usdc(), 200).unwrap();
        assert_eq!(out, 700_000);
    }

    #[test]
    fn test_quote_no_route() {
        let aggregator = FixedRateAggregator::new(addr(9));
        assert!(matches!(
            aggregator.quote(Asset::Native, usdc(), 100),
            Err(AggregatorError::NoRoute { .. })
        ));
    }

    #[test]
    fn test_build_execution_declares_route() {
        let mut aggregator = FixedRateAggregator::new(addr(9));
        aggregator.set_rate(Asset::Native, usdc(), 2 * RATE_SCALE);

        let payload = aggregator
            .build_execution(Asset::Native, usdc(), 1_000, 50)
            .unwrap();

        assert_eq!(payload.src_token, Asset::Native);
        assert_eq!(payload.dst_token, usdc());
        assert_eq!(payload.amount, 1_000);
        assert_eq!(payload.min_return, 1_990); // 2000 less 0.5%
        assert_eq!(payload.executor, addr(9));
    }

    #[test]
    fn test_execute_honors_min_return() {
        let mut aggregator = FixedRateAggregator::new(addr(9));
        aggregator.set_rate(Asset::Native, usdc(), 2 * RATE_SCALE);

        let mut payload = aggregator
            .build_execution(Asset::Native, usdc(), 1_000, 0)
            .unwrap();
        assert_eq!(aggregator.execute(&payload).unwrap(), 2_000);

        // A rate drop below the declared minimum fails execution
        aggregator.set_rate(Asset::Native, usdc(), RATE_SCALE);
        payload.min_return = 2_000;
        assert!(matches!(
            aggregator.execute(&payload),
            Err(AggregatorError::Execution(_))
        ));
    }

    #[test]
    fn test_authorization_digest_binds_every_field() {
        let base = authorization_digest(1, 1, &Fr::from(5u64), &usdc(), &addr(3));

        assert_ne!(
            base,
            authorization_digest(2, 1, &Fr::from(5u64), &usdc(), &addr(3))
        );
        assert_ne!(
            base,
            authorization_digest(1, 2, &Fr::from(5u64), &usdc(), &addr(3))
        );
        assert_ne!(
            base,
            authorization_digest(1, 1, &Fr::from(6u64), &usdc(), &addr(3))
        );
        assert_ne!(
            base,
            authorization_digest(1, 1, &Fr::from(5u64), &Asset::Native, &addr(3))
        );
        assert_ne!(
            base,
            authorization_digest(1, 1, &Fr::from(5u64), &usdc(), &addr(4))
        );
    }
}
