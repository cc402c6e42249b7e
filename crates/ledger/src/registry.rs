//! Nullifier registry
//!
//! Tracks the per-nullifier-hash state machine `Unseen → Swapped →
//! Withdrawn`. Transitions are strictly forward and single-fire: the swap
//! result is written exactly once, and consumption is an atomic
//! check-then-set. This registry is the protocol's double-spend barrier.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

use umbra_core::fr_to_bytes;

use crate::asset::{Amount, Asset};
use crate::error::LedgerError;

/// Outcome of the swap phase for one nullifier hash
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResult {
    /// Asset the pool received
    pub token_out: Asset,
    /// Amount the pool received
    pub amount: Amount,
}

/// Lifecycle state of a nullifier hash
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NullifierStatus {
    /// Never seen by the swap phase
    Unseen,
    /// Swap recorded, proceeds claimable
    Swapped,
    /// Proceeds claimed; permanently terminal
    Withdrawn,
}

/// Registry of swap results and consumed nullifier hashes
#[derive(Debug, Default)]
pub struct NullifierRegistry {
    results: HashMap<[u8; 32], SwapResult>,
    consumed: HashSet<[u8; 32]>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the swap result for a nullifier hash; write-once
    pub fn record(&mut self, nullifier_hash: &Fr, result: SwapResult) -> Result<(), LedgerError> {
        let key = fr_to_bytes(nullifier_hash);
        if self.results.contains_key(&key) {
            return Err(LedgerError::AlreadySwapped);
        }

        self.results.insert(key, result);
        info!(
            nullifier_hash = %hex::encode(key),
            token_out = %result.token_out,
            amount = result.amount,
            "swap result recorded"
        );
        Ok(())
    }

    /// Return the swap result and atomically mark the hash consumed
    ///
    /// The check and the set are one indivisible step under `&mut self`; two
    /// withdrawals for the same hash cannot both succeed.
    pub fn consume_and_get(&mut self, nullifier_hash: &Fr) -> Result<SwapResult, LedgerError> {
        let key = fr_to_bytes(nullifier_hash);

        if self.consumed.contains(&key) {
            return Err(LedgerError::AlreadyWithdrawn);
        }
        let result = *self.results.get(&key).ok_or(LedgerError::NoSwapResult)?;

        self.consumed.insert(key);
        info!(nullifier_hash = %hex::encode(key), "nullifier hash consumed");
        Ok(result)
    }

    /// True once the hash has been consumed by a withdrawal
    pub fn is_consumed(&self, nullifier_hash: &Fr) -> bool {
        self.consumed.contains(&fr_to_bytes(nullifier_hash))
    }

    /// The recorded swap result, if any
    pub fn swap_result(&self, nullifier_hash: &Fr) -> Option<SwapResult> {
        self.results.get(&fr_to_bytes(nullifier_hash)).copied()
    }

    /// Current lifecycle state of a nullifier hash
    pub fn status(&self, nullifier_hash: &Fr) -> NullifierStatus {
        let key = fr_to_bytes(nullifier_hash);
        if self.consumed.contains(&key) {
            NullifierStatus::Withdrawn
        } else if self.results.contains_key(&key) {
            NullifierStatus::Swapped
        } else {
            NullifierStatus::Unseen
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Address;

    fn usdc_result(amount: Amount) -> SwapResult {
        SwapResult {
            token_out: Asset::Fungible(Address([0xa0; 20])),
            amount,
        }
    }

    #[test]
    fn test_record_write_once() {
        let mut registry = NullifierRegistry::new();
        let nh = Fr::from(42u64);

        registry.record(&nh, usdc_result(700)).unwrap();

        // The failed second write must not change the stored result
        let err = registry.record(&nh, usdc_result(999)).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadySwapped));
        assert_eq!(registry.swap_result(&nh), Some(usdc_result(700)));
    }

    #[test]
    fn test_consume_requires_swap() {
        let mut registry = NullifierRegistry::new();
        let nh = Fr::from(1u64);

        assert!(matches!(
            registry.consume_and_get(&nh),
            Err(LedgerError::NoSwapResult)
        ));
    }

    #[test]
    fn test_consume_single_fire() {
        let mut registry = NullifierRegistry::new();
        let nh = Fr::from(7u64);

        registry.record(&nh, usdc_result(500)).unwrap();

        assert_eq!(registry.consume_and_get(&nh).unwrap(), usdc_result(500));
        assert!(matches!(
            registry.consume_and_get(&nh),
            Err(LedgerError::AlreadyWithdrawn)
        ));
    }

    #[test]
    fn test_status_transitions_forward() {
        let mut registry = NullifierRegistry::new();
        let nh = Fr::from(9u64);

        assert_eq!(registry.status(&nh), NullifierStatus::Unseen);
        assert!(!registry.is_consumed(&nh));

        registry.record(&nh, usdc_result(100)).unwrap();
        assert_eq!(registry.status(&nh), NullifierStatus::Swapped);

        registry.consume_and_get(&nh).unwrap();
        assert_eq!(registry.status(&nh), NullifierStatus::Withdrawn);
        assert!(registry.is_consumed(&nh));

        // Terminal: the result is still readable, but never claimable again
        assert_eq!(registry.swap_result(&nh), Some(usdc_result(100)));
    }

    #[test]
    fn test_hashes_independent() {
        let mut registry = NullifierRegistry::new();
        let a = Fr::from(1u64);
        let b = Fr::from(2u64);

        registry.record(&a, usdc_result(10)).unwrap();
        registry.record(&b, usdc_result(20)).unwrap();
        registry.consume_and_get(&a).unwrap();

        assert_eq!(registry.status(&a), NullifierStatus::Withdrawn);
        assert_eq!(registry.status(&b), NullifierStatus::Swapped);
    }
}
