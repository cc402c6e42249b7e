//! Ledger event log
//!
//! Every protocol transition appends one event. The log is the only
//! practical way to map a commitment back to its leaf index after the fact,
//! so it is retained and queryable for the lifetime of any outstanding
//! deposit.

use serde::{Deserialize, Serialize};

use crate::asset::{Address, Amount, Asset};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Deposit {
        /// Commitment as 32 big-endian bytes
        commitment: [u8; 32],
        leaf_index: u32,
        swap_config_id: u64,
        slot: u64,
    },
    SwapResultRecorded {
        /// Nullifier hash as 32 big-endian bytes
        nullifier_hash: [u8; 32],
        token_out: Asset,
        amount_out: Amount,
        slot: u64,
    },
    Withdrawal {
        nullifier_hash: [u8; 32],
        recipient: Address,
        token_out: Asset,
        amount: Amount,
        slot: u64,
    },
}

/// Append-only, in-order event log
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<LedgerEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    /// All events in append order
    pub fn all(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Deposit events in insertion order
    pub fn deposits(&self) -> impl Iterator<Item = (&[u8; 32], u32, u64)> {
        self.events.iter().filter_map(|event| match event {
            LedgerEvent::Deposit {
                commitment,
                leaf_index,
                swap_config_id,
                ..
            } => Some((commitment, *leaf_index, *swap_config_id)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
