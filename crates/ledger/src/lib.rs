//! Umbra - Ledger State Machine
//!
//! Ledger-side half of the commit → swap → withdraw protocol: asset custody,
//! swap configurations, the aggregator binding, the nullifier registry, and
//! withdrawal orchestration.
//!
//! The execution model is the host ledger's: mutations are serialized
//! (`&mut self`), run to completion or full failure, and cross-nullifier
//! operations are independent. The registries enforce the one genuine
//! concurrency invariant: atomic check-then-set on swap recording and
//! nullifier consumption.

pub mod asset;
pub mod error;
pub mod events;
pub mod pool;
pub mod registry;
pub mod swap;

// Re-export common types
pub use asset::{Address, Amount, Asset, InMemoryVault, TransferError, Vault};
pub use error::LedgerError;
pub use events::{EventLog, LedgerEvent};
pub use pool::{Pool, PoolParams};
pub use registry::{NullifierRegistry, NullifierStatus, SwapResult};
pub use swap::{
    authorization_digest, AggregatorError, ExecutionPayload, FixedRateAggregator, SwapAggregator,
    SwapConfig, SwapConfigRegistry,
};
