//! Asset model and vault custody
//!
//! Tokens are a single tagged variant instead of address-equality branching
//! scattered through call sites: `Native` for the chain's base asset,
//! `Fungible(address)` for everything else, and one `transfer` capability
//! over both.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use umbra_core::fr_from_bytes;

/// Amount in an asset's smallest unit
pub type Amount = u128;

/// 20-byte account address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

#[derive(Error, Debug)]
pub enum AddressError {
    #[error("invalid address {0:?}: expected 20 hex bytes")]
    InvalidAddress(String),
}

impl Address {
    /// The zero address
    pub const ZERO: Address = Address([0u8; 20]);

    /// Parse from hex, with or without a `0x` prefix
    pub fn from_hex(input: &str) -> Result<Self, AddressError> {
        let stripped = input.strip_prefix("0x").unwrap_or(input);
        let bytes =
            hex::decode(stripped).map_err(|_| AddressError::InvalidAddress(input.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidAddress(input.to_string()))?;
        Ok(Self(bytes))
    }

    /// The address as a proof public-signal field element
    pub fn as_field(&self) -> Fr {
        let mut padded = [0u8; 32];
        padded[12..].copy_from_slice(&self.0);
        fr_from_bytes(&padded)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// An asset the pool can hold and transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// The chain's base asset
    Native,
    /// A fungible token identified by its contract address
    Fungible(Address),
}

impl Asset {
    /// Stable byte encoding used in digests and payload hashing
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Asset::Native => vec![0u8],
            Asset::Fungible(address) => {
                let mut bytes = Vec::with_capacity(21);
                bytes.push(1u8);
                bytes.extend_from_slice(&address.0);
                bytes
            }
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Fungible(address) => write!(f, "{}", address),
        }
    }
}

/// Asset transfer failures
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("insufficient {asset} funds: need {needed}, have {available}")]
    InsufficientFunds {
        asset: Asset,
        needed: Amount,
        available: Amount,
    },
    /// The underlying transfer reverted; the cause is preserved so callers
    /// can distinguish token quirks from pool insolvency
    #[error("transfer rejected")]
    Rejected(#[source] anyhow::Error),
}

/// Custody of pooled funds
///
/// One capability covers both asset variants; implementations decide how
/// native and fungible transfers differ.
pub trait Vault {
    /// Pull a deposit from an external account into the pool
    fn collect(&mut self, asset: Asset, from: Address, amount: Amount)
        -> Result<(), TransferError>;

    /// Pay out pooled funds to an external account
    fn transfer(&mut self, asset: Asset, to: Address, amount: Amount)
        -> Result<(), TransferError>;

    /// Credit the pool with funds received from an external party
    fn credit_pool(&mut self, asset: Asset, amount: Amount);

    /// Pooled balance of an asset
    fn pool_balance(&self, asset: Asset) -> Amount;
}

/// In-memory vault with explicit account bookkeeping
#[derive(Debug, Default)]
pub struct InMemoryVault {
    pool: HashMap<Asset, Amount>,
    accounts: HashMap<(Address, Asset), Amount>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an external account (test setup)
    pub fn credit_account(&mut self, account: Address, asset: Asset, amount: Amount) {
        *self.accounts.entry((account, asset)).or_default() += amount;
    }

    /// Balance of an external account
    pub fn account_balance(&self, account: Address, asset: Asset) -> Amount {
        self.accounts.get(&(account, asset)).copied().unwrap_or(0)
    }
}

impl Vault for InMemoryVault {
    fn collect(
        &mut self,
        asset: Asset,
        from: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let balance = self.accounts.entry((from, asset)).or_default();
        if *balance < amount {
            return Err(TransferError::InsufficientFunds {
                asset,
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        *self.pool.entry(asset).or_default() += amount;
        Ok(())
    }

    fn transfer(&mut self, asset: Asset, to: Address, amount: Amount) -> Result<(), TransferError> {
        let balance = self.pool.entry(asset).or_default();
        if *balance < amount {
            return Err(TransferError::InsufficientFunds {
                asset,
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        *self.accounts.entry((to, asset)).or_default() += amount;
        Ok(())
    }

    fn credit_pool(&mut self, asset: Asset, amount: Amount) {
        *self.pool.entry(asset).or_default() += amount;
    }

    fn pool_balance(&self, asset: Asset) -> Amount {
        self.pool.get(&asset).copied().unwrap_or(0)
    }
}
