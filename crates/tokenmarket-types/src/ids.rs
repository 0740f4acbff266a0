//! Identifiers used throughout TokenMarket.
//!
//! Accounts, tokens and the contract itself are all [`Address`]es in the
//! raw `workchain:hash` form. Orders are keyed by caller-chosen `u64` IDs.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{constants, MarketError};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Identity of an account, token, or contract.
///
/// Serialized in raw form: `"<workchain>:<64 hex chars>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Address {
    pub workchain: i32,
    pub hash: [u8; 32],
}

impl Address {
    #[must_use]
    pub fn new(workchain: i32, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Deterministic address on the default workchain derived from a label.
    ///
    /// Used for the contract's custody account when the deploy
    /// configuration does not pin one.
    #[must_use]
    pub fn derive(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::ADDRESS_DOMAIN);
        hasher.update(label.as_bytes());
        Self {
            workchain: constants::DEFAULT_WORKCHAIN,
            hash: hasher.finalize().into(),
        }
    }

    /// First four bytes of the hash, hex encoded. For log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.hash[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(self.hash))
    }
}

impl FromStr for Address {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wc, hash_hex) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| MarketError::invalid(format!("address {s:?} is not in raw form")))?;
        let workchain = wc
            .parse::<i32>()
            .map_err(|e| MarketError::invalid(format!("address workchain {wc:?}: {e}")))?;
        let bytes = hex::decode(hash_hex)
            .map_err(|e| MarketError::invalid(format!("address hash {hash_hex:?}: {e}")))?;
        let hash: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            MarketError::invalid(format!("address hash must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self { workchain, hash })
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    /// A distinct, stable address per `n`.
    pub fn test(n: u32) -> Self {
        Self::derive(&format!("test-account-{n}"))
    }
}

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Sell-order identifier, chosen by the seller at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl OrderId {
    /// The following identifier, or `None` at `u64::MAX`.
    #[must_use]
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// FillId
// ---------------------------------------------------------------------------

/// Identifier of a single buy against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FillId(pub [u8; 16]);

impl FillId {
    /// Deterministic `FillId` from the order ID and the market's fill sequence.
    ///
    /// Replaying the same message log yields the same fill IDs.
    #[must_use]
    pub fn deterministic(order_id: OrderId, fill_sequence: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::FILL_ID_DOMAIN);
        hasher.update(order_id.0.to_le_bytes());
        hasher.update(fill_sequence.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(bytes)
    }
}

impl fmt::Display for FillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fill:{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
