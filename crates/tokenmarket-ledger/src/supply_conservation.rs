//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced by the in-memory ledger:
//! ```text
//! ∀ asset: Σ balances (custody included) == Σ mints - Σ burns
//! ```
//!
//! Escrows, releases and value transfers only move balances between
//! accounts, so settlement can never change an asset's total supply.

use std::collections::{BTreeSet, HashMap};

use tokenmarket_types::{Address, Amount, MarketError, Result};

/// Tracks per-asset mint and burn totals.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    minted: HashMap<Address, Amount>,
    burned: HashMap<Address, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns `SupplyInvariantViolation` if the asset's total supply would
    /// exceed `Amount::MAX`.
    pub fn record_mint(&mut self, asset: Address, amount: Amount) -> Result<()> {
        let minted = self.minted.entry(asset).or_insert(0);
        *minted = minted.checked_add(amount).ok_or_else(|| {
            MarketError::SupplyInvariantViolation {
                reason: format!("Asset {asset}: minting {amount} overflows total supply"),
            }
        })?;
        Ok(())
    }

    pub fn record_burn(&mut self, asset: Address, amount: Amount) {
        *self.burned.entry(asset).or_insert(0) += amount;
    }

    /// Expected total supply for an asset: mints - burns.
    #[must_use]
    pub fn expected_supply(&self, asset: &Address) -> Amount {
        self.total_minted(asset)
            .saturating_sub(self.total_burned(asset))
    }

    /// Verify that the actual supply matches mints - burns.
    ///
    /// # Errors
    /// Returns [`MarketError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, asset: &Address, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(MarketError::SupplyInvariantViolation {
                reason: format!(
                    "Asset {asset}: actual supply {actual_supply} != expected {expected} \
                     (minted={}, burned={})",
                    self.total_minted(asset),
                    self.total_burned(asset),
                ),
            });
        }
        Ok(())
    }

    /// Every asset that was ever minted or burned.
    #[must_use]
    pub fn tracked_assets(&self) -> BTreeSet<Address> {
        self.minted.keys().chain(self.burned.keys()).copied().collect()
    }

    #[must_use]
    pub fn total_minted(&self, asset: &Address) -> Amount {
        self.minted.get(asset).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_burned(&self, asset: &Address) -> Amount {
        self.burned.get(asset).copied().unwrap_or(0)
    }
}
