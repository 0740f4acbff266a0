//! The ledger capability consumed by the market contract.

use serde::{Deserialize, Serialize};
use tokenmarket_types::{Address, Amount, Result};

/// A single fund movement between an account and the contract's custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    /// Move `amount` of `asset` from `from` into custody.
    Escrow {
        from: Address,
        asset: Address,
        amount: Amount,
    },
    /// Return escrowed `asset` from custody to `to`.
    Release {
        to: Address,
        asset: Address,
        amount: Amount,
    },
    /// Pay value held in custody out to `to`.
    TransferValue {
        to: Address,
        asset: Address,
        amount: Amount,
    },
}

impl LedgerOp {
    #[must_use]
    pub fn asset(&self) -> Address {
        match self {
            Self::Escrow { asset, .. }
            | Self::Release { asset, .. }
            | Self::TransferValue { asset, .. } => *asset,
        }
    }

    #[must_use]
    pub fn amount(&self) -> Amount {
        match self {
            Self::Escrow { amount, .. }
            | Self::Release { amount, .. }
            | Self::TransferValue { amount, .. } => *amount,
        }
    }
}

/// Asset custody as seen by the contract.
///
/// Implementations must make [`Ledger::apply`] all-or-nothing: if any op in
/// the batch fails, no op in the batch has any effect.
pub trait Ledger {
    /// The account that holds escrowed assets.
    fn custody_account(&self) -> Address;

    /// Apply a batch of ops atomically.
    ///
    /// # Errors
    /// - `InsufficientBalance` if an escrow exceeds the sender's balance
    /// - `InsufficientCustody` if a release or transfer exceeds custody
    fn apply(&mut self, ops: &[LedgerOp]) -> Result<()>;

    /// Amount of `asset` currently held in custody.
    fn custody_balance(&self, asset: &Address) -> Amount;

    fn escrow(&mut self, from: Address, asset: Address, amount: Amount) -> Result<()> {
        self.apply(&[LedgerOp::Escrow {
            from,
            asset,
            amount,
        }])
    }

    fn release(&mut self, to: Address, asset: Address, amount: Amount) -> Result<()> {
        self.apply(&[LedgerOp::Release { to, asset, amount }])
    }

    fn transfer_value(&mut self, to: Address, asset: Address, amount: Amount) -> Result<()> {
        self.apply(&[LedgerOp::TransferValue { to, asset, amount }])
    }
}
