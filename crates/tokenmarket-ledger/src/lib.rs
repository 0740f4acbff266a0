//! # tokenmarket-ledger
//!
//! The asset-custody side of the market. The contract never touches
//! balances directly; it describes fund movements as [`LedgerOp`]s and hands
//! them to a [`Ledger`], which applies a whole batch or none of it.
//!
//! ## Components
//!
//! 1. **Ledger**: the capability trait (`escrow`, `release`, `transfer_value`)
//! 2. **InMemoryLedger**: reference implementation with stage-and-commit batches
//! 3. **SupplyConservation**: per-asset mint/burn totals checked against balances
//!
//! ```text
//! seller ──escrow──▶ custody ──release──▶ buyer
//! buyer  ──escrow──▶ custody ──transfer_value──▶ seller, fee receiver
//! ```

pub mod in_memory;
pub mod ledger;
pub mod supply_conservation;

pub use in_memory::InMemoryLedger;
pub use ledger::{Ledger, LedgerOp};
pub use supply_conservation::SupplyConservation;
