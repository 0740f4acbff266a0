//! # tokenmarket-settlement
//!
//! **Settlement engine** and the **market contract** dispatcher.
//!
//! ## Architecture
//!
//! [`Market`] owns the whole contract state and the [`Ledger`]. Every inbound
//! [`Message`] is matched exhaustively and handled to completion before the
//! next one:
//! 1. Authorization and pause checks ([`AdminControl`])
//! 2. Argument and order-state validation ([`OrderBook`], [`AllowlistRegistry`])
//! 3. One atomic ledger batch
//! 4. State commit and events
//!
//! A message that fails at any step leaves state and balances untouched.
//!
//! ## Buy settlement
//!
//! ```text
//! buyer ──notional (stable)──▶ custody ──notional - fee──▶ seller
//!                                       └──fee──────────▶ fee receiver
//! custody ──amount (token)──▶ buyer
//! ```
//!
//! [`Ledger`]: tokenmarket_ledger::Ledger
//! [`Message`]: tokenmarket_types::Message
//! [`AdminControl`]: tokenmarket_book::AdminControl
//! [`OrderBook`]: tokenmarket_book::OrderBook
//! [`AllowlistRegistry`]: tokenmarket_book::AllowlistRegistry

pub mod engine;
pub mod fee;
pub mod market;

pub use engine::{BuyRequest, SettlementEngine, SettlementPlan};
pub use fee::{FeeBreakdown, mul_bps_floor};
pub use market::{Market, MarketStatus};
