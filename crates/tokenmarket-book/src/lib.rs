//! # tokenmarket-book
//!
//! The bookkeeping half of the market contract. Nothing in this crate moves
//! funds; it only validates and records.
//!
//! - **AdminControl**: admin identity, pause flag, fee rate, signer identity
//! - **AllowlistRegistry**: settlement tokens accepted as payment
//! - **OrderBook**: sell orders keyed by caller-chosen IDs
//!
//! Mutations are split into a fallible check and an infallible commit so the
//! caller can run ledger effects in between and keep every message atomic.

pub mod admin;
pub mod allowlist;
pub mod order_book;

pub use admin::AdminControl;
pub use allowlist::AllowlistRegistry;
pub use order_book::{NewOrder, OrderBook};
