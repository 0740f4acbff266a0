//! # tokenmarket-types
//!
//! Shared types, errors, and configuration for the **TokenMarket** contract.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`OrderId`], [`FillId`]
//! - **Order model**: [`SellOrder`], [`OrderStatus`]
//! - **Fill model**: [`Fill`]
//! - **Messages**: [`Message`], [`Query`], [`QueryResponse`]
//! - **Events**: [`MarketEvent`]
//! - **Configuration**: [`MarketConfig`]
//! - **Errors**: [`MarketError`] with `TM_ERR_` prefix codes
//! - **Constants**: fee limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod fill;
pub mod ids;
pub mod message;
pub mod order;
pub mod wire;

pub use config::*;
pub use error::*;
pub use event::*;
pub use fill::*;
pub use ids::*;
pub use message::*;
pub use order::*;

/// On-chain quantity in the smallest unit of an asset (nano-units).
pub type Amount = u128;

// Constants are accessed via `tokenmarket_types::constants::FOO`
// (not re-exported to avoid name collisions).
