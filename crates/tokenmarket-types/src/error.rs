//! Error types for the TokenMarket contract.
//!
//! All errors use the `TM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization / contract state errors
//! - 2xx: Argument errors
//! - 3xx: Order book errors
//! - 4xx: Settlement errors
//! - 5xx: Ledger errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Address, Amount, OrderId};

/// Central error enum for all TokenMarket operations.
///
/// Every variant is terminal for the message that produced it: the contract
/// state is left exactly as it was before the message was handled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    // =================================================================
    // Authorization / State Errors (1xx)
    // =================================================================
    /// The sender is not allowed to perform this action.
    #[error("TM_ERR_100: Unauthorized: {sender} may not {action}")]
    Unauthorized {
        sender: Address,
        action: &'static str,
    },

    /// A state-mutating message arrived while the contract is paused.
    #[error("TM_ERR_101: Contract is paused")]
    Paused,

    /// The message discriminator does not name any known message.
    #[error("TM_ERR_102: Unknown message type: {0}")]
    UnknownMessage(String),

    // =================================================================
    // Argument Errors (2xx)
    // =================================================================
    /// Out-of-range or inconsistent input.
    #[error("TM_ERR_200: Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // =================================================================
    // Order Book Errors (3xx)
    // =================================================================
    /// No order was ever created with this ID.
    #[error("TM_ERR_300: Order not found: {0}")]
    NotFound(OrderId),

    /// The order was cancelled or fully filled.
    #[error("TM_ERR_301: Order {0} is no longer active")]
    AlreadyInactive(OrderId),

    /// An order with this ID already exists (IDs are never reused).
    #[error("TM_ERR_302: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    // =================================================================
    // Settlement Errors (4xx)
    // =================================================================
    /// The payment token is not on the allowlist.
    #[error("TM_ERR_400: Settlement token not allowed: {0}")]
    TokenNotAllowed(Address),

    /// The buy would pay the seller less than their per-unit floor.
    #[error(
        "TM_ERR_401: Price floor violated: seller would receive {proceeds} for {amount} units, floor is {min_buy_price} per unit"
    )]
    PriceViolation {
        proceeds: Amount,
        amount: Amount,
        min_buy_price: Amount,
    },

    // =================================================================
    // Ledger Errors (5xx)
    // =================================================================
    /// An account does not hold enough of an asset.
    #[error("TM_ERR_500: Insufficient balance for {account} in {asset}: need {needed}, have {available}")]
    InsufficientBalance {
        account: Address,
        asset: Address,
        needed: Amount,
        available: Amount,
    },

    /// The contract's custody account does not hold enough of an asset.
    #[error("TM_ERR_501: Insufficient custody of {asset}: need {needed}, have {available}")]
    InsufficientCustody {
        asset: Address,
        needed: Amount,
        available: Amount,
    },

    /// Supply conservation invariant violated.
    #[error("TM_ERR_502: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("TM_ERR_900: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("TM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (config or script files).
    #[error("TM_ERR_902: I/O error: {0}")]
    Io(String),
}

impl MarketError {
    /// Shorthand for [`MarketError::InvalidArgument`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
