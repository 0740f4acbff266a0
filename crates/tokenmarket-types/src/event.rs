//! Events emitted by successfully handled messages.
//!
//! Events form the append-only audit trail of the market. A message that
//! fails emits nothing; a no-op admin toggle emits nothing either.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, Fill, OrderId};

/// Something that happened inside the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MarketEvent {
    /// Answer to a `Deploy` message.
    Deployed { query_id: u64 },
    ContractPaused { by: Address },
    ContractUnpaused { by: Address },
    FeeRateUpdated { old_bps: u16, new_bps: u16 },
    AllowedStableUpdated { token: Address, allowed: bool },
    OrderCreated {
        order_id: OrderId,
        seller: Address,
        token: Address,
        #[serde(with = "crate::wire::int_string")]
        amount: Amount,
        #[serde(with = "crate::wire::int_string")]
        price: Amount,
        #[serde(with = "crate::wire::int_string")]
        min_buy_price: Amount,
    },
    OrderCancelled {
        order_id: OrderId,
        seller: Address,
        /// Remaining escrow returned to the seller.
        #[serde(with = "crate::wire::int_string")]
        refunded: Amount,
    },
    OrderFilled(Fill),
}

impl MarketEvent {
    /// The order this event concerns, if any.
    #[must_use]
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::OrderCreated { order_id, .. } | Self::OrderCancelled { order_id, .. } => {
                Some(*order_id)
            }
            Self::OrderFilled(fill) => Some(fill.order_id),
            _ => None,
        }
    }
}

impl std::fmt::Display for MarketEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deployed { query_id } => write!(f, "DEPLOYED query_id={query_id}"),
            Self::ContractPaused { by } => write!(f, "PAUSED by {by}"),
            Self::ContractUnpaused { by } => write!(f, "UNPAUSED by {by}"),
            Self::FeeRateUpdated { old_bps, new_bps } => {
                write!(f, "FEE_RATE {old_bps} -> {new_bps} bps")
            }
            Self::AllowedStableUpdated { token, allowed } => {
                write!(f, "ALLOWED_STABLE {token} = {allowed}")
            }
            Self::OrderCreated {
                order_id,
                amount,
                price,
                ..
            } => write!(f, "ORDER_CREATED {order_id}: {amount} @ {price}"),
            Self::OrderCancelled {
                order_id, refunded, ..
            } => write!(f, "ORDER_CANCELLED {order_id}: refunded {refunded}"),
            Self::OrderFilled(fill) => write!(f, "ORDER_FILLED {fill}"),
        }
    }
}
