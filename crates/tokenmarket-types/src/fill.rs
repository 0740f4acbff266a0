//! Fill records produced by the settlement engine.
//!
//! A [`Fill`] is the immutable record of one buy against a sell order:
//! who paid what, and where the money went.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, FillId, OrderId};

/// One settled buy.
///
/// `seller_proceeds + fee == notional` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    pub id: FillId,
    pub order_id: OrderId,
    pub buyer: Address,
    pub seller: Address,
    /// Asset released from escrow to the buyer.
    pub token: Address,
    /// Allowlisted asset the buyer paid with.
    pub stable_token: Address,
    #[serde(with = "crate::wire::int_string")]
    pub amount: Amount,
    #[serde(with = "crate::wire::int_string")]
    pub price: Amount,
    /// `amount * price`, paid by the buyer.
    #[serde(with = "crate::wire::int_string")]
    pub notional: Amount,
    /// Paid to the fee receiver.
    #[serde(with = "crate::wire::int_string")]
    pub fee: Amount,
    /// Paid to the seller.
    #[serde(with = "crate::wire::int_string")]
    pub seller_proceeds: Amount,
    pub executed_at: DateTime<Utc>,
}

impl Fill {
    /// Whether the value split adds back up to the notional.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.seller_proceeds.checked_add(self.fee) == Some(self.notional)
    }
}

impl std::fmt::Display for Fill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fill[{}] order {} {} @ {} = {} (fee {})",
            self.id, self.order_id, self.amount, self.price, self.notional, self.fee,
        )
    }
}
