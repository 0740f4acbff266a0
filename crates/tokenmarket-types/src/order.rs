//! Sell-order types for the TokenMarket contract.
//!
//! A [`SellOrder`] is created with its full quantity escrowed in the
//! contract's custody account. Buys decrement `amount`; the order leaves the
//! `Active` state exactly when `amount` reaches zero or the seller cancels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, OrderId};

/// Lifecycle status of a sell order.
///
/// ```text
///   ┌────────┐  buy (amount → 0)  ┌────────┐
///   │ ACTIVE ├───────────────────▶│ FILLED │
///   └───┬────┘                    └────────┘
///       │ cancel
///       ▼
///   ┌───────────┐
///   │ CANCELLED │
///   └───────────┘
/// ```
///
/// Partial buys keep the order `Active`. Terminal states never transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Active,
    Filled,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A seller's standing offer to sell `amount` of `token` at `price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellOrder {
    pub id: OrderId,
    pub seller: Address,
    /// The asset being sold.
    pub token: Address,
    /// Quantity escrowed at creation.
    #[serde(with = "crate::wire::int_string")]
    pub initial_amount: Amount,
    /// Quantity still available to buy.
    #[serde(with = "crate::wire::int_string")]
    pub amount: Amount,
    /// Quantity bought so far.
    #[serde(with = "crate::wire::int_string")]
    pub filled_amount: Amount,
    /// Quoted unit price in settlement-token units.
    #[serde(with = "crate::wire::int_string")]
    pub price: Amount,
    /// Per-unit floor on what the seller must receive after fees.
    #[serde(with = "crate::wire::int_string")]
    pub min_buy_price: Amount,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SellOrder {
    /// A freshly created, fully escrowed order.
    #[must_use]
    pub fn new(
        id: OrderId,
        seller: Address,
        token: Address,
        amount: Amount,
        price: Amount,
        min_buy_price: Amount,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            seller,
            token,
            initial_amount: amount,
            amount,
            filled_amount: 0,
            price,
            min_buy_price,
            status: OrderStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Active
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Record a buy of `qty` units. The caller has already checked
    /// `0 < qty <= amount`.
    pub fn apply_fill(&mut self, qty: Amount) {
        debug_assert!(self.is_active() && qty > 0 && qty <= self.amount);
        self.amount -= qty;
        self.filled_amount += qty;
        if self.amount == 0 {
            self.status = OrderStatus::Filled;
        }
        self.updated_at = Utc::now();
    }

    /// Close the order and return the quantity that must be refunded.
    pub fn cancel(&mut self) -> Amount {
        debug_assert!(self.is_active());
        let refund = self.amount;
        self.amount = 0;
        self.status = OrderStatus::Cancelled;
        self.updated_at = Utc::now();
        refund
    }
}
