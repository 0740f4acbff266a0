//! The sell-order book.
//!
//! Orders live in a `BTreeMap<OrderId, SellOrder>` and are never removed:
//! cancelled and filled orders stay readable, and their IDs stay taken.
//!
//! IDs are chosen by the seller. `next_order_id` is kept strictly above
//! every ID ever used, so it is always a free ID to suggest to clients.

use std::collections::BTreeMap;

use tokenmarket_types::{Address, Amount, MarketError, OrderId, Result, SellOrder};

/// First value reported by `next_order_id` on an empty book.
const FIRST_ORDER_ID: OrderId = OrderId(1);

/// A create request that passed validation and awaits escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub seller: Address,
    pub token: Address,
    pub amount: Amount,
    pub price: Amount,
    pub min_buy_price: Amount,
}

/// All sell orders ever created on this market.
#[derive(Debug)]
pub struct OrderBook {
    orders: BTreeMap<OrderId, SellOrder>,
    next_order_id: OrderId,
}

impl OrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: BTreeMap::new(),
            next_order_id: FIRST_ORDER_ID,
        }
    }

    // =================================================================
    // Creation
    // =================================================================

    /// Validate a create request without touching the book.
    ///
    /// # Errors
    /// - `InvalidArgument` for a zero amount or price, `min_buy_price > price`,
    ///   an ID with no successor, or when `next_order_id` can no longer advance
    /// - `DuplicateOrder` if the ID was ever used
    pub fn check_create(
        &self,
        seller: Address,
        id: OrderId,
        price: Amount,
        min_buy_price: Amount,
        token: Address,
        amount: Amount,
    ) -> Result<NewOrder> {
        if amount == 0 {
            return Err(MarketError::invalid("order amount must be positive"));
        }
        if price == 0 {
            return Err(MarketError::invalid("order price must be positive"));
        }
        if min_buy_price > price {
            return Err(MarketError::invalid(format!(
                "min buy price {min_buy_price} exceeds price {price}"
            )));
        }
        if self.orders.contains_key(&id) {
            return Err(MarketError::DuplicateOrder(id));
        }
        if id.checked_next().is_none() {
            return Err(MarketError::invalid(format!("order id {id} is reserved")));
        }
        if self.next_order_id.checked_next().is_none() {
            return Err(MarketError::invalid("order id space exhausted"));
        }
        Ok(NewOrder {
            id,
            seller,
            token,
            amount,
            price,
            min_buy_price,
        })
    }

    /// Insert an order whose escrow has been taken.
    pub fn insert(&mut self, new: NewOrder) -> &SellOrder {
        debug_assert!(!self.orders.contains_key(&new.id));
        // Both successors exist: `check_create` rejects the cases where they don't.
        let after_id = new.id.checked_next().unwrap_or(new.id);
        let bumped = self.next_order_id.checked_next().unwrap_or(self.next_order_id);
        self.next_order_id = bumped.max(after_id);

        tracing::debug!(
            order_id = %new.id,
            seller = %new.seller.short(),
            amount = %new.amount,
            next_order_id = %self.next_order_id,
            "order inserted"
        );

        self.orders.entry(new.id).or_insert_with(|| {
            SellOrder::new(
                new.id,
                new.seller,
                new.token,
                new.amount,
                new.price,
                new.min_buy_price,
            )
        })
    }

    // =================================================================
    // Cancellation
    // =================================================================

    /// Validate a cancel request and return the order it targets.
    ///
    /// # Errors
    /// - `NotFound` for an unknown ID
    /// - `Unauthorized` unless `sender` is the seller
    /// - `AlreadyInactive` if the order is filled or cancelled
    pub fn check_cancel(&self, sender: Address, id: OrderId) -> Result<&SellOrder> {
        let order = self.orders.get(&id).ok_or(MarketError::NotFound(id))?;
        if order.seller != sender {
            return Err(MarketError::Unauthorized {
                sender,
                action: "cancel another seller's order",
            });
        }
        if !order.is_active() {
            return Err(MarketError::AlreadyInactive(id));
        }
        Ok(order)
    }

    /// Close an active order. Returns the refunded remainder.
    pub fn cancel(&mut self, id: OrderId) -> Result<Amount> {
        let order = self.active_order_mut(id)?;
        Ok(order.cancel())
    }

    // =================================================================
    // Fills
    // =================================================================

    /// The order with this ID, if it is still active.
    ///
    /// # Errors
    /// `NotFound` or `AlreadyInactive`.
    pub fn active_order(&self, id: OrderId) -> Result<&SellOrder> {
        let order = self.orders.get(&id).ok_or(MarketError::NotFound(id))?;
        if !order.is_active() {
            return Err(MarketError::AlreadyInactive(id));
        }
        Ok(order)
    }

    /// Decrement an active order by `qty`, deactivating it at zero.
    ///
    /// # Errors
    /// `NotFound`, `AlreadyInactive`, or `InvalidArgument` for an overfill.
    pub fn record_fill(&mut self, id: OrderId, qty: Amount) -> Result<&SellOrder> {
        let order = self.active_order_mut(id)?;
        if qty == 0 || qty > order.amount {
            return Err(MarketError::invalid(format!(
                "fill of {qty} against remaining {}",
                order.amount
            )));
        }
        order.apply_fill(qty);
        Ok(&*order)
    }

    fn active_order_mut(&mut self, id: OrderId) -> Result<&mut SellOrder> {
        let order = self.orders.get_mut(&id).ok_or(MarketError::NotFound(id))?;
        if !order.is_active() {
            return Err(MarketError::AlreadyInactive(id));
        }
        Ok(order)
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<&SellOrder> {
        self.orders.get(&id)
    }

    /// An ID guaranteed not to be in use.
    #[must_use]
    pub fn next_order_id(&self) -> OrderId {
        self.next_order_id
    }

    /// Number of orders ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.orders.values().filter(|o| o.is_active()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SellOrder> {
        self.orders.values()
    }

    pub fn orders_by_seller(&self, seller: Address) -> impl Iterator<Item = &SellOrder> {
        self.orders.values().filter(move |o| o.seller == seller)
    }

    /// Remaining quantity of every active order, summed per token.
    #[must_use]
    pub fn escrowed_by_token(&self) -> BTreeMap<Address, Amount> {
        let mut totals = BTreeMap::new();
        for order in self.orders.values().filter(|o| o.is_active()) {
            *totals.entry(order.token).or_insert(0) += order.amount;
        }
        totals
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
