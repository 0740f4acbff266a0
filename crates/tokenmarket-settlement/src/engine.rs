//! Buy settlement.
//!
//! A buy is planned against the live contract state, then committed:
//! 1. Check pause flag, order state, quantity, allowlist
//! 2. Split the notional into fee and seller proceeds
//! 3. Enforce the seller's per-unit floor on the proceeds
//! 4. Apply one ledger batch (collect, pay seller, pay fee, release asset)
//! 5. Decrement the order and emit a [`Fill`]
//!
//! Steps 1-3 never mutate anything. Step 4 is all-or-nothing. Only
//! [`SettlementEngine::buy`] commits, and it plans and commits under one
//! exclusive borrow of the book, so step 5 always sees the order step 1
//! checked. A [`SettlementPlan`] on its own is a quote and cannot be applied.

use chrono::Utc;
use tokenmarket_book::{AdminControl, AllowlistRegistry, OrderBook};
use tokenmarket_ledger::{Ledger, LedgerOp};
use tokenmarket_types::{Address, Amount, Fill, FillId, MarketError, OrderId, Result};

use crate::fee::FeeBreakdown;

/// A buyer's request against one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyRequest {
    pub buyer: Address,
    pub order_id: OrderId,
    pub amount: Amount,
    pub stable_token: Address,
}

/// The effects a buy would have against the state it was planned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub request: BuyRequest,
    pub seller: Address,
    pub token: Address,
    pub price: Amount,
    pub split: FeeBreakdown,
    pub ops: Vec<LedgerOp>,
}

/// Plans and settles buys. Holds the fill sequence used for fill IDs.
#[derive(Debug, Default)]
pub struct SettlementEngine {
    fill_sequence: u64,
}

impl SettlementEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a buy and describe its effects without changing anything.
    ///
    /// # Errors
    /// - `Paused` while paused
    /// - `NotFound` / `AlreadyInactive` for a missing or closed order
    /// - `InvalidArgument` for a zero amount, an overfill, or an overflowing
    ///   notional
    /// - `TokenNotAllowed` if the payment token is not allowlisted
    /// - `PriceViolation` if the seller would net less than `min_buy_price`
    ///   per unit
    pub fn plan_buy(
        &self,
        admin: &AdminControl,
        allowlist: &AllowlistRegistry,
        book: &OrderBook,
        request: BuyRequest,
    ) -> Result<SettlementPlan> {
        admin.ensure_not_paused()?;
        let order = book.active_order(request.order_id)?;

        if request.amount == 0 {
            return Err(MarketError::invalid("buy amount must be positive"));
        }
        if request.amount > order.amount {
            return Err(MarketError::invalid(format!(
                "buy of {} exceeds remaining {} on order {}",
                request.amount, order.amount, order.id
            )));
        }
        if !allowlist.is_allowed(&request.stable_token) {
            return Err(MarketError::TokenNotAllowed(request.stable_token));
        }

        let split = FeeBreakdown::compute(request.amount, order.price, admin.fee_rate_bps())?;
        if !split.meets_floor(request.amount, order.min_buy_price) {
            return Err(MarketError::PriceViolation {
                proceeds: split.seller_proceeds,
                amount: request.amount,
                min_buy_price: order.min_buy_price,
            });
        }

        let mut ops = Vec::with_capacity(4);
        ops.push(LedgerOp::Escrow {
            from: request.buyer,
            asset: request.stable_token,
            amount: split.notional,
        });
        ops.push(LedgerOp::TransferValue {
            to: order.seller,
            asset: request.stable_token,
            amount: split.seller_proceeds,
        });
        if split.fee > 0 {
            ops.push(LedgerOp::TransferValue {
                to: admin.fee_receiver(),
                asset: request.stable_token,
                amount: split.fee,
            });
        }
        ops.push(LedgerOp::Release {
            to: request.buyer,
            asset: order.token,
            amount: request.amount,
        });

        Ok(SettlementPlan {
            request,
            seller: order.seller,
            token: order.token,
            price: order.price,
            split,
            ops,
        })
    }

    /// Validate and settle a buy.
    ///
    /// # Errors
    /// Any error of [`Self::plan_buy`], plus ledger failures. On error the
    /// book, the ledger and the fill sequence are unchanged.
    pub fn buy<L: Ledger>(
        &mut self,
        admin: &AdminControl,
        allowlist: &AllowlistRegistry,
        book: &mut OrderBook,
        ledger: &mut L,
        request: BuyRequest,
    ) -> Result<Fill> {
        let plan = self.plan_buy(admin, allowlist, book, request)?;
        self.commit(plan, book, ledger)
    }

    /// Apply a plan made against `book` in the same exclusive borrow.
    fn commit<L: Ledger>(
        &mut self,
        plan: SettlementPlan,
        book: &mut OrderBook,
        ledger: &mut L,
    ) -> Result<Fill> {
        let SettlementPlan {
            request,
            seller,
            token,
            price,
            split,
            ops,
        } = plan;

        ledger.apply(&ops)?;
        let order = book.record_fill(request.order_id, request.amount)?;

        let fill = Fill {
            id: FillId::deterministic(request.order_id, self.fill_sequence),
            order_id: request.order_id,
            buyer: request.buyer,
            seller,
            token,
            stable_token: request.stable_token,
            amount: request.amount,
            price,
            notional: split.notional,
            fee: split.fee,
            seller_proceeds: split.seller_proceeds,
            executed_at: Utc::now(),
        };
        self.fill_sequence += 1;

        tracing::info!(
            fill_id = %fill.id,
            order_id = %order.id,
            amount = %fill.amount,
            notional = %fill.notional,
            fee = %fill.fee,
            remaining = %order.amount,
            status = %order.status,
            "buy settled"
        );

        Ok(fill)
    }

    /// Number of buys settled so far.
    #[must_use]
    pub fn fills_settled(&self) -> u64 {
        self.fill_sequence
    }
}
