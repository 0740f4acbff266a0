//! The market contract: one owned state, one dispatcher.
//!
//! [`Market::handle`] is the only way state changes. Each handler validates
//! everything first, then submits its fund movements as one ledger batch,
//! then commits book and admin state. Nothing after the ledger call can fail.

use rust_decimal::Decimal;
use serde::Serialize;
use tokenmarket_book::{AdminControl, AllowlistRegistry, OrderBook};
use tokenmarket_ledger::Ledger;
use tokenmarket_types::{
    Address, Amount, MarketConfig, MarketError, MarketEvent, Message, OrderId, Query,
    QueryResponse, Result, SellOrder,
};
use tracing::{debug, info, warn};

use crate::engine::{BuyRequest, SettlementEngine};

/// Snapshot of contract state for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketStatus {
    pub contract: Address,
    pub admin: Address,
    pub backend_signer: Address,
    pub fee_receiver: Address,
    pub fee_rate_bps: u16,
    pub fee_rate_percent: Decimal,
    pub paused: bool,
    pub next_order_id: OrderId,
    pub total_orders: usize,
    pub active_orders: usize,
    pub allowed_stables: Vec<Address>,
    pub fills_settled: u64,
}

/// A deployed market contract bound to a ledger.
#[derive(Debug)]
pub struct Market<L: Ledger> {
    address: Address,
    admin: AdminControl,
    allowlist: AllowlistRegistry,
    book: OrderBook,
    engine: SettlementEngine,
    ledger: L,
}

impl<L: Ledger> Market<L> {
    /// Deploy a market from `config` on top of `ledger`.
    ///
    /// # Errors
    /// Returns `Configuration` if the config is invalid or the ledger's
    /// custody account is not the configured contract address.
    pub fn deploy(config: &MarketConfig, ledger: L) -> Result<Self> {
        config.validate()?;
        let address = config.contract_address();
        if ledger.custody_account() != address {
            return Err(MarketError::Configuration(format!(
                "ledger custody {} does not match contract address {address}",
                ledger.custody_account()
            )));
        }

        let admin = AdminControl::from_config(config)
            .map_err(|e| MarketError::Configuration(e.to_string()))?;
        let allowlist: AllowlistRegistry = config.stable_token.into_iter().collect();

        info!(
            contract = %address,
            admin = %config.admin,
            fee_rate_bps = config.fee_rate_bps,
            allowed_stables = allowlist.len(),
            "market deployed"
        );

        Ok(Self {
            address,
            admin,
            allowlist,
            book: OrderBook::new(),
            engine: SettlementEngine::new(),
            ledger,
        })
    }

    // =================================================================
    // Dispatch
    // =================================================================

    /// Handle one message from `sender` to completion.
    ///
    /// On error nothing has changed: no state, no balances, no events.
    pub fn handle(&mut self, sender: Address, message: Message) -> Result<Vec<MarketEvent>> {
        let kind = message.type_name();
        let result = self.dispatch(sender, message);
        if let Err(err) = &result {
            warn!(msg_type = kind, sender = %sender.short(), error = %err, "message rejected");
        }
        result
    }

    /// Decode a `$$type`-tagged JSON body and handle it.
    ///
    /// # Errors
    /// `UnknownMessage` for an unrecognized tag, `Serialization` for a
    /// malformed body, and any error of [`Self::handle`].
    pub fn handle_json(&mut self, sender: Address, json: &str) -> Result<Vec<MarketEvent>> {
        let message = Message::from_json(json).inspect_err(|err| {
            warn!(sender = %sender.short(), error = %err, "undecodable message");
        })?;
        self.handle(sender, message)
    }

    fn dispatch(&mut self, sender: Address, message: Message) -> Result<Vec<MarketEvent>> {
        match message {
            Message::Deploy { query_id } => {
                debug!(query_id, "deploy acknowledged");
                Ok(vec![MarketEvent::Deployed { query_id }])
            }
            Message::PauseContract => self.pause(sender),
            Message::UnpauseContract => self.unpause(sender),
            Message::UpdateFeeRate { rate } => self.update_fee_rate(sender, rate),
            Message::UpdateAllowedStable { token, allowed } => {
                self.update_allowed_stable(sender, token, allowed)
            }
            Message::CreateOrder {
                id,
                price,
                min_buy_price,
                token,
                amount,
            } => self.create_order(sender, OrderId(id), price, min_buy_price, token, amount),
            Message::CancelOrder { id } => self.cancel_order(sender, OrderId(id)),
            Message::BuyOrder {
                id,
                amount,
                stable_token,
            } => self.buy_order(BuyRequest {
                buyer: sender,
                order_id: OrderId(id),
                amount,
                stable_token,
            }),
        }
    }

    // =================================================================
    // Admin handlers
    // =================================================================

    fn pause(&mut self, sender: Address) -> Result<Vec<MarketEvent>> {
        if !self.admin.pause(sender)? {
            debug!("pause requested while already paused");
            return Ok(Vec::new());
        }
        info!(by = %sender.short(), "contract paused");
        Ok(vec![MarketEvent::ContractPaused { by: sender }])
    }

    fn unpause(&mut self, sender: Address) -> Result<Vec<MarketEvent>> {
        if !self.admin.unpause(sender)? {
            debug!("unpause requested while not paused");
            return Ok(Vec::new());
        }
        info!(by = %sender.short(), "contract unpaused");
        Ok(vec![MarketEvent::ContractUnpaused { by: sender }])
    }

    fn update_fee_rate(&mut self, sender: Address, rate: u128) -> Result<Vec<MarketEvent>> {
        let old_bps = self.admin.update_fee_rate(sender, rate)?;
        let new_bps = self.admin.fee_rate_bps();
        info!(old_bps, new_bps, "fee rate updated");
        Ok(vec![MarketEvent::FeeRateUpdated { old_bps, new_bps }])
    }

    fn update_allowed_stable(
        &mut self,
        sender: Address,
        token: Address,
        allowed: bool,
    ) -> Result<Vec<MarketEvent>> {
        self.admin.ensure_admin(sender, "update the stable allowlist")?;
        self.admin.ensure_not_paused()?;
        if !self.allowlist.set_allowed(token, allowed) {
            debug!(token = %token, allowed, "allowlist already up to date");
            return Ok(Vec::new());
        }
        info!(token = %token, allowed, "allowed stable updated");
        Ok(vec![MarketEvent::AllowedStableUpdated { token, allowed }])
    }

    // =================================================================
    // Order handlers
    // =================================================================

    fn create_order(
        &mut self,
        seller: Address,
        id: OrderId,
        price: Amount,
        min_buy_price: Amount,
        token: Address,
        amount: Amount,
    ) -> Result<Vec<MarketEvent>> {
        self.admin.ensure_not_paused()?;
        let new = self
            .book
            .check_create(seller, id, price, min_buy_price, token, amount)?;
        self.ledger.escrow(seller, token, amount)?;
        self.book.insert(new);

        info!(
            order_id = %id,
            seller = %seller.short(),
            amount = %amount,
            price = %price,
            min_buy_price = %min_buy_price,
            "order created"
        );
        Ok(vec![MarketEvent::OrderCreated {
            order_id: id,
            seller,
            token,
            amount,
            price,
            min_buy_price,
        }])
    }

    fn cancel_order(&mut self, sender: Address, id: OrderId) -> Result<Vec<MarketEvent>> {
        self.admin.ensure_not_paused()?;
        let order = self.book.check_cancel(sender, id)?;
        let (token, remaining) = (order.token, order.amount);
        self.ledger.release(sender, token, remaining)?;
        let refunded = self.book.cancel(id)?;

        info!(order_id = %id, refunded = %refunded, "order cancelled");
        Ok(vec![MarketEvent::OrderCancelled {
            order_id: id,
            seller: sender,
            refunded,
        }])
    }

    fn buy_order(&mut self, request: BuyRequest) -> Result<Vec<MarketEvent>> {
        let fill = self.engine.buy(
            &self.admin,
            &self.allowlist,
            &mut self.book,
            &mut self.ledger,
            request,
        )?;
        Ok(vec![MarketEvent::OrderFilled(fill)])
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Answer a getter. Never changes state.
    #[must_use]
    pub fn query(&self, query: &Query) -> QueryResponse {
        match query {
            Query::GetAdminWallet => QueryResponse::AdminWallet(self.admin.admin()),
            Query::GetBackendSigner => QueryResponse::BackendSigner(self.admin.backend_signer()),
            Query::GetFeeReceiver => QueryResponse::FeeReceiver(self.admin.fee_receiver()),
            Query::GetFeeRate => QueryResponse::FeeRate(self.admin.fee_rate_bps()),
            Query::GetIsPaused => QueryResponse::IsPaused(self.admin.is_paused()),
            Query::GetIsAllowedStable { token } => {
                QueryResponse::IsAllowedStable(self.allowlist.is_allowed(token))
            }
            Query::GetNextOrderId => QueryResponse::NextOrderId(self.book.next_order_id()),
            Query::GetSellOrder { id } => {
                QueryResponse::SellOrder(self.book.get(OrderId(*id)).cloned())
            }
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn admin(&self) -> &AdminControl {
        &self.admin
    }

    #[must_use]
    pub fn allowlist(&self) -> &AllowlistRegistry {
        &self.allowlist
    }

    #[must_use]
    pub fn order_book(&self) -> &OrderBook {
        &self.book
    }

    #[must_use]
    pub fn sell_order(&self, id: OrderId) -> Option<&SellOrder> {
        self.book.get(id)
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for funding accounts outside the contract.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Check that custody covers the remaining amount of every active order.
    ///
    /// # Errors
    /// Returns `InsufficientCustody` for the first token that is short.
    pub fn verify_escrow(&self) -> Result<()> {
        for (token, escrowed) in self.book.escrowed_by_token() {
            let available = self.ledger.custody_balance(&token);
            if available < escrowed {
                return Err(MarketError::InsufficientCustody {
                    asset: token,
                    needed: escrowed,
                    available,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn status(&self) -> MarketStatus {
        MarketStatus {
            contract: self.address,
            admin: self.admin.admin(),
            backend_signer: self.admin.backend_signer(),
            fee_receiver: self.admin.fee_receiver(),
            fee_rate_bps: self.admin.fee_rate_bps(),
            fee_rate_percent: self.admin.fee_rate_percent(),
            paused: self.admin.is_paused(),
            next_order_id: self.book.next_order_id(),
            total_orders: self.book.len(),
            active_orders: self.book.active_count(),
            allowed_stables: self.allowlist.iter().copied().collect(),
            fills_settled: self.engine.fills_settled(),
        }
    }
}
