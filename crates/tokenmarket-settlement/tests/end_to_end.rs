//! End-to-end scenarios: messages in, events and balances out.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tokenmarket_ledger::{InMemoryLedger, Ledger, LedgerOp};
use tokenmarket_settlement::Market;
use tokenmarket_types::{
    Address, Amount, MarketConfig, MarketError, MarketEvent, Message, OrderId, OrderStatus,
    Query, QueryResponse, Result,
};

// =====================================================================
// Fixtures
// =====================================================================

fn admin() -> Address {
    Address::test(1)
}

fn fee_receiver() -> Address {
    Address::test(3)
}

fn seller() -> Address {
    Address::test(10)
}

fn buyer() -> Address {
    Address::test(20)
}

fn token() -> Address {
    Address::test(100)
}

fn usdt() -> Address {
    Address::test(200)
}

fn config() -> MarketConfig {
    MarketConfig::new(admin(), Address::test(2), usdt(), fee_receiver())
}

fn funded_ledger(cfg: &MarketConfig) -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new(cfg.contract_address());
    ledger.mint(seller(), token(), 1_000).unwrap();
    ledger.mint(buyer(), usdt(), 10_000_000).unwrap();
    ledger
}

fn market() -> Market<InMemoryLedger> {
    let cfg = config();
    let ledger = funded_ledger(&cfg);
    Market::deploy(&cfg, ledger).unwrap()
}

fn create(id: u64, amount: Amount) -> Message {
    Message::CreateOrder {
        id,
        price: 1_000,
        min_buy_price: 900,
        token: token(),
        amount,
    }
}

fn buy(id: u64, amount: Amount) -> Message {
    Message::BuyOrder {
        id,
        amount,
        stable_token: usdt(),
    }
}

fn filled(events: &[MarketEvent]) -> &tokenmarket_types::Fill {
    match events {
        [MarketEvent::OrderFilled(fill)] => fill,
        other => panic!("expected one fill, got {other:?}"),
    }
}

/// Ledger that can be told to reject its next batch.
struct FlakyLedger {
    inner: InMemoryLedger,
    fail_next: bool,
}

impl Ledger for FlakyLedger {
    fn custody_account(&self) -> Address {
        self.inner.custody_account()
    }

    fn apply(&mut self, ops: &[LedgerOp]) -> Result<()> {
        if std::mem::take(&mut self.fail_next) {
            return Err(MarketError::InsufficientCustody {
                asset: ops[0].asset(),
                needed: ops[0].amount(),
                available: 0,
            });
        }
        self.inner.apply(ops)
    }

    fn custody_balance(&self, asset: &Address) -> Amount {
        self.inner.custody_balance(asset)
    }
}

// =====================================================================
// Settlement
// =====================================================================

#[test]
fn partial_then_full_fill() {
    let mut m = market();
    m.handle(seller(), create(1, 50)).unwrap();

    let events = m.handle(buyer(), buy(1, 20)).unwrap();
    let fill = filled(&events);
    assert_eq!(fill.notional, 20_000);
    assert_eq!(fill.fee, 200);
    assert_eq!(fill.seller_proceeds, 19_800);
    assert_eq!(m.ledger().balance(seller(), usdt()), 19_800);
    assert_eq!(m.ledger().balance(fee_receiver(), usdt()), 200);
    assert_eq!(m.ledger().balance(buyer(), token()), 20);

    let order = m.sell_order(OrderId(1)).unwrap();
    assert_eq!(order.amount, 30);
    assert!(order.is_active());

    m.handle(buyer(), buy(1, 30)).unwrap();
    let order = m.sell_order(OrderId(1)).unwrap();
    assert_eq!(order.amount, 0);
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(m.ledger().custody_balance(&token()), 0);

    let err = m.handle(buyer(), buy(1, 1)).unwrap_err();
    assert_eq!(err, MarketError::AlreadyInactive(OrderId(1)));
    m.verify_escrow().unwrap();
}

#[test]
fn overfill_rejected_without_effect() {
    let mut m = market();
    m.handle(seller(), create(1, 50)).unwrap();
    let err = m.handle(buyer(), buy(1, 51)).unwrap_err();
    assert!(matches!(err, MarketError::InvalidArgument { .. }));
    assert_eq!(m.sell_order(OrderId(1)).unwrap().amount, 50);
    assert_eq!(m.ledger().balance(buyer(), usdt()), 10_000_000);
}

#[test]
fn buy_of_unknown_order() {
    let mut m = market();
    assert_eq!(
        m.handle(buyer(), buy(42, 1)).unwrap_err(),
        MarketError::NotFound(OrderId(42))
    );
}

#[test]
fn buy_with_unlisted_stable() {
    let mut m = market();
    m.handle(seller(), create(1, 50)).unwrap();
    let msg = Message::BuyOrder {
        id: 1,
        amount: 1,
        stable_token: Address::test(201),
    };
    assert_eq!(
        m.handle(buyer(), msg).unwrap_err(),
        MarketError::TokenNotAllowed(Address::test(201))
    );
}

#[test]
fn delisting_stable_blocks_buys() {
    let mut m = market();
    m.handle(seller(), create(1, 50)).unwrap();
    m.handle(
        admin(),
        Message::UpdateAllowedStable {
            token: usdt(),
            allowed: false,
        },
    )
    .unwrap();
    assert_eq!(
        m.handle(buyer(), buy(1, 1)).unwrap_err(),
        MarketError::TokenNotAllowed(usdt())
    );
}

#[test]
fn fee_increase_can_trip_price_floor() {
    let mut m = market();
    m.handle(seller(), create(1, 50)).unwrap();
    // 10% leaves the seller exactly 900 per unit.
    m.handle(admin(), Message::UpdateFeeRate { rate: 1_000 }).unwrap();
    m.handle(buyer(), buy(1, 1)).unwrap();

    // 10.01% on 10 units: fee 1_001, seller nets 8_999 < 9_000.
    m.handle(admin(), Message::UpdateFeeRate { rate: 1_001 }).unwrap();
    let err = m.handle(buyer(), buy(1, 10)).unwrap_err();
    assert!(matches!(err, MarketError::PriceViolation { .. }));
    assert_eq!(m.sell_order(OrderId(1)).unwrap().amount, 49);
}

#[test]
fn randomized_partial_fills_conserve_value() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut m = market();
    m.handle(seller(), create(1, 1_000)).unwrap();

    let mut notional_total: Amount = 0;
    let mut fee_total: Amount = 0;
    let mut bought: Amount = 0;

    while m.sell_order(OrderId(1)).unwrap().is_active() {
        let remaining = m.sell_order(OrderId(1)).unwrap().amount;
        let qty = rng.gen_range(1..=remaining.min(97));
        let events = m.handle(buyer(), buy(1, qty)).unwrap();
        let fill = filled(&events);
        assert!(fill.is_balanced());
        notional_total += fill.notional;
        fee_total += fill.fee;
        bought += qty;
        m.verify_escrow().unwrap();
    }

    assert_eq!(bought, 1_000);
    assert_eq!(
        m.ledger().balance(seller(), usdt()),
        notional_total - fee_total
    );
    assert_eq!(m.ledger().balance(fee_receiver(), usdt()), fee_total);
    assert_eq!(m.ledger().balance(buyer(), token()), 1_000);
    assert_eq!(m.ledger().custody_balance(&usdt()), 0);
    m.ledger().verify_all_supplies().unwrap();
}

#[test]
fn failed_ledger_batch_leaves_state_untouched() {
    let cfg = config();
    let ledger = FlakyLedger {
        inner: funded_ledger(&cfg),
        fail_next: false,
    };
    let mut m = Market::deploy(&cfg, ledger).unwrap();
    m.handle(seller(), create(1, 50)).unwrap();

    m.ledger_mut().fail_next = true;
    assert!(m.handle(buyer(), buy(1, 20)).is_err());
    assert_eq!(m.sell_order(OrderId(1)).unwrap().amount, 50);
    assert_eq!(m.status().fills_settled, 0);
    assert_eq!(m.ledger().inner.balance(buyer(), usdt()), 10_000_000);

    m.ledger_mut().fail_next = true;
    assert!(m.handle(seller(), create(2, 10)).is_err());
    assert!(m.sell_order(OrderId(2)).is_none());
    assert_eq!(m.order_book().next_order_id(), OrderId(2));

    m.ledger_mut().fail_next = true;
    assert!(m.handle(seller(), Message::CancelOrder { id: 1 }).is_err());
    assert!(m.sell_order(OrderId(1)).unwrap().is_active());

    // Next batch goes through.
    let events = m.handle(buyer(), buy(1, 20)).unwrap();
    assert_eq!(filled(&events).seller_proceeds, 19_800);
}

// =====================================================================
// Admin and order lifecycle
// =====================================================================

#[test]
fn pause_blocks_mutations_until_unpaused() {
    let mut m = market();
    m.handle(seller(), create(1, 50)).unwrap();
    m.handle(admin(), Message::PauseContract).unwrap();

    assert_eq!(m.handle(seller(), create(2, 5)).unwrap_err(), MarketError::Paused);
    assert_eq!(m.handle(buyer(), buy(1, 1)).unwrap_err(), MarketError::Paused);
    assert_eq!(
        m.handle(seller(), Message::CancelOrder { id: 1 }).unwrap_err(),
        MarketError::Paused
    );
    assert_eq!(
        m.handle(admin(), Message::UpdateFeeRate { rate: 5 }).unwrap_err(),
        MarketError::Paused
    );
    assert_eq!(
        m.handle(
            admin(),
            Message::UpdateAllowedStable {
                token: Address::test(201),
                allowed: true,
            }
        )
        .unwrap_err(),
        MarketError::Paused
    );

    // Queries still answer.
    assert_eq!(m.query(&Query::GetIsPaused), QueryResponse::IsPaused(true));

    m.handle(admin(), Message::UnpauseContract).unwrap();
    m.handle(seller(), create(2, 5)).unwrap();
    assert!(m.sell_order(OrderId(2)).unwrap().is_active());
}

#[test]
fn only_admin_administers() {
    let mut m = market();
    for msg in [
        Message::PauseContract,
        Message::UnpauseContract,
        Message::UpdateFeeRate { rate: 5 },
    ] {
        assert!(matches!(
            m.handle(buyer(), msg).unwrap_err(),
            MarketError::Unauthorized { .. }
        ));
    }
    assert_eq!(m.query(&Query::GetFeeRate), QueryResponse::FeeRate(100));
}

#[test]
fn fee_rate_bounds() {
    let mut m = market();
    let err = m
        .handle(admin(), Message::UpdateFeeRate { rate: 10_001 })
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidArgument { .. }));
    m.handle(admin(), Message::UpdateFeeRate { rate: 10_000 })
        .unwrap();
    assert_eq!(m.query(&Query::GetFeeRate), QueryResponse::FeeRate(10_000));

    let err = m
        .handle_json(admin(), r#"{"$$type":"UpdateFeeRate","rate":"5000000000"}"#)
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidArgument { .. }));
    assert_eq!(m.query(&Query::GetFeeRate), QueryResponse::FeeRate(10_000));
}

#[test]
fn floor_at_list_price_fills_only_fee_free() {
    let mut m = market();
    m.handle(
        seller(),
        Message::CreateOrder {
            id: 1,
            price: 1_000,
            min_buy_price: 1_000,
            token: token(),
            amount: 50,
        },
    )
    .unwrap();

    let err = m.handle(buyer(), buy(1, 10)).unwrap_err();
    assert!(matches!(err, MarketError::PriceViolation { .. }));
    assert_eq!(m.sell_order(OrderId(1)).unwrap().amount, 50);

    m.handle(admin(), Message::UpdateFeeRate { rate: 0 }).unwrap();
    let events = m.handle(buyer(), buy(1, 10)).unwrap();
    assert_eq!(filled(&events).seller_proceeds, 10_000);
    assert_eq!(m.sell_order(OrderId(1)).unwrap().amount, 40);
}

#[test]
fn non_seller_cannot_cancel() {
    let mut m = market();
    m.handle(seller(), create(1, 50)).unwrap();
    let before = m.sell_order(OrderId(1)).cloned();
    let err = m
        .handle(buyer(), Message::CancelOrder { id: 1 })
        .unwrap_err();
    assert!(matches!(err, MarketError::Unauthorized { .. }));
    assert_eq!(m.sell_order(OrderId(1)).cloned(), before);
}

#[test]
fn cancel_after_partial_fill_refunds_rest() {
    let mut m = market();
    m.handle(seller(), create(1, 50)).unwrap();
    m.handle(buyer(), buy(1, 20)).unwrap();
    let events = m.handle(seller(), Message::CancelOrder { id: 1 }).unwrap();
    assert!(matches!(
        events[0],
        MarketEvent::OrderCancelled { refunded: 30, .. }
    ));
    assert_eq!(m.ledger().balance(seller(), token()), 980);
    assert_eq!(
        m.handle(seller(), Message::CancelOrder { id: 1 }).unwrap_err(),
        MarketError::AlreadyInactive(OrderId(1))
    );
}

#[test]
fn order_ids_are_never_reused() {
    let mut m = market();
    m.handle(seller(), create(5, 10)).unwrap();
    m.handle(seller(), Message::CancelOrder { id: 5 }).unwrap();
    assert_eq!(
        m.handle(seller(), create(5, 10)).unwrap_err(),
        MarketError::DuplicateOrder(OrderId(5))
    );
    let QueryResponse::NextOrderId(next) = m.query(&Query::GetNextOrderId) else {
        panic!("wrong response");
    };
    assert!(next > OrderId(5));
    m.handle(seller(), create(next.0, 10)).unwrap();
}

#[test]
fn create_rejects_bad_arguments() {
    let mut m = market();
    let bad = [
        create(1, 0),
        Message::CreateOrder {
            id: 1,
            price: 100,
            min_buy_price: 101,
            token: token(),
            amount: 1,
        },
    ];
    for msg in bad {
        assert!(matches!(
            m.handle(seller(), msg).unwrap_err(),
            MarketError::InvalidArgument { .. }
        ));
    }
    assert!(m.order_book().is_empty());
}

#[test]
fn allowlist_toggle_is_idempotent() {
    let mut m = market();
    let add = Message::UpdateAllowedStable {
        token: Address::test(201),
        allowed: true,
    };
    m.handle(admin(), add.clone()).unwrap();
    m.handle(admin(), add).unwrap();
    assert_eq!(m.allowlist().len(), 2);
}

// =====================================================================
// Wire format
// =====================================================================

#[test]
fn json_script_round() {
    let mut m = market();
    let create = format!(
        r#"{{"$$type":"CreateOrder","id":"1","price":"1000","minBuyPrice":"900","token":"{}","amount":"50"}}"#,
        token()
    );
    let buy = format!(
        r#"{{"$$type":"BuyOrder","id":1,"amount":"20","stableToken":"{}"}}"#,
        usdt()
    );
    m.handle_json(seller(), &create).unwrap();
    let events = m.handle_json(buyer(), &buy).unwrap();
    assert_eq!(filled(&events).fee, 200);

    let err = m
        .handle_json(buyer(), r#"{"$$type":"Withdraw"}"#)
        .unwrap_err();
    assert_eq!(err, MarketError::UnknownMessage("Withdraw".into()));
}
