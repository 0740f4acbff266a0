//! In-memory reference ledger.
//!
//! Tracks per-(account, asset) balances. The contract's custody account is
//! an ordinary account here. Batches are staged on an overlay and committed
//! only when every op succeeds.

use std::collections::HashMap;

use tokenmarket_types::{Address, Amount, MarketError, Result};

use crate::{
    ledger::{Ledger, LedgerOp},
    supply_conservation::SupplyConservation,
};

/// Ledger that keeps every balance in a `HashMap`.
#[derive(Debug)]
pub struct InMemoryLedger {
    custody: Address,
    balances: HashMap<(Address, Address), Amount>,
    supply: SupplyConservation,
}

impl InMemoryLedger {
    /// Create an empty ledger whose custody account is `custody`.
    #[must_use]
    pub fn new(custody: Address) -> Self {
        Self {
            custody,
            balances: HashMap::new(),
            supply: SupplyConservation::new(),
        }
    }

    /// Create new supply of `asset` in `account`.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` if the asset's total supply would
    /// overflow. Nothing is credited in that case.
    pub fn mint(&mut self, account: Address, asset: Address, amount: Amount) -> Result<()> {
        let next = self.balance(account, asset).checked_add(amount).ok_or_else(|| {
            MarketError::SupplyInvariantViolation {
                reason: format!("balance of {account} in {asset} overflows"),
            }
        })?;
        self.supply.record_mint(asset, amount)?;
        self.balances.insert((account, asset), next);
        Ok(())
    }

    /// Destroy `amount` of `asset` held by `account`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if the account holds less than `amount`.
    pub fn burn(&mut self, account: Address, asset: Address, amount: Amount) -> Result<()> {
        let available = self.balance(account, asset);
        if available < amount {
            return Err(MarketError::InsufficientBalance {
                account,
                asset,
                needed: amount,
                available,
            });
        }
        self.balances.insert((account, asset), available - amount);
        self.supply.record_burn(asset, amount);
        Ok(())
    }

    /// Balance of `asset` held by `account`.
    #[must_use]
    pub fn balance(&self, account: Address, asset: Address) -> Amount {
        self.balances.get(&(account, asset)).copied().unwrap_or(0)
    }

    /// Sum of every account's holding of `asset`, custody included.
    #[must_use]
    pub fn total_supply(&self, asset: &Address) -> Amount {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Verify supply conservation for one asset.
    pub fn verify_supply(&self, asset: &Address) -> Result<()> {
        self.supply.verify(asset, self.total_supply(asset))
    }

    /// Verify supply conservation for every asset ever minted.
    pub fn verify_all_supplies(&self) -> Result<()> {
        self.supply
            .tracked_assets()
            .iter()
            .try_for_each(|asset| self.verify_supply(asset))
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }
}

/// Uncommitted balance changes of one batch.
struct Staged<'a> {
    base: &'a HashMap<(Address, Address), Amount>,
    overlay: HashMap<(Address, Address), Amount>,
}

impl Staged<'_> {
    fn get(&self, key: (Address, Address)) -> Amount {
        self.overlay
            .get(&key)
            .or_else(|| self.base.get(&key))
            .copied()
            .unwrap_or(0)
    }

    fn debit(&mut self, key: (Address, Address), amount: Amount) -> std::result::Result<(), Amount> {
        let available = self.get(key);
        if available < amount {
            return Err(available);
        }
        self.overlay.insert(key, available - amount);
        Ok(())
    }

    fn credit(&mut self, key: (Address, Address), amount: Amount) -> Result<()> {
        let next = self.get(key).checked_add(amount).ok_or_else(|| {
            MarketError::invalid(format!("balance of {} in {} overflows", key.0, key.1))
        })?;
        self.overlay.insert(key, next);
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn custody_account(&self) -> Address {
        self.custody
    }

    fn apply(&mut self, ops: &[LedgerOp]) -> Result<()> {
        let mut staged = Staged {
            base: &self.balances,
            overlay: HashMap::new(),
        };

        for op in ops {
            match *op {
                LedgerOp::Escrow {
                    from,
                    asset,
                    amount,
                } => {
                    staged
                        .debit((from, asset), amount)
                        .map_err(|available| MarketError::InsufficientBalance {
                            account: from,
                            asset,
                            needed: amount,
                            available,
                        })?;
                    staged.credit((self.custody, asset), amount)?;
                }
                LedgerOp::Release { to, asset, amount }
                | LedgerOp::TransferValue { to, asset, amount } => {
                    staged
                        .debit((self.custody, asset), amount)
                        .map_err(|available| MarketError::InsufficientCustody {
                            asset,
                            needed: amount,
                            available,
                        })?;
                    staged.credit((to, asset), amount)?;
                }
            }
        }

        let changes = staged.overlay;
        tracing::debug!(ops = ops.len(), touched = changes.len(), "ledger batch committed");
        self.balances.extend(changes);
        Ok(())
    }

    fn custody_balance(&self, asset: &Address) -> Amount {
        self.balance(self.custody, *asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custody() -> Address {
        Address::test(999)
    }

    fn token() -> Address {
        Address::test(100)
    }

    fn usdt() -> Address {
        Address::test(200)
    }

    #[test]
    fn mint_and_balance() {
        let mut ledger = InMemoryLedger::new(custody());
        let alice = Address::test(1);
        ledger.mint(alice, usdt(), 1_000).unwrap();
        assert_eq!(ledger.balance(alice, usdt()), 1_000);
        assert_eq!(ledger.total_supply(&usdt()), 1_000);
        ledger.verify_supply(&usdt()).unwrap();
    }

    #[test]
    fn mint_overflow_rejected_without_credit() {
        let mut ledger = InMemoryLedger::new(custody());
        let alice = Address::test(1);
        let bob = Address::test(2);
        ledger.mint(alice, usdt(), u128::MAX).unwrap();
        let err = ledger.mint(bob, usdt(), 1).unwrap_err();
        assert!(matches!(err, MarketError::SupplyInvariantViolation { .. }));
        assert_eq!(ledger.balance(bob, usdt()), 0);
        assert!(ledger.mint(alice, usdt(), 1).is_err());
        ledger.verify_supply(&usdt()).unwrap();
    }

    #[test]
    fn escrow_moves_into_custody() {
        let mut ledger = InMemoryLedger::new(custody());
        let alice = Address::test(1);
        ledger.mint(alice, token(), 50).unwrap();
        ledger.escrow(alice, token(), 30).unwrap();
        assert_eq!(ledger.balance(alice, token()), 20);
        assert_eq!(ledger.custody_balance(&token()), 30);
        ledger.verify_supply(&token()).unwrap();
    }

    #[test]
    fn escrow_insufficient_fails_cleanly() {
        let mut ledger = InMemoryLedger::new(custody());
        let alice = Address::test(1);
        ledger.mint(alice, token(), 10).unwrap();
        let err = ledger.escrow(alice, token(), 11).unwrap_err();
        assert_eq!(
            err,
            MarketError::InsufficientBalance {
                account: alice,
                asset: token(),
                needed: 11,
                available: 10,
            }
        );
        assert_eq!(ledger.balance(alice, token()), 10);
        assert_eq!(ledger.custody_balance(&token()), 0);
    }

    #[test]
    fn release_beyond_custody_fails() {
        let mut ledger = InMemoryLedger::new(custody());
        let err = ledger.release(Address::test(1), token(), 1).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientCustody { .. }));
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut ledger = InMemoryLedger::new(custody());
        let seller = Address::test(1);
        let buyer = Address::test(2);
        ledger.mint(seller, token(), 50).unwrap();
        ledger.escrow(seller, token(), 50).unwrap();
        ledger.mint(buyer, usdt(), 100).unwrap();

        // Second op fails: buyer cannot pay 200.
        let ops = [
            LedgerOp::Release {
                to: buyer,
                asset: token(),
                amount: 10,
            },
            LedgerOp::Escrow {
                from: buyer,
                asset: usdt(),
                amount: 200,
            },
        ];
        assert!(ledger.apply(&ops).is_err());
        assert_eq!(ledger.balance(buyer, token()), 0);
        assert_eq!(ledger.custody_balance(&token()), 50);
        assert_eq!(ledger.balance(buyer, usdt()), 100);
    }

    #[test]
    fn batch_sees_its_own_earlier_ops() {
        let mut ledger = InMemoryLedger::new(custody());
        let buyer = Address::test(2);
        let seller = Address::test(1);
        ledger.mint(buyer, usdt(), 1_000).unwrap();
        let ops = [
            LedgerOp::Escrow {
                from: buyer,
                asset: usdt(),
                amount: 1_000,
            },
            LedgerOp::TransferValue {
                to: seller,
                asset: usdt(),
                amount: 990,
            },
            LedgerOp::TransferValue {
                to: Address::test(3),
                asset: usdt(),
                amount: 10,
            },
        ];
        ledger.apply(&ops).unwrap();
        assert_eq!(ledger.balance(seller, usdt()), 990);
        assert_eq!(ledger.balance(Address::test(3), usdt()), 10);
        assert_eq!(ledger.custody_balance(&usdt()), 0);
        ledger.verify_all_supplies().unwrap();
    }

    #[test]
    fn burn_reduces_expected_supply() {
        let mut ledger = InMemoryLedger::new(custody());
        let alice = Address::test(1);
        ledger.mint(alice, usdt(), 100).unwrap();
        ledger.burn(alice, usdt(), 40).unwrap();
        assert_eq!(ledger.balance(alice, usdt()), 60);
        ledger.verify_supply(&usdt()).unwrap();
        assert!(ledger.burn(alice, usdt(), 61).is_err());
    }

    #[test]
    fn ledger_op_accessors() {
        let op = LedgerOp::TransferValue {
            to: Address::test(1),
            asset: usdt(),
            amount: 7,
        };
        assert_eq!(op.asset(), usdt());
        assert_eq!(op.amount(), 7);
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("TransferValue"));
    }
}
