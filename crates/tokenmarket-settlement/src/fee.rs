//! Fee math. All rounding is floor, and the fee and the seller's proceeds
//! always add back up to the notional.

use tokenmarket_types::{constants::BPS_DENOMINATOR, Amount, MarketError, Result};

/// Value split of one buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub notional: Amount,
    pub fee: Amount,
    pub seller_proceeds: Amount,
}

impl FeeBreakdown {
    /// Split `amount * price` at `fee_rate_bps`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the notional overflows.
    pub fn compute(amount: Amount, price: Amount, fee_rate_bps: u16) -> Result<Self> {
        let notional = amount.checked_mul(price).ok_or_else(|| {
            MarketError::invalid(format!("notional of {amount} x {price} overflows"))
        })?;
        let fee = mul_bps_floor(notional, fee_rate_bps);
        Ok(Self {
            notional,
            fee,
            seller_proceeds: notional - fee,
        })
    }

    /// Whether the seller receives at least `min_unit_price` per unit.
    ///
    /// The floor is checked against proceeds net of fee, so an order with
    /// `min_buy_price == price` only fills while the fee rate is zero.
    #[must_use]
    pub fn meets_floor(&self, amount: Amount, min_unit_price: Amount) -> bool {
        match min_unit_price.checked_mul(amount) {
            Some(floor) => self.seller_proceeds >= floor,
            None => false,
        }
    }
}

/// `floor(value * bps / 10_000)` without overflowing on large values.
#[must_use]
pub fn mul_bps_floor(value: Amount, bps: u16) -> Amount {
    let bps = Amount::from(bps);
    (value / BPS_DENOMINATOR) * bps + (value % BPS_DENOMINATOR) * bps / BPS_DENOMINATOR
}
