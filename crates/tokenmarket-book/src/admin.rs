//! Admin control: who may administer the market, and its global switches.

use rust_decimal::Decimal;
use tokenmarket_types::{constants, Address, MarketConfig, MarketError, Result};

/// Admin identity, pause flag, fee rate, and signer identity.
#[derive(Debug, Clone)]
pub struct AdminControl {
    admin: Address,
    backend_signer: Address,
    fee_receiver: Address,
    fee_rate_bps: u16,
    paused: bool,
}

impl AdminControl {
    /// # Errors
    /// Returns `InvalidArgument` if `fee_rate_bps` exceeds 10 000.
    pub fn new(
        admin: Address,
        backend_signer: Address,
        fee_receiver: Address,
        fee_rate_bps: u16,
    ) -> Result<Self> {
        check_fee_rate(u128::from(fee_rate_bps))?;
        Ok(Self {
            admin,
            backend_signer,
            fee_receiver,
            fee_rate_bps,
            paused: false,
        })
    }

    pub fn from_config(config: &MarketConfig) -> Result<Self> {
        Self::new(
            config.admin,
            config.backend_signer,
            config.fee_receiver,
            config.fee_rate_bps,
        )
    }

    // =================================================================
    // Guards
    // =================================================================

    /// # Errors
    /// Returns `Unauthorized` unless `sender` is the admin.
    pub fn ensure_admin(&self, sender: Address, action: &'static str) -> Result<()> {
        if sender != self.admin {
            return Err(MarketError::Unauthorized { sender, action });
        }
        Ok(())
    }

    /// # Errors
    /// Returns `Paused` while the contract is paused.
    pub fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            return Err(MarketError::Paused);
        }
        Ok(())
    }

    // =================================================================
    // Mutations
    // =================================================================

    /// Pause the contract. Returns `false` if it was already paused.
    pub fn pause(&mut self, sender: Address) -> Result<bool> {
        self.ensure_admin(sender, "pause the contract")?;
        Ok(!std::mem::replace(&mut self.paused, true))
    }

    /// Unpause the contract. Returns `false` if it was not paused.
    pub fn unpause(&mut self, sender: Address) -> Result<bool> {
        self.ensure_admin(sender, "unpause the contract")?;
        Ok(std::mem::replace(&mut self.paused, false))
    }

    /// Replace the fee rate. Returns the previous rate.
    ///
    /// # Errors
    /// - `Unauthorized` unless `sender` is the admin
    /// - `Paused` while paused
    /// - `InvalidArgument` if `rate` exceeds 10 000 bps
    pub fn update_fee_rate(&mut self, sender: Address, rate: u128) -> Result<u16> {
        self.ensure_admin(sender, "update the fee rate")?;
        self.ensure_not_paused()?;
        let rate = check_fee_rate(rate)?;
        Ok(std::mem::replace(&mut self.fee_rate_bps, rate))
    }

    // =================================================================
    // Getters
    // =================================================================

    #[must_use]
    pub fn admin(&self) -> Address {
        self.admin
    }

    #[must_use]
    pub fn backend_signer(&self) -> Address {
        self.backend_signer
    }

    #[must_use]
    pub fn fee_receiver(&self) -> Address {
        self.fee_receiver
    }

    #[must_use]
    pub fn fee_rate_bps(&self) -> u16 {
        self.fee_rate_bps
    }

    /// Fee rate as a percentage, e.g. `1.00` for 100 bps.
    #[must_use]
    pub fn fee_rate_percent(&self) -> Decimal {
        Decimal::new(i64::from(self.fee_rate_bps), 2)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

fn check_fee_rate(rate: u128) -> Result<u16> {
    u16::try_from(rate)
        .ok()
        .filter(|r| *r <= constants::MAX_FEE_RATE_BPS)
        .ok_or_else(|| {
            MarketError::invalid(format!(
                "fee rate {rate} bps is outside [0, {}]",
                constants::MAX_FEE_RATE_BPS
            ))
        })
}
