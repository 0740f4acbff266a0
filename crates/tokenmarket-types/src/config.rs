//! Deploy-time configuration for a market contract.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, Address, MarketError, Result};

/// Construction parameters of a market.
///
/// Mirrors the contract's init arguments: admin wallet, backend signer,
/// an initial stable token, and the fee receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Account allowed to pause, change fees and edit the allowlist.
    pub admin: Address,
    /// Account authorized to co-sign privileged operations.
    pub backend_signer: Address,
    /// Account credited with settlement fees.
    pub fee_receiver: Address,
    /// Settlement token allowlisted at deployment.
    #[serde(default)]
    pub stable_token: Option<Address>,
    /// Initial fee rate in basis points.
    #[serde(default = "default_fee_rate_bps")]
    pub fee_rate_bps: u16,
    /// Custody account of the contract. Derived from the admin when unset.
    #[serde(default)]
    pub contract_address: Option<Address>,
}

fn default_fee_rate_bps() -> u16 {
    constants::DEFAULT_FEE_RATE_BPS
}

impl MarketConfig {
    /// Config with the default fee rate, in init-argument order.
    #[must_use]
    pub fn new(
        admin: Address,
        backend_signer: Address,
        stable_token: Address,
        fee_receiver: Address,
    ) -> Self {
        Self {
            admin,
            backend_signer,
            fee_receiver,
            stable_token: Some(stable_token),
            fee_rate_bps: constants::DEFAULT_FEE_RATE_BPS,
            contract_address: None,
        }
    }

    #[must_use]
    pub fn with_fee_rate(mut self, fee_rate_bps: u16) -> Self {
        self.fee_rate_bps = fee_rate_bps;
        self
    }

    #[must_use]
    pub fn with_contract_address(mut self, address: Address) -> Self {
        self.contract_address = Some(address);
        self
    }

    /// The contract's own address.
    #[must_use]
    pub fn contract_address(&self) -> Address {
        self.contract_address
            .unwrap_or_else(|| Address::derive(&format!("tokenmarket:contract:{}", self.admin)))
    }

    /// Fee rate as a percentage (100 bps → 1).
    #[must_use]
    pub fn fee_rate_percent(&self) -> Decimal {
        Decimal::new(i64::from(self.fee_rate_bps), 2)
    }

    /// Check the config before a market is built from it.
    ///
    /// # Errors
    /// Returns `Configuration` if the fee rate exceeds 100% or the contract
    /// address collides with one of the configured accounts.
    pub fn validate(&self) -> Result<()> {
        if self.fee_rate_bps > constants::MAX_FEE_RATE_BPS {
            return Err(MarketError::Configuration(format!(
                "fee_rate_bps {} exceeds {}",
                self.fee_rate_bps,
                constants::MAX_FEE_RATE_BPS
            )));
        }
        let contract = self.contract_address();
        if [self.admin, self.backend_signer, self.fee_receiver].contains(&contract) {
            return Err(MarketError::Configuration(format!(
                "contract address {contract} must not be a configured account"
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MarketError::Configuration(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MarketError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }
}
