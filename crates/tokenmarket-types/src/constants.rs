//! System-wide constants for the TokenMarket contract.

/// Basis points in 100%.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Highest fee rate the admin may configure (100%).
pub const MAX_FEE_RATE_BPS: u16 = 10_000;

/// Fee rate applied when the deploy configuration does not name one (1%).
pub const DEFAULT_FEE_RATE_BPS: u16 = 100;

/// JSON field carrying the message discriminator.
pub const MESSAGE_TAG: &str = "$$type";

/// Workchain used for derived addresses.
pub const DEFAULT_WORKCHAIN: i32 = 0;

/// Domain separator for [`crate::Address::derive`].
pub const ADDRESS_DOMAIN: &[u8] = b"tokenmarket:address:v1:";

/// Domain separator for [`crate::FillId::deterministic`].
pub const FILL_ID_DOMAIN: &[u8] = b"tokenmarket:fill_id:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "TokenMarket";
