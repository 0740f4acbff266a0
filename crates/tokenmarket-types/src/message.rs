//! Inbound messages and read-only queries.
//!
//! Messages are a closed sum type matched exhaustively by the dispatcher.
//! On the wire they are JSON objects discriminated by a `$$type` field,
//! e.g. `{"$$type":"BuyOrder","id":"1","amount":"20","stableToken":"0:…"}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{constants, Address, Amount, MarketError, OrderId, Result, SellOrder};

/// A state-changing message sent to the market contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$$type", rename_all_fields = "camelCase")]
pub enum Message {
    /// Deployment ping; acknowledged with [`crate::MarketEvent::Deployed`].
    Deploy {
        #[serde(with = "crate::wire::int_string")]
        query_id: u64,
    },
    PauseContract,
    UnpauseContract,
    /// `rate` is decoded wide so out-of-range values reach the bounds check.
    UpdateFeeRate {
        #[serde(with = "crate::wire::int_string")]
        rate: u128,
    },
    UpdateAllowedStable {
        token: Address,
        allowed: bool,
    },
    CreateOrder {
        #[serde(with = "crate::wire::int_string")]
        id: u64,
        #[serde(with = "crate::wire::int_string")]
        price: Amount,
        #[serde(with = "crate::wire::int_string")]
        min_buy_price: Amount,
        token: Address,
        #[serde(with = "crate::wire::int_string")]
        amount: Amount,
    },
    CancelOrder {
        #[serde(with = "crate::wire::int_string")]
        id: u64,
    },
    BuyOrder {
        #[serde(with = "crate::wire::int_string")]
        id: u64,
        #[serde(with = "crate::wire::int_string")]
        amount: Amount,
        stable_token: Address,
    },
}

impl Message {
    /// Every `$$type` tag this contract understands.
    pub const TYPES: [&'static str; 8] = [
        "Deploy",
        "PauseContract",
        "UnpauseContract",
        "UpdateFeeRate",
        "UpdateAllowedStable",
        "CreateOrder",
        "CancelOrder",
        "BuyOrder",
    ];

    /// The `$$type` tag of this message.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Deploy { .. } => "Deploy",
            Self::PauseContract => "PauseContract",
            Self::UnpauseContract => "UnpauseContract",
            Self::UpdateFeeRate { .. } => "UpdateFeeRate",
            Self::UpdateAllowedStable { .. } => "UpdateAllowedStable",
            Self::CreateOrder { .. } => "CreateOrder",
            Self::CancelOrder { .. } => "CancelOrder",
            Self::BuyOrder { .. } => "BuyOrder",
        }
    }

    /// Messages that only the admin may send.
    #[must_use]
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Self::PauseContract
                | Self::UnpauseContract
                | Self::UpdateFeeRate { .. }
                | Self::UpdateAllowedStable { .. }
        )
    }

    /// Decode a JSON message body.
    ///
    /// # Errors
    /// - `UnknownMessage` if `$$type` names no known message
    /// - `Serialization` if the body is malformed or the tag is missing
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON message body.
    pub fn from_value(value: Value) -> Result<Self> {
        check_tag(&value, &Self::TYPES)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as a JSON message body.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A read-only getter. Never changes contract state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$$type", rename_all_fields = "camelCase")]
pub enum Query {
    GetAdminWallet,
    GetBackendSigner,
    GetFeeReceiver,
    GetFeeRate,
    GetIsPaused,
    GetIsAllowedStable {
        token: Address,
    },
    GetNextOrderId,
    GetSellOrder {
        #[serde(with = "crate::wire::int_string")]
        id: u64,
    },
}

impl Query {
    /// Every `$$type` tag accepted as a getter.
    pub const TYPES: [&'static str; 8] = [
        "GetAdminWallet",
        "GetBackendSigner",
        "GetFeeReceiver",
        "GetFeeRate",
        "GetIsPaused",
        "GetIsAllowedStable",
        "GetNextOrderId",
        "GetSellOrder",
    ];

    /// The `$$type` tag of this query.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::GetAdminWallet => "GetAdminWallet",
            Self::GetBackendSigner => "GetBackendSigner",
            Self::GetFeeReceiver => "GetFeeReceiver",
            Self::GetFeeRate => "GetFeeRate",
            Self::GetIsPaused => "GetIsPaused",
            Self::GetIsAllowedStable { .. } => "GetIsAllowedStable",
            Self::GetNextOrderId => "GetNextOrderId",
            Self::GetSellOrder { .. } => "GetSellOrder",
        }
    }

    /// Decode a `$$type`-tagged getter body.
    ///
    /// # Errors
    /// Same as [`Message::from_value`].
    pub fn from_value(value: Value) -> Result<Self> {
        check_tag(&value, &Self::TYPES)?;
        Ok(serde_json::from_value(value)?)
    }
}

fn check_tag(value: &Value, known: &[&str]) -> Result<()> {
    let tag = value
        .get(constants::MESSAGE_TAG)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            MarketError::Serialization(format!(
                "message body has no string {} field",
                constants::MESSAGE_TAG
            ))
        })?;
    if known.contains(&tag) {
        Ok(())
    } else {
        Err(MarketError::UnknownMessage(tag.to_string()))
    }
}

/// Answer to a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryResponse {
    AdminWallet(Address),
    BackendSigner(Address),
    FeeReceiver(Address),
    FeeRate(u16),
    IsPaused(bool),
    IsAllowedStable(bool),
    NextOrderId(OrderId),
    SellOrder(Option<SellOrder>),
}
