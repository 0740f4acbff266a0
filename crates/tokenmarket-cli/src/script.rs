//! Replay scripts: initial balances plus a list of steps. A step either
//! sends a message as `sender` or asks a getter.
//!
//! ```json
//! {
//!   "mints": [{ "account": "0:…", "asset": "0:…", "amount": "1000" }],
//!   "steps": [
//!     { "sender": "0:…", "message": { "$$type": "PauseContract" } },
//!     { "query": { "$$type": "GetIsPaused" } }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use tokenmarket_ledger::InMemoryLedger;
use tokenmarket_settlement::Market;
use tokenmarket_types::{Address, Amount, MarketEvent, Message, Query, QueryResponse, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub mints: Vec<Mint>,
    pub steps: Vec<Step>,
}

/// Balance created in the ledger before the market is deployed.
#[derive(Debug, Clone, Deserialize)]
pub struct Mint {
    pub account: Address,
    pub asset: Address,
    #[serde(with = "tokenmarket_types::wire::int_string")]
    pub amount: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Free-form note printed next to the outcome.
    #[serde(default)]
    pub note: Option<String>,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Action {
    /// A `$$type`-tagged message body sent by `sender`.
    Send { sender: Address, message: Value },
    /// A `$$type`-tagged getter body.
    Query { query: Value },
}

impl Action {
    fn body(&self) -> &Value {
        match self {
            Self::Send { message, .. } => message,
            Self::Query { query } => query,
        }
    }
}

/// What an accepted step produced.
#[derive(Debug, PartialEq)]
pub enum Reply {
    Events(Vec<MarketEvent>),
    Answer(QueryResponse),
}

/// Result of one replayed step.
#[derive(Debug)]
pub struct StepOutcome {
    pub index: usize,
    pub kind: String,
    pub note: Option<String>,
    pub result: Result<Reply>,
}

impl Script {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing script {}", path.display()))
    }

    /// Credit every mint to `ledger`, stopping at the first that overflows.
    pub fn fund(&self, ledger: &mut InMemoryLedger) -> Result<()> {
        for mint in &self.mints {
            ledger.mint(mint.account, mint.asset, mint.amount)?;
        }
        Ok(())
    }

    /// Play every step in order. Rejections are recorded and do not stop
    /// the replay.
    pub fn replay(&self, market: &mut Market<InMemoryLedger>) -> Vec<StepOutcome> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let kind = step
                    .action
                    .body()
                    .get(tokenmarket_types::constants::MESSAGE_TAG)
                    .and_then(Value::as_str)
                    .unwrap_or("?")
                    .to_string();
                let result = match &step.action {
                    Action::Send { sender, message } => Message::from_value(message.clone())
                        .and_then(|message| market.handle(*sender, message))
                        .map(Reply::Events),
                    Action::Query { query } => Query::from_value(query.clone())
                        .map(|query| Reply::Answer(market.query(&query))),
                };
                StepOutcome {
                    index,
                    kind,
                    note: step.note.clone(),
                    result,
                }
            })
            .collect()
    }
}
