//! `tokenmarket <config.json> <script.json>`
//!
//! Deploys a market on an in-memory ledger, replays the script, prints each
//! step's events or getter answer and the final contract status.

mod script;

use std::path::Path;

use anyhow::Context;
use tokenmarket_ledger::InMemoryLedger;
use tokenmarket_settlement::Market;
use tokenmarket_types::{MarketConfig, constants};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::script::{Reply, Script};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tokenmarket=info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(script_path)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: tokenmarket <config.json> <script.json>");
    };

    let config = MarketConfig::load(Path::new(&config_path))
        .with_context(|| format!("loading config {config_path}"))?;
    let script = Script::load(Path::new(&script_path))?;

    let mut ledger = InMemoryLedger::new(config.contract_address());
    script.fund(&mut ledger).context("funding accounts")?;
    let mut market = Market::deploy(&config, ledger).context("deploying market")?;

    tracing::info!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        contract = %market.address(),
        steps = script.steps.len(),
        "replaying script"
    );

    let outcomes = script.replay(&mut market);
    let rejected = outcomes.iter().filter(|o| o.result.is_err()).count();
    for outcome in &outcomes {
        let note = outcome.note.as_deref().unwrap_or("");
        match &outcome.result {
            Ok(Reply::Answer(answer)) => {
                let answer = serde_json::to_string(answer)?;
                println!("#{:<3} {:<20} = {answer} {note}", outcome.index, outcome.kind);
            }
            Ok(Reply::Events(events)) if events.is_empty() => {
                println!("#{:<3} {:<20} ok (no change) {note}", outcome.index, outcome.kind);
            }
            Ok(Reply::Events(events)) => {
                println!("#{:<3} {:<20} ok {note}", outcome.index, outcome.kind);
                for event in events {
                    println!("       {event}");
                }
            }
            Err(err) => {
                println!("#{:<3} {:<20} REJECTED {err} {note}", outcome.index, outcome.kind);
            }
        }
    }

    market.verify_escrow().context("escrow check")?;
    market
        .ledger()
        .verify_all_supplies()
        .context("supply check")?;

    println!("{}", serde_json::to_string_pretty(&market.status())?);
    tracing::info!(
        accepted = outcomes.len() - rejected,
        rejected,
        "replay finished"
    );
    Ok(())
}
