//! Subcommand handlers. Each one loads the config, opens the local store and
//! prints JSON to stdout.

pub mod achievements;
pub mod activity;
pub mod checkin;
pub mod config;
pub mod day;
pub mod progress;
pub mod session;
pub mod xp;

use std::sync::Arc;

use dayquest_core::rewards::{RestLedger, SqliteLedger, StaticAuth};
use dayquest_core::storage::{data_dir, LedgerBackend};
use dayquest_core::{ActorId, ChallengeEngine, Config, RewardLedger, RewardSync, SqliteKvStore};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Ledger selected by `ledger.backend`, with the configured actor signed in.
pub fn reward_sync(config: &Config) -> Result<RewardSync, Box<dyn std::error::Error>> {
    let ledger: Arc<dyn RewardLedger> = match config.ledger.backend {
        LedgerBackend::Sqlite => Arc::new(SqliteLedger::open_at(&data_dir()?.join("ledger.db"))?),
        LedgerBackend::Rest => {
            let base_url = config
                .ledger
                .base_url
                .as_deref()
                .ok_or("ledger.base_url is not set")?;
            let api_key = config.ledger.api_key.clone().unwrap_or_default();
            Arc::new(RestLedger::new(base_url, api_key)?)
        }
    };

    let auth = match &config.actor_id {
        Some(id) if !id.is_empty() => StaticAuth::signed_in(ActorId::new(id.clone())),
        _ => StaticAuth::signed_out(),
    };
    Ok(RewardSync::new(ledger, Arc::new(auth)))
}

/// Engine over the on-disk challenge store.
pub fn open_engine() -> Result<ChallengeEngine<SqliteKvStore>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let sync = reward_sync(&config)?;
    let kv = SqliteKvStore::open()?;
    Ok(ChallengeEngine::from_config(kv, &config, sync)?)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
