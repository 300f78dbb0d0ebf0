use clap::Subcommand;
use dayquest_core::achievements::compute_unlocks_from_state;

use super::{open_engine, print_json, CommandResult};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// Catalog merged with the signed-in actor's unlocks
    List,
    /// Keys earned by the local challenge state
    Local,
    /// Submit locally earned unlocks to the ledger
    Sync,
}

pub async fn run(action: AchievementsAction) -> CommandResult {
    let mut engine = open_engine()?;

    match action {
        AchievementsAction::List => {
            let status = engine.sync().load_achievement_status().await?;
            print_json(&status)?;
        }
        AchievementsAction::Local => {
            let keys = engine.store_mut().read(compute_unlocks_from_state)?;
            print_json(&keys)?;
        }
        AchievementsAction::Sync => {
            let keys = engine.store_mut().read(compute_unlocks_from_state)?;
            let inserted = engine.sync().unlock_on_server(&keys).await;
            print_json(&serde_json::json!({ "earned": keys, "inserted": inserted }))?;
        }
    }
    Ok(())
}
