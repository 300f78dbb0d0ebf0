use clap::Subcommand;

use super::{open_engine, print_json, CommandResult};

#[derive(Subcommand)]
pub enum XpAction {
    /// Authoritative total and level from the ledger
    Show,
    /// Overwrite the local XP cache with the ledger total
    Resync,
}

pub async fn run(action: XpAction) -> CommandResult {
    let mut engine = open_engine()?;

    match action {
        XpAction::Show => {
            let summary = engine.sync().load_aggregate_xp().await?;
            print_json(&summary)?;
        }
        XpAction::Resync => {
            let summary = engine.resync_xp().await?;
            print_json(&summary)?;
        }
    }
    Ok(())
}
