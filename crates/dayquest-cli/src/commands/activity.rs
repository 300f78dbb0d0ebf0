use clap::Args;
use dayquest_core::XpKind;

use super::{open_engine, print_json, CommandResult};

/// Kinds with their own subcommand; awarding them here would skip the local
/// record they belong to.
const DEDICATED: [XpKind; 3] = [XpKind::DayComplete, XpKind::MoodCheckin, XpKind::FocusSession];

#[derive(Args)]
pub struct ActivityArgs {
    /// tiny_habit, task_complete, flashcards_practice or weekly_retro
    pub kind: String,
    /// Challenge day index (1-based)
    pub day: u32,
}

fn parse_kind(raw: &str) -> Result<XpKind, Box<dyn std::error::Error>> {
    let kind: XpKind = raw.parse()?;
    if DEDICATED.contains(&kind) {
        return Err(format!("'{kind}' is recorded through its own subcommand").into());
    }
    Ok(kind)
}

pub async fn run(args: ActivityArgs) -> CommandResult {
    let kind = parse_kind(&args.kind)?;
    let mut engine = open_engine()?;
    let report = engine.award_activity(kind, args.day).await?;
    print_json(&report.to_json())
}
