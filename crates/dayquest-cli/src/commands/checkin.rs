use clap::Args;

use super::{open_engine, print_json, CommandResult};

#[derive(Args)]
pub struct CheckinArgs {
    /// Challenge day index (1-based)
    pub day: u32,
    /// terrible, bad, normal, good or super
    pub mood: String,
    /// Optional free-text note
    #[arg(long)]
    pub note: Option<String>,
}

pub async fn run(args: CheckinArgs) -> CommandResult {
    let mut engine = open_engine()?;
    let report = engine.checkin(args.day, &args.mood, args.note).await?;
    print_json(&report.to_json())
}
