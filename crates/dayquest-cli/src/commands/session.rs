use clap::Args;

use super::{open_engine, print_json, CommandResult};

#[derive(Args)]
pub struct SessionArgs {
    /// Challenge day index (1-based)
    pub day: u32,
    /// Focused minutes
    pub minutes: u32,
    /// Optional free-text note
    #[arg(long)]
    pub note: Option<String>,
}

pub async fn run(args: SessionArgs) -> CommandResult {
    let mut engine = open_engine()?;
    let report = engine
        .complete_session(args.day, args.minutes, args.note)
        .await?;
    print_json(&report.to_json())
}
