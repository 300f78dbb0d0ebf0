use chrono::NaiveDate;
use clap::Args;

use super::{open_engine, print_json, CommandResult};

#[derive(Args)]
pub struct ProgressArgs {
    /// Evaluate as of this calendar date (YYYY-MM-DD) instead of today
    #[arg(long)]
    pub on: Option<NaiveDate>,
}

pub fn run(args: ProgressArgs) -> CommandResult {
    let mut engine = open_engine()?;
    let snapshot = match args.on {
        Some(date) => engine.progress_on(date)?,
        None => engine.progress()?,
    };
    print_json(&snapshot)
}
