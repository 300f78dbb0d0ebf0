use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dayquest-cli", version, about = "Dayquest CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Day completion and per-day data
    Day {
        #[command(subcommand)]
        action: commands::day::DayAction,
    },
    /// Record a mood check-in
    Checkin(commands::checkin::CheckinArgs),
    /// Record a finished focus session
    Session(commands::session::SessionArgs),
    /// Award XP for another activity kind
    Activity(commands::activity::ActivityArgs),
    /// Streak, adherence and level
    Progress(commands::progress::ProgressArgs),
    /// Achievement catalog and unlocks
    Achievements {
        #[command(subcommand)]
        action: commands::achievements::AchievementsAction,
    },
    /// Authoritative XP from the ledger
    Xp {
        #[command(subcommand)]
        action: commands::xp::XpAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("DAYQUEST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let result = match cli.command {
        Commands::Day { action } => commands::day::run(action).await,
        Commands::Checkin(args) => commands::checkin::run(args).await,
        Commands::Session(args) => commands::session::run(args).await,
        Commands::Activity(args) => commands::activity::run(args).await,
        Commands::Progress(args) => commands::progress::run(args),
        Commands::Achievements { action } => commands::achievements::run(action).await,
        Commands::Xp { action } => commands::xp::run(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
