use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "recovery-cli", version, about = "Recovery plan CLI")]
struct Cli {
    /// Evaluate commands at this local time instead of the wall clock
    /// (e.g. 2025-01-01T09:00:00)
    #[arg(long, global = true, env = "RECOVERY_NOW", hide = true)]
    now: Option<NaiveDateTime>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Behavior catalog
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// Plan lifecycle
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Record today's check-in for a plan
    Checkin(commands::checkin::CheckinArgs),
    /// Daily reminder control
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RECOVERY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let now = cli
        .now
        .unwrap_or_else(|| chrono::Local::now().naive_local());

    let result = match cli.command {
        Commands::Catalog { action } => commands::catalog::run(action),
        Commands::Plan { action } => commands::plan::run(action, now),
        Commands::Checkin(args) => commands::checkin::run(args, now),
        Commands::Reminder { action } => commands::reminder::run(action, now),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
