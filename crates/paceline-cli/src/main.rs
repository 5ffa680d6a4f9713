use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

mod commands;
mod loader;

#[derive(Parser)]
#[command(name = "paceline", version, about = "Deadline-driven workload planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate task scores at an instant
    Score {
        /// Path to the TOML task log
        #[arg(long)]
        file: PathBuf,
        /// Evaluation instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Plan the upcoming period
    Plan {
        /// Path to the TOML task log
        #[arg(long)]
        file: PathBuf,
        /// Evaluation instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Period baseline instant (RFC 3339); defaults to the evaluation
        /// instant
        #[arg(long)]
        baseline: Option<DateTime<Utc>>,
        /// End of the planned period (RFC 3339)
        #[arg(long)]
        until: DateTime<Utc>,
    },
    /// List the task snapshot in preference order
    Tasks {
        /// Path to the TOML task log
        #[arg(long)]
        file: PathBuf,
        /// Snapshot instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Score { file, at } => commands::score::run(&file, at),
        Commands::Plan {
            file,
            at,
            baseline,
            until,
        } => commands::plan::run(&file, at, baseline, until),
        Commands::Tasks { file, at } => commands::tasks::run(&file, at),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
