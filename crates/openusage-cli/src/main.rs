//! openusage CLI.
//!
//! Thin wrapper over `openusage-core`: every subcommand parses its arguments,
//! calls into the library, and prints plain text. Log verbosity follows
//! `RUST_LOG` (default `info`).

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "openusage")]
#[command(about = "Know where your machine's time goes", long_about = None)]
#[command(version = openusage_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample the machine once per interval until Ctrl+C (or --duration)
    Run {
        /// Data directory for CSV journals and process statistics
        #[arg(short, long, default_value = "openusage-data")]
        data_dir: String,

        /// Sampling interval (e.g. "1s", "500ms", "2s")
        #[arg(short, long, default_value = "1s")]
        interval: String,

        /// Seconds between status lines (0 = no status output)
        #[arg(long, default_value_t = 5)]
        status_every: u64,

        /// Stop after this long (e.g. "90s", "15m", "2h"); default runs until Ctrl+C
        #[arg(long)]
        duration: Option<String>,
    },

    /// Summarize lifetime per-process statistics from a data directory
    Summary {
        /// Data directory holding process_statistics.json
        #[arg(short, long, default_value = "openusage-data")]
        data_dir: String,

        /// Number of processes per ranking
        #[arg(short, long, default_value_t = 10)]
        top: usize,

        /// Print the raw statistics document as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Print recent rows from the CSV journals
    History {
        /// Data directory holding the journals
        #[arg(short, long, default_value = "openusage-data")]
        data_dir: String,

        /// Number of minute-average rows to show
        #[arg(short, long, default_value_t = 15)]
        minutes: usize,

        /// Show this many per-second rows instead of minute averages
        #[arg(short, long)]
        seconds: Option<usize>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            data_dir,
            interval,
            status_every,
            duration,
        } => commands::run::run(&data_dir, &interval, status_every, duration.as_deref()),
        Commands::Summary {
            data_dir,
            top,
            json,
        } => commands::summary::run(&data_dir, top, json),
        Commands::History {
            data_dir,
            minutes,
            seconds,
        } => commands::history::run(&data_dir, minutes, seconds),
    }
}
