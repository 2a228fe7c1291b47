use algolab::commands::{backtest, clean, reproduce, search, simulate};
use algolab::config::Settings;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "algolab")]
#[command(about = "A tick-replay strategy backtesting and grid search tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one strategy configuration over a scenario
    Backtest {
        /// Directory of per-instrument price files
        scenario_dir: PathBuf,
        /// Strategy template to run
        #[arg(long)]
        template_id: String,
        /// Strategy parameters as inline JSON, e.g. '{"lot": 2}'
        #[arg(long)]
        params: Option<String>,
        /// Comma separated subset of instruments to load
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        instruments: Vec<String>,
        /// Start horizon (defaults to the configured lookback allowance)
        #[arg(long)]
        start: Option<usize>,
        /// Starting cash balance
        #[arg(long, default_value_t = 10_000.0)]
        capital: f64,
        /// Flat cost charged per non-zero trade
        #[arg(long, default_value_t = 0.0)]
        cost: f64,
        /// Directory for per-strategy trade logs (disabled when omitted)
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Exhaustively search a parameter grid for the best configuration
    Search {
        scenario_dir: PathBuf,
        #[arg(long)]
        template_id: String,
        /// Grid dimensions as inline JSON or a path to a JSON file
        #[arg(long)]
        bounds: String,
        /// Objective: total-equity or equity-over-exposure
        #[arg(long, default_value = "total-equity")]
        score: String,
        /// Worker threads (defaults to the CPU count)
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        start: Option<usize>,
        #[arg(long, default_value_t = 0.0)]
        capital: f64,
        #[arg(long, default_value_t = 0.0)]
        cost: f64,
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        instruments: Vec<String>,
        /// Search delta-normalized prices, then replay the winner raw
        #[arg(long)]
        replay_raw: bool,
    },
    /// Replay a recorded move table over a scenario
    Reproduce {
        scenario_dir: PathBuf,
        /// JSON move table, as emitted in a run's statistics
        #[arg(long)]
        moves: PathBuf,
        #[arg(long)]
        start: Option<usize>,
        #[arg(long, default_value_t = 0.0)]
        capital: f64,
        #[arg(long, default_value_t = 0.0)]
        cost: f64,
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        instruments: Vec<String>,
    },
    /// Generate a seeded random-walk scenario
    Simulate {
        out_dir: PathBuf,
        #[arg(long, default_value_t = 2)]
        instruments: usize,
        #[arg(long, default_value_t = 100)]
        ticks: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Clean exported CSV price histories into scenario files
    Clean {
        raw_dir: PathBuf,
        out_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    info!("Starting algolab. Backtest results are not financial advice.");

    match cli.command {
        Commands::Backtest {
            scenario_dir,
            template_id,
            params,
            instruments,
            start,
            capital,
            cost,
            log_dir,
        } => {
            let settings = Settings {
                start_capital: capital,
                transaction_cost: cost,
                ..Settings::default()
            };
            backtest::run(
                &scenario_dir,
                &template_id,
                params.as_deref(),
                instrument_filter(&instruments),
                start,
                settings,
                log_dir.as_deref(),
            )?;
        }
        Commands::Search {
            scenario_dir,
            template_id,
            bounds,
            score,
            workers,
            start,
            capital,
            cost,
            instruments,
            replay_raw,
        } => {
            let settings = Settings {
                start_capital: capital,
                transaction_cost: cost,
                ..Settings::default()
            };
            search::run(
                &scenario_dir,
                &template_id,
                &bounds,
                &score,
                workers,
                start,
                instrument_filter(&instruments),
                settings,
                replay_raw,
            )?;
        }
        Commands::Reproduce {
            scenario_dir,
            moves,
            start,
            capital,
            cost,
            instruments,
        } => {
            let settings = Settings {
                start_capital: capital,
                transaction_cost: cost,
                ..Settings::default()
            };
            reproduce::run(
                &scenario_dir,
                &moves,
                instrument_filter(&instruments),
                start,
                settings,
            )?;
        }
        Commands::Simulate {
            out_dir,
            instruments,
            ticks,
            seed,
        } => {
            simulate::run(&out_dir, instruments, ticks, seed)?;
        }
        Commands::Clean { raw_dir, out_dir } => {
            clean::run(&raw_dir, &out_dir)?;
        }
    }

    Ok(())
}

fn instrument_filter(instruments: &[String]) -> Option<&[String]> {
    if instruments.is_empty() {
        None
    } else {
        Some(instruments)
    }
}
