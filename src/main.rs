//! Double MA strategy - main entry point
//!
//! This binary provides five subcommands:
//! - preview: Inspect a candle CSV or feather file
//! - check: Smoke-test config, strategy and loss
//! - signals: Run the strategy over candles
//! - score: Score and rank trials with the hyperopt loss
//! - schema: Print the hyperopt parameter schema

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "double-ma")]
#[command(about = "Double moving average crossover strategy with its hyperopt loss", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Preview a candle CSV or feather file
    Preview {
        /// Path to the CSV or feather file
        file: PathBuf,
    },

    /// Check that config, strategy and loss work together
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/double_ma.json")]
        config: String,
    },

    /// Compute indicators and entry/exit signals over a candle file
    Signals {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/double_ma.json")]
        config: String,

        /// Candle CSV or feather file
        #[arg(short, long)]
        data: PathBuf,

        /// Write the full signal frame to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of trailing rows to print
        #[arg(long, default_value = "10")]
        tail: usize,
    },

    /// Score trade files with the hyperopt loss and rank them
    Score {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/double_ma.json")]
        config: String,

        /// Start of the backtest window (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End of the backtest window (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Trade count to score with instead of the number of records
        #[arg(long)]
        trade_count: Option<usize>,

        /// Log the per-term loss breakdown
        #[arg(long)]
        debug: bool,

        /// Strategy parameter override applied to every trial (key=value, repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Trade CSV files, one trial each. A sibling `<name>.json` holds that
        /// trial's strategy parameters
        #[arg(required = true)]
        trades: Vec<PathBuf>,
    },

    /// Print the parameter schema and strategy settings as JSON
    Schema {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Log file named `{command}_{date}.log`
fn log_file_name(command_name: &str, now: chrono::NaiveDateTime) -> String {
    format!("{}_{}.log", command_name, now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Command name used for the log file, and whether logs go to the file only
fn logging_mode(command: &Commands) -> (&'static str, bool) {
    match command {
        Commands::Preview { .. } => ("preview", false),
        Commands::Check { .. } => ("check", false),
        Commands::Signals { .. } => ("signals", false),
        Commands::Score { .. } => ("score", true),
        Commands::Schema { .. } => ("schema", true),
    }
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    let log_filename = log_file_name(command_name, chrono::Local::now().naive_local());
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if file_only {
        // Console stays clean for the progress bar or JSON output
        let file_appender = tracing_appender::rolling::never("logs", &log_filename);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        let file_appender = tracing_appender::rolling::never("logs", &log_filename);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let (command_name, file_only) = logging_mode(&cli.command);

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Preview { file } => commands::preview::run(file),

        Commands::Check { config } => commands::check::run(config),

        Commands::Signals {
            config,
            data,
            output,
            tail,
        } => commands::signals::run(config, data, output, tail),

        Commands::Score {
            config,
            start,
            end,
            trade_count,
            debug,
            params,
            trades,
        } => commands::score::run(config, start, end, trade_count, debug, params, trades),

        Commands::Schema { config } => commands::schema::run(config),
    }
}
