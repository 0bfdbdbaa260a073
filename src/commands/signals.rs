//! Signals command implementation

use anyhow::{Context, Result};
use double_ma_strategy::strategies::{self, double_ma};
use double_ma_strategy::{data, Config};
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

pub fn run(config_path: String, data_path: PathBuf, output: Option<PathBuf>, tail: usize) -> Result<()> {
    info!("Starting signal generation");

    let config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    let strategy = strategies::create_strategy(&config)?;
    info!("Strategy: {} ({})", strategy.name(), strategy.timeframe());

    let candles = data::load_candles(&data_path)?;
    info!("Loaded {} candles from {}", candles.len(), data_path.display());

    if candles.len() < strategy.startup_candle_count() {
        tracing::warn!(
            candles = candles.len(),
            startup = strategy.startup_candle_count(),
            "Fewer candles than the startup period, signals will be sparse"
        );
    }

    let frame = strategy.analyze(&candles)?;
    info!("{}", frame.describe());

    if let Some(path) = &output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        frame.write_csv(file)?;
        info!("Wrote signal frame to {}", path.display());
    }

    println!("\n{}", "=".repeat(60));
    println!("SIGNALS");
    println!("{}", "=".repeat(60));
    if let Ok(parsed) = double_ma::create_strategy_from_config(&config) {
        println!("Parameters:         {}", double_ma::format_params(parsed.config()));
    }
    println!("Candles:            {}", frame.len());
    println!("Entry signals:      {}", frame.entry_count());
    println!("Exit signals:       {}", frame.exit_count());

    let start = frame.len().saturating_sub(tail);
    if start < frame.len() {
        println!("\nLast {} rows:", frame.len() - start);
        println!("  {}", frame.column_names().join(","));
        for i in start..frame.len() {
            println!("  {}", frame.row(i).join(","));
        }
    }
    println!("{}", "=".repeat(60));

    info!("Signal generation completed successfully");
    Ok(())
}
