//! Check command implementation
//!
//! Runs each setup step in turn and reports pass/fail, so a broken config or
//! strategy is caught before a long hyperopt run.

use anyhow::Result;
use chrono::{Duration, Utc};
use double_ma_strategy::hyperopt::{self, LossBreakdown};
use double_ma_strategy::strategies::{self, double_ma};
use double_ma_strategy::{data, Config, TradeResult};
use tracing::{info, warn};

/// Six closed trades covering wins, losses and a small drawdown
const MOCK_TRADES: [(f64, f64); 6] = [
    (0.02, 120.0),
    (-0.01, 180.0),
    (0.03, 90.0),
    (0.01, 240.0),
    (-0.005, 60.0),
    (0.025, 150.0),
];

fn mock_trades() -> Result<Vec<TradeResult>> {
    MOCK_TRADES
        .iter()
        .map(|&(profit, duration)| TradeResult::new(profit, duration).map_err(anyhow::Error::from))
        .collect()
}

fn pass(step: &str, detail: impl std::fmt::Display) {
    println!("  ✓ {:<18} {}", step, detail);
}

fn fail(step: &str, err: impl std::fmt::Display) {
    println!("  ✗ {:<18} {}", step, err);
}

pub fn run(config_path: String) -> Result<()> {
    info!("Starting setup check");

    println!("\n{}", "=".repeat(60));
    println!("SETUP CHECK");
    println!("{}", "=".repeat(60));

    let mut failures = 0;

    let config = match Config::from_file(&config_path) {
        Ok(config) => {
            pass("config", &config_path);
            config
        }
        Err(e) => {
            fail("config", format!("{:#}", e));
            failures += 1;
            Config::with_strategy(serde_json::json!({ "name": double_ma::NAME }))
        }
    };

    match strategies::create_strategy(&config) {
        Ok(strategy) => pass(
            "strategy",
            format!(
                "{} timeframe={} startup={}",
                strategy.name(),
                strategy.timeframe(),
                strategy.startup_candle_count()
            ),
        ),
        Err(e) => {
            fail("strategy", format!("{:#}", e));
            failures += 1;
        }
    }

    match double_ma::create_strategy_from_config(&config) {
        Ok(strategy) => {
            let settings = strategy.config();
            pass("parameters", double_ma::format_params(settings));
            println!("    stoploss={} roi={:?}", settings.stoploss, settings.minimal_roi);
            let outside = double_ma::params::out_of_bounds(settings);
            if !outside.is_empty() {
                println!("    outside search space: {}", outside.join(", "));
            }
        }
        Err(e) => {
            fail("parameters", format!("{:#}", e));
            failures += 1;
        }
    }

    let loss = hyperopt::create_loss(&config).and_then(|loss| {
        let trades = mock_trades()?;
        let end = Utc::now();
        let start = end - Duration::days(9);
        let value = loss.hyperopt_loss(&trades, trades.len(), start, end, &config);
        Ok((value, LossBreakdown::compute(&trades, trades.len(), start, end, &config)))
    });
    match loss {
        Ok((value, breakdown)) if value.is_finite() => {
            pass("hyperopt loss", format!("{:.6} on mock trial", value));
            info!("\n{}", breakdown);
        }
        Ok((value, _)) => {
            fail("hyperopt loss", format!("non-finite loss {}", value));
            failures += 1;
        }
        Err(e) => {
            fail("hyperopt loss", format!("{:#}", e));
            failures += 1;
        }
    }

    match data::find_data_files(&config.data.data_dir) {
        Ok(files) if !files.is_empty() => {
            pass("data", format!("{} data files in {}", files.len(), config.data.data_dir));
            for file in files.iter().take(5) {
                println!("    {}", file.display());
            }
        }
        Ok(_) => {
            warn!("No data files in {}", config.data.data_dir);
            fail("data", format!("no CSV or feather files in {}", config.data.data_dir));
            failures += 1;
        }
        Err(e) => {
            fail("data", format!("{:#}", e));
            failures += 1;
        }
    }

    println!("{}", "=".repeat(60));

    if failures > 0 {
        anyhow::bail!("{} check(s) failed", failures);
    }

    println!("All checks passed");
    info!("Setup check completed successfully");
    Ok(())
}
