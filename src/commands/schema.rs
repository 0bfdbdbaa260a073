//! Schema command implementation

use anyhow::{Context, Result};
use double_ma_strategy::strategies::double_ma::{self, params};
use double_ma_strategy::Config;
use serde_json::json;

pub fn run(config_path: Option<String>) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    let strategy = double_ma::create_strategy_from_config(&config)?;

    let output = json!({
        "strategy": double_ma::NAME,
        "parameters": params::search_space(),
        "defaults": params::default_params(),
        "settings": strategy.config(),
        "plot_config": strategy.config().plot_config(),
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize schema")?
    );
    Ok(())
}
