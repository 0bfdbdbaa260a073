//! Double Moving Average Crossover Strategy
//!
//! ## Entry Logic (Long)
//! 1. Fast MA crosses above slow MA (golden cross)
//! 2. Close above the fast MA
//! 3. Volume above its 20-bar average times `min_volume_multiplier`
//! 4. Close above the long-period EMA trend filter
//! 5. Non-zero volume
//!
//! ## Exit Logic
//! Fast MA crosses below slow MA (dead cross), or close drops below the slow MA.

mod config;
pub mod params;
mod strategy;

pub use config::{ConfigError, DoubleMaConfig, PlotConfig, PlotStyle};
pub use params::{search_space, ParameterKind, ParameterSpec, SearchSpace};
pub use strategy::DoubleMaStrategy;

use crate::{Config, Strategy};
use anyhow::Result;
use std::collections::HashMap;

/// Registry name
pub const NAME: &str = "double_ma";

/// Frame column names
pub mod columns {
    pub const FAST_MA: &str = "fast_ma";
    pub const SLOW_MA: &str = "slow_ma";
    pub const TREND_FILTER: &str = "trend_filter";
    pub const VOLUME_SMA: &str = "volume_sma";
    pub const MA_CROSS_UP: &str = "ma_cross_up";
    pub const MA_CROSS_DOWN: &str = "ma_cross_down";
    pub const FAST_MA_SLOPE: &str = "fast_ma_slope";
    pub const SLOW_MA_SLOPE: &str = "slow_ma_slope";
}

/// Parse the strategy section of a config
pub fn create_strategy_from_config(config: &Config) -> Result<DoubleMaStrategy> {
    let strategy_config: DoubleMaConfig = if config.strategy.is_null() {
        DoubleMaConfig::default()
    } else {
        serde_json::from_value(config.strategy.clone())
            .map_err(|e| anyhow::anyhow!("Failed to parse double_ma config: {}", e))?
    };
    strategy_config.validate()?;
    Ok(DoubleMaStrategy::new(strategy_config))
}

/// Create strategy from config (called by registry)
pub fn create(config: &Config) -> Result<Box<dyn Strategy>> {
    Ok(Box::new(create_strategy_from_config(config)?))
}

/// Convert config to params for reporting
pub fn config_to_params(config: &DoubleMaConfig) -> HashMap<String, f64> {
    let mut params = HashMap::new();
    params.insert("fast_ma_period".to_string(), config.fast_ma_period as f64);
    params.insert("slow_ma_period".to_string(), config.slow_ma_period as f64);
    params.insert(
        "trend_filter_period".to_string(),
        config.trend_filter_period as f64,
    );
    params.insert(
        "min_volume_multiplier".to_string(),
        config.min_volume_multiplier,
    );
    params
}

/// Format params for display
pub fn format_params(config: &DoubleMaConfig) -> String {
    format!(
        "{}:{}/{} Trend:{} Vol:{:.2}",
        config.ma_type,
        config.fast_ma_period,
        config.slow_ma_period,
        config.trend_filter_period,
        config.min_volume_multiplier
    )
}
