//! Double MA Configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::indicators::MaType;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),

    #[error("min_volume_multiplier must be positive, got {0}")]
    NonPositiveVolumeMultiplier(f64),

    #[error("stoploss must be negative, got {0}")]
    NonNegativeStoploss(f64),
}

/// Configuration for the Double MA Strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoubleMaConfig {
    /// Candle timeframe (default: "1h")
    #[serde(default = "default_timeframe")]
    pub timeframe: String,

    /// Fast moving average period (default: 10)
    #[serde(default = "default_fast_ma_period")]
    pub fast_ma_period: usize,

    /// Slow moving average period (default: 30)
    #[serde(default = "default_slow_ma_period")]
    pub slow_ma_period: usize,

    /// Moving average flavour for fast/slow lines (default: EMA)
    #[serde(default = "default_ma_type")]
    pub ma_type: MaType,

    /// Volume must exceed its average times this (default: 1.0)
    #[serde(default = "default_min_volume_multiplier")]
    pub min_volume_multiplier: f64,

    /// EMA period of the trend filter (default: 100)
    #[serde(default = "default_trend_filter_period")]
    pub trend_filter_period: usize,

    /// SMA period of the volume average (default: 20)
    #[serde(default = "default_volume_sma_period")]
    pub volume_sma_period: usize,

    /// Short entries (default: false, spot only)
    #[serde(default)]
    pub can_short: bool,

    /// Hard stop as a negative ratio (default: -0.08)
    #[serde(default = "default_stoploss")]
    pub stoploss: f64,

    #[serde(default)]
    pub trailing_stop: bool,
    #[serde(default)]
    pub trailing_only_offset_is_reached: bool,
    #[serde(default = "default_trailing_stop_positive")]
    pub trailing_stop_positive: f64,
    #[serde(default)]
    pub trailing_stop_positive_offset: f64,

    /// Minutes in trade -> required profit ratio
    #[serde(default = "default_minimal_roi")]
    pub minimal_roi: BTreeMap<u32, f64>,

    #[serde(default = "default_startup_candle_count")]
    pub startup_candle_count: usize,
    #[serde(default = "default_true")]
    pub process_only_new_candles: bool,
    #[serde(default = "default_true")]
    pub use_exit_signal: bool,
    #[serde(default)]
    pub exit_profit_only: bool,
    #[serde(default)]
    pub ignore_roi_if_entry_signal: bool,
}

fn default_timeframe() -> String { "1h".to_string() }
fn default_fast_ma_period() -> usize { 10 }
fn default_slow_ma_period() -> usize { 30 }
fn default_ma_type() -> MaType { MaType::Ema }
fn default_min_volume_multiplier() -> f64 { 1.0 }
fn default_trend_filter_period() -> usize { 100 }
fn default_volume_sma_period() -> usize { 20 }
fn default_stoploss() -> f64 { -0.08 }
fn default_trailing_stop_positive() -> f64 { 0.01 }
fn default_startup_candle_count() -> usize { 50 }
fn default_true() -> bool { true }

fn default_minimal_roi() -> BTreeMap<u32, f64> {
    BTreeMap::from([
        (0, 0.06),
        (180, 0.05),
        (360, 0.04),
        (720, 0.03),
        (1440, 0.02),
    ])
}

impl Default for DoubleMaConfig {
    fn default() -> Self {
        Self {
            timeframe: default_timeframe(),
            fast_ma_period: default_fast_ma_period(),
            slow_ma_period: default_slow_ma_period(),
            ma_type: default_ma_type(),
            min_volume_multiplier: default_min_volume_multiplier(),
            trend_filter_period: default_trend_filter_period(),
            volume_sma_period: default_volume_sma_period(),
            can_short: false,
            stoploss: default_stoploss(),
            trailing_stop: false,
            trailing_only_offset_is_reached: false,
            trailing_stop_positive: default_trailing_stop_positive(),
            trailing_stop_positive_offset: 0.0,
            minimal_roi: default_minimal_roi(),
            startup_candle_count: default_startup_candle_count(),
            process_only_new_candles: true,
            use_exit_signal: true,
            exit_profit_only: false,
            ignore_roi_if_entry_signal: false,
        }
    }
}

impl DoubleMaConfig {
    /// Reject values the indicator pipeline cannot work with.
    ///
    /// Values outside the hyperopt search bounds are accepted with a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, period) in [
            ("fast_ma_period", self.fast_ma_period),
            ("slow_ma_period", self.slow_ma_period),
            ("trend_filter_period", self.trend_filter_period),
            ("volume_sma_period", self.volume_sma_period),
        ] {
            if period == 0 {
                return Err(ConfigError::ZeroPeriod(name));
            }
        }
        if self.min_volume_multiplier <= 0.0 {
            return Err(ConfigError::NonPositiveVolumeMultiplier(
                self.min_volume_multiplier,
            ));
        }
        if self.stoploss >= 0.0 {
            return Err(ConfigError::NonNegativeStoploss(self.stoploss));
        }

        for name in super::params::out_of_bounds(self) {
            tracing::warn!(param = name, "Parameter outside hyperopt search bounds");
        }
        if self.fast_ma_period >= self.slow_ma_period {
            tracing::warn!(
                fast = self.fast_ma_period,
                slow = self.slow_ma_period,
                "Fast MA period is not shorter than slow MA period"
            );
        }

        Ok(())
    }

    /// Required profit ratio after `minutes` in trade, if any ROI step applies
    pub fn minimal_roi_at(&self, minutes: u32) -> Option<f64> {
        self.minimal_roi
            .range(..=minutes)
            .next_back()
            .map(|(_, &roi)| roi)
    }

    pub fn plot_config(&self) -> PlotConfig {
        PlotConfig::default()
    }
}

/// Line style for a plotted column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotStyle {
    pub color: String,
}

impl PlotStyle {
    fn color(color: &str) -> Self {
        PlotStyle {
            color: color.to_string(),
        }
    }
}

/// Chart layout hint for the host's plotting tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    pub main_plot: BTreeMap<String, PlotStyle>,
    pub subplots: BTreeMap<String, BTreeMap<String, PlotStyle>>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        let main_plot = BTreeMap::from([
            ("fast_ma".to_string(), PlotStyle::color("blue")),
            ("slow_ma".to_string(), PlotStyle::color("red")),
            ("trend_filter".to_string(), PlotStyle::color("green")),
        ]);
        let volume = BTreeMap::from([
            ("volume".to_string(), PlotStyle::color("purple")),
            ("volume_sma".to_string(), PlotStyle::color("orange")),
        ]);
        PlotConfig {
            main_plot,
            subplots: BTreeMap::from([("Volume".to_string(), volume)]),
        }
    }
}
