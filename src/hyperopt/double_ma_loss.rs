//! Hyperopt loss tuned for the double MA strategy
//!
//! Seven penalty terms, each measuring how far a trial is from the target
//! operating regime, combined under fixed weights. Lower is better.
//!
//! | term        | target                         | weight |
//! |-------------|--------------------------------|--------|
//! | profit      | total profit ratio >= 2.0      | 0.25   |
//! | win rate    | 35%..65%, best at 50%          | 0.20   |
//! | drawdown    | max drawdown <= 15%            | 0.20   |
//! | frequency   | 10..30 trades per month        | 0.10   |
//! | duration    | average hold <= 720 minutes    | 0.10   |
//! | trade count | 50..300 trades                 | 0.10   |
//! | params      | sane fast/slow/trend periods   | 0.10   |
//!
//! Weights are fixed constants, not configuration. They add up to 1.05.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::HyperOptLoss;
use crate::{Config, TradeResult};

pub const TARGET_TRADES_MIN: usize = 50;
pub const TARGET_TRADES_MAX: usize = 300;

pub const EXPECTED_MAX_PROFIT: f64 = 2.0;

/// Minutes (12 hours)
pub const MAX_ACCEPTED_TRADE_DURATION: f64 = 720.0;

pub const TARGET_WIN_RATE_MIN: f64 = 0.35;
pub const TARGET_WIN_RATE_MAX: f64 = 0.65;
pub const TARGET_WIN_RATE_OPTIMAL: f64 = 0.50;

pub const MAX_ACCEPTED_DRAWDOWN: f64 = 0.15;

pub const TARGET_TRADES_PER_MONTH_MIN: f64 = 10.0;
pub const TARGET_TRADES_PER_MONTH_MAX: f64 = 30.0;

/// Returned by the parameter check when the strategy mapping is unusable
pub const PARAMS_FALLBACK_LOSS: f64 = 0.1;

/// Fixed weight of each loss term
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LossWeights {
    pub profit: f64,
    pub win_rate: f64,
    pub drawdown: f64,
    pub frequency: f64,
    pub duration: f64,
    pub trade_count: f64,
    pub params: f64,
}

pub const WEIGHTS: LossWeights = LossWeights {
    profit: 0.25,
    win_rate: 0.20,
    drawdown: 0.20,
    frequency: 0.10,
    duration: 0.10,
    trade_count: 0.10,
    params: 0.10,
};

// =============================================================================
// Loss terms
// =============================================================================

/// Reward approaching `EXPECTED_MAX_PROFIT`, heavy penalty for a net loss.
///
/// Note the jump at zero: 1.0 just above, 2.0 at exactly zero.
pub fn profit_loss(total_profit: f64) -> f64 {
    if total_profit > 0.0 {
        (1.0 - total_profit / EXPECTED_MAX_PROFIT).max(0.0)
    } else {
        2.0 + total_profit.abs()
    }
}

pub fn win_rate_loss(win_rate: f64) -> f64 {
    if win_rate < TARGET_WIN_RATE_MIN {
        (TARGET_WIN_RATE_MIN - win_rate) * 2.0
    } else if win_rate > TARGET_WIN_RATE_MAX {
        (win_rate - TARGET_WIN_RATE_MAX) * 1.5
    } else {
        (win_rate - TARGET_WIN_RATE_OPTIMAL).abs() * 0.5
    }
}

pub fn drawdown_loss(max_drawdown: f64) -> f64 {
    if max_drawdown > MAX_ACCEPTED_DRAWDOWN {
        (max_drawdown - MAX_ACCEPTED_DRAWDOWN) * 3.0
    } else {
        max_drawdown * 2.0
    }
}

pub fn frequency_loss(trades_per_month: f64) -> f64 {
    if trades_per_month < TARGET_TRADES_PER_MONTH_MIN {
        (TARGET_TRADES_PER_MONTH_MIN - trades_per_month) * 0.1
    } else if trades_per_month > TARGET_TRADES_PER_MONTH_MAX {
        (trades_per_month - TARGET_TRADES_PER_MONTH_MAX) * 0.05
    } else {
        0.0
    }
}

pub fn duration_loss(avg_trade_duration: f64) -> f64 {
    if avg_trade_duration > MAX_ACCEPTED_TRADE_DURATION {
        (avg_trade_duration - MAX_ACCEPTED_TRADE_DURATION) / 1000.0
    } else {
        0.0
    }
}

pub fn trade_count_loss(trade_count: usize) -> f64 {
    if trade_count < TARGET_TRADES_MIN {
        (TARGET_TRADES_MIN - trade_count) as f64 * 0.01
    } else if trade_count > TARGET_TRADES_MAX {
        (trade_count - TARGET_TRADES_MAX) as f64 * 0.005
    } else {
        0.0
    }
}

// =============================================================================
// Parameter sanity
// =============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("strategy section is not a mapping")]
    NotAMapping,

    #[error("'{0}' is not numeric")]
    NonNumeric(&'static str),

    #[error("slow_ma_period is zero")]
    ZeroSlowPeriod,
}

fn period(strategy: &Value, key: &'static str, default: f64) -> Result<f64, ParamsError> {
    match strategy.get(key) {
        None => Ok(default),
        Some(v) => v.as_f64().ok_or(ParamsError::NonNumeric(key)),
    }
}

/// Penalty for implausible period combinations, or the error that prevents computing it
pub fn try_params_reasonable_loss(strategy: &Value) -> Result<f64, ParamsError> {
    if !strategy.is_object() {
        return Err(ParamsError::NotAMapping);
    }

    let fast_period = period(strategy, "fast_ma_period", 10.0)?;
    let slow_period = period(strategy, "slow_ma_period", 30.0)?;
    let trend_period = period(strategy, "trend_filter_period", 100.0)?;

    if slow_period == 0.0 {
        return Err(ParamsError::ZeroSlowPeriod);
    }

    let mut loss = 0.0;

    // Fast line should be clearly shorter than the slow one, but not negligible
    let period_ratio = fast_period / slow_period;
    if period_ratio > 0.8 {
        loss += (period_ratio - 0.8) * 2.0;
    } else if period_ratio < 0.1 {
        loss += (0.1 - period_ratio) * 1.0;
    }

    // Trend filter must look further back than the slow line
    if trend_period <= slow_period {
        loss += (slow_period - trend_period + 1.0) * 0.01;
    }

    if !(3.0..=100.0).contains(&fast_period) {
        loss += 0.5;
    }
    if !(10.0..=200.0).contains(&slow_period) {
        loss += 0.5;
    }
    if !(20.0..=500.0).contains(&trend_period) {
        loss += 0.5;
    }

    Ok(loss)
}

/// Parameter sanity term; never fails, falls back to `PARAMS_FALLBACK_LOSS`
pub fn params_reasonable_loss(strategy: &Value) -> f64 {
    try_params_reasonable_loss(strategy).unwrap_or_else(|e| {
        debug!(error = %e, "Cannot evaluate strategy parameters, using fallback");
        PARAMS_FALLBACK_LOSS
    })
}

// =============================================================================
// Breakdown
// =============================================================================

/// Every intermediate value of one loss evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LossBreakdown {
    pub total_profit: f64,
    pub avg_profit: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub avg_drawdown: f64,
    pub trade_count: usize,
    pub days: i64,
    pub trades_per_month: f64,
    pub avg_trade_duration: f64,

    pub profit_loss: f64,
    pub win_rate_loss: f64,
    pub drawdown_loss: f64,
    pub freq_loss: f64,
    pub duration_loss: f64,
    pub trade_count_loss: f64,
    pub params_loss: f64,

    pub total_loss: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    use statrs::statistics::Statistics;
    values.mean()
}

/// (max, avg) magnitude of the drawdown of the cumulative profit curve
fn drawdowns(results: &[TradeResult]) -> (f64, f64) {
    if results.is_empty() {
        return (0.0, 0.0);
    }

    let mut cumulative = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    let mut sum = 0.0;

    for trade in results {
        cumulative += trade.profit_ratio;
        peak = peak.max(cumulative);
        let drawdown = cumulative - peak;
        worst = worst.min(drawdown);
        sum += drawdown;
    }

    (worst.abs(), (sum / results.len() as f64).abs())
}

impl LossBreakdown {
    pub fn compute(
        results: &[TradeResult],
        trade_count: usize,
        min_date: DateTime<Utc>,
        max_date: DateTime<Utc>,
        config: &Config,
    ) -> Self {
        let days = (max_date - min_date).num_days().max(1);

        let (total_profit, avg_profit, win_rate, avg_trade_duration) = if results.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            let total: f64 = results.iter().map(|t| t.profit_ratio).sum();
            let wins = results.iter().filter(|t| t.is_win()).count();
            (
                total,
                mean(results.iter().map(|t| t.profit_ratio)),
                wins as f64 / results.len() as f64,
                mean(results.iter().map(|t| t.trade_duration)),
            )
        };

        let (max_drawdown, avg_drawdown) = drawdowns(results);

        let trades_per_day = trade_count as f64 / days as f64;
        let trades_per_month = trades_per_day * 30.0;

        let mut breakdown = LossBreakdown {
            total_profit,
            avg_profit,
            win_rate,
            max_drawdown,
            avg_drawdown,
            trade_count,
            days,
            trades_per_month,
            avg_trade_duration,
            profit_loss: profit_loss(total_profit),
            win_rate_loss: win_rate_loss(win_rate),
            drawdown_loss: drawdown_loss(max_drawdown),
            freq_loss: frequency_loss(trades_per_month),
            duration_loss: duration_loss(avg_trade_duration),
            trade_count_loss: trade_count_loss(trade_count),
            params_loss: params_reasonable_loss(&config.strategy),
            total_loss: 0.0,
        };
        breakdown.total_loss = breakdown.weighted_total();
        breakdown
    }

    fn weighted_total(&self) -> f64 {
        self.profit_loss * WEIGHTS.profit
            + self.win_rate_loss * WEIGHTS.win_rate
            + self.drawdown_loss * WEIGHTS.drawdown
            + self.freq_loss * WEIGHTS.frequency
            + self.duration_loss * WEIGHTS.duration
            + self.trade_count_loss * WEIGHTS.trade_count
            + self.params_loss * WEIGHTS.params
    }
}

impl fmt::Display for LossBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Double MA hyperopt loss ===")?;
        writeln!(f, "Metrics:")?;
        writeln!(f, "  Total profit:       {:.4}", self.total_profit)?;
        writeln!(f, "  Win rate:           {:.2}%", self.win_rate * 100.0)?;
        writeln!(f, "  Max drawdown:       {:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "  Trades:             {}", self.trade_count)?;
        writeln!(f, "  Trades per month:   {:.1}", self.trades_per_month)?;
        writeln!(f, "  Avg duration:       {:.0} min", self.avg_trade_duration)?;
        writeln!(f, "Loss terms:")?;
        writeln!(f, "  Profit:             {:.4}", self.profit_loss)?;
        writeln!(f, "  Win rate:           {:.4}", self.win_rate_loss)?;
        writeln!(f, "  Drawdown:           {:.4}", self.drawdown_loss)?;
        writeln!(f, "  Frequency:          {:.4}", self.freq_loss)?;
        writeln!(f, "  Duration:           {:.4}", self.duration_loss)?;
        writeln!(f, "  Trade count:        {:.4}", self.trade_count_loss)?;
        writeln!(f, "  Params:             {:.4}", self.params_loss)?;
        write!(f, "Total loss:           {:.6}", self.total_loss)
    }
}

// =============================================================================
// Loss function
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleMaHyperOptLoss {
    debug: bool,
}

impl DoubleMaHyperOptLoss {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the full breakdown of every evaluation
    pub fn with_debug(debug: bool) -> Self {
        Self { debug }
    }
}

impl HyperOptLoss for DoubleMaHyperOptLoss {
    fn name(&self) -> &'static str {
        super::DOUBLE_MA_LOSS
    }

    fn hyperopt_loss(
        &self,
        results: &[TradeResult],
        trade_count: usize,
        min_date: DateTime<Utc>,
        max_date: DateTime<Utc>,
        config: &Config,
    ) -> f64 {
        let breakdown = LossBreakdown::compute(results, trade_count, min_date, max_date, config);
        if self.debug {
            info!("\n{}", breakdown);
        }
        breakdown.total_loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use serde_json::json;

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn trades(profits: &[f64], durations: &[f64]) -> Vec<TradeResult> {
        profits
            .iter()
            .zip(durations)
            .map(|(&p, &d)| TradeResult::new(p, d).unwrap())
            .collect()
    }

    fn sample_trades() -> Vec<TradeResult> {
        trades(
            &[0.02, -0.01, 0.03, 0.01, -0.005, 0.025],
            &[120.0, 180.0, 90.0, 240.0, 60.0, 150.0],
        )
    }

    #[test]
    fn test_weights_total() {
        let w = WEIGHTS;
        let sum = w.profit + w.win_rate + w.drawdown + w.frequency + w.duration + w.trade_count + w.params;
        assert_relative_eq!(sum, 1.05, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_trial_breakdown() {
        let b = LossBreakdown::compute(&sample_trades(), 6, date(1), date(10), &Config::default());

        assert_eq!(b.days, 9);
        assert_relative_eq!(b.total_profit, 0.07, epsilon = 1e-12);
        assert_relative_eq!(b.profit_loss, 0.965, epsilon = 1e-12);
        assert_relative_eq!(b.win_rate, 4.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(b.win_rate_loss, 0.025, epsilon = 1e-9);
        assert_relative_eq!(b.max_drawdown, 0.01, epsilon = 1e-12);
        assert_relative_eq!(b.avg_drawdown, 0.0025, epsilon = 1e-12);
        assert_relative_eq!(b.drawdown_loss, 0.02, epsilon = 1e-12);
        assert_relative_eq!(b.trades_per_month, 20.0, epsilon = 1e-12);
        assert_eq!(b.freq_loss, 0.0);
        assert_relative_eq!(b.avg_trade_duration, 140.0, epsilon = 1e-12);
        assert_eq!(b.duration_loss, 0.0);
        assert_relative_eq!(b.trade_count_loss, 0.44, epsilon = 1e-12);
        assert_eq!(b.params_loss, 0.0);

        // 0.965*0.25 + 0.025*0.2 + 0.02*0.2 + 0.44*0.1
        assert_relative_eq!(b.total_loss, 0.29425, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_results() {
        let b = LossBreakdown::compute(&[], 0, date(1), date(31), &Config::default());

        assert_eq!(b.total_profit, 0.0);
        assert_eq!(b.win_rate, 0.0);
        assert_eq!(b.max_drawdown, 0.0);
        assert_eq!(b.avg_trade_duration, 0.0);
        assert_eq!(b.profit_loss, 2.0);
        assert_relative_eq!(b.win_rate_loss, 0.7, epsilon = 1e-12);
        assert_eq!(b.drawdown_loss, 0.0);
        assert_eq!(b.duration_loss, 0.0);
        assert_relative_eq!(b.trade_count_loss, 0.5, epsilon = 1e-12);
        // 0 trades over 30 days -> 10 below the monthly minimum
        assert_relative_eq!(b.freq_loss, 1.0, epsilon = 1e-12);
        assert!(b.total_loss.is_finite());
    }

    #[test]
    fn test_zero_day_window_counts_as_one_day() {
        let b = LossBreakdown::compute(&sample_trades(), 6, date(5), date(5), &Config::default());
        assert_eq!(b.days, 1);
        assert_relative_eq!(b.trades_per_month, 180.0, epsilon = 1e-12);
        assert_relative_eq!(b.freq_loss, 7.5, epsilon = 1e-12);

        // Reversed window is floored the same way
        let b = LossBreakdown::compute(&sample_trades(), 6, date(10), date(1), &Config::default());
        assert_eq!(b.days, 1);
    }

    #[test]
    fn test_trade_count_is_authoritative() {
        let b = LossBreakdown::compute(&sample_trades(), 120, date(1), date(31), &Config::default());
        assert_eq!(b.trade_count_loss, 0.0);
        assert_relative_eq!(b.trades_per_month, 120.0, epsilon = 1e-12);
        // Per-trade statistics still come from the records
        assert_relative_eq!(b.win_rate, 4.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_profit_loss_branches() {
        assert_eq!(profit_loss(0.0), 2.0);
        assert_relative_eq!(profit_loss(1e-9), 1.0, epsilon = 1e-6);
        assert_relative_eq!(profit_loss(1.0), 0.5);
        assert_eq!(profit_loss(2.0), 0.0);
        assert_eq!(profit_loss(5.0), 0.0);
        assert_relative_eq!(profit_loss(-0.3), 2.3);
    }

    #[test]
    fn test_profit_loss_monotonic() {
        let points = [-1.0, -0.5, -0.1, 0.0, 0.1, 0.5, 1.0, 1.5, 1.99];
        for pair in points.windows(2) {
            assert!(profit_loss(pair[1]) < profit_loss(pair[0]), "{:?}", pair);
        }
        assert_eq!(profit_loss(2.0), profit_loss(3.0));
    }

    #[test]
    fn test_win_rate_loss() {
        assert_eq!(win_rate_loss(0.5), 0.0);
        assert!(win_rate_loss(0.45) > 0.0);
        assert!(win_rate_loss(0.40) > win_rate_loss(0.45));
        assert!(win_rate_loss(0.60) > win_rate_loss(0.55));
        assert_relative_eq!(win_rate_loss(0.35), 0.075, epsilon = 1e-12);
        assert_relative_eq!(win_rate_loss(0.2), 0.3, epsilon = 1e-12);
        assert_relative_eq!(win_rate_loss(0.8), 0.225, epsilon = 1e-12);
    }

    #[test]
    fn test_drawdown_loss() {
        assert_relative_eq!(drawdown_loss(0.1), 0.2);
        assert_relative_eq!(drawdown_loss(0.15), 0.3);
        assert_relative_eq!(drawdown_loss(0.25), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_drawdown_peak_starts_at_first_trade() {
        // Losing streak from the start has no peak to fall from
        let (max_dd, _) = drawdowns(&trades(&[-0.1, -0.05], &[10.0, 10.0]));
        assert_relative_eq!(max_dd, 0.05, epsilon = 1e-12);

        let (max_dd, avg_dd) = drawdowns(&trades(&[-0.1], &[10.0]));
        assert_eq!(max_dd, 0.0);
        assert_eq!(avg_dd, 0.0);

        let (max_dd, _) = drawdowns(&trades(&[0.1, -0.2, 0.05, 0.3], &[10.0; 4]));
        assert_relative_eq!(max_dd, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_frequency_duration_and_count_losses() {
        assert_relative_eq!(frequency_loss(4.0), 0.6, epsilon = 1e-12);
        assert_eq!(frequency_loss(10.0), 0.0);
        assert_eq!(frequency_loss(30.0), 0.0);
        assert_relative_eq!(frequency_loss(50.0), 1.0, epsilon = 1e-12);

        assert_eq!(duration_loss(720.0), 0.0);
        assert_relative_eq!(duration_loss(1720.0), 1.0, epsilon = 1e-12);

        assert_eq!(trade_count_loss(50), 0.0);
        assert_eq!(trade_count_loss(300), 0.0);
        assert_relative_eq!(trade_count_loss(0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(trade_count_loss(400), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_params_defaults_are_reasonable() {
        assert_eq!(params_reasonable_loss(&json!({})), 0.0);
        assert_eq!(
            params_reasonable_loss(&json!({
                "fast_ma_period": 10,
                "slow_ma_period": 30,
                "trend_filter_period": 100
            })),
            0.0
        );
    }

    #[test]
    fn test_params_fast_too_close_to_slow() {
        let loss = params_reasonable_loss(&json!({ "fast_ma_period": 25, "slow_ma_period": 30 }));
        assert_relative_eq!(loss, (25.0 / 30.0 - 0.8) * 2.0, epsilon = 1e-12);
        assert_relative_eq!(loss, 0.0667, epsilon = 1e-3);
    }

    #[test]
    fn test_params_fast_negligible() {
        let loss = params_reasonable_loss(&json!({
            "fast_ma_period": 5,
            "slow_ma_period": 100,
            "trend_filter_period": 150
        }));
        assert_relative_eq!(loss, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_params_trend_not_beyond_slow() {
        let loss = params_reasonable_loss(&json!({
            "fast_ma_period": 10,
            "slow_ma_period": 40,
            "trend_filter_period": 30
        }));
        assert_relative_eq!(loss, 0.11, epsilon = 1e-12);
    }

    #[test]
    fn test_params_out_of_range_each_add_half() {
        let loss = params_reasonable_loss(&json!({
            "fast_ma_period": 2,
            "slow_ma_period": 250,
            "trend_filter_period": 600
        }));
        // ratio 0.008 -> +0.092, three range violations -> +1.5
        assert_relative_eq!(loss, 0.092 + 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_params_float_values_accepted() {
        assert_eq!(
            params_reasonable_loss(&json!({ "fast_ma_period": 10.0, "slow_ma_period": 30.0 })),
            0.0
        );
    }

    #[test]
    fn test_params_malformed_fall_back() {
        assert_eq!(
            try_params_reasonable_loss(&json!("DoubleMAStrategy")),
            Err(ParamsError::NotAMapping)
        );
        assert_eq!(params_reasonable_loss(&json!("DoubleMAStrategy")), PARAMS_FALLBACK_LOSS);
        assert_eq!(params_reasonable_loss(&json!([1, 2])), PARAMS_FALLBACK_LOSS);
        assert_eq!(try_params_reasonable_loss(&Value::Null), Err(ParamsError::NotAMapping));
        assert_eq!(params_reasonable_loss(&Value::Null), PARAMS_FALLBACK_LOSS);
        assert_eq!(
            try_params_reasonable_loss(&json!({ "fast_ma_period": "ten" })),
            Err(ParamsError::NonNumeric("fast_ma_period"))
        );
        assert_eq!(
            params_reasonable_loss(&json!({ "slow_ma_period": null })),
            PARAMS_FALLBACK_LOSS
        );
        assert_eq!(
            try_params_reasonable_loss(&json!({ "slow_ma_period": 0 })),
            Err(ParamsError::ZeroSlowPeriod)
        );
    }

    #[test]
    fn test_malformed_params_reach_total() {
        let config = Config::with_strategy(json!("DoubleMAStrategy"));
        let b = LossBreakdown::compute(&sample_trades(), 6, date(1), date(10), &config);
        assert_eq!(b.params_loss, PARAMS_FALLBACK_LOSS);
        assert_relative_eq!(b.total_loss, 0.29425 + 0.01, epsilon = 1e-9);
    }

    #[test]
    fn test_null_strategy_section_falls_back() {
        let explicit: Config =
            serde_json::from_str(r#"{ "strategy": null, "hyperopt": { "loss": "double_ma" } }"#)
                .unwrap();
        let b = LossBreakdown::compute(&sample_trades(), 6, date(1), date(10), &explicit);
        assert_eq!(b.params_loss, PARAMS_FALLBACK_LOSS);

        let absent: Config = serde_json::from_str(r#"{ "hyperopt": { "loss": "double_ma" } }"#).unwrap();
        let b = LossBreakdown::compute(&sample_trades(), 6, date(1), date(10), &absent);
        assert_eq!(b.params_loss, 0.0);
    }

    #[test]
    fn test_loss_is_deterministic() {
        let loss = DoubleMaHyperOptLoss::with_debug(true);
        let trades = sample_trades();
        let config = Config::default();
        let a = loss.hyperopt_loss(&trades, 6, date(1), date(10), &config);
        let b = loss.hyperopt_loss(&trades, 6, date(1), date(10), &config);
        assert_eq!(a.to_bits(), b.to_bits());
        assert_relative_eq!(a, 0.29425, epsilon = 1e-9);
    }

    #[test]
    fn test_breakdown_display() {
        let b = LossBreakdown::compute(&sample_trades(), 6, date(1), date(10), &Config::default());
        let text = b.to_string();
        assert!(text.contains("66.67%"));
        assert!(text.contains("0.4400"));
        assert!(text.ends_with("0.294250"));
    }
}
