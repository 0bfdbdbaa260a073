//! Double Moving Average Crossover Strategy Implementation

use crate::frame::{FrameError, SignalFrame};
use crate::indicators::{crossed_above, crossed_below, diff, ema, moving_average, sma};
use crate::strategies::Strategy;
use crate::Candle;

use super::columns::*;
use super::config::DoubleMaConfig;

/// Double Moving Average Crossover Strategy
pub struct DoubleMaStrategy {
    config: DoubleMaConfig,
}

impl DoubleMaStrategy {
    pub fn new(config: DoubleMaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DoubleMaConfig {
        &self.config
    }

    fn add_indicators(&self, frame: &mut SignalFrame) -> Result<(), FrameError> {
        let close = frame.close();
        let volume = frame.volume();

        let fast_ma = moving_average(&close, self.config.fast_ma_period, self.config.ma_type);
        let slow_ma = moving_average(&close, self.config.slow_ma_period, self.config.ma_type);

        frame.insert_flag(MA_CROSS_UP, crossed_above(&fast_ma, &slow_ma))?;
        frame.insert_flag(MA_CROSS_DOWN, crossed_below(&fast_ma, &slow_ma))?;
        frame.insert_series(FAST_MA_SLOPE, diff(&fast_ma))?;
        frame.insert_series(SLOW_MA_SLOPE, diff(&slow_ma))?;
        frame.insert_series(FAST_MA, fast_ma)?;
        frame.insert_series(SLOW_MA, slow_ma)?;

        frame.insert_series(TREND_FILTER, ema(&close, self.config.trend_filter_period))?;
        frame.insert_series(VOLUME_SMA, sma(&volume, self.config.volume_sma_period))?;
        Ok(())
    }
}

/// `a > b`, false while either side is still warming up
fn gt(a: f64, b: Option<f64>) -> bool {
    b.is_some_and(|b| a > b)
}

fn lt(a: f64, b: Option<f64>) -> bool {
    b.is_some_and(|b| a < b)
}

impl Strategy for DoubleMaStrategy {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn timeframe(&self) -> &str {
        &self.config.timeframe
    }

    fn startup_candle_count(&self) -> usize {
        self.config.startup_candle_count
    }

    fn populate_indicators(&self, candles: &[Candle]) -> SignalFrame {
        let mut frame = SignalFrame::new(candles.to_vec());
        if let Err(e) = self.add_indicators(&mut frame) {
            tracing::error!(error = %e, "Indicator column rejected");
        }

        tracing::debug!(
            rows = frame.len(),
            ma_type = %self.config.ma_type,
            fast = self.config.fast_ma_period,
            slow = self.config.slow_ma_period,
            "Indicators populated"
        );

        frame
    }

    fn populate_entry_trend(&self, frame: &mut SignalFrame) -> Result<(), FrameError> {
        let enter_long: Vec<bool> = {
            let cross_up = frame.flag(MA_CROSS_UP)?;
            let fast_ma = frame.series(FAST_MA)?;
            let trend_filter = frame.series(TREND_FILTER)?;
            let volume_sma = frame.series(VOLUME_SMA)?;
            let multiplier = self.config.min_volume_multiplier;

            frame
                .candles()
                .iter()
                .enumerate()
                .map(|(i, candle)| {
                    cross_up[i]
                        && gt(candle.close, fast_ma[i])
                        && gt(candle.volume, volume_sma[i].map(|v| v * multiplier))
                        && gt(candle.close, trend_filter[i])
                        && candle.volume > 0.0
                })
                .collect()
        };

        frame.enter_long = enter_long;
        tracing::debug!(entries = frame.entry_count(), "Entry signals populated");
        Ok(())
    }

    fn populate_exit_trend(&self, frame: &mut SignalFrame) -> Result<(), FrameError> {
        let exit_long: Vec<bool> = {
            let cross_down = frame.flag(MA_CROSS_DOWN)?;
            let slow_ma = frame.series(SLOW_MA)?;

            frame
                .candles()
                .iter()
                .enumerate()
                .map(|(i, candle)| cross_down[i] || lt(candle.close, slow_ma[i]))
                .collect()
        };

        frame.exit_long = exit_long;
        tracing::debug!(exits = frame.exit_count(), "Exit signals populated");
        Ok(())
    }
}
