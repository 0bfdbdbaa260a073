//! Core data types shared by the strategy and the hyperopt loss

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for candle data
#[derive(Debug, Error)]
pub enum CandleValidationError {
    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("volume ({0}) must be >= 0")]
    NegativeVolume(f64),

    #[error("close ({close}) must be between low ({low}) and high ({high})")]
    CloseOutOfRange { close: f64, low: f64, high: f64 },

    #[error("prices must be positive: open={open}, high={high}, low={low}, close={close}")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

/// OHLCV candlestick data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Create a new candle with validation
    pub fn new(
        datetime: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, CandleValidationError> {
        let candle = Self {
            datetime,
            open,
            high,
            low,
            close,
            volume,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Validate the candle data
    pub fn validate(&self) -> Result<(), CandleValidationError> {
        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(CandleValidationError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(CandleValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        if self.volume < 0.0 {
            return Err(CandleValidationError::NegativeVolume(self.volume));
        }

        if self.close < self.low || self.close > self.high {
            return Err(CandleValidationError::CloseOutOfRange {
                close: self.close,
                low: self.low,
                high: self.high,
            });
        }

        Ok(())
    }
}

/// Rejection reasons for a closed-trade record
#[derive(Debug, Error, PartialEq)]
pub enum TradeRecordError {
    #[error("profit_ratio must be finite, got {0}")]
    NonFiniteProfit(f64),

    #[error("trade_duration must be a finite number of minutes >= 0, got {0}")]
    InvalidDuration(f64),
}

/// One closed trade as reported by the backtester to the hyperopt loss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    /// Signed fractional return (0.02 = +2%)
    pub profit_ratio: f64,
    /// Holding time in minutes
    pub trade_duration: f64,
}

impl TradeResult {
    pub fn new(profit_ratio: f64, trade_duration: f64) -> Result<Self, TradeRecordError> {
        let trade = Self {
            profit_ratio,
            trade_duration,
        };
        trade.validate()?;
        Ok(trade)
    }

    pub fn validate(&self) -> Result<(), TradeRecordError> {
        if !self.profit_ratio.is_finite() {
            return Err(TradeRecordError::NonFiniteProfit(self.profit_ratio));
        }
        if !self.trade_duration.is_finite() || self.trade_duration < 0.0 {
            return Err(TradeRecordError::InvalidDuration(self.trade_duration));
        }
        Ok(())
    }

    pub fn is_win(&self) -> bool {
        self.profit_ratio > 0.0
    }
}
