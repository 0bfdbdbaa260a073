//! Trading Strategies Module
//!
//! Strategy framework with:
//! - Narrow trait interface the host calls per candle batch
//! - Dynamic strategy registry (no hardcoded names)

pub mod double_ma;

use crate::frame::{FrameError, SignalFrame};
use crate::{Candle, Config};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

// =============================================================================
// Strategy Trait - The contract all strategies must implement
// =============================================================================

/// Trading strategy trait.
///
/// The host calls the three `populate_*` methods in order for every batch of
/// candles. The remaining callbacks are optional and default to neutral
/// answers (accept every trade, no leverage, stake as proposed).
pub trait Strategy: Send + Sync {
    /// Strategy identifier (must match config's strategy name)
    fn name(&self) -> &'static str;

    /// Candle timeframe the strategy is designed for (e.g. "1h")
    fn timeframe(&self) -> &str;

    /// Number of leading candles needed before signals are meaningful
    fn startup_candle_count(&self) -> usize;

    /// Compute every indicator column the signal callbacks need
    fn populate_indicators(&self, candles: &[Candle]) -> SignalFrame;

    /// Fill the `enter_long` column
    fn populate_entry_trend(&self, frame: &mut SignalFrame) -> Result<(), FrameError>;

    /// Fill the `exit_long` column
    fn populate_exit_trend(&self, frame: &mut SignalFrame) -> Result<(), FrameError>;

    /// Run the full indicator and signal pipeline
    fn analyze(&self, candles: &[Candle]) -> Result<SignalFrame, FrameError> {
        let mut frame = self.populate_indicators(candles);
        self.populate_entry_trend(&mut frame)?;
        self.populate_exit_trend(&mut frame)?;
        Ok(frame)
    }

    /// Last chance to veto an entry order
    fn confirm_trade_entry(&self, _pair: &str, _rate: f64, _current_time: DateTime<Utc>) -> bool {
        true
    }

    /// Last chance to veto an exit order
    fn confirm_trade_exit(
        &self,
        _pair: &str,
        _exit_reason: &str,
        _rate: f64,
        _current_time: DateTime<Utc>,
    ) -> bool {
        true
    }

    /// Leverage to apply to a new position
    fn leverage(&self, _pair: &str, _proposed_leverage: f64, _max_leverage: f64) -> f64 {
        1.0
    }

    /// Stake to commit to a new position
    fn custom_stake_amount(
        &self,
        _pair: &str,
        proposed_stake: f64,
        _min_stake: Option<f64>,
        _max_stake: f64,
    ) -> f64 {
        proposed_stake
    }
}

// =============================================================================
// Strategy Factory - Type alias for strategy constructor functions
// =============================================================================

/// Factory function type for creating strategies from config
pub type StrategyFactory = fn(&Config) -> Result<Box<dyn Strategy>>;

// =============================================================================
// Strategy Registry - Dynamic registration without hardcoding
// =============================================================================

static REGISTRY: OnceLock<RwLock<HashMap<&'static str, StrategyFactory>>> = OnceLock::new();

fn get_registry() -> &'static RwLock<HashMap<&'static str, StrategyFactory>> {
    REGISTRY.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert(double_ma::NAME, double_ma::create as StrategyFactory);
        RwLock::new(map)
    })
}

/// Create a strategy from configuration
pub fn create_strategy(config: &Config) -> Result<Box<dyn Strategy>> {
    let strategy_name = config.strategy_name()?;

    let factory = {
        let registry = get_registry()
            .read()
            .map_err(|_| anyhow::anyhow!("strategy registry lock poisoned"))?;
        registry.get(strategy_name.as_str()).copied().ok_or_else(|| {
            let mut available: Vec<_> = registry.keys().copied().collect();
            available.sort_unstable();
            anyhow::anyhow!(
                "Unknown strategy: '{}'. Available: {}",
                strategy_name,
                available.join(", ")
            )
        })?
    };

    factory(config)
}

/// Get list of available strategy names
pub fn available_strategies() -> Vec<&'static str> {
    let registry = get_registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut names: Vec<_> = registry.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Register a new strategy (for plugins or testing)
pub fn register_strategy(name: &'static str, factory: StrategyFactory) {
    get_registry()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(name, factory);
}
