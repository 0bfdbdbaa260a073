//! Hyperopt loss functions
//!
//! A loss turns the closed trades of one optimizer trial into a single
//! scalar; the optimizer keeps the trial with the lowest value.

pub mod double_ma_loss;

pub use double_ma_loss::{DoubleMaHyperOptLoss, LossBreakdown};

use crate::{Config, TradeResult};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

/// Registry name of the double MA loss
pub const DOUBLE_MA_LOSS: &str = "double_ma";

/// Trial scoring contract. Implementations must be pure: the same inputs
/// always give the same loss, and nothing is mutated.
pub trait HyperOptLoss: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score one trial, lower is better.
    ///
    /// `trade_count` is authoritative for count-based terms even when it
    /// differs from `results.len()`.
    fn hyperopt_loss(
        &self,
        results: &[TradeResult],
        trade_count: usize,
        min_date: DateTime<Utc>,
        max_date: DateTime<Utc>,
        config: &Config,
    ) -> f64;
}

// =============================================================================
// Loss registry
// =============================================================================

pub type LossFactory = fn(&Config) -> Box<dyn HyperOptLoss>;

fn create_double_ma_loss(config: &Config) -> Box<dyn HyperOptLoss> {
    Box::new(DoubleMaHyperOptLoss::with_debug(config.hyperopt.debug))
}

static REGISTRY: OnceLock<RwLock<HashMap<&'static str, LossFactory>>> = OnceLock::new();

fn get_registry() -> &'static RwLock<HashMap<&'static str, LossFactory>> {
    REGISTRY.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert(DOUBLE_MA_LOSS, create_double_ma_loss as LossFactory);
        RwLock::new(map)
    })
}

/// Create the loss named by `config.hyperopt.loss`
pub fn create_loss(config: &Config) -> Result<Box<dyn HyperOptLoss>> {
    let name = config.hyperopt.loss.as_str();
    let factory = {
        let registry = get_registry()
            .read()
            .map_err(|_| anyhow::anyhow!("loss registry lock poisoned"))?;
        registry.get(name).copied().ok_or_else(|| {
            let mut available: Vec<_> = registry.keys().copied().collect();
            available.sort_unstable();
            anyhow::anyhow!(
                "Unknown hyperopt loss: '{}'. Available: {}",
                name,
                available.join(", ")
            )
        })?
    };
    Ok(factory(config))
}

pub fn available_losses() -> Vec<&'static str> {
    let registry = get_registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut names: Vec<_> = registry.keys().copied().collect();
    names.sort_unstable();
    names
}

// =============================================================================
// Trials
// =============================================================================

/// Closed trades of one optimizer trial
#[derive(Debug, Clone)]
pub struct Trial {
    pub label: String,
    pub results: Vec<TradeResult>,
    pub trade_count: usize,
    pub min_date: DateTime<Utc>,
    pub max_date: DateTime<Utc>,
    /// Strategy mapping the trial was run with; `None` scores with the base config's
    pub strategy: Option<serde_json::Value>,
}

impl Trial {
    /// Trial whose trade count is the number of records
    pub fn new(
        label: impl Into<String>,
        results: Vec<TradeResult>,
        min_date: DateTime<Utc>,
        max_date: DateTime<Utc>,
    ) -> Self {
        let trade_count = results.len();
        Trial {
            label: label.into(),
            results,
            trade_count,
            min_date,
            max_date,
            strategy: None,
        }
    }

    pub fn with_trade_count(mut self, trade_count: usize) -> Self {
        self.trade_count = trade_count;
        self
    }

    pub fn with_strategy(mut self, strategy: serde_json::Value) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Config this trial is scored under
    pub fn config<'a>(&self, base: &'a Config) -> Cow<'a, Config> {
        match &self.strategy {
            Some(strategy) => Cow::Owned(Config {
                strategy: strategy.clone(),
                ..base.clone()
            }),
            None => Cow::Borrowed(base),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTrial {
    pub label: String,
    pub loss: f64,
    pub trade_count: usize,
}

/// Score one trial under its own strategy mapping, falling back to `config`'s
pub fn score_trial(loss: &dyn HyperOptLoss, trial: &Trial, config: &Config) -> ScoredTrial {
    let config = trial.config(config);
    ScoredTrial {
        label: trial.label.clone(),
        loss: loss.hyperopt_loss(
            &trial.results,
            trial.trade_count,
            trial.min_date,
            trial.max_date,
            &config,
        ),
        trade_count: trial.trade_count,
    }
}

/// Best first, ties broken by label
pub fn sort_scored(scored: &mut [ScoredTrial]) {
    scored.sort_by(|a, b| {
        a.loss
            .partial_cmp(&b.loss)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
}

/// Score every trial in parallel and rank them
pub fn rank_trials(loss: &dyn HyperOptLoss, trials: &[Trial], config: &Config) -> Vec<ScoredTrial> {
    let mut scored: Vec<ScoredTrial> = trials
        .par_iter()
        .map(|trial| score_trial(loss, trial, config))
        .collect();
    sort_scored(&mut scored);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn trial(label: &str, profits: &[f64]) -> Trial {
        let results = profits
            .iter()
            .map(|&p| TradeResult::new(p, 120.0).unwrap())
            .collect();
        Trial::new(label, results, date(1), date(31))
    }

    #[test]
    fn test_create_loss_default() {
        let loss = create_loss(&Config::default()).unwrap();
        assert_eq!(loss.name(), DOUBLE_MA_LOSS);
        assert_eq!(available_losses(), vec![DOUBLE_MA_LOSS]);
    }

    #[test]
    fn test_create_loss_unknown() {
        let mut config = Config::default();
        config.hyperopt.loss = "sharpe".to_string();
        let err = create_loss(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown hyperopt loss: 'sharpe'"));
    }

    #[test]
    fn test_rank_trials_best_first() {
        let loss = DoubleMaHyperOptLoss::new();
        let trials = vec![
            trial("losing", &[-0.05, -0.02, 0.01]),
            trial("winning", &[0.3, -0.05, 0.4, 0.2, -0.05, 0.3]),
            trial("flat", &[0.01, -0.01]),
        ];
        let ranked = rank_trials(&loss, &trials, &Config::default());

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].label, "winning");
        assert_eq!(ranked[2].label, "losing");
        assert!(ranked.windows(2).all(|w| w[0].loss <= w[1].loss));
    }

    #[test]
    fn test_rank_trials_ties_by_label() {
        let loss = DoubleMaHyperOptLoss::new();
        let trials = vec![trial("b", &[0.02]), trial("a", &[0.02])];
        let ranked = rank_trials(&loss, &trials, &Config::default());
        assert_eq!(ranked[0].label, "a");
        assert_eq!(ranked[0].loss, ranked[1].loss);
    }

    #[test]
    fn test_rank_trials_uses_each_trial_strategy() {
        let loss = DoubleMaHyperOptLoss::new();
        let profits = [0.02, -0.01, 0.03, 0.01];
        let trials = vec![
            trial("close", &profits)
                .with_strategy(serde_json::json!({ "fast_ma_period": 29, "slow_ma_period": 30 })),
            trial("spread", &profits)
                .with_strategy(serde_json::json!({ "fast_ma_period": 10, "slow_ma_period": 30 })),
        ];
        let ranked = rank_trials(&loss, &trials, &Config::default());

        assert_eq!(ranked[0].label, "spread");
        assert_eq!(ranked[1].label, "close");
        assert!(ranked[0].loss < ranked[1].loss);
    }

    #[test]
    fn test_trial_config_falls_back_to_base() {
        let base = Config::with_strategy(serde_json::json!({ "fast_ma_period": 12 }));
        let plain = trial("plain", &[0.01]);
        assert_eq!(plain.config(&base).strategy["fast_ma_period"], 12);

        let own = plain.with_strategy(serde_json::json!({ "fast_ma_period": 8 }));
        let config = own.config(&base);
        assert_eq!(config.strategy["fast_ma_period"], 8);
        assert_eq!(config.hyperopt.loss, base.hyperopt.loss);
    }

    #[test]
    fn test_trade_count_override() {
        let t = trial("x", &[0.02, 0.01]).with_trade_count(80);
        assert_eq!(t.results.len(), 2);
        let scored = score_trial(&DoubleMaHyperOptLoss::new(), &t, &Config::default());
        assert_eq!(scored.trade_count, 80);
    }
}
