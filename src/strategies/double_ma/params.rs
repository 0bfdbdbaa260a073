//! Hyperopt search space for the Double MA Strategy
//!
//! Every optimizable parameter is listed here with its type, bounds and
//! default, so an external search driver can sample trials without knowing
//! anything about the strategy internals.

use serde::Serialize;
use serde_json::{json, Value};

use super::config::DoubleMaConfig;
use crate::indicators::MaType;

/// Hyperopt space a parameter belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSpace {
    Buy,
    Sell,
}

/// Parameter domain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterKind {
    Int { low: i64, high: i64, default: i64 },
    Decimal { low: f64, high: f64, default: f64, decimals: u32 },
    Categorical { options: Vec<&'static str>, default: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub space: SearchSpace,
    pub optimize: bool,
    #[serde(flatten)]
    pub kind: ParameterKind,
}

impl ParameterSpec {
    fn new(name: &'static str, kind: ParameterKind) -> Self {
        ParameterSpec {
            name,
            space: SearchSpace::Buy,
            optimize: true,
            kind,
        }
    }

    pub fn default_value(&self) -> Value {
        match &self.kind {
            ParameterKind::Int { default, .. } => json!(default),
            ParameterKind::Decimal { default, .. } => json!(default),
            ParameterKind::Categorical { default, .. } => json!(default),
        }
    }

    /// Whether `value` is a legal sample for this parameter
    pub fn contains(&self, value: &Value) -> bool {
        match &self.kind {
            ParameterKind::Int { low, high, .. } => value
                .as_i64()
                .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .is_some_and(|v| (*low..=*high).contains(&v)),
            ParameterKind::Decimal { low, high, .. } => value
                .as_f64()
                .is_some_and(|v| v >= *low && v <= *high),
            ParameterKind::Categorical { options, .. } => value
                .as_str()
                .is_some_and(|v| options.iter().any(|o| o.eq_ignore_ascii_case(v))),
        }
    }
}

/// All optimizable parameters of the strategy
pub fn search_space() -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::new(
            "fast_ma_period",
            ParameterKind::Int { low: 5, high: 50, default: 10 },
        ),
        ParameterSpec::new(
            "slow_ma_period",
            ParameterKind::Int { low: 20, high: 100, default: 30 },
        ),
        ParameterSpec::new(
            "ma_type",
            ParameterKind::Categorical {
                options: MaType::ALL.iter().map(MaType::as_str).collect(),
                default: MaType::Ema.as_str(),
            },
        ),
        ParameterSpec::new(
            "min_volume_multiplier",
            ParameterKind::Decimal { low: 0.5, high: 3.0, default: 1.0, decimals: 3 },
        ),
        ParameterSpec::new(
            "trend_filter_period",
            ParameterKind::Int { low: 50, high: 200, default: 100 },
        ),
    ]
}

/// Strategy mapping holding the default of every parameter
pub fn default_params() -> Value {
    Value::Object(
        search_space()
            .into_iter()
            .map(|spec| (spec.name.to_string(), spec.default_value()))
            .collect(),
    )
}

/// Names of parameters whose configured value lies outside the search space
pub fn out_of_bounds(config: &DoubleMaConfig) -> Vec<&'static str> {
    let current = json!({
        "fast_ma_period": config.fast_ma_period,
        "slow_ma_period": config.slow_ma_period,
        "ma_type": config.ma_type.as_str(),
        "min_volume_multiplier": config.min_volume_multiplier,
        "trend_filter_period": config.trend_filter_period,
    });

    search_space()
        .into_iter()
        .filter(|spec| !spec.contains(&current[spec.name]))
        .map(|spec| spec.name)
        .collect()
}
