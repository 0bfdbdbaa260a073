//! Technical indicators powered by the `ta` crate
//!
//! Moving averages and crossover helpers used by the double MA strategy.
//! Every series has the same length as its input; warm-up positions are `None`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ta::indicators::SimpleMovingAverage;
use ta::Next;

/// Moving average flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaType {
    Sma,
    Ema,
    Wma,
}

impl MaType {
    pub const ALL: [MaType; 3] = [MaType::Sma, MaType::Ema, MaType::Wma];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaType::Sma => "SMA",
            MaType::Ema => "EMA",
            MaType::Wma => "WMA",
        }
    }
}

impl fmt::Display for MaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SMA" => Ok(MaType::Sma),
            "EMA" => Ok(MaType::Ema),
            "WMA" => Ok(MaType::Wma),
            other => Err(format!("unknown moving average type: {}", other)),
        }
    }
}

/// Calculate Simple Moving Average
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![None; values.len()];
    }

    let mut indicator = match SimpleMovingAverage::new(period) {
        Ok(i) => i,
        Err(_) => return vec![None; values.len()],
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let sma_val = indicator.next(value);
            (i + 1 >= period).then_some(sma_val)
        })
        .collect()
}

/// Calculate Exponential Moving Average (manual implementation - seeded with
/// the SMA of the first window, as TA-Lib does; `ta` seeds with the first value)
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.len() < period || period == 0 {
        return vec![None; values.len()];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    let mut ema = 0.0;

    for (i, &value) in values.iter().enumerate() {
        if i + 1 < period {
            result.push(None);
        } else if i + 1 == period {
            ema = values[..period].iter().sum::<f64>() / period as f64;
            result.push(Some(ema));
        } else {
            ema = (value - ema) * multiplier + ema;
            result.push(Some(ema));
        }
    }

    result
}

/// Calculate Weighted Moving Average (manual implementation - not in ta crate)
pub fn wma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![None; values.len()];
    }

    let weight_sum: f64 = (1..=period).map(|x| x as f64).sum();

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let weighted_sum: f64 = values[i + 1 - period..=i]
                .iter()
                .enumerate()
                .map(|(j, &v)| v * (j + 1) as f64)
                .sum();
            Some(weighted_sum / weight_sum)
        })
        .collect()
}

/// Moving average of the requested type
pub fn moving_average(values: &[f64], period: usize, ma_type: MaType) -> Vec<Option<f64>> {
    match ma_type {
        MaType::Sma => sma(values, period),
        MaType::Ema => ema(values, period),
        MaType::Wma => wma(values, period),
    }
}

/// True where `a` closes above `b` after being at or below it on the previous bar
pub fn crossed_above(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<bool> {
    crossed(a, b, |now_a, now_b, prev_a, prev_b| {
        now_a > now_b && prev_a <= prev_b
    })
}

/// True where `a` closes below `b` after being at or above it on the previous bar
pub fn crossed_below(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<bool> {
    crossed(a, b, |now_a, now_b, prev_a, prev_b| {
        now_a < now_b && prev_a >= prev_b
    })
}

fn crossed<F>(a: &[Option<f64>], b: &[Option<f64>], test: F) -> Vec<bool>
where
    F: Fn(f64, f64, f64, f64) -> bool,
{
    let len = a.len().min(b.len());
    (0..len)
        .map(|i| {
            if i == 0 {
                return false;
            }
            match (a[i], b[i], a[i - 1], b[i - 1]) {
                (Some(na), Some(nb), Some(pa), Some(pb)) => test(na, nb, pa, pb),
                _ => false,
            }
        })
        .collect()
}

/// First difference: `values[i] - values[i - 1]`
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            match (values[i], values[i - 1]) {
                (Some(now), Some(prev)) => Some(now - prev),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sma() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&values, 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_relative_eq!(result[2].unwrap(), 2.0);
        assert_relative_eq!(result[3].unwrap(), 3.0);
        assert_relative_eq!(result[4].unwrap(), 4.0);
    }

    #[test]
    fn test_ema() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema(&values, 3);

        assert_eq!(result.len(), values.len());
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        // Seeded with the SMA of the first window, then k = 0.5
        assert_relative_eq!(result[2].unwrap(), 2.0);
        assert_relative_eq!(result[3].unwrap(), 3.0);
        assert_relative_eq!(result[4].unwrap(), 4.0);
    }

    #[test]
    fn test_ema_seed_and_short_input() {
        let values = vec![10.0, 9.0, 8.0, 7.0, 6.0, 6.5, 9.0];
        let result = ema(&values, 3);
        assert_relative_eq!(result[2].unwrap(), 9.0);
        assert_relative_eq!(result[5].unwrap(), 6.75);
        assert_relative_eq!(result[6].unwrap(), 7.875);

        assert_eq!(ema(&[1.0, 2.0], 3), vec![None, None]);
    }

    #[test]
    fn test_wma() {
        let values = vec![1.0, 2.0, 3.0];
        let result = wma(&values, 3);
        // (1*1 + 2*2 + 3*3) / 6
        assert_relative_eq!(result[2].unwrap(), 14.0 / 6.0);
        assert_eq!(result[1], None);
    }

    #[test]
    fn test_zero_period_is_all_none() {
        let values = vec![1.0, 2.0];
        assert_eq!(sma(&values, 0), vec![None, None]);
        assert_eq!(ema(&values, 0), vec![None, None]);
        assert_eq!(wma(&values, 0), vec![None, None]);
    }

    #[test]
    fn test_moving_average_dispatch() {
        let values = vec![2.0, 4.0, 6.0, 8.0];
        assert_eq!(moving_average(&values, 2, MaType::Sma), sma(&values, 2));
        assert_eq!(moving_average(&values, 2, MaType::Wma), wma(&values, 2));
        assert_eq!(moving_average(&values, 2, MaType::Ema), ema(&values, 2));
    }

    #[test]
    fn test_crossed_above_and_below() {
        let fast = vec![None, Some(1.0), Some(3.0), Some(3.0), Some(1.0)];
        let slow = vec![Some(2.0), Some(2.0), Some(2.0), Some(2.0), Some(2.0)];

        assert_eq!(
            crossed_above(&fast, &slow),
            vec![false, false, true, false, false]
        );
        assert_eq!(
            crossed_below(&fast, &slow),
            vec![false, false, false, false, true]
        );
    }

    #[test]
    fn test_touch_then_cross_counts_once() {
        let fast = vec![Some(1.0), Some(2.0), Some(3.0)];
        let slow = vec![Some(2.0), Some(2.0), Some(2.0)];
        assert_eq!(crossed_above(&fast, &slow), vec![false, false, true]);
    }

    #[test]
    fn test_diff() {
        let values = vec![Some(1.0), Some(3.0), None, Some(4.0)];
        assert_eq!(diff(&values), vec![None, Some(2.0), None, None]);
    }

    #[test]
    fn test_ma_type_parse() {
        assert_eq!("ema".parse::<MaType>().unwrap(), MaType::Ema);
        assert_eq!("WMA".parse::<MaType>().unwrap(), MaType::Wma);
        assert!("HMA".parse::<MaType>().is_err());
        assert_eq!(serde_json::to_string(&MaType::Sma).unwrap(), "\"SMA\"");
    }
}
