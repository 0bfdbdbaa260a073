//! Column-oriented candle table passed between strategy callbacks
//!
//! Holds the raw candles plus named numeric series (indicators) and named
//! boolean flags (crossovers), and the `enter_long` / `exit_long` columns
//! the strategy fills in.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use itertools::Itertools;
use thiserror::Error;

use crate::Candle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("missing column '{0}'; run populate_indicators first")]
    MissingColumn(String),

    #[error("column '{name}' has {actual} rows, frame has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SignalFrame {
    candles: Vec<Candle>,
    series: BTreeMap<String, Vec<Option<f64>>>,
    flags: BTreeMap<String, Vec<bool>>,
    pub enter_long: Vec<bool>,
    pub exit_long: Vec<bool>,
}

impl SignalFrame {
    pub fn new(candles: Vec<Candle>) -> Self {
        let len = candles.len();
        SignalFrame {
            candles,
            series: BTreeMap::new(),
            flags: BTreeMap::new(),
            enter_long: vec![false; len],
            exit_long: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn close(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volume(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    pub fn insert_series(
        &mut self,
        name: &str,
        values: Vec<Option<f64>>,
    ) -> Result<(), FrameError> {
        self.check_len(name, values.len())?;
        self.series.insert(name.to_string(), values);
        Ok(())
    }

    pub fn insert_flag(&mut self, name: &str, values: Vec<bool>) -> Result<(), FrameError> {
        self.check_len(name, values.len())?;
        self.flags.insert(name.to_string(), values);
        Ok(())
    }

    pub fn series(&self, name: &str) -> Result<&[Option<f64>], FrameError> {
        self.series
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    pub fn flag(&self, name: &str) -> Result<&[bool], FrameError> {
        self.flags
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    pub fn entry_count(&self) -> usize {
        self.enter_long.iter().filter(|&&e| e).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exit_long.iter().filter(|&&e| e).count()
    }

    fn check_len(&self, name: &str, actual: usize) -> Result<(), FrameError> {
        if actual != self.len() {
            return Err(FrameError::LengthMismatch {
                name: name.to_string(),
                expected: self.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Header row: candle columns, then series, flags and signal columns
    pub fn column_names(&self) -> Vec<String> {
        ["date", "open", "high", "low", "close", "volume"]
            .iter()
            .map(|s| s.to_string())
            .chain(self.series.keys().cloned())
            .chain(self.flags.keys().cloned())
            .chain(["enter_long".to_string(), "exit_long".to_string()])
            .collect()
    }

    /// Render one row as strings, in `column_names` order
    pub fn row(&self, i: usize) -> Vec<String> {
        let c = &self.candles[i];
        let mut row = vec![
            c.datetime.to_rfc3339(),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
        ];
        row.extend(
            self.series
                .values()
                .map(|s| s[i].map(|v| format!("{:.6}", v)).unwrap_or_default()),
        );
        row.extend(self.flags.values().map(|f| (f[i] as u8).to_string()));
        row.push((self.enter_long[i] as u8).to_string());
        row.push((self.exit_long[i] as u8).to_string());
        row
    }

    /// Write the whole frame as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.column_names())
            .context("Failed to write CSV header")?;
        for i in 0..self.len() {
            wtr.write_record(self.row(i))
                .with_context(|| format!("Failed to write row {}", i + 1))?;
        }
        wtr.flush().context("Failed to flush CSV writer")?;
        Ok(())
    }

    /// Short textual summary of the registered columns
    pub fn describe(&self) -> String {
        format!(
            "{} rows | series: [{}] | flags: [{}]",
            self.len(),
            self.series.keys().join(", "),
            self.flags.keys().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candles(n: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| Candle {
                datetime: start + Duration::hours(i as i64),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0 + i as f64 * 0.1,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn test_insert_and_read_columns() {
        let mut frame = SignalFrame::new(candles(3));
        frame
            .insert_series("fast_ma", vec![None, Some(1.0), Some(2.0)])
            .unwrap();
        frame.insert_flag("cross", vec![false, true, false]).unwrap();

        assert_eq!(frame.series("fast_ma").unwrap()[1], Some(1.0));
        assert!(frame.flag("cross").unwrap()[1]);
        assert_eq!(
            frame.series("slow_ma"),
            Err(FrameError::MissingColumn("slow_ma".to_string()))
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut frame = SignalFrame::new(candles(3));
        let err = frame.insert_flag("cross", vec![true]).unwrap_err();
        assert_eq!(
            err,
            FrameError::LengthMismatch {
                name: "cross".to_string(),
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn test_write_csv() {
        let mut frame = SignalFrame::new(candles(2));
        frame.insert_series("fast_ma", vec![None, Some(1.5)]).unwrap();
        frame.enter_long[1] = true;

        let mut buf = Vec::new();
        frame.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "date,open,high,low,close,volume,fast_ma,enter_long,exit_long"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",,0,0"));
        assert!(lines[2].ends_with(",1.500000,1,0"));
        assert_eq!(frame.entry_count(), 1);
        assert_eq!(frame.exit_count(), 0);
    }
}
