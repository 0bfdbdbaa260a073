//! Data loading
//!
//! Candles are read from CSV files (`datetime,open,high,low,close,volume`
//! layout) or from Feather (Arrow IPC) files with a datetime `date` column and
//! the usual OHLCV columns. Closed-trade records are CSV with at least
//! `profit_ratio` and `trade_duration` columns.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use polars::prelude::{DataFrame, DataType, IpcReader, SerReader, TimeUnit};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{Candle, TradeResult};

/// Rows shown at each end of a preview
pub const PREVIEW_ROWS: usize = 5;

/// Extensions read as Feather (Arrow IPC) candle files
pub const FEATHER_EXTENSIONS: [&str; 3] = ["feather", "arrow", "ipc"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

pub fn is_feather(path: &Path) -> bool {
    has_extension(path, &FEATHER_EXTENSIONS)
}

// =============================================================================
// CSV Data Loading
// =============================================================================

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Try parsing without timezone and assume UTC
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        })
        .with_context(|| format!("Failed to parse datetime: {}", s))
}

fn parse_field(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64> {
    record
        .get(idx)
        .with_context(|| format!("Missing {} column", name))?
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse {}", name))
}

/// Load OHLCV data from CSV file
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut candles = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 1;
        let record = result.with_context(|| format!("Failed to read row {}", row))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let candle = Candle {
            datetime: parse_datetime(dt_str.trim()).with_context(|| format!("Row {}", row))?,
            open: parse_field(&record, 1, "open").with_context(|| format!("Row {}", row))?,
            high: parse_field(&record, 2, "high").with_context(|| format!("Row {}", row))?,
            low: parse_field(&record, 3, "low").with_context(|| format!("Row {}", row))?,
            close: parse_field(&record, 4, "close").with_context(|| format!("Row {}", row))?,
            volume: parse_field(&record, 5, "volume").with_context(|| format!("Row {}", row))?,
        };
        candles.push(candle);
    }

    let report = validate_candles(&candles);
    for warning in &report.warnings {
        warn!(file = %path.display(), "{}", warning);
    }
    for error in &report.errors {
        warn!(file = %path.display(), "{}", error);
    }

    debug!(rows = candles.len(), file = %path.display(), "Loaded candles");
    Ok(candles)
}

// =============================================================================
// Feather Data Loading
// =============================================================================

fn read_feather(path: &Path) -> Result<DataFrame> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open feather file {}", path.display()))?;
    IpcReader::new(file)
        .finish()
        .with_context(|| format!("Failed to read feather file {}", path.display()))
}

fn timestamp_to_utc(value: i64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .with_context(|| format!("Missing {} column", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("{} column is not numeric", name))?;
    let values = column.f64().with_context(|| format!("{} column type", name))?;
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.with_context(|| format!("Row {}: null {}", i + 1, name)))
        .collect()
}

fn candles_from_frame(df: &DataFrame) -> Result<Vec<Candle>> {
    let date = df.column("date").context("Missing date column")?;
    let unit = match date.dtype() {
        DataType::Datetime(unit, _) => *unit,
        other => anyhow::bail!("date column has type {}, expected datetime", other),
    };
    let stamps = date.cast(&DataType::Int64).context("date column cast")?;
    let stamps = stamps.i64().context("date column type")?;

    let open = float_column(df, "open")?;
    let high = float_column(df, "high")?;
    let low = float_column(df, "low")?;
    let close = float_column(df, "close")?;
    let volume = float_column(df, "volume")?;

    stamps
        .into_iter()
        .enumerate()
        .map(|(i, stamp)| {
            let datetime = stamp
                .and_then(|v| timestamp_to_utc(v, unit))
                .with_context(|| format!("Row {}: invalid date", i + 1))?;
            Ok(Candle {
                datetime,
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                volume: volume[i],
            })
        })
        .collect()
}

/// Load OHLCV data from a Feather (Arrow IPC) file
pub fn load_feather(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let candles = candles_from_frame(&read_feather(path)?)
        .with_context(|| format!("Invalid candle data in {}", path.display()))?;

    let report = validate_candles(&candles);
    for issue in report.warnings.iter().chain(&report.errors) {
        warn!(file = %path.display(), "{}", issue);
    }

    debug!(rows = candles.len(), file = %path.display(), "Loaded candles");
    Ok(candles)
}

/// Load candles, picking the reader from the file extension
pub fn load_candles(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    if is_feather(path) {
        load_feather(path)
    } else {
        load_csv(path)
    }
}

/// Load closed-trade records, rejecting malformed rows
pub fn load_trades(path: impl AsRef<Path>) -> Result<Vec<TradeResult>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open trades file {}", path.display()))?;

    let mut trades = Vec::new();
    for (row_idx, result) in reader.deserialize::<TradeResult>().enumerate() {
        let row = row_idx + 1;
        let trade = result.with_context(|| format!("Failed to read trade row {}", row))?;
        trade
            .validate()
            .with_context(|| format!("Invalid trade at row {}", row))?;
        trades.push(trade);
    }

    debug!(trades = trades.len(), file = %path.display(), "Loaded trades");
    Ok(trades)
}

// =============================================================================
// Data Preview
// =============================================================================

/// Close price summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloseStats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub last: f64,
}

/// Summary of one candle file
#[derive(Debug, Clone, Serialize)]
pub struct DataPreview {
    pub file_name: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub first_date: Option<DateTime<Utc>>,
    pub last_date: Option<DateTime<Utc>>,
    pub file_size: u64,
    pub head: Vec<Candle>,
    pub tail: Vec<Candle>,
    pub close: Option<CloseStats>,
}

impl DataPreview {
    pub fn file_size_mb(&self) -> f64 {
        self.file_size as f64 / 1024.0 / 1024.0
    }
}

fn mean(values: &[f64]) -> f64 {
    use statrs::statistics::Statistics;
    values.mean()
}

fn build_preview(path: &Path, columns: Vec<String>, candles: Vec<Candle>) -> Result<DataPreview> {
    let file_size = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();

    let close = if candles.is_empty() {
        None
    } else {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        Some(CloseStats {
            max: closes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: closes.iter().copied().fold(f64::INFINITY, f64::min),
            mean: mean(&closes),
            last: closes[closes.len() - 1],
        })
    };

    let tail_start = candles.len().saturating_sub(PREVIEW_ROWS);

    Ok(DataPreview {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        rows: candles.len(),
        columns,
        first_date: candles.iter().map(|c| c.datetime).min(),
        last_date: candles.iter().map(|c| c.datetime).max(),
        file_size,
        head: candles.iter().take(PREVIEW_ROWS).cloned().collect(),
        tail: candles[tail_start..].to_vec(),
        close,
    })
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

/// Build a preview of a candle CSV file
pub fn preview_csv(path: impl AsRef<Path>) -> Result<DataPreview> {
    let path = path.as_ref();
    ensure_exists(path)?;

    let columns: Vec<String> = csv::Reader::from_path(path)
        .context("Failed to open CSV file")?
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    build_preview(path, columns, load_csv(path)?)
}

/// Build a preview of a candle Feather file
pub fn preview_feather(path: impl AsRef<Path>) -> Result<DataPreview> {
    let path = path.as_ref();
    ensure_exists(path)?;

    let df = read_feather(path)?;
    let columns = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    let candles = candles_from_frame(&df)
        .with_context(|| format!("Invalid candle data in {}", path.display()))?;

    build_preview(path, columns, candles)
}

/// Build a preview of a candle file of either format
pub fn preview_file(path: impl AsRef<Path>) -> Result<DataPreview> {
    let path = path.as_ref();
    if is_feather(path) {
        preview_feather(path)
    } else {
        preview_csv(path)
    }
}

/// All candle files (`.csv` and Feather) under `dir`, sorted
pub fn find_data_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            if path.is_dir() {
                walk(&path, out)?;
            } else if has_extension(&path, &["csv"]) || is_feather(&path) {
                out.push(path);
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(dir.as_ref(), &mut files)?;
    files.sort();
    Ok(files)
}

// =============================================================================
// Data Validation
// =============================================================================

/// Validate candle data for consistency
pub fn validate_candles(candles: &[Candle]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (i, candle) in candles.iter().enumerate() {
        if let Err(e) = candle.validate() {
            errors.push(format!("Candle {}: {}", i, e));
        }
        if i > 0 && candle.datetime <= candles[i - 1].datetime {
            warnings.push(format!("Candle {}: not chronological", i));
        }
    }

    ValidationResult { errors, warnings }
}

/// Result of data validation
#[derive(Debug)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
