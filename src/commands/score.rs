//! Score command implementation with progress tracking

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use double_ma_strategy::hyperopt::{self, LossBreakdown, ScoredTrial, Trial};
use double_ma_strategy::{data, Config};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use rayon::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parse a YYYY-MM-DD date as midnight UTC
fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .with_context(|| format!("Invalid date '{}'", s))
}

fn trial_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One label per trade file: the file stem, or the full path when stems collide.
/// Files passed more than once get their position appended.
fn trial_labels(paths: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = paths.iter().map(|p| trial_label(p)).collect();
    let stem_counts = stems.iter().counts();
    let labels: Vec<String> = paths
        .iter()
        .zip(&stems)
        .map(|(path, stem)| {
            if stem_counts[stem] > 1 {
                path.display().to_string()
            } else {
                stem.clone()
            }
        })
        .collect();

    let label_counts = labels.iter().counts();
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            if label_counts[label] > 1 {
                format!("{}#{}", label, i + 1)
            } else {
                label.clone()
            }
        })
        .collect()
}

/// Parse a `key=value` override. The value is read as JSON, or kept as a
/// string when it is not valid JSON.
fn parse_param(s: &str) -> Result<(String, Value)> {
    let (key, value) = s
        .split_once('=')
        .with_context(|| format!("Invalid parameter '{}', expected KEY=VALUE", s))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Invalid parameter '{}', empty key", s);
    }
    let value = value.trim();
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Strategy parameters stored next to a trade file as `<name>.json`
fn load_sidecar_params(trades_path: &Path) -> Result<Option<serde_json::Map<String, Value>>> {
    let path = trades_path.with_extension("json");
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read trial parameters {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse trial parameters {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => anyhow::bail!("Trial parameters in {} must be a JSON object", path.display()),
    }
}

/// Strategy mapping for one trial: the base config's, then the sidecar file,
/// then the command line overrides. `None` when nothing changes the base.
fn trial_strategy(
    base: &Config,
    sidecar: Option<serde_json::Map<String, Value>>,
    overrides: &[(String, Value)],
) -> Option<Value> {
    if sidecar.is_none() && overrides.is_empty() {
        return None;
    }
    let mut config = base.clone();
    for (key, value) in sidecar.into_iter().flatten() {
        config.set_strategy_param(&key, value);
    }
    for (key, value) in overrides {
        config.set_strategy_param(key, value.clone());
    }
    Some(config.strategy)
}

pub fn run(
    config_path: String,
    start: String,
    end: String,
    trade_count: Option<usize>,
    debug: bool,
    params: Vec<String>,
    trade_files: Vec<PathBuf>,
) -> Result<()> {
    info!("Starting trial scoring");

    let mut config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);
    if debug {
        config.hyperopt.debug = true;
    }

    let min_date = parse_date(&start)?;
    let max_date = parse_date(&end)?;

    let overrides = params
        .iter()
        .map(|p| parse_param(p))
        .collect::<Result<Vec<_>>>()?;

    let trials = trade_files
        .iter()
        .zip(trial_labels(&trade_files))
        .map(|(path, label)| -> Result<Trial> {
            let results = data::load_trades(path)?;
            let mut trial = Trial::new(label, results, min_date, max_date);
            if let Some(n) = trade_count {
                trial = trial.with_trade_count(n);
            }
            if let Some(strategy) = trial_strategy(&config, load_sidecar_params(path)?, &overrides) {
                debug!("Trial {} strategy: {}", trial.label, strategy);
                trial = trial.with_strategy(strategy);
            }
            Ok(trial)
        })
        .collect::<Result<Vec<_>>>()?;

    let loss = hyperopt::create_loss(&config)?;
    info!("Scoring {} trials with loss '{}'", trials.len(), loss.name());

    let pb = ProgressBar::new(trials.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("⚡ {percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}, {per_sec:.2}] ✓ {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█░ "),
    );

    let mut scored: Vec<ScoredTrial> = trials
        .par_iter()
        .map(|trial| {
            let result = hyperopt::score_trial(loss.as_ref(), trial, &config);
            pb.inc(1);
            result
        })
        .collect();

    pb.finish_with_message(format!("{} scored", scored.len()));
    println!();

    hyperopt::sort_scored(&mut scored);

    println!("\n{}", "=".repeat(60));
    println!("TRIAL RANKING ({} to {})", start, end);
    println!("{}", "=".repeat(60));
    println!("{:<4} {:>10} {:>7} | Trial", "Rank", "Loss", "Trades");
    println!("{}", "-".repeat(60));
    for (i, s) in scored.iter().enumerate() {
        println!("{:<4} {:>10.6} {:>7} | {}", i + 1, s.loss, s.trade_count, s.label);
    }
    println!("{}", "=".repeat(60));

    if config.hyperopt.loss == hyperopt::DOUBLE_MA_LOSS {
        if let Some(best) = scored
            .first()
            .and_then(|s| trials.iter().find(|t| t.label == s.label))
        {
            let breakdown = LossBreakdown::compute(
                &best.results,
                best.trade_count,
                best.min_date,
                best.max_date,
                &best.config(&config),
            );
            println!("\nBest trial: {}", best.label);
            println!("{}", breakdown);
        }
    }

    info!("Scoring completed successfully");
    Ok(())
}
