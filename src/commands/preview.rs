//! Preview command implementation

use anyhow::Result;
use double_ma_strategy::data::{self, DataPreview};
use double_ma_strategy::Candle;
use std::path::PathBuf;
use tracing::info;

fn print_candles(candles: &[Candle]) {
    println!(
        "  {:<20} {:>12} {:>12} {:>12} {:>12} {:>14}",
        "datetime", "open", "high", "low", "close", "volume"
    );
    for c in candles {
        println!(
            "  {:<20} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>14.2}",
            c.datetime.format("%Y-%m-%d %H:%M:%S"),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume
        );
    }
}

fn print_preview(preview: &DataPreview) {
    println!("\n{}", "=".repeat(60));
    println!("{} PREVIEW", preview.file_name);
    println!("{}", "=".repeat(60));
    println!("Rows:               {}", preview.rows);
    println!("Columns:            {}", preview.columns.len());
    match (preview.first_date, preview.last_date) {
        (Some(first), Some(last)) => println!("Date range:         {} to {}", first, last),
        _ => println!("Date range:         n/a"),
    }
    println!("File size:          {:.2} MB", preview.file_size_mb());

    println!("\nColumns:");
    for (i, col) in preview.columns.iter().enumerate() {
        println!("  {}. {}", i + 1, col);
    }

    println!("\nFirst {} rows:", preview.head.len());
    print_candles(&preview.head);

    println!("\nLast {} rows:", preview.tail.len());
    print_candles(&preview.tail);

    if let Some(close) = &preview.close {
        println!("\nClose price:");
        println!("  Max:              {:.2}", close.max);
        println!("  Min:              {:.2}", close.min);
        println!("  Mean:             {:.2}", close.mean);
        println!("  Last:             {:.2}", close.last);
    }
    println!("{}", "=".repeat(60));
}

pub fn run(file: PathBuf) -> Result<()> {
    info!("Previewing {}", file.display());
    let preview = data::preview_file(&file)?;
    print_preview(&preview);
    Ok(())
}
