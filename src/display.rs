use anyhow::Result;
use chrono::NaiveDateTime;
use clap::ValueEnum;
use market_reshaper::{AggregationMode, LongRecord};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Summary,
    Json,
    Csv,
}

/// `12.50 EUR/MW`; missing values render as `-`.
pub fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.2} {}", v, unit),
        None => "-".to_string(),
    }
}

pub fn format_timestamp(ts: NaiveDateTime, aggregation: AggregationMode) -> String {
    match aggregation {
        AggregationMode::DailyMean => ts.format("%Y-%m-%d").to_string(),
        AggregationMode::Raw => ts.format("%Y-%m-%d %H:%M").to_string(),
    }
}

pub fn header(title: &str) {
    println!("\n{}", title);
    println!("{}", "=".repeat(60));
}

pub fn print_json<T: Serialize>(rows: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

pub fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Prints at most `max_rows` lines and notes how many were left out.
pub fn print_limited(lines: &[String], max_rows: usize) {
    for line in lines.iter().take(max_rows) {
        println!("{}", line);
    }
    if lines.len() > max_rows {
        println!("  ... ({} more rows)", lines.len() - max_rows);
    }
}

/// One block per series label, rows in input order.
pub fn print_long_series(records: &[LongRecord], unit: &str, aggregation: AggregationMode, max_rows: usize) {
    let mut series: BTreeMap<String, Vec<&LongRecord>> = BTreeMap::new();
    for record in records {
        series.entry(record.series_label()).or_default().push(record);
    }

    for (label, rows) in series {
        println!("\n📍 {} ({} rows)", label, rows.len());
        let lines: Vec<String> = rows
            .iter()
            .map(|r| {
                format!(
                    "  {:<18} {}",
                    format_timestamp(r.timestamp, aggregation),
                    format_value(r.value, unit)
                )
            })
            .collect();
        print_limited(&lines, max_rows);
    }
}
