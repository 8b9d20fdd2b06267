use crate::dashboard::ViewContext;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use market_reshaper::reshape::to_long;
use market_reshaper::{LongRecord, MeasureKind, SchemaMapping, Table};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Long-format table as a DataFrame: `timestamp`, `zone`, `kind`, `value`.
pub fn long_dataframe(records: &[LongRecord]) -> Result<DataFrame> {
    let timestamps: Vec<i64> = records
        .iter()
        .map(|r| r.timestamp.and_utc().timestamp_millis())
        .collect();
    let zones: Vec<Option<String>> = records.iter().map(|r| r.zone.clone()).collect();
    let kinds: Vec<String> = records.iter().map(|r| r.kind.clone()).collect();
    let values: Vec<Option<f64>> = records.iter().map(|r| r.value).collect();

    let timestamp = Series::new("timestamp", timestamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    Ok(DataFrame::new(vec![
        timestamp,
        Series::new("zone", zones),
        Series::new("kind", kinds),
        Series::new("value", values),
    ])?)
}

fn long_for(table: &Table, schema: &SchemaMapping, kind: MeasureKind) -> Result<Vec<LongRecord>> {
    let columns = schema.columns_of_kind(kind);
    Ok(to_long(table, &columns, schema)?)
}

/// Saves one DataFrame as CSV, Parquet and Arrow IPC next to each other.
fn save_all_formats(df: &mut DataFrame, output_dir: &Path, base_name: &str) -> Result<Vec<PathBuf>> {
    let csv_path = output_dir.join(format!("{}.csv", base_name));
    CsvWriter::new(std::fs::File::create(&csv_path)?).finish(df)?;

    let parquet_path = output_dir.join(format!("{}.parquet", base_name));
    ParquetWriter::new(std::fs::File::create(&parquet_path)?).finish(df)?;

    let arrow_path = output_dir.join(format!("{}.arrow", base_name));
    IpcWriter::new(std::fs::File::create(&arrow_path)?).finish(df)?;

    Ok(vec![csv_path, parquet_path, arrow_path])
}

pub fn export(ctx: &ViewContext, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let datasets = vec![
        ("mfrr_prices_long", long_for(&ctx.mfrr, &ctx.mfrr_schema, MeasureKind::Price)?),
        ("mfrr_volumes_long", long_for(&ctx.mfrr, &ctx.mfrr_schema, MeasureKind::Volume)?),
        ("fcr_prices_long", long_for(&ctx.fcr, &ctx.fcr_schema, MeasureKind::Price)?),
        ("fcr_volumes_long", long_for(&ctx.fcr, &ctx.fcr_schema, MeasureKind::Volume)?),
    ];

    println!("\n💾 Exporting long-format tables to {}", output_dir.display());
    let pb = ProgressBar::new(datasets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")?,
    );

    let mut written = Vec::new();
    for (name, records) in datasets {
        pb.set_message(name);
        if records.is_empty() {
            log::debug!("Skipping {}: no rows", name);
            pb.inc(1);
            continue;
        }
        let mut df = long_dataframe(&records)?;
        written.extend(save_all_formats(&mut df, output_dir, name)?);
        log::info!("Exported {} rows to {}", df.height(), name);
        pb.inc(1);
    }
    pb.finish_with_message(format!("{} files written", written.len()));

    Ok(written)
}
