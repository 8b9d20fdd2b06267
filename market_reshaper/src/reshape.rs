//! Pure table transformations behind every dashboard view.
//!
//! Every function takes its input by reference and returns a new table or
//! sequence. Failures are input-contract violations only and nothing is
//! partially applied.

use crate::error::{ReshapeError, Result};
use crate::models::{AggregationMode, FilterSpec, LongRecord, RankedEntry, RawRecord, Table};
use crate::schema::SchemaMapping;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Zone,
}

/// Rows with `start <= timestamp <= end`, in input order.
pub fn filter_by_time(table: &Table, start: NaiveDateTime, end: NaiveDateTime) -> Result<Table> {
    if start > end {
        return Err(ReshapeError::InvalidTimeRange { start, end });
    }
    let records = table
        .records
        .iter()
        .filter(|r| r.timestamp >= start && r.timestamp <= end)
        .cloned()
        .collect();
    Ok(table.derive(records))
}

/// Rows whose zone is one of `zones`. No zones selected means no filtering.
pub fn filter_by_zone<S: AsRef<str>>(table: &Table, zones: &[S]) -> Table {
    if zones.is_empty() {
        return table.clone();
    }
    let wanted: HashSet<&str> = zones.iter().map(AsRef::as_ref).collect();
    let records = table
        .records
        .iter()
        .filter(|r| r.zone.as_deref().map_or(false, |z| wanted.contains(z)))
        .cloned()
        .collect();
    table.derive(records)
}

/// Rows with `min <= value <= max` in `column`. Rows without a value are dropped.
pub fn filter_by_value_range(table: &Table, column: &str, min: f64, max: f64) -> Result<Table> {
    // Also rejects NaN bounds
    if !(min <= max) {
        return Err(ReshapeError::InvalidValueRange { min, max });
    }
    let idx = table.column_index(column)?;
    let records = table
        .records
        .iter()
        .filter(|r| r.value(idx).map_or(false, |v| v >= min && v <= max))
        .cloned()
        .collect();
    Ok(table.derive(records))
}

/// Daily mean per `(date, group keys...)` for each of `columns`.
///
/// Output rows are ordered by date, then zone (rows without a zone first), and
/// carry the date at midnight as timestamp. Values within a bucket are summed
/// in sorted order, so any permutation of the input gives bit-identical means.
/// A column with no values in a bucket stays missing.
pub fn aggregate_daily(table: &Table, columns: &[&str], group_keys: &[GroupKey]) -> Result<Table> {
    let indices = columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;
    let by_zone = group_keys.contains(&GroupKey::Zone);

    let mut buckets: BTreeMap<(NaiveDate, Option<String>), Vec<Vec<f64>>> = BTreeMap::new();
    for record in &table.records {
        let zone = if by_zone { record.zone.clone() } else { None };
        let bucket = buckets
            .entry((record.timestamp.date(), zone))
            .or_insert_with(|| vec![Vec::new(); indices.len()]);
        for (slot, &idx) in bucket.iter_mut().zip(&indices) {
            if let Some(v) = record.value(idx) {
                slot.push(v);
            }
        }
    }

    let records = buckets
        .into_iter()
        .map(|((date, zone), mut values)| {
            let means = values.iter_mut().map(|vals| sorted_mean(vals)).collect();
            RawRecord::new(date.and_time(chrono::NaiveTime::MIN), zone.as_deref(), means)
        })
        .collect();

    Ok(Table::with_records(
        columns.iter().map(|c| c.to_string()).collect(),
        records,
    ))
}

fn sorted_mean(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Wide to long: one record per row and value column, row-major.
///
/// Missing cells are kept with `value: None`. The zone is the row's zone, or
/// the column's region from `schema` for tables that carry the region in the
/// column instead.
pub fn to_long(table: &Table, value_columns: &[&str], schema: &SchemaMapping) -> Result<Vec<LongRecord>> {
    let columns = value_columns
        .iter()
        .map(|c| {
            Ok((
                table.column_index(c)?,
                schema.kind_label(c),
                schema.region(c).map(str::to_string),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut long = Vec::with_capacity(table.len() * columns.len());
    for record in &table.records {
        for (idx, kind, region) in &columns {
            long.push(LongRecord {
                timestamp: record.timestamp,
                zone: record.zone.clone().or_else(|| region.clone()),
                kind: kind.clone(),
                value: record.value(*idx),
            });
        }
    }
    Ok(long)
}

/// Positions of the `n` largest values, descending, earlier position first on ties.
fn stable_top_n(values: impl Iterator<Item = Option<f64>>, n: usize) -> Result<Vec<(usize, f64)>> {
    if n == 0 {
        return Err(ReshapeError::InvalidArgument("n must be positive".to_string()));
    }
    let mut ranked: Vec<(usize, f64)> = values
        .enumerate()
        .filter_map(|(pos, v)| v.map(|v| (pos, v)))
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    Ok(ranked)
}

/// The `n` rows with the largest value in `column`.
pub fn top_n(table: &Table, column: &str, n: usize) -> Result<Vec<RankedEntry>> {
    let idx = table.column_index(column)?;
    let ranked = stable_top_n(table.records.iter().map(|r| r.value(idx)), n)?;
    Ok(ranked
        .into_iter()
        .map(|(pos, value)| {
            let record = &table.records[pos];
            RankedEntry {
                timestamp: record.timestamp,
                market_label: record.zone.clone().unwrap_or_else(|| column.to_string()),
                value,
            }
        })
        .collect())
}

/// Top-N over an unpivoted sequence, e.g. up and down prices ranked together.
pub fn top_n_long(records: &[LongRecord], n: usize) -> Result<Vec<RankedEntry>> {
    let ranked = stable_top_n(records.iter().map(|r| r.value), n)?;
    Ok(ranked
        .into_iter()
        .map(|(pos, value)| RankedEntry {
            timestamp: records[pos].timestamp,
            market_label: records[pos].series_label(),
            value,
        })
        .collect())
}

/// Concatenate long sequences and order by timestamp; earlier parts win ties.
pub fn merge_long(parts: Vec<Vec<LongRecord>>) -> Vec<LongRecord> {
    let mut merged: Vec<LongRecord> = parts.into_iter().flatten().collect();
    merged.sort_by_key(|r| r.timestamp);
    merged
}

/// Time, zone and value filters, then the requested aggregation.
pub fn apply_filter(table: &Table, spec: &FilterSpec) -> Result<Table> {
    let mut filtered = filter_by_time(table, spec.start, spec.end)?;
    filtered = filter_by_zone(&filtered, &spec.zones);
    if let Some(range) = &spec.value_range {
        filtered = filter_by_value_range(&filtered, &range.column, range.min, range.max)?;
    }

    match spec.aggregation {
        AggregationMode::Raw => Ok(filtered),
        AggregationMode::DailyMean => {
            let columns: Vec<&str> = filtered.columns.iter().map(String::as_str).collect();
            aggregate_daily(&filtered, &columns, &[GroupKey::Zone])
        }
    }
}

/// Earliest and latest timestamp, `None` for an empty table.
pub fn time_bounds(table: &Table) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let min = table.records.iter().map(|r| r.timestamp).min()?;
    let max = table.records.iter().map(|r| r.timestamp).max()?;
    Some((min, max))
}

/// Distinct zones in first-seen order.
pub fn zones(table: &Table) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .records
        .iter()
        .filter_map(|r| r.zone.as_deref())
        .filter(|z| seen.insert(*z))
        .map(str::to_string)
        .collect()
}
