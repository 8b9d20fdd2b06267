use crate::config::SourceConfig;
use crate::error::{ReshapeError, Result};
use crate::models::{RawRecord, Table};
use crate::schema::SchemaMapping;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M",
];

/// Parses `Period`/`Datum` cells; a bare date means midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Numeric cell; accepts a decimal comma. Empty cells and `NaN` are missing.
fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
}

fn numeric_column(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    match series.dtype() {
        DataType::Utf8 => Ok(series
            .utf8()?
            .into_iter()
            .map(|v| v.and_then(parse_number))
            .collect()),
        _ => Ok(series.cast(&DataType::Float64)?.f64()?.into_iter().collect()),
    }
}

fn source_error(source: &SourceConfig, path: &Path, err: impl std::fmt::Display) -> ReshapeError {
    ReshapeError::data_source(&source.name, format!("{}: {}", path.display(), err))
}

pub struct DataLoader {
    parallel: bool,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DataLoader {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    /// Files a source refers to: the path itself, or every glob match in path order.
    pub fn resolve_paths(source: &SourceConfig) -> Result<Vec<PathBuf>> {
        let direct = Path::new(&source.path);
        if direct.is_file() {
            return Ok(vec![direct.to_path_buf()]);
        }

        let mut paths: Vec<PathBuf> = glob::glob(&source.path)
            .map_err(|e| ReshapeError::data_source(&source.name, format!("bad pattern '{}': {}", source.path, e)))?
            .filter_map(std::result::Result::ok)
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(ReshapeError::data_source(
                &source.name,
                format!("no files found at '{}'", source.path),
            ));
        }
        Ok(paths)
    }

    /// Load a whole source into one table with the schema's columns.
    pub fn load(&self, source: &SourceConfig) -> Result<Table> {
        let schema = source.schema()?;
        let paths = Self::resolve_paths(source)?;

        let tables: Vec<Table> = if self.parallel && paths.len() > 1 {
            paths
                .par_iter()
                .map(|path| self.load_file(path, source, &schema))
                .collect::<Result<Vec<_>>>()?
        } else {
            paths
                .iter()
                .map(|path| self.load_file(path, source, &schema))
                .collect::<Result<Vec<_>>>()?
        };

        let mut combined = Table::new(schema.columns());
        for table in tables {
            combined.append(table)?;
        }

        log::info!(
            "Loaded {} rows for {} from {} file(s)",
            combined.len(),
            source.name,
            paths.len()
        );
        Ok(combined)
    }

    fn load_file(&self, path: &Path, source: &SourceConfig, schema: &SchemaMapping) -> Result<Table> {
        log::debug!("Reading {}", path.display());

        let df = CsvReader::from_path(path)
            .map_err(|e| source_error(source, path, e))?
            .has_header(true)
            .finish()
            .map_err(|e| source_error(source, path, e))?;

        let names = df.get_column_names();
        let mut required = vec![source.timestamp_column.as_str()];
        if let Some(zone) = &source.zone_column {
            required.push(zone.as_str());
        }
        required.extend(schema.specs().iter().map(|s| s.column.as_str()));

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !names.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(source_error(
                source,
                path,
                format!("missing expected columns {:?}", missing),
            ));
        }

        let timestamps = df
            .column(&source.timestamp_column)
            .and_then(|s| s.cast(&DataType::Utf8))
            .map_err(|e| source_error(source, path, e))?;
        let timestamps = timestamps.utf8().map_err(|e| source_error(source, path, e))?;

        let zones = match &source.zone_column {
            Some(zone) => Some(
                df.column(zone)
                    .and_then(|s| s.cast(&DataType::Utf8))
                    .map_err(|e| source_error(source, path, e))?,
            ),
            None => None,
        };
        let zones = match &zones {
            Some(series) => Some(series.utf8().map_err(|e| source_error(source, path, e))?),
            None => None,
        };

        let mut columns = Vec::with_capacity(schema.specs().len());
        for spec in schema.specs() {
            let series = df
                .column(&spec.column)
                .map_err(|e| source_error(source, path, e))?;
            columns.push(numeric_column(series).map_err(|e| source_error(source, path, e))?);
        }

        let mut records = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            // Header is line 1
            let line = idx + 2;
            let raw_ts = timestamps.get(idx).ok_or_else(|| {
                source_error(source, path, format!("line {}: empty {}", line, source.timestamp_column))
            })?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
                source_error(source, path, format!("line {}: bad timestamp '{}'", line, raw_ts))
            })?;
            let zone = zones.and_then(|z| z.get(idx));
            let values = columns.iter().map(|c| c[idx]).collect();

            records.push(RawRecord::new(timestamp, zone, values));
        }

        Ok(Table::with_records(schema.columns(), records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-05 14:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:00"), Some(expected));
        assert_eq!(parse_timestamp(" 2024-03-05 14:00 "), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-05"),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("05.03.2024"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number("12,5"), Some(12.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn test_data_loader_creation() {
        assert!(DataLoader::default().parallel);
        assert!(!DataLoader::new(false).parallel);
    }
}
