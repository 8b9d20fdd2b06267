use crate::error::{ReshapeError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One source row: timestamp, optional zone and one value per measurement column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub timestamp: NaiveDateTime,
    pub zone: Option<String>,
    values: Vec<Option<f64>>, // aligned with Table::columns
}

impl RawRecord {
    pub fn new(timestamp: NaiveDateTime, zone: Option<&str>, values: Vec<Option<f64>>) -> Self {
        Self {
            timestamp,
            zone: zone.map(str::to_string),
            // NaN and an empty cell mean the same thing downstream
            values: values
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect(),
        }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn with_records(columns: Vec<String>, records: Vec<RawRecord>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of a measurement column, or `InvalidArgument` if the table has no such column.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| ReshapeError::InvalidArgument(format!("unknown column '{}'", column)))
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Same columns, different rows.
    pub fn derive(&self, records: Vec<RawRecord>) -> Self {
        Self {
            columns: self.columns.clone(),
            records,
        }
    }

    /// Appends the rows of `other`; both tables must share the same columns.
    pub fn append(&mut self, other: Table) -> Result<()> {
        if self.columns != other.columns {
            return Err(ReshapeError::InvalidArgument(format!(
                "cannot append table with columns {:?} to {:?}",
                other.columns, self.columns
            )));
        }
        self.records.extend(other.records);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AggregationMode {
    #[default]
    Raw,
    DailyMean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub column: String,
    pub min: f64,
    pub max: f64,
}

/// A finished query as produced by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub zones: Vec<String>, // empty = all
    pub value_range: Option<ValueRange>,
    pub aggregation: AggregationMode,
}

impl FilterSpec {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            zones: Vec::new(),
            value_range: None,
            aggregation: AggregationMode::Raw,
        }
    }

    pub fn with_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zones = zones.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_value_range(mut self, column: &str, min: f64, max: f64) -> Self {
        self.value_range = Some(ValueRange {
            column: column.to_string(),
            min,
            max,
        });
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationMode) -> Self {
        self.aggregation = aggregation;
        self
    }
}

/// One measurement of one row in long (chart-ready) layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub timestamp: NaiveDateTime,
    pub zone: Option<String>,
    pub kind: String,
    pub value: Option<f64>, // None = no value in the source cell
}

impl LongRecord {
    /// Series name used by charts and rankings, e.g. `SN1 - mFRR Up Price`.
    pub fn series_label(&self) -> String {
        match &self.zone {
            Some(zone) => format!("{} - {}", zone, self.kind),
            None => self.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub timestamp: NaiveDateTime,
    pub market_label: String,
    pub value: f64,
}
