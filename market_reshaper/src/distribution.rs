use crate::models::LongRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Box-plot statistics of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub zone: Option<String>,
    pub kind: String,
    pub count: usize,
    pub min: f64,
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
    pub max: f64,
    pub mean: f64,
}

impl DistributionSummary {
    pub fn interquartile_range(&self) -> f64 {
        self.upper_quartile - self.lower_quartile
    }
}

/// Linear interpolation between closest ranks over an ascending slice; `None` when empty.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// One summary per (zone, kind), in key order. Missing values are skipped and
/// series without any value are left out.
pub fn price_distribution(records: &[LongRecord]) -> Vec<DistributionSummary> {
    let mut series: BTreeMap<(Option<&str>, &str), Vec<f64>> = BTreeMap::new();
    for record in records {
        let values = series
            .entry((record.zone.as_deref(), record.kind.as_str()))
            .or_default();
        if let Some(v) = record.value {
            values.push(v);
        }
    }

    series
        .into_iter()
        .filter_map(|((zone, kind), mut values)| {
            values.sort_by(|a, b| a.total_cmp(b));
            let count = values.len();
            Some(DistributionSummary {
                zone: zone.map(str::to_string),
                kind: kind.to_string(),
                count,
                min: *values.first()?,
                lower_quartile: quantile(&values, 0.25)?,
                median: quantile(&values, 0.5)?,
                upper_quartile: quantile(&values, 0.75)?,
                max: *values.last()?,
                mean: values.iter().sum::<f64>() / count as f64,
            })
        })
        .collect()
}
