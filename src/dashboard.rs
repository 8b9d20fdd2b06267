use anyhow::Result;
use chrono::NaiveDateTime;
use log::{info, warn};
use market_reshaper::reshape::{apply_filter, filter_by_zone, time_bounds, zones};
use market_reshaper::{
    AggregationMode, CachedLoader, DashboardConfig, DataLoader, FilterSpec, ReshapeError,
    SchemaMapping, SourceConfig, Table, ValueRange,
};
use std::sync::Arc;

/// What the user picked; anything left out falls back to the data or the config.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub zones: Option<Vec<String>>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub value_range: Option<ValueRange>,
    pub aggregation: AggregationMode,
}

/// Filtered tables plus everything a view needs to render them.
#[derive(Debug)]
pub struct ViewContext {
    pub mfrr: Table,
    pub fcr: Table,
    pub mfrr_schema: SchemaMapping,
    pub fcr_schema: SchemaMapping,
    pub spec: FilterSpec,
    pub top_n: usize,
}

impl ViewContext {
    /// Zones to draw: the selection, or every zone left after filtering.
    pub fn zones_to_show(&self) -> Vec<String> {
        if self.spec.zones.is_empty() {
            zones(&self.mfrr)
        } else {
            self.spec.zones.clone()
        }
    }

    /// Rows of one zone of the filtered mFRR table.
    pub fn mfrr_zone(&self, zone: &str) -> Table {
        filter_by_zone(&self.mfrr, &[zone])
    }
}

pub struct Dashboard {
    config: DashboardConfig,
    mfrr_cache: CachedLoader,
    fcr_cache: CachedLoader,
    notices: Vec<String>,
}

/// Loads one source; a `DataSource` failure becomes an empty table plus a notice.
fn load_or_empty(cache: &mut CachedLoader, source: &SourceConfig) -> Result<(Arc<Table>, Option<String>)> {
    match cache.load(source) {
        Ok(table) => Ok((table, None)),
        Err(err @ ReshapeError::DataSource { .. }) => {
            warn!("{}", err);
            let empty = Arc::new(Table::new(source.schema()?.columns()));
            Ok((empty, Some(format!("Error loading {} data: {}", source.name, err))))
        }
        Err(err) => Err(err.into()),
    }
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let ttl = config.cache_ttl();
        Self {
            mfrr_cache: CachedLoader::new(DataLoader::default(), ttl),
            fcr_cache: CachedLoader::new(DataLoader::default(), ttl),
            notices: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Non-fatal problems seen so far, oldest first.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    // stderr only: stdout carries nothing but view output
    fn notice(&mut self, message: String) {
        eprintln!("⚠️  {}", message);
        self.notices.push(message);
    }

    /// Loads both sources side by side; an unreadable source becomes an empty table.
    fn load_sources(&mut self) -> Result<(Arc<Table>, Arc<Table>)> {
        let Self {
            config,
            mfrr_cache,
            fcr_cache,
            ..
        } = &mut *self;

        let (mfrr, fcr) = rayon::join(
            || load_or_empty(mfrr_cache, &config.mfrr),
            || load_or_empty(fcr_cache, &config.fcr),
        );
        let (mfrr, mfrr_notice) = mfrr?;
        let (fcr, fcr_notice) = fcr?;
        for message in mfrr_notice.into_iter().chain(fcr_notice) {
            self.notice(message);
        }
        Ok((mfrr, fcr))
    }

    /// Loads (through the cache) and filters both sources. `None` when there is nothing to show.
    pub fn prepare(&mut self, selection: &Selection) -> Result<Option<ViewContext>> {
        let (mfrr, fcr) = self.load_sources()?;

        // Default range spans the mFRR data, else the FCR data
        let bounds = time_bounds(&mfrr).or_else(|| time_bounds(&fcr));
        let (start, end) = match (selection.start, selection.end, bounds) {
            (Some(start), Some(end), _) => (start, end),
            (start, end, Some((lo, hi))) => (start.unwrap_or(lo), end.unwrap_or(hi)),
            (_, _, None) => {
                self.notice("No data available for the selected filters.".to_string());
                return Ok(None);
            }
        };

        let available = zones(&mfrr);
        let selected_zones = match &selection.zones {
            Some(zones) => zones.clone(),
            None => self
                .config
                .default_zones
                .iter()
                .filter(|z| available.contains(*z))
                .cloned()
                .collect(),
        };

        let mut spec = FilterSpec::new(start, end)
            .with_zones(selected_zones)
            .with_aggregation(selection.aggregation);
        spec.value_range = selection.value_range.clone();

        let mfrr_spec = FilterSpec {
            value_range: spec
                .value_range
                .clone()
                .filter(|r| mfrr.has_column(&r.column)),
            ..spec.clone()
        };
        // FCR has no zones and its own columns
        let fcr_spec = FilterSpec {
            zones: Vec::new(),
            value_range: spec.value_range.clone().filter(|r| fcr.has_column(&r.column)),
            ..spec.clone()
        };
        if let Some(range) = &spec.value_range {
            if !(range.min <= range.max) {
                return Err(ReshapeError::InvalidValueRange {
                    min: range.min,
                    max: range.max,
                }
                .into());
            }
            if !mfrr.has_column(&range.column) && !fcr.has_column(&range.column) {
                warn!("Value filter column '{}' is not in any source", range.column);
            }
        }

        let mfrr_filtered = apply_filter(&mfrr, &mfrr_spec)?;
        let fcr_filtered = apply_filter(&fcr, &fcr_spec)?;
        info!(
            "Filtered to {} mFRR rows and {} FCR rows",
            mfrr_filtered.len(),
            fcr_filtered.len()
        );

        if mfrr_filtered.is_empty() && fcr_filtered.is_empty() {
            self.notice("No data available for the selected filters.".to_string());
            return Ok(None);
        }

        Ok(Some(ViewContext {
            mfrr: mfrr_filtered,
            fcr: fcr_filtered,
            mfrr_schema: self.config.mfrr.schema()?,
            fcr_schema: self.config.fcr.schema()?,
            spec,
            top_n: self.config.top_n,
        }))
    }

    pub fn cache_stats(&self) -> (u64, u64) {
        (
            self.mfrr_cache.hits() + self.fcr_cache.hits(),
            self.mfrr_cache.misses() + self.fcr_cache.misses(),
        )
    }
}
