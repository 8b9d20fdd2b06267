use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use clap::{Parser, ValueEnum};
use log::info;
use market_reshaper::data_loader::parse_timestamp;
use market_reshaper::{AggregationMode, DashboardConfig, MeasureKind, ValueRange};
use std::path::PathBuf;
use std::time::Duration;

mod combined_view;
mod dashboard;
mod display;
mod distribution_view;
mod fcr_view;
mod long_exporter;
mod price_view;
mod top_prices;

use dashboard::{Dashboard, Selection};
use display::OutputFormat;

#[derive(Parser)]
#[command(name = "balancing_dashboard")]
#[command(about = "mFRR and FCR balancing market data: filter, aggregate, rank and export")]
struct Args {
    /// Dashboard configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// mFRR source file or glob pattern
    #[arg(long)]
    mfrr: Option<String>,

    /// FCR source file or glob pattern
    #[arg(long)]
    fcr: Option<String>,

    /// Column mapping CSV for the mFRR source
    #[arg(long)]
    mfrr_schema: Option<PathBuf>,

    /// Column mapping CSV for the FCR source
    #[arg(long)]
    fcr_schema: Option<PathBuf>,

    /// View to render
    #[arg(short, long, value_enum, default_value = "prices")]
    view: View,

    /// Elområde selection, comma separated (defaults from config)
    #[arg(short, long, value_delimiter = ',')]
    zones: Option<Vec<String>>,

    /// Show every zone
    #[arg(long, conflicts_with = "zones")]
    all_zones: bool,

    /// Time aggregation
    #[arg(short, long, value_enum, default_value = "hourly")]
    aggregation: Aggregation,

    /// Start of the range (YYYY-MM-DD or YYYY-MM-DD HH:MM), defaults to the first row
    #[arg(long)]
    start: Option<String>,

    /// End of the range, inclusive; a bare date covers the whole day
    #[arg(long)]
    end: Option<String>,

    /// Column the value range applies to
    #[arg(long)]
    value_column: Option<String>,

    #[arg(long, requires = "value_column", allow_hyphen_values = true)]
    min_value: Option<f64>,

    #[arg(long, requires = "value_column", allow_hyphen_values = true)]
    max_value: Option<f64>,

    /// Number of entries in the top prices table
    #[arg(short = 'n', long)]
    top_n: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    output: OutputFormat,

    /// Rows printed per series in summary output
    #[arg(long, default_value = "48")]
    max_rows: usize,

    /// Directory for the export view
    #[arg(long, default_value = "exports")]
    export_dir: PathBuf,

    /// Seconds between re-renders
    #[arg(long, default_value = "0")]
    refresh_secs: u64,

    /// Number of renders; sources are reloaded only when the cache says so
    #[arg(long, default_value = "1")]
    refresh_count: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    Prices,
    Volumes,
    TopPrices,
    Distribution,
    Fcr,
    Combined,
    Export,
}

#[derive(Clone, Copy, ValueEnum)]
enum Aggregation {
    Hourly,
    DailyAverage,
}

impl From<Aggregation> for AggregationMode {
    fn from(value: Aggregation) -> Self {
        match value {
            Aggregation::Hourly => AggregationMode::Raw,
            Aggregation::DailyAverage => AggregationMode::DailyMean,
        }
    }
}

fn parse_bound(value: &str, end_of_day: bool) -> Result<NaiveDateTime> {
    let Some(ts) = parse_timestamp(value) else {
        bail!("Cannot parse '{}' as YYYY-MM-DD[ HH:MM]", value);
    };
    // A bare end date includes the whole day
    if end_of_day && value.trim().len() == 10 {
        if let Some(last) = ts.date().and_hms_opt(23, 59, 59) {
            return Ok(last);
        }
    }
    Ok(ts)
}

fn build_config(args: &Args) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_json_file(path)?,
        None => DashboardConfig::default(),
    };

    if let Some(path) = &args.mfrr {
        config.mfrr.path = path.clone();
    }
    if let Some(path) = &args.fcr {
        config.fcr.path = path.clone();
    }
    if let Some(schema) = &args.mfrr_schema {
        config.mfrr.schema_file = Some(schema.clone());
    }
    if let Some(schema) = &args.fcr_schema {
        config.fcr.schema_file = Some(schema.clone());
    }
    if let Some(n) = args.top_n {
        config.top_n = n;
    }
    config.validate()?;
    Ok(config)
}

fn build_selection(args: &Args) -> Result<Selection> {
    let zones = if args.all_zones {
        Some(Vec::new())
    } else {
        args.zones.clone()
    };

    let value_range = args.value_column.as_ref().map(|column| ValueRange {
        column: column.clone(),
        min: args.min_value.unwrap_or(f64::NEG_INFINITY),
        max: args.max_value.unwrap_or(f64::INFINITY),
    });

    Ok(Selection {
        zones,
        start: args.start.as_deref().map(|s| parse_bound(s, false)).transpose()?,
        end: args.end.as_deref().map(|s| parse_bound(s, true)).transpose()?,
        value_range,
        aggregation: args.aggregation.into(),
    })
}

fn render(dashboard: &mut Dashboard, args: &Args, selection: &Selection) -> Result<()> {
    let Some(ctx) = dashboard.prepare(selection)? else {
        return Ok(());
    };

    match args.view {
        View::Prices => price_view::render(&ctx, MeasureKind::Price, args.output, args.max_rows),
        View::Volumes => price_view::render(&ctx, MeasureKind::Volume, args.output, args.max_rows),
        View::TopPrices => top_prices::render(&ctx, args.output),
        View::Distribution => distribution_view::render(&ctx, args.output),
        View::Fcr => fcr_view::render(&ctx, args.output, args.max_rows),
        View::Combined => combined_view::render(&ctx, args.output, args.max_rows),
        View::Export => {
            let written = long_exporter::export(&ctx, &args.export_dir)?;
            println!("✅ Wrote {} files", written.len());
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .build_global()?;

    let args = Args::parse();
    let config = build_config(&args)?;
    let selection = build_selection(&args)?;

    if args.output == OutputFormat::Summary {
        println!("⚡ mFRR Market Data Visualization");
        println!("Using {} CPU cores", rayon::current_num_threads());
        println!("{}", "=".repeat(60));
    }
    info!("mFRR source: {}, FCR source: {}", config.mfrr.path, config.fcr.path);

    let mut dashboard = Dashboard::new(config);
    let renders = args.refresh_count.max(1);

    for i in 0..renders {
        if i > 0 {
            std::thread::sleep(Duration::from_secs(args.refresh_secs));
        }
        render(&mut dashboard, &args, &selection)?;
    }

    let (hits, misses) = dashboard.cache_stats();
    info!(
        "Cache hits: {}, misses: {} (ttl {:?}), {} notices",
        hits,
        misses,
        dashboard.config().cache_ttl(),
        dashboard.notices().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_bound_end_of_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(parse_bound("2024-01-31", false).unwrap(), day.and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(parse_bound("2024-01-31", true).unwrap(), day.and_hms_opt(23, 59, 59).unwrap());
        assert_eq!(
            parse_bound("2024-01-31 12:00", true).unwrap(),
            day.and_hms_opt(12, 0, 0).unwrap()
        );
        assert!(parse_bound("31/01/2024", false).is_err());
    }

    #[test]
    fn test_selection_from_args() {
        let args = Args::parse_from([
            "balancing_dashboard",
            "--zones",
            "SN1,SN2",
            "--aggregation",
            "daily-average",
            "--value-column",
            "mFRR Upp Pris (EUR/MW)",
            "--min-value",
            "-5",
        ]);
        let selection = build_selection(&args).unwrap();
        assert_eq!(selection.zones, Some(vec!["SN1".to_string(), "SN2".to_string()]));
        assert_eq!(selection.aggregation, AggregationMode::DailyMean);

        let range = selection.value_range.unwrap();
        assert_eq!(range.min, -5.0);
        assert_eq!(range.max, f64::INFINITY);
    }

    #[test]
    fn test_all_zones_means_empty_selection() {
        let args = Args::parse_from(["balancing_dashboard", "--all-zones"]);
        assert_eq!(build_selection(&args).unwrap().zones, Some(Vec::new()));
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from(["balancing_dashboard", "--mfrr", "data/*.csv", "-n", "10"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.mfrr.path, "data/*.csv");
        assert_eq!(config.top_n, 10);
    }
}
