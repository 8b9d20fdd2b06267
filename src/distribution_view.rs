use crate::dashboard::ViewContext;
use crate::display::{self, OutputFormat};
use anyhow::Result;
use market_reshaper::reshape::to_long;
use market_reshaper::{price_distribution, DistributionSummary, MeasureKind};

/// Box-plot statistics for every mFRR and FCR price series.
pub fn distributions(ctx: &ViewContext) -> Result<Vec<DistributionSummary>> {
    let mfrr_columns = ctx.mfrr_schema.columns_of_kind(MeasureKind::Price);
    let fcr_columns = ctx.fcr_schema.columns_of_kind(MeasureKind::Price);

    let mut summaries = price_distribution(&to_long(&ctx.mfrr, &mfrr_columns, &ctx.mfrr_schema)?);
    summaries.extend(price_distribution(&to_long(&ctx.fcr, &fcr_columns, &ctx.fcr_schema)?));
    Ok(summaries)
}

pub fn render(ctx: &ViewContext, format: OutputFormat) -> Result<()> {
    let summaries = distributions(ctx)?;

    match format {
        OutputFormat::Json => display::print_json(&summaries),
        OutputFormat::Csv => display::print_csv(&summaries),
        OutputFormat::Summary => {
            display::header("📊 Price Distribution (EUR/MW)");
            println!(
                "  {:<6} {:<18} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
                "Zone", "Series", "Count", "Min", "Q1", "Median", "Q3", "Max", "Mean"
            );
            for s in &summaries {
                println!(
                    "  {:<6} {:<18} {:>6} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>9.2}",
                    s.zone.as_deref().unwrap_or("-"),
                    s.kind,
                    s.count,
                    s.min,
                    s.lower_quartile,
                    s.median,
                    s.upper_quartile,
                    s.max,
                    s.mean
                );
            }
            Ok(())
        }
    }
}
