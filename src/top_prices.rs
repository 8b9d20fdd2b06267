use crate::dashboard::ViewContext;
use crate::display::{self, OutputFormat};
use anyhow::Result;
use market_reshaper::reshape::{to_long, top_n_long};
use market_reshaper::{MeasureKind, RankedEntry};

/// Highest price points with up and down prices ranked together.
pub fn top_prices(ctx: &ViewContext, n: usize) -> Result<Vec<RankedEntry>> {
    let columns = ctx.mfrr_schema.columns_of_kind(MeasureKind::Price);
    let long = to_long(&ctx.mfrr, &columns, &ctx.mfrr_schema)?;
    Ok(top_n_long(&long, n)?)
}

pub fn render(ctx: &ViewContext, format: OutputFormat) -> Result<()> {
    let top = top_prices(ctx, ctx.top_n)?;

    match format {
        OutputFormat::Json => display::print_json(&top),
        OutputFormat::Csv => display::print_csv(&top),
        OutputFormat::Summary => {
            display::header(&format!("🏆 Top {} Highest Price Points", ctx.top_n));
            println!("  {:<18} {:<28} {}", "Period", "Series", "Price");
            for entry in &top {
                println!(
                    "  {:<18} {:<28} {}",
                    display::format_timestamp(entry.timestamp, ctx.spec.aggregation),
                    entry.market_label,
                    display::format_value(Some(entry.value), MeasureKind::Price.unit())
                );
            }
            if top.is_empty() {
                println!("  (no prices in the selected range)");
            }
            Ok(())
        }
    }
}
