use crate::dashboard::ViewContext;
use crate::display::{self, OutputFormat};
use anyhow::Result;
use market_reshaper::reshape::{merge_long, to_long};
use market_reshaper::{LongRecord, MeasureKind};

/// mFRR and FCR prices on one timeline.
pub fn combined_prices(ctx: &ViewContext) -> Result<Vec<LongRecord>> {
    let mfrr_columns = ctx.mfrr_schema.columns_of_kind(MeasureKind::Price);
    let fcr_columns = ctx.fcr_schema.columns_of_kind(MeasureKind::Price);

    Ok(merge_long(vec![
        to_long(&ctx.mfrr, &mfrr_columns, &ctx.mfrr_schema)?,
        to_long(&ctx.fcr, &fcr_columns, &ctx.fcr_schema)?,
    ]))
}

pub fn render(ctx: &ViewContext, format: OutputFormat, max_rows: usize) -> Result<()> {
    let combined = combined_prices(ctx)?;

    match format {
        OutputFormat::Json => display::print_json(&combined),
        OutputFormat::Csv => display::print_csv(&combined),
        OutputFormat::Summary => {
            display::header("🔀 Combined mFRR and FCR Prices");
            let lines: Vec<String> = combined
                .iter()
                .map(|r| {
                    format!(
                        "  {:<18} {:<28} {}",
                        display::format_timestamp(r.timestamp, ctx.spec.aggregation),
                        r.series_label(),
                        display::format_value(r.value, MeasureKind::Price.unit())
                    )
                })
                .collect();
            display::print_limited(&lines, max_rows);
            Ok(())
        }
    }
}
