use crate::dashboard::ViewContext;
use crate::display::{self, OutputFormat};
use anyhow::Result;
use market_reshaper::reshape::to_long;
use market_reshaper::MeasureKind;

pub fn render(ctx: &ViewContext, format: OutputFormat, max_rows: usize) -> Result<()> {
    let columns = ctx.fcr_schema.columns_of_kind(MeasureKind::Price);
    let long = to_long(&ctx.fcr, &columns, &ctx.fcr_schema)?;

    match format {
        OutputFormat::Json => display::print_json(&long),
        OutputFormat::Csv => display::print_csv(&long),
        OutputFormat::Summary => {
            display::header("⚡ FCR Prices");
            if long.is_empty() {
                println!("  (no FCR data in the selected range)");
                return Ok(());
            }
            display::print_long_series(&long, MeasureKind::Price.unit(), ctx.spec.aggregation, max_rows);
            Ok(())
        }
    }
}
