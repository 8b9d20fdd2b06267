use crate::dashboard::ViewContext;
use crate::display::{self, OutputFormat};
use anyhow::Result;
use market_reshaper::reshape::to_long;
use market_reshaper::{Direction, MeasureKind, SchemaMapping};

/// Header label per column, e.g. `mFRR Up Price (EUR/MW)`.
fn column_labels(schema: &SchemaMapping, columns: &[&str], kind: MeasureKind) -> Vec<String> {
    columns
        .iter()
        .map(|c| format!("{} ({})", schema.kind_label(c), schema.unit(c).unwrap_or(kind.unit())))
        .collect()
}

/// Up and down series per zone for prices or volumes.
pub fn render(ctx: &ViewContext, kind: MeasureKind, format: OutputFormat, max_rows: usize) -> Result<()> {
    let schema = &ctx.mfrr_schema;
    let up = schema.columns_matching(kind, Direction::Up);
    let down = schema.columns_matching(kind, Direction::Down);
    let columns: Vec<&str> = up.iter().chain(down.iter()).copied().collect();

    if columns.is_empty() {
        eprintln!("⚠️  No mFRR {} columns are mapped", kind);
        return Ok(());
    }

    match format {
        OutputFormat::Json => display::print_json(&to_long(&ctx.mfrr, &columns, schema)?),
        OutputFormat::Csv => display::print_csv(&to_long(&ctx.mfrr, &columns, schema)?),
        OutputFormat::Summary => {
            let title = match kind {
                MeasureKind::Price => "Price Visualization",
                MeasureKind::Volume => "Volume Visualization",
            };
            display::header(&format!("📈 {}", title));

            let indices = columns
                .iter()
                .map(|c| ctx.mfrr.column_index(c))
                .collect::<market_reshaper::Result<Vec<_>>>()?;
            let labels = column_labels(schema, &columns, kind);

            for zone in ctx.zones_to_show() {
                let rows = ctx.mfrr_zone(&zone);
                println!("\n📍 {} ({} rows)", zone, rows.len());
                if rows.is_empty() {
                    continue;
                }
                println!("  {:<18} {}", "Period", labels.join(" | "));

                let lines: Vec<String> = rows
                    .records
                    .iter()
                    .map(|record| {
                        let values: Vec<String> = indices
                            .iter()
                            .map(|&idx| display::format_value(record.value(idx), kind.unit()))
                            .collect();
                        format!(
                            "  {:<18} {}",
                            display::format_timestamp(record.timestamp, ctx.spec.aggregation),
                            values.join(" | ")
                        )
                    })
                    .collect();
                display::print_limited(&lines, max_rows);
            }
            Ok(())
        }
    }
}
