use chrono::{Duration, NaiveDate};
use market_reshaper::reshape::{apply_filter, to_long, top_n_long};
use market_reshaper::schema::{MFRR_DOWN_PRICE, MFRR_DOWN_VOLUME, MFRR_UP_PRICE, MFRR_UP_VOLUME};
use market_reshaper::{AggregationMode, FilterSpec, RawRecord, SchemaMapping, Table};

fn main() {
    env_logger::init();

    let base = NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    // Two days of hourly prices for two zones
    // Evening peak on the up side, night dip on the down side
    let mut records = vec![];
    for hour in 0..48 {
        for zone in ["SN1", "SN2"] {
            let up = match hour % 24 {
                17..=20 => 120.0,
                _ => 35.0,
            };
            let down = match hour % 24 {
                0..=5 => 60.0,
                _ => 15.0,
            };
            records.push(RawRecord::new(
                base + Duration::hours(hour),
                Some(zone),
                vec![Some(up), Some(50.0), Some(down), Some(40.0)],
            ));
        }
    }

    let table = Table::with_records(
        vec![
            MFRR_UP_PRICE.to_string(),
            MFRR_UP_VOLUME.to_string(),
            MFRR_DOWN_PRICE.to_string(),
            MFRR_DOWN_VOLUME.to_string(),
        ],
        records,
    );
    let schema = SchemaMapping::default_mfrr();

    let spec = FilterSpec::new(base, base + Duration::hours(47))
        .with_zones(["SN1"])
        .with_aggregation(AggregationMode::DailyMean);
    let daily = apply_filter(&table, &spec).expect("valid filter");

    println!("Daily averages for SN1");
    println!("======================");
    for record in &daily.records {
        println!(
            "  {}  up {:.2} EUR/MW  down {:.2} EUR/MW",
            record.timestamp.format("%Y-%m-%d"),
            record.value(0).unwrap_or_default(),
            record.value(2).unwrap_or_default()
        );
    }

    let hourly = apply_filter(&table, &FilterSpec::new(base, base + Duration::hours(47)))
        .expect("valid filter");
    let long = to_long(&hourly, &[MFRR_UP_PRICE, MFRR_DOWN_PRICE], &schema).expect("known columns");
    let top = top_n_long(&long, 5).expect("positive n");

    println!();
    println!("Top 5 highest price points");
    for entry in top {
        println!(
            "  {}  {:<24} {:.2} EUR/MW",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.market_label,
            entry.value
        );
    }
}
