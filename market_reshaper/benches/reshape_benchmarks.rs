use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use market_reshaper::reshape::{aggregate_daily, filter_by_time, to_long, top_n_long, GroupKey};
use market_reshaper::schema::{MFRR_DOWN_PRICE, MFRR_DOWN_VOLUME, MFRR_UP_PRICE, MFRR_UP_VOLUME};
use market_reshaper::{RawRecord, SchemaMapping, Table};

/// A year of hourly mFRR data for four zones.
fn sample_table() -> Table {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let zones = ["SN1", "SN2", "SN3", "SN4"];

    let mut records = Vec::new();
    for hour in 0..24 * 365 {
        for (z, zone) in zones.iter().enumerate() {
            let price = 20.0 + ((hour % 24) as f64) * 2.5 + z as f64;
            records.push(RawRecord::new(
                base + Duration::hours(hour),
                Some(*zone),
                vec![Some(price), Some(100.0), Some(price / 2.0), Some(80.0)],
            ));
        }
    }

    Table::with_records(
        vec![
            MFRR_UP_PRICE.to_string(),
            MFRR_UP_VOLUME.to_string(),
            MFRR_DOWN_PRICE.to_string(),
            MFRR_DOWN_VOLUME.to_string(),
        ],
        records,
    )
}

fn benchmark_filter_by_time(c: &mut Criterion) {
    let table = sample_table();
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap().and_hms_opt(23, 0, 0).unwrap();

    c.bench_function("filter_by_time", |b| {
        b.iter(|| black_box(filter_by_time(&table, start, end).unwrap()));
    });
}

fn benchmark_aggregate_daily(c: &mut Criterion) {
    let table = sample_table();
    let columns = [MFRR_UP_PRICE, MFRR_UP_VOLUME, MFRR_DOWN_PRICE, MFRR_DOWN_VOLUME];

    c.bench_function("aggregate_daily", |b| {
        b.iter(|| black_box(aggregate_daily(&table, &columns, &[GroupKey::Zone]).unwrap()));
    });
}

fn benchmark_top_prices(c: &mut Criterion) {
    let table = sample_table();
    let schema = SchemaMapping::default_mfrr();

    c.bench_function("to_long_top_5", |b| {
        b.iter(|| {
            let long = to_long(&table, &[MFRR_UP_PRICE, MFRR_DOWN_PRICE], &schema).unwrap();
            black_box(top_n_long(&long, 5).unwrap())
        });
    });
}

criterion_group!(
    benches,
    benchmark_filter_by_time,
    benchmark_aggregate_daily,
    benchmark_top_prices
);
criterion_main!(benches);
