use market_reshaper::config::SourceConfig;
use market_reshaper::reshape::{apply_filter, to_long, top_n_long};
use market_reshaper::schema::{MFRR_DOWN_PRICE, MFRR_UP_PRICE};
use market_reshaper::{AggregationMode, CachedLoader, DataLoader, FilterSpec, ReshapeError};
use std::path::Path;
use std::time::Duration;

const MFRR_HEADER: &str =
    "Period,Elområde,mFRR Upp Pris (EUR/MW),mFRR Upp Volym (MW),mFRR Ned Pris (EUR/MW),mFRR Ned Volym (MW)\n";

fn write_mfrr(path: &Path, rows: &[&str]) {
    let mut content = MFRR_HEADER.to_string();
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(path, content).unwrap();
}

fn source_for(path: &Path) -> SourceConfig {
    SourceConfig::mfrr(path.to_str().unwrap())
}

#[test]
fn test_load_mfrr_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mfrr.csv");
    write_mfrr(
        &path,
        &[
            "2024-01-01 00:00:00,SN1,10.5,100,5,50",
            "2024-01-01 01:00:00,SN2,12,110,,40",
            "2024-01-01 02:00:00,SN1,NaN,90,7.25,30",
        ],
    );

    let table = DataLoader::new(false).load(&source_for(&path)).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.columns[0], MFRR_UP_PRICE);
    assert_eq!(table.records[0].zone.as_deref(), Some("SN1"));
    assert_eq!(table.records[0].value(0), Some(10.5));
    assert_eq!(table.records[1].value(2), None);
    assert_eq!(table.records[2].value(0), None);
    assert_eq!(table.records[2].value(2), Some(7.25));
}

#[test]
fn test_missing_column_is_data_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    std::fs::write(&path, "Period,Elområde,mFRR Upp Pris (EUR/MW)\n2024-01-01,SN1,1\n").unwrap();

    let err = DataLoader::new(false).load(&source_for(&path)).unwrap_err();
    match err {
        ReshapeError::DataSource { reason, .. } => assert!(reason.contains("missing expected columns")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_file_is_data_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = source_for(&dir.path().join("nope.csv"));
    assert!(matches!(
        DataLoader::default().load(&source),
        Err(ReshapeError::DataSource { .. })
    ));
}

#[test]
fn test_bad_timestamp_names_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mfrr.csv");
    write_mfrr(&path, &["2024-01-01 00:00:00,SN1,1,1,1,1", "yesterday,SN1,1,1,1,1"]);

    let err = DataLoader::new(false).load(&source_for(&path)).unwrap_err();
    assert!(err.to_string().contains("line 3"));
}

#[test]
fn test_glob_source_concatenates_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    write_mfrr(&dir.path().join("mfrr_2024_02.csv"), &["2024-02-01 00:00:00,SN1,2,1,1,1"]);
    write_mfrr(&dir.path().join("mfrr_2024_01.csv"), &["2024-01-01 00:00:00,SN1,1,1,1,1"]);

    let pattern = dir.path().join("mfrr_*.csv");
    let source = SourceConfig::mfrr(pattern.to_str().unwrap());
    let table = DataLoader::new(true).load(&source).unwrap();

    let ups: Vec<_> = table.records.iter().map(|r| r.value(0)).collect();
    assert_eq!(ups, vec![Some(1.0), Some(2.0)]);
}

#[test]
fn test_fcr_source_without_zone_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.csv");
    std::fs::write(
        &path,
        "column,product,direction,kind,region,label\nFCR-N SE1,FCR-N,,Price,SE1,\n",
    )
    .unwrap();
    let data = dir.path().join("fcr.csv");
    std::fs::write(&data, "Datum,FCR-N SE1\n2024-01-01,31.5\n2024-01-02,28\n").unwrap();

    let mut source = SourceConfig::fcr(data.to_str().unwrap());
    source.schema_file = Some(path);
    let schema = source.schema().unwrap();
    let table = DataLoader::default().load(&source).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.records[0].zone, None);
    let long = to_long(&table, &["FCR-N SE1"], &schema).unwrap();
    assert_eq!(long[1].zone.as_deref(), Some("SE1"));
    assert_eq!(long[1].value, Some(28.0));
}

#[test]
fn test_cache_reuses_table_until_invalidated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mfrr.csv");
    write_mfrr(&path, &["2024-01-01 00:00:00,SN1,1,1,1,1"]);
    let source = source_for(&path);

    let mut cache = CachedLoader::new(DataLoader::default(), None);
    let first = cache.load(&source).unwrap();
    let second = cache.load(&source).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!((cache.hits(), cache.misses()), (1, 1));

    cache.invalidate();
    assert!(cache.is_empty());
    let third = cache.load(&source).unwrap();
    assert!(!std::sync::Arc::ptr_eq(&first, &third));
    assert_eq!(cache.misses(), 2);
}

#[test]
fn test_cache_reloads_when_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mfrr.csv");
    write_mfrr(&path, &["2024-01-01 00:00:00,SN1,1,1,1,1"]);
    let source = source_for(&path);

    let mut cache = CachedLoader::new(DataLoader::default(), None);
    assert_eq!(cache.load(&source).unwrap().len(), 1);

    // Different length changes the key even if the mtime resolution is coarse
    write_mfrr(
        &path,
        &["2024-01-01 00:00:00,SN1,1,1,1,1", "2024-01-01 01:00:00,SN1,2,2,2,2"],
    );
    assert_eq!(cache.load(&source).unwrap().len(), 2);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cache_zero_ttl_always_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mfrr.csv");
    write_mfrr(&path, &["2024-01-01 00:00:00,SN1,1,1,1,1"]);
    let source = source_for(&path);

    let mut cache = CachedLoader::new(DataLoader::default(), Some(Duration::ZERO));
    cache.load(&source).unwrap();
    cache.load(&source).unwrap();
    assert_eq!((cache.hits(), cache.misses()), (0, 2));
}

#[test]
fn test_top_prices_from_loaded_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mfrr.csv");
    write_mfrr(
        &path,
        &[
            "2024-01-01 00:00:00,SN1,10,1,40,1",
            "2024-01-01 12:00:00,SN1,20,1,15,1",
            "2024-01-02 00:00:00,SN1,30,1,25,1",
            "2024-01-02 00:00:00,SN2,99,1,99,1",
        ],
    );
    let source = source_for(&path);
    let schema = source.schema().unwrap();
    let table = DataLoader::default().load(&source).unwrap();

    let start = market_reshaper::data_loader::parse_timestamp("2024-01-01").unwrap();
    let end = market_reshaper::data_loader::parse_timestamp("2024-01-02 23:00").unwrap();
    let spec = FilterSpec::new(start, end)
        .with_zones(["SN1"])
        .with_aggregation(AggregationMode::DailyMean);
    let daily = apply_filter(&table, &spec).unwrap();
    assert_eq!(daily.len(), 2);

    let long = to_long(&daily, &[MFRR_UP_PRICE, MFRR_DOWN_PRICE], &schema).unwrap();
    let top = top_n_long(&long, 2).unwrap();
    assert_eq!(top[0].market_label, "SN1 - mFRR Up Price");
    assert_eq!(top[0].value, 30.0);
    assert_eq!(top[1].market_label, "SN1 - mFRR Down Price");
    assert_eq!(top[1].value, 27.5);
}
