use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double};
use serde_json::{json, Value};
use tempfile::TempDir;

use marketflow_core::corporate_actions::TimestampFormat;
use marketflow_core::db;
use marketflow_core::ingest::IngestService;

mod common;

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct CloseRow {
    #[diesel(sql_type = Double)]
    close: f64,
    #[diesel(sql_type = BigInt)]
    volume: i64,
}

fn count(pool: &db::DbPool, table: &str) -> i64 {
    let mut conn = db::get_connection(pool).unwrap();
    let rows: Vec<CountRow> =
        diesel::sql_query(format!("SELECT COUNT(*) AS count FROM {}", table))
            .load(&mut conn)
            .unwrap();
    rows[0].count
}

fn split_payload(symbol: &str, ex_date: &str, from: i64, to: i64, refid: i64) -> Value {
    json!({
        "declaredDate": "2020-04-01",
        "description": format!("{}-for-{} split", to, from),
        "exDate": ex_date,
        "fromFactor": from,
        "toFactor": to,
        "refid": refid,
        "symbol": symbol,
        "id": "SPLITS",
        "key": symbol,
        "subkey": refid.to_string(),
        "updated": 1_590_000_000,
    })
}

fn dividend_payload(symbol: &str, refid: i64) -> Value {
    json!({
        "amount": 0.82,
        "currency": "USD",
        "declaredDate": "2020-04-30",
        "description": "Ordinary Shares",
        "exDate": "2020-05-08",
        "flag": "Cash",
        "frequency": "quarterly",
        "paymentDate": "2020-05-14",
        "recordDate": "2020-05-11",
        "refid": refid,
        "symbol": symbol,
        "id": "DIVIDENDS",
        "key": symbol,
        "subkey": refid.to_string(),
        "date": 1_588_896_000,
        "updated": 1_588_896_000,
    })
}

fn price_payload(symbol: &str, date: &str, price: f64, volume: i64) -> Value {
    json!({
        "date": date,
        "symbol": symbol,
        "open": price, "close": price, "high": price, "low": price,
        "volume": volume,
        "uOpen": price, "uClose": price, "uHigh": price, "uLow": price,
        "uVolume": volume,
    })
}

#[test]
fn full_unit_sync_applies_splits_and_converges_on_reingest() {
    let (_db_dir, pool) = common::setup_pool();
    let snapshot_dir = TempDir::new().unwrap();
    let service = IngestService::new(pool.clone(), snapshot_dir.path());

    let splits = vec![
        split_payload("AAPL", "2020-06-01", 1, 2, 101),
        split_payload("AAPL", "2020-07-01", 1, 3, 102),
    ];
    let dividends = vec![dividend_payload("AAPL", 201)];

    let (split_registry, dividend_registry) = service
        .sync_corporate_actions("AAPL", &splits, &dividends, TimestampFormat::EpochSeconds)
        .unwrap();
    assert_eq!(split_registry.count(), 2);
    assert_eq!(dividend_registry.count(), 1);

    let prices = vec![price_payload("AAPL", "2020-01-02", 30.0, 1000)];
    let series = service
        .sync_daily_prices("AAPL", 2020, &prices, &split_registry)
        .unwrap();

    // 30.00 through a 2-for-1 then a 3-for-1: x0.5 then x1/3.
    let bar = series.get(0).unwrap();
    assert_eq!(bar.close, 5.0);
    assert_eq!(bar.volume, 6000);
    assert_eq!(bar.unadjusted_close, 30.0);

    assert_eq!(count(&pool, "splits"), 2);
    assert_eq!(count(&pool, "dividends"), 1);
    assert_eq!(count(&pool, "daily_prices"), 1);

    // Re-ingest the same batches: an overlapping run must not add rows or
    // double-adjust.
    let (split_registry, _) = service
        .sync_corporate_actions("AAPL", &splits, &dividends, TimestampFormat::EpochSeconds)
        .unwrap();
    assert_eq!(split_registry.count(), 2);

    service
        .sync_daily_prices("AAPL", 2020, &prices, &split_registry)
        .unwrap();

    assert_eq!(count(&pool, "splits"), 2);
    assert_eq!(count(&pool, "dividends"), 1);
    assert_eq!(count(&pool, "daily_prices"), 1);

    let mut conn = db::get_connection(&pool).unwrap();
    let rows: Vec<CloseRow> =
        diesel::sql_query("SELECT close, volume FROM daily_prices")
            .load(&mut conn)
            .unwrap();
    assert_eq!(rows[0].close, 5.0);
    assert_eq!(rows[0].volume, 6000);
}

#[test]
fn malformed_payload_leaves_both_sinks_untouched() {
    let (_db_dir, pool) = common::setup_pool();
    let snapshot_dir = TempDir::new().unwrap();
    let service = IngestService::new(pool.clone(), snapshot_dir.path());

    let mut bad_split = split_payload("AAPL", "2020-06-01", 1, 2, 101);
    bad_split.as_object_mut().unwrap().remove("toFactor");

    let result = service.sync_corporate_actions(
        "AAPL",
        &[bad_split],
        &[],
        TimestampFormat::EpochSeconds,
    );
    assert!(result.is_err());

    // Nothing was created: no snapshot files, no tables.
    assert!(!snapshot_dir.path().join("splits").exists());
    let mut conn = db::get_connection(&pool).unwrap();
    let tables: Vec<CountRow> = diesel::sql_query(
        "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = 'splits'",
    )
    .load(&mut conn)
    .unwrap();
    assert_eq!(tables[0].count, 0);
}
