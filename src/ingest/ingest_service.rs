use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use serde_json::Value;

use crate::corporate_actions::{
    DividendRegistry, SplitRegistry, TimestampFormat,
};
use crate::db::DbPool;
use crate::errors::Result;
use crate::persistence::{MergeRepository, TableSpec, ToSqlRow, COL_DATE, COL_SYMBOL};
use crate::prices::PriceSeries;
use crate::snapshot::{
    dividends_to_frame, frame_to_dividends, frame_to_splits, price_series_to_frame,
    splits_to_frame, SnapshotRepository,
};

/// Orchestrates one ingestion unit (one symbol, one pass): parse the
/// provider payloads, merge with previously persisted state, adjust, and
/// hand off to both sinks.
///
/// Built fresh per unit with an explicit pool and snapshot root; nothing is
/// retained between units. Parsing, merging and adjustment complete before
/// any sink connection is used.
pub struct IngestService {
    repository: MergeRepository,
    snapshots: SnapshotRepository,
}

impl IngestService {
    pub fn new(pool: Arc<DbPool>, snapshot_root: impl Into<PathBuf>) -> Self {
        Self {
            repository: MergeRepository::new(pool),
            snapshots: SnapshotRepository::new(snapshot_root),
        }
    }

    /// Ingest one batch of split and dividend payloads for a symbol.
    ///
    /// Both batches parse all-or-nothing. The parsed registries are merged
    /// into whatever earlier runs persisted, so re-ingesting an overlapping
    /// range only adds the genuinely new events. The merged registries are
    /// rewritten to their snapshots and upserted into the relational sink,
    /// then returned for use by price adjustment.
    pub fn sync_corporate_actions(
        &self,
        symbol: &str,
        split_payloads: &[Value],
        dividend_payloads: &[Value],
        format: TimestampFormat,
    ) -> Result<(SplitRegistry, DividendRegistry)> {
        let fresh_splits = SplitRegistry::parse_batch(split_payloads, format)?;
        let fresh_dividends = DividendRegistry::parse_batch(dividend_payloads, format)?;

        let splits_path = self.snapshots.splits_path(symbol);
        let mut splits = match self.snapshots.read(&splits_path)? {
            Some(frame) => frame_to_splits(&frame)?,
            None => SplitRegistry::new(),
        };
        splits.merge_from(&fresh_splits);

        let dividends_path = self.snapshots.dividends_path(symbol);
        let mut dividends = match self.snapshots.read(&dividends_path)? {
            Some(frame) => frame_to_dividends(&frame)?,
            None => DividendRegistry::new(),
        };
        dividends.merge_from(&fresh_dividends);

        info!(
            "{}: {} splits, {} dividends after merge",
            symbol,
            splits.count(),
            dividends.count()
        );

        self.snapshots.write(&splits_path, &splits_to_frame(&splits)?)?;
        self.snapshots
            .write(&dividends_path, &dividends_to_frame(&dividends)?)?;

        let split_spec = TableSpec::splits();
        self.repository.create_table_if_not_exists(&split_spec)?;
        let split_rows: Vec<_> = splits.iter().map(ToSqlRow::to_row).collect();
        self.repository.upsert_batch(&split_spec, &split_rows)?;

        let dividend_spec = TableSpec::dividends();
        self.repository.create_table_if_not_exists(&dividend_spec)?;
        let dividend_rows: Vec<_> = dividends.iter().map(ToSqlRow::to_row).collect();
        self.repository.upsert_batch(&dividend_spec, &dividend_rows)?;

        Ok((splits, dividends))
    }

    /// Ingest one year partition of daily price payloads for a symbol,
    /// folding in the given splits (oldest first) before anything touches a
    /// sink.
    pub fn sync_daily_prices(
        &self,
        symbol: &str,
        year: i32,
        price_payloads: &[Value],
        splits: &SplitRegistry,
    ) -> Result<PriceSeries> {
        let mut series = PriceSeries::parse_batch(price_payloads)?;
        series.apply_splits(splits);

        info!("{}/{}: {} bars after adjustment", symbol, year, series.count());

        let path = self.snapshots.daily_price_path(symbol, year);
        let frame = price_series_to_frame(&series)?;
        self.snapshots
            .merge_write(&path, &frame, &[COL_DATE, COL_SYMBOL])?;

        let spec = TableSpec::daily_prices();
        self.repository.create_table_if_not_exists(&spec)?;
        let rows: Vec<_> = series.iter().map(ToSqlRow::to_row).collect();
        self.repository.upsert_batch(&spec, &rows)?;

        Ok(series)
    }
}
