//! Partitioned parquet snapshot sink.
//!
//! One file per partition, fully replaced on every write. Writes are NOT
//! crash-atomic: a crash mid-rewrite can leave a truncated or missing file.
//! Recovery is upstream — provider re-fetch is idempotent and the pipeline
//! retries the partition from source.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use polars::prelude::*;

use super::snapshot_errors::SnapshotError;

type Result<T> = std::result::Result<T, SnapshotError>;

/// Columnar snapshot store rooted at one storage path.
pub struct SnapshotRepository {
    root: PathBuf,
}

impl SnapshotRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Price partitions are one file per symbol and calendar year.
    pub fn daily_price_path(&self, symbol: &str, year: i32) -> PathBuf {
        self.root
            .join("prices")
            .join(symbol)
            .join(format!("{}.parquet", year))
    }

    pub fn splits_path(&self, symbol: &str) -> PathBuf {
        self.root.join("splits").join(format!("{}.parquet", symbol))
    }

    pub fn dividends_path(&self, symbol: &str) -> PathBuf {
        self.root
            .join("dividends")
            .join(format!("{}.parquet", symbol))
    }

    /// Read one partition in full. A missing file is an empty prior state,
    /// not an error.
    pub fn read(&self, path: &Path) -> Result<Option<DataFrame>> {
        if !path.exists() {
            debug!("No snapshot at {}, treating as empty", path.display());
            return Ok(None);
        }
        let file = fs::File::open(path)?;
        let frame = ParquetReader::new(file).finish()?;
        Ok(Some(frame))
    }

    /// Replace one partition in full.
    pub fn write(&self, path: &Path, frame: &DataFrame) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!(
            "Writing snapshot of {} rows to {}",
            frame.height(),
            path.display()
        );
        let file = fs::File::create(path)?;
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Gzip(None))
            .finish(&mut frame.clone())?;
        Ok(())
    }

    /// Converge one partition to one row per key across re-ingestions.
    ///
    /// Prior state is read in full, the incoming batch appended, exact
    /// duplicate rows dropped, and where a key still repeats, the last
    /// occurrence in concatenation order wins — the new batch beats the old
    /// on conflicting keys by append order, not by any timestamp column.
    /// Returns the merged frame as written.
    pub fn merge_write(
        &self,
        path: &Path,
        incoming: &DataFrame,
        key_columns: &[&str],
    ) -> Result<DataFrame> {
        let combined = match self.read(path)? {
            Some(existing) => existing.vstack(incoming)?,
            None => incoming.clone(),
        };

        let keys = Some(key_columns.iter().map(|k| (*k).into()).collect());
        let merged = combined
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .unique_stable(keys, UniqueKeepStrategy::Last)
            .collect()?;

        self.write(path, &merged)?;
        Ok(merged)
    }
}
