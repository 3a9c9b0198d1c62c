//! DataFrame conversions for the snapshot sink. Calendar dates travel as
//! polars `Date` (days since epoch), timestamps as millisecond `Datetime`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;

use super::snapshot_errors::SnapshotError;
use crate::corporate_actions::{Dividend, DividendRegistry, Split, SplitRegistry};
use crate::persistence::{
    COL_AMOUNT, COL_CLOSE, COL_CURRENCY, COL_DATE, COL_DATE_LAST_ADJUSTED, COL_DECLARED_DATE,
    COL_DESCRIPTION, COL_EXECUTION_DATE, COL_FLAG, COL_FREQUENCY, COL_FROM_FACTOR, COL_HIGH,
    COL_ID, COL_KEY, COL_LOW, COL_OPEN, COL_PAYMENT_DATE, COL_RATIO, COL_RECORD_DATE, COL_REFID,
    COL_SUBKEY, COL_SYMBOL, COL_TO_FACTOR, COL_UNADJUSTED_CLOSE, COL_UNADJUSTED_HIGH,
    COL_UNADJUSTED_LOW, COL_UNADJUSTED_OPEN, COL_UNADJUSTED_VOLUME, COL_UPDATED, COL_VOLUME,
};
use crate::prices::{PriceBar, PriceSeries};

type Result<T> = std::result::Result<T, SnapshotError>;

pub fn price_series_to_frame(series: &PriceSeries) -> Result<DataFrame> {
    let bars: Vec<&PriceBar> = series.iter().collect();
    let frame = DataFrame::new(vec![
        date_column(COL_DATE, bars.iter().map(|b| b.date))?,
        Column::new(COL_SYMBOL.into(), bars.iter().map(|b| b.symbol.clone()).collect::<Vec<_>>()),
        date_column(COL_DATE_LAST_ADJUSTED, bars.iter().map(|b| b.date_last_adjusted))?,
        Column::new(COL_OPEN.into(), bars.iter().map(|b| b.open).collect::<Vec<_>>()),
        Column::new(COL_CLOSE.into(), bars.iter().map(|b| b.close).collect::<Vec<_>>()),
        Column::new(COL_HIGH.into(), bars.iter().map(|b| b.high).collect::<Vec<_>>()),
        Column::new(COL_LOW.into(), bars.iter().map(|b| b.low).collect::<Vec<_>>()),
        Column::new(COL_VOLUME.into(), bars.iter().map(|b| b.volume).collect::<Vec<_>>()),
        Column::new(
            COL_UNADJUSTED_OPEN.into(),
            bars.iter().map(|b| b.unadjusted_open).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_UNADJUSTED_CLOSE.into(),
            bars.iter().map(|b| b.unadjusted_close).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_UNADJUSTED_HIGH.into(),
            bars.iter().map(|b| b.unadjusted_high).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_UNADJUSTED_LOW.into(),
            bars.iter().map(|b| b.unadjusted_low).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_UNADJUSTED_VOLUME.into(),
            bars.iter().map(|b| b.unadjusted_volume).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(frame)
}

pub fn frame_to_price_series(df: &DataFrame) -> Result<PriceSeries> {
    let dates = date_values(df, COL_DATE)?;
    let symbols = string_values(df, COL_SYMBOL)?;
    let watermarks = date_values(df, COL_DATE_LAST_ADJUSTED)?;
    let opens = f64_values(df, COL_OPEN)?;
    let closes = f64_values(df, COL_CLOSE)?;
    let highs = f64_values(df, COL_HIGH)?;
    let lows = f64_values(df, COL_LOW)?;
    let volumes = i64_values(df, COL_VOLUME)?;
    let raw_opens = f64_values(df, COL_UNADJUSTED_OPEN)?;
    let raw_closes = f64_values(df, COL_UNADJUSTED_CLOSE)?;
    let raw_highs = f64_values(df, COL_UNADJUSTED_HIGH)?;
    let raw_lows = f64_values(df, COL_UNADJUSTED_LOW)?;
    let raw_volumes = i64_values(df, COL_UNADJUSTED_VOLUME)?;

    let mut series = PriceSeries::new();
    for i in 0..df.height() {
        series.add_bar(PriceBar {
            date: dates[i],
            date_last_adjusted: watermarks[i],
            symbol: symbols[i].clone(),
            open: opens[i],
            close: closes[i],
            high: highs[i],
            low: lows[i],
            volume: volumes[i],
            unadjusted_open: raw_opens[i],
            unadjusted_close: raw_closes[i],
            unadjusted_high: raw_highs[i],
            unadjusted_low: raw_lows[i],
            unadjusted_volume: raw_volumes[i],
        });
    }
    Ok(series)
}

pub fn splits_to_frame(registry: &SplitRegistry) -> Result<DataFrame> {
    let splits: Vec<&Split> = registry.iter().collect();
    let frame = DataFrame::new(vec![
        Column::new(COL_SYMBOL.into(), splits.iter().map(|s| s.symbol.clone()).collect::<Vec<_>>()),
        Column::new(COL_REFID.into(), splits.iter().map(|s| s.refid).collect::<Vec<_>>()),
        date_column(COL_EXECUTION_DATE, splits.iter().map(|s| s.execution_date))?,
        date_column(COL_DECLARED_DATE, splits.iter().map(|s| s.declared_date))?,
        Column::new(
            COL_FROM_FACTOR.into(),
            splits.iter().map(|s| s.from_factor).collect::<Vec<_>>(),
        ),
        Column::new(COL_TO_FACTOR.into(), splits.iter().map(|s| s.to_factor).collect::<Vec<_>>()),
        Column::new(COL_RATIO.into(), splits.iter().map(|s| s.ratio).collect::<Vec<_>>()),
        Column::new(
            COL_DESCRIPTION.into(),
            splits.iter().map(|s| s.description.clone()).collect::<Vec<_>>(),
        ),
        Column::new(COL_ID.into(), splits.iter().map(|s| s.id.clone()).collect::<Vec<_>>()),
        Column::new(COL_KEY.into(), splits.iter().map(|s| s.key.clone()).collect::<Vec<_>>()),
        Column::new(COL_SUBKEY.into(), splits.iter().map(|s| s.subkey.clone()).collect::<Vec<_>>()),
        datetime_column(COL_UPDATED, splits.iter().map(|s| s.updated))?,
    ])?;
    Ok(frame)
}

/// The stored ratio column is output-only; the ratio is recomputed from the
/// factors on the way back in.
pub fn frame_to_splits(df: &DataFrame) -> Result<SplitRegistry> {
    let symbols = string_values(df, COL_SYMBOL)?;
    let refids = i64_values(df, COL_REFID)?;
    let execution_dates = date_values(df, COL_EXECUTION_DATE)?;
    let declared_dates = date_values(df, COL_DECLARED_DATE)?;
    let from_factors = i64_values(df, COL_FROM_FACTOR)?;
    let to_factors = i64_values(df, COL_TO_FACTOR)?;
    let descriptions = string_values(df, COL_DESCRIPTION)?;
    let ids = string_values(df, COL_ID)?;
    let keys = string_values(df, COL_KEY)?;
    let subkeys = string_values(df, COL_SUBKEY)?;
    let updated = datetime_values(df, COL_UPDATED)?;

    let mut registry = SplitRegistry::new();
    for i in 0..df.height() {
        registry.insert_if_absent(Split::new(
            declared_dates[i],
            descriptions[i].clone(),
            execution_dates[i],
            from_factors[i],
            to_factors[i],
            refids[i],
            symbols[i].clone(),
            ids[i].clone(),
            keys[i].clone(),
            subkeys[i].clone(),
            updated[i],
        ));
    }
    Ok(registry)
}

pub fn dividends_to_frame(registry: &DividendRegistry) -> Result<DataFrame> {
    let dividends: Vec<&Dividend> = registry.iter().collect();
    let frame = DataFrame::new(vec![
        Column::new(
            COL_SYMBOL.into(),
            dividends.iter().map(|d| d.symbol.clone()).collect::<Vec<_>>(),
        ),
        Column::new(COL_REFID.into(), dividends.iter().map(|d| d.refid).collect::<Vec<_>>()),
        datetime_column(COL_DATE, dividends.iter().map(|d| d.date))?,
        date_column(COL_EXECUTION_DATE, dividends.iter().map(|d| d.execution_date))?,
        date_column(COL_DECLARED_DATE, dividends.iter().map(|d| d.declared_date))?,
        date_column(COL_PAYMENT_DATE, dividends.iter().map(|d| d.payment_date))?,
        date_column(COL_RECORD_DATE, dividends.iter().map(|d| d.record_date))?,
        Column::new(COL_AMOUNT.into(), dividends.iter().map(|d| d.amount).collect::<Vec<_>>()),
        Column::new(
            COL_CURRENCY.into(),
            dividends.iter().map(|d| d.currency.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            COL_DESCRIPTION.into(),
            dividends.iter().map(|d| d.description.clone()).collect::<Vec<_>>(),
        ),
        Column::new(COL_FLAG.into(), dividends.iter().map(|d| d.flag.clone()).collect::<Vec<_>>()),
        Column::new(
            COL_FREQUENCY.into(),
            dividends.iter().map(|d| d.frequency.clone()).collect::<Vec<_>>(),
        ),
        Column::new(COL_ID.into(), dividends.iter().map(|d| d.id.clone()).collect::<Vec<_>>()),
        Column::new(COL_KEY.into(), dividends.iter().map(|d| d.key.clone()).collect::<Vec<_>>()),
        Column::new(
            COL_SUBKEY.into(),
            dividends.iter().map(|d| d.subkey.clone()).collect::<Vec<_>>(),
        ),
        datetime_column(COL_UPDATED, dividends.iter().map(|d| d.updated))?,
    ])?;
    Ok(frame)
}

pub fn frame_to_dividends(df: &DataFrame) -> Result<DividendRegistry> {
    let symbols = string_values(df, COL_SYMBOL)?;
    let refids = i64_values(df, COL_REFID)?;
    let dates = datetime_values(df, COL_DATE)?;
    let execution_dates = date_values(df, COL_EXECUTION_DATE)?;
    let declared_dates = date_values(df, COL_DECLARED_DATE)?;
    let payment_dates = date_values(df, COL_PAYMENT_DATE)?;
    let record_dates = date_values(df, COL_RECORD_DATE)?;
    let amounts = f64_values(df, COL_AMOUNT)?;
    let currencies = string_values(df, COL_CURRENCY)?;
    let descriptions = string_values(df, COL_DESCRIPTION)?;
    let flags = string_values(df, COL_FLAG)?;
    let frequencies = string_values(df, COL_FREQUENCY)?;
    let ids = string_values(df, COL_ID)?;
    let keys = string_values(df, COL_KEY)?;
    let subkeys = string_values(df, COL_SUBKEY)?;
    let updated = datetime_values(df, COL_UPDATED)?;

    let mut registry = DividendRegistry::new();
    for i in 0..df.height() {
        registry.insert_if_absent(Dividend {
            amount: amounts[i],
            currency: currencies[i].clone(),
            declared_date: declared_dates[i],
            description: descriptions[i].clone(),
            execution_date: execution_dates[i],
            flag: flags[i].clone(),
            frequency: frequencies[i].clone(),
            payment_date: payment_dates[i],
            record_date: record_dates[i],
            refid: refids[i],
            symbol: symbols[i].clone(),
            id: ids[i].clone(),
            key: keys[i].clone(),
            subkey: subkeys[i].clone(),
            date: dates[i],
            updated: updated[i],
        });
    }
    Ok(registry)
}

// ── Column builders ─────────────────────────────────────────────────

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch date is representable")
}

fn date_column(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<Column> {
    let days: Vec<i32> = dates
        .map(|d| (d - epoch_date()).num_days() as i32)
        .collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

fn datetime_column(name: &str, stamps: impl Iterator<Item = NaiveDateTime>) -> Result<Column> {
    let millis: Vec<i64> = stamps.map(|t| t.and_utc().timestamp_millis()).collect();
    Ok(Column::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}

// ── Column readers ──────────────────────────────────────────────────

fn date_values(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let column = df
        .column(name)
        .map_err(|e| SnapshotError::column(name, e))?;
    let ca = column.date().map_err(|e| SnapshotError::column(name, e))?;
    let mut out = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let days = ca.get(row).ok_or_else(|| SnapshotError::null(name, row))?;
        out.push(epoch_date() + Duration::days(days as i64));
    }
    Ok(out)
}

fn datetime_values(df: &DataFrame, name: &str) -> Result<Vec<NaiveDateTime>> {
    let column = df
        .column(name)
        .map_err(|e| SnapshotError::column(name, e))?;
    let ca = column
        .datetime()
        .map_err(|e| SnapshotError::column(name, e))?;
    let mut out = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let millis = ca.get(row).ok_or_else(|| SnapshotError::null(name, row))?;
        let stamp = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| SnapshotError::column(name, "timestamp out of range"))?;
        out.push(stamp.naive_utc());
    }
    Ok(out)
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|e| SnapshotError::column(name, e))?;
    let ca = column.str().map_err(|e| SnapshotError::column(name, e))?;
    let mut out = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let text = ca.get(row).ok_or_else(|| SnapshotError::null(name, row))?;
        out.push(text.to_string());
    }
    Ok(out)
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|e| SnapshotError::column(name, e))?;
    let ca = column.f64().map_err(|e| SnapshotError::column(name, e))?;
    let mut out = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        out.push(ca.get(row).ok_or_else(|| SnapshotError::null(name, row))?);
    }
    Ok(out)
}

fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let column = df
        .column(name)
        .map_err(|e| SnapshotError::column(name, e))?;
    let ca = column.i64().map_err(|e| SnapshotError::column(name, e))?;
    let mut out = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        out.push(ca.get(row).ok_or_else(|| SnapshotError::null(name, row))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::prices_model::tests::bar;

    #[test]
    fn price_series_survives_the_frame_round_trip() {
        let mut series = PriceSeries::new();
        series.add_bar(bar((2020, 1, 2), 297.43, 33_911_864));
        series.add_bar(bar((2020, 1, 3), 293.65, 36_633_878));

        let frame = price_series_to_frame(&series).unwrap();
        assert_eq!(frame.height(), 2);
        let back = frame_to_price_series(&frame).unwrap();
        assert_eq!(series, back);
    }

    #[test]
    fn split_registry_survives_the_frame_round_trip() {
        let date = NaiveDate::from_ymd_opt(2020, 8, 31).unwrap();
        let mut registry = SplitRegistry::new();
        registry.insert_if_absent(Split::new(
            date,
            "4-for-1 split".to_string(),
            date,
            1,
            4,
            6_846_210,
            "AAPL".to_string(),
            "SPLITS".to_string(),
            "AAPL".to_string(),
            "6846210".to_string(),
            DateTime::from_timestamp(1_598_832_000, 0).unwrap().naive_utc(),
        ));

        let frame = splits_to_frame(&registry).unwrap();
        let back = frame_to_splits(&frame).unwrap();
        assert_eq!(registry, back);
        assert_eq!(back.get(0).unwrap().ratio, 0.25);
    }
}
