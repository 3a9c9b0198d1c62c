use chrono::NaiveDate;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prices_errors::PriceError;
use crate::corporate_actions::SplitRegistry;
use crate::utils::time_utils::parse_date_value;

/// One daily OHLCV bar.
///
/// The `unadjusted_*` fields hold the raw provider values and are never
/// mutated. The adjusted fields equal the raw fields scaled by every split
/// absorbed so far; `date_last_adjusted` is the watermark marking the latest
/// split execution date already folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub date: NaiveDate,
    pub date_last_adjusted: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
    pub unadjusted_open: f64,
    pub unadjusted_close: f64,
    pub unadjusted_high: f64,
    pub unadjusted_low: f64,
    pub unadjusted_volume: i64,
}

impl PriceBar {
    /// Parse one provider payload object. All fields are required; the
    /// watermark falls back to the bar date when the payload has not been
    /// through adjustment yet.
    pub fn from_payload(payload: &Value) -> Result<Self, PriceError> {
        let date = date_field(payload, "date")?;
        let date_last_adjusted = match payload.get("dateLastAdjusted") {
            Some(value) => parse_date_value(value)
                .ok_or_else(|| invalid("dateLastAdjusted", "expected an ISO-8601 date"))?,
            None => date,
        };

        Ok(Self {
            date,
            date_last_adjusted,
            symbol: string_field(payload, "symbol")?,
            open: float_field(payload, "open")?,
            close: float_field(payload, "close")?,
            high: float_field(payload, "high")?,
            low: float_field(payload, "low")?,
            volume: int_field(payload, "volume")?,
            unadjusted_open: float_field(payload, "uOpen")?,
            unadjusted_close: float_field(payload, "uClose")?,
            unadjusted_high: float_field(payload, "uHigh")?,
            unadjusted_low: float_field(payload, "uLow")?,
            unadjusted_volume: int_field(payload, "uVolume")?,
        })
    }

    /// Fold one split into the bar. A ratio of 0.5 means one share becomes
    /// two; 2.0 the reverse.
    ///
    /// Returns `false` without mutating when the ratio is non-positive or
    /// when `execution_date` is at or before the watermark — the bar has
    /// already absorbed that split, so re-application is a no-op. On
    /// success, prices are scaled and rounded half-up to 2 decimals, volume
    /// is multiplied by `trunc(1 / ratio)` (exact only for integer n-for-1
    /// and 1-for-n ratios), and the watermark advances to `execution_date`.
    pub fn apply_split(&mut self, ratio: f64, execution_date: NaiveDate) -> bool {
        if ratio <= 0.0 {
            return false;
        }

        if execution_date <= self.date_last_adjusted {
            return false;
        }

        self.open = round_price(self.open * ratio);
        self.close = round_price(self.close * ratio);
        self.high = round_price(self.high * ratio);
        self.low = round_price(self.low * ratio);
        self.volume *= (1.0 / ratio) as i64;

        self.date_last_adjusted = execution_date;
        true
    }
}

fn round_price(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Ordered run of daily bars for one symbol, one bar per trading date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self { bars: Vec::new() }
    }

    /// All-or-nothing construction: one malformed payload fails the batch.
    pub fn parse_batch(payloads: &[Value]) -> Result<Self, PriceError> {
        let mut series = Self::new();
        for payload in payloads {
            series.add_bar(PriceBar::from_payload(payload)?);
        }
        Ok(series)
    }

    pub fn add_bar(&mut self, bar: PriceBar) {
        self.bars.push(bar);
    }

    pub fn count(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriceBar> {
        self.bars.iter()
    }

    /// Offer one split to every bar; each bar accepts or skips via its own
    /// watermark.
    pub fn apply_split(&mut self, ratio: f64, execution_date: NaiveDate) {
        for bar in &mut self.bars {
            bar.apply_split(ratio, execution_date);
        }
    }

    /// Apply a registry of splits oldest-to-newest. The registry's sort
    /// order is load-bearing: compounding depends on application order, not
    /// just the product of the ratios.
    pub fn apply_splits(&mut self, splits: &SplitRegistry) {
        for split in splits {
            self.apply_split(split.ratio, split.execution_date);
        }
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PriceBar;
    type IntoIter = std::slice::Iter<'a, PriceBar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

// ── Payload field extraction ────────────────────────────────────────

fn require<'a>(payload: &'a Value, name: &str) -> Result<&'a Value, PriceError> {
    payload
        .get(name)
        .ok_or_else(|| PriceError::MissingField(name.to_string()))
}

fn string_field(payload: &Value, name: &str) -> Result<String, PriceError> {
    require(payload, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(name, "expected a string"))
}

fn int_field(payload: &Value, name: &str) -> Result<i64, PriceError> {
    require(payload, name)?
        .as_i64()
        .ok_or_else(|| invalid(name, "expected an integer"))
}

fn float_field(payload: &Value, name: &str) -> Result<f64, PriceError> {
    require(payload, name)?
        .as_f64()
        .ok_or_else(|| invalid(name, "expected a number"))
}

fn date_field(payload: &Value, name: &str) -> Result<NaiveDate, PriceError> {
    let value = require(payload, name)?;
    parse_date_value(value).ok_or_else(|| invalid(name, "expected an ISO-8601 date"))
}

fn invalid(field: &str, reason: &str) -> PriceError {
    PriceError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    use crate::corporate_actions::Split;

    pub(crate) fn bar(date: (i32, u32, u32), close: f64, volume: i64) -> PriceBar {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        PriceBar {
            date,
            date_last_adjusted: date,
            symbol: "AAPL".to_string(),
            open: close,
            close,
            high: close,
            low: close,
            volume,
            unadjusted_open: close,
            unadjusted_close: close,
            unadjusted_high: close,
            unadjusted_low: close,
            unadjusted_volume: volume,
        }
    }

    fn registry_of(splits: &[(i32, u32, u32, i64, i64)]) -> SplitRegistry {
        let mut registry = SplitRegistry::new();
        for &(y, m, d, from, to) in splits {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            registry.insert_if_absent(Split::new(
                date,
                format!("{}-for-{}", to, from),
                date,
                from,
                to,
                1,
                "AAPL".to_string(),
                "SPLITS".to_string(),
                "AAPL".to_string(),
                "1".to_string(),
                NaiveDateTime::default(),
            ));
        }
        registry
    }

    #[test]
    fn non_positive_ratio_is_rejected_without_mutation() {
        let mut b = bar((2020, 1, 1), 30.0, 1000);
        let before = b.clone();
        assert!(!b.apply_split(0.0, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()));
        assert!(!b.apply_split(-0.5, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()));
        assert_eq!(b, before);
    }

    #[test]
    fn split_at_or_before_watermark_is_skipped() {
        let mut b = bar((2020, 1, 1), 30.0, 1000);
        assert!(b.apply_split(0.5, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()));
        let adjusted = b.clone();

        // Same execution date again: watermark already caught up.
        assert!(!b.apply_split(0.5, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()));
        // Older split arriving late: also skipped.
        assert!(!b.apply_split(0.5, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()));
        assert_eq!(b, adjusted);
    }

    #[test]
    fn raw_fields_survive_adjustment() {
        let mut b = bar((2020, 1, 1), 30.0, 1000);
        b.apply_split(0.5, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap());
        assert_eq!(b.close, 15.0);
        assert_eq!(b.volume, 2000);
        assert_eq!(b.unadjusted_close, 30.0);
        assert_eq!(b.unadjusted_volume, 1000);
        assert_eq!(
            b.date_last_adjusted,
            NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()
        );
    }

    #[test]
    fn compounding_follows_registry_order() {
        // 2-for-1 in June, then 3-for-1 in July.
        let registry = registry_of(&[(2020, 7, 1, 1, 3), (2020, 6, 1, 1, 2)]);

        let mut series = PriceSeries::new();
        series.add_bar(bar((2020, 1, 1), 30.0, 1000));
        series.apply_splits(&registry);

        let adjusted = series.get(0).unwrap();
        assert_eq!(adjusted.close, 5.0);
        assert_eq!(adjusted.volume, 6000);
        assert_eq!(
            adjusted.date_last_adjusted,
            NaiveDate::from_ymd_opt(2020, 7, 1).unwrap()
        );
    }

    #[test]
    fn reapplying_the_same_splits_is_idempotent() {
        let registry = registry_of(&[(2020, 6, 1, 1, 2), (2020, 7, 1, 1, 3)]);

        let mut once = PriceSeries::new();
        once.add_bar(bar((2020, 1, 1), 30.0, 1000));
        once.apply_splits(&registry);

        let mut twice = once.clone();
        twice.apply_splits(&registry);

        assert_eq!(once, twice);
    }

    #[test]
    fn bar_dated_after_split_is_still_adjusted_until_watermark_catches_up() {
        // The guard compares the watermark, not the bar's calendar date.
        let mut late_bar = bar((2020, 8, 15), 12.0, 500);
        late_bar.date_last_adjusted = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(late_bar.apply_split(0.5, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()));
        assert_eq!(late_bar.close, 6.0);
    }

    #[test]
    fn parse_batch_rejects_missing_required_field() {
        let good = serde_json::json!({
            "date": "2020-01-02",
            "symbol": "AAPL",
            "open": 296.24, "close": 297.43, "high": 298.93, "low": 295.19,
            "volume": 33_911_864_i64,
            "uOpen": 296.24, "uClose": 297.43, "uHigh": 298.93, "uLow": 295.19,
            "uVolume": 33_911_864_i64,
        });
        let mut bad = good.clone();
        bad.as_object_mut().unwrap().remove("uClose");

        assert!(PriceSeries::parse_batch(&[good.clone()]).is_ok());
        assert!(PriceSeries::parse_batch(&[good, bad]).is_err());
    }
}
