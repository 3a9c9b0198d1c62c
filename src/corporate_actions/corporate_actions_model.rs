use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::corporate_actions_errors::CorporateActionError;
use crate::utils::time_utils::{parse_date_value, parse_timestamp_value, TimestampFormat};

/// Contract for registry members: the sort key alone decides position,
/// full-field equality decides duplicates.
pub trait OrderedAction: Clone + PartialEq {
    type SortKey: Ord + Copy;

    fn sort_key(&self) -> Self::SortKey;
}

/// Construction from one provider payload object. Every required field must
/// be present and well-typed; anything less fails the whole item.
pub trait FromPayload: Sized {
    fn from_payload(payload: &Value, format: TimestampFormat)
        -> Result<Self, CorporateActionError>;
}

/// A stock split event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub declared_date: NaiveDate,
    pub description: String,
    pub execution_date: NaiveDate,
    pub from_factor: i64,
    pub to_factor: i64,
    /// Always recomputed from the factors; provider-supplied ratios can be
    /// truncated.
    pub ratio: f64,
    pub refid: i64,
    pub symbol: String,
    pub id: String,
    pub key: String,
    pub subkey: String,
    pub updated: NaiveDateTime,
}

impl Split {
    pub fn new(
        declared_date: NaiveDate,
        description: String,
        execution_date: NaiveDate,
        from_factor: i64,
        to_factor: i64,
        refid: i64,
        symbol: String,
        id: String,
        key: String,
        subkey: String,
        updated: NaiveDateTime,
    ) -> Self {
        Self {
            declared_date,
            description,
            execution_date,
            from_factor,
            to_factor,
            ratio: from_factor as f64 / to_factor as f64,
            refid,
            symbol,
            id,
            key,
            subkey,
            updated,
        }
    }
}

// `ratio` is derived from the factors and excluded from equality.
impl PartialEq for Split {
    fn eq(&self, other: &Self) -> bool {
        self.declared_date == other.declared_date
            && self.description == other.description
            && self.execution_date == other.execution_date
            && self.from_factor == other.from_factor
            && self.to_factor == other.to_factor
            && self.refid == other.refid
            && self.symbol == other.symbol
            && self.id == other.id
            && self.key == other.key
            && self.subkey == other.subkey
            && self.updated == other.updated
    }
}

impl OrderedAction for Split {
    type SortKey = NaiveDate;

    fn sort_key(&self) -> NaiveDate {
        self.execution_date
    }
}

impl FromPayload for Split {
    fn from_payload(
        payload: &Value,
        format: TimestampFormat,
    ) -> Result<Self, CorporateActionError> {
        Ok(Split::new(
            date_field(payload, "declaredDate")?,
            string_field(payload, "description")?,
            date_field(payload, "exDate")?,
            int_field(payload, "fromFactor")?,
            int_field(payload, "toFactor")?,
            int_field(payload, "refid")?,
            string_field(payload, "symbol")?,
            string_field(payload, "id")?,
            string_field(payload, "key")?,
            string_field(payload, "subkey")?,
            timestamp_field(payload, "updated", format)?,
        ))
    }
}

/// A cash dividend event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dividend {
    pub amount: f64,
    pub currency: String,
    pub declared_date: NaiveDate,
    pub description: String,
    pub execution_date: NaiveDate,
    pub flag: String,
    pub frequency: String,
    pub payment_date: NaiveDate,
    pub record_date: NaiveDate,
    pub refid: i64,
    pub symbol: String,
    pub id: String,
    pub key: String,
    pub subkey: String,
    pub date: NaiveDateTime,
    pub updated: NaiveDateTime,
}

impl Dividend {
    pub fn unique_key(&self) -> String {
        format!("{}.{}", self.key, self.subkey)
    }
}

impl OrderedAction for Dividend {
    type SortKey = NaiveDateTime;

    fn sort_key(&self) -> NaiveDateTime {
        self.date
    }
}

impl FromPayload for Dividend {
    fn from_payload(
        payload: &Value,
        format: TimestampFormat,
    ) -> Result<Self, CorporateActionError> {
        Ok(Dividend {
            amount: float_field(payload, "amount")?,
            currency: string_field(payload, "currency")?,
            declared_date: date_field(payload, "declaredDate")?,
            description: string_field(payload, "description")?,
            execution_date: date_field(payload, "exDate")?,
            flag: string_field(payload, "flag")?,
            frequency: string_field(payload, "frequency")?,
            payment_date: date_field(payload, "paymentDate")?,
            record_date: date_field(payload, "recordDate")?,
            refid: int_field(payload, "refid")?,
            symbol: string_field(payload, "symbol")?,
            id: string_field(payload, "id")?,
            key: string_field(payload, "key")?,
            subkey: string_field(payload, "subkey")?,
            date: timestamp_field(payload, "date", format)?,
            updated: timestamp_field(payload, "updated", format)?,
        })
    }
}

/// Tagged union over the action variants, for callers routing mixed events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CorporateAction {
    Split(Split),
    Dividend(Dividend),
}

impl CorporateAction {
    pub fn symbol(&self) -> &str {
        match self {
            CorporateAction::Split(split) => &split.symbol,
            CorporateAction::Dividend(dividend) => &dividend.symbol,
        }
    }

    /// The variant's natural ordering key, widened to a timestamp.
    pub fn ordering_timestamp(&self) -> NaiveDateTime {
        match self {
            CorporateAction::Split(split) => split
                .execution_date
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always representable"),
            CorporateAction::Dividend(dividend) => dividend.date,
        }
    }
}

// ── Payload field extraction ────────────────────────────────────────

fn require<'a>(payload: &'a Value, name: &str) -> Result<&'a Value, CorporateActionError> {
    payload
        .get(name)
        .ok_or_else(|| CorporateActionError::MissingField(name.to_string()))
}

fn string_field(payload: &Value, name: &str) -> Result<String, CorporateActionError> {
    require(payload, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(name, "expected a string"))
}

fn int_field(payload: &Value, name: &str) -> Result<i64, CorporateActionError> {
    require(payload, name)?
        .as_i64()
        .ok_or_else(|| invalid(name, "expected an integer"))
}

fn float_field(payload: &Value, name: &str) -> Result<f64, CorporateActionError> {
    require(payload, name)?
        .as_f64()
        .ok_or_else(|| invalid(name, "expected a number"))
}

fn date_field(payload: &Value, name: &str) -> Result<NaiveDate, CorporateActionError> {
    let value = require(payload, name)?;
    parse_date_value(value).ok_or_else(|| invalid(name, "expected an ISO-8601 date"))
}

fn timestamp_field(
    payload: &Value,
    name: &str,
    format: TimestampFormat,
) -> Result<NaiveDateTime, CorporateActionError> {
    let value = require(payload, name)?;
    parse_timestamp_value(value, format)
        .ok_or_else(|| invalid(name, "value does not match the declared timestamp format"))
}

fn invalid(field: &str, reason: &str) -> CorporateActionError {
    CorporateActionError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
