use chrono::{NaiveDate, NaiveDateTime};

use crate::corporate_actions::{Dividend, Split};
use crate::prices::PriceBar;

/// One cell of a staged row, rendered into SQL text on load. String content
/// is escaped; identifiers never travel through this type.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    BigInt(i64),
    Double(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Null,
}

impl SqlValue {
    pub fn render(&self) -> String {
        match self {
            SqlValue::Text(text) => format!("'{}'", text.replace('\'', "''")),
            SqlValue::BigInt(value) => value.to_string(),
            SqlValue::Double(value) => {
                if value.is_finite() {
                    value.to_string()
                } else {
                    "NULL".to_string()
                }
            }
            SqlValue::Date(date) => format!("'{}'", date.format("%Y-%m-%d")),
            SqlValue::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            SqlValue::Null => "NULL".to_string(),
        }
    }
}

/// Conversion into one staged row, cells ordered to match the owning
/// `TableSpec::merge_columns()` (key columns first, then value columns).
pub trait ToSqlRow {
    fn to_row(&self) -> Vec<SqlValue>;
}

impl ToSqlRow for PriceBar {
    fn to_row(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Date(self.date),
            SqlValue::Text(self.symbol.clone()),
            SqlValue::Date(self.date_last_adjusted),
            SqlValue::Double(self.open),
            SqlValue::Double(self.close),
            SqlValue::Double(self.high),
            SqlValue::Double(self.low),
            SqlValue::BigInt(self.volume),
            SqlValue::Double(self.unadjusted_open),
            SqlValue::Double(self.unadjusted_close),
            SqlValue::Double(self.unadjusted_high),
            SqlValue::Double(self.unadjusted_low),
            SqlValue::BigInt(self.unadjusted_volume),
        ]
    }
}

impl ToSqlRow for Split {
    fn to_row(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.symbol.clone()),
            SqlValue::BigInt(self.refid),
            SqlValue::Date(self.execution_date),
            SqlValue::Date(self.declared_date),
            SqlValue::BigInt(self.from_factor),
            SqlValue::BigInt(self.to_factor),
            SqlValue::Double(self.ratio),
            SqlValue::Text(self.description.clone()),
            SqlValue::Text(self.id.clone()),
            SqlValue::Text(self.key.clone()),
            SqlValue::Text(self.subkey.clone()),
            SqlValue::Timestamp(self.updated),
        ]
    }
}

impl ToSqlRow for Dividend {
    fn to_row(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.symbol.clone()),
            SqlValue::BigInt(self.refid),
            SqlValue::Timestamp(self.date),
            SqlValue::Date(self.execution_date),
            SqlValue::Date(self.declared_date),
            SqlValue::Date(self.payment_date),
            SqlValue::Date(self.record_date),
            SqlValue::Double(self.amount),
            SqlValue::Text(self.currency.clone()),
            SqlValue::Text(self.description.clone()),
            SqlValue::Text(self.flag.clone()),
            SqlValue::Text(self.frequency.clone()),
            SqlValue::Text(self.id.clone()),
            SqlValue::Text(self.key.clone()),
            SqlValue::Text(self.subkey.clone()),
            SqlValue::Timestamp(self.updated),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rendering_escapes_quotes() {
        let value = SqlValue::Text("O'Reilly; DROP TABLE daily_prices".to_string());
        assert_eq!(value.render(), "'O''Reilly; DROP TABLE daily_prices'");
    }

    #[test]
    fn non_finite_doubles_render_as_null() {
        assert_eq!(SqlValue::Double(f64::NAN).render(), "NULL");
        assert_eq!(SqlValue::Double(f64::INFINITY).render(), "NULL");
    }

    #[test]
    fn price_bar_row_matches_daily_price_columns() {
        use crate::persistence::persistence_schema::TableSpec;
        use crate::prices::prices_model::tests::bar;

        let spec = TableSpec::daily_prices();
        let row = bar((2020, 1, 2), 100.0, 1000).to_row();
        assert_eq!(row.len(), spec.merge_columns().len());
    }
}
