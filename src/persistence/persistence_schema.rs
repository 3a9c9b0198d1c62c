use lazy_static::lazy_static;
use regex::Regex;

use super::persistence_constants::{
    COL_AMOUNT, COL_CLOSE, COL_CURRENCY, COL_DATE, COL_DATE_LAST_ADJUSTED, COL_DECLARED_DATE,
    COL_DESCRIPTION, COL_EXECUTION_DATE, COL_FLAG, COL_FREQUENCY, COL_FROM_FACTOR, COL_HIGH,
    COL_ID, COL_KEY, COL_LOW, COL_OPEN, COL_PAYMENT_DATE, COL_RATIO, COL_RECORD_DATE, COL_REFID,
    COL_SUBKEY, COL_SYMBOL, COL_TO_FACTOR, COL_UNADJUSTED_CLOSE, COL_UNADJUSTED_HIGH,
    COL_UNADJUSTED_LOW, COL_UNADJUSTED_OPEN, COL_UNADJUSTED_VOLUME, COL_UPDATED, COL_VOLUME,
    TABLE_DAILY_PRICES, TABLE_DIVIDENDS, TABLE_SPLITS,
};
use super::persistence_errors::PersistenceError;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Vet a caller-supplied name before it is ever interpolated into SQL text.
pub fn validate_identifier(name: &str) -> Result<(), PersistenceError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(PersistenceError::InvalidIdentifier(name.to_string()))
    }
}

/// SQL column types the sink understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    BigInt,
    Text,
    Double,
    Date,
    Timestamp,
    Varchar(u16),
}

impl SqlType {
    pub fn sql_string(&self) -> String {
        match self {
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Varchar(len) => format!("VARCHAR({})", len),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
}

/// Ordered column layout of one sink table. Identifiers are validated at
/// construction, so generated SQL only ever contains vetted names.
#[derive(Debug, Clone)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(columns: &[(&str, SqlType)]) -> Result<Self, PersistenceError> {
        let mut defs = Vec::with_capacity(columns.len());
        for (name, sql_type) in columns {
            validate_identifier(name)?;
            defs.push(ColumnDef {
                name: name.to_string(),
                sql_type: *sql_type,
            });
        }
        Ok(Self { columns: defs })
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// `name TYPE` pairs, one per line, for table-creation statements.
    pub fn sql_string(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("    {} {}", c.name, c.sql_type.sql_string()))
            .collect::<Vec<_>>()
            .join(",\n")
    }
}

/// Everything the merge protocol needs to know about one target table:
/// layout, which columns identify a row, and which carry the payload.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub schema: TableSchema,
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
}

impl TableSpec {
    pub fn new(
        name: &str,
        schema: TableSchema,
        key_columns: &[&str],
        value_columns: &[&str],
    ) -> Result<Self, PersistenceError> {
        validate_identifier(name)?;
        for column in key_columns.iter().chain(value_columns) {
            validate_identifier(column)?;
            if !schema.contains_column(column) {
                return Err(PersistenceError::UnknownColumn(column.to_string()));
            }
        }
        Ok(Self {
            name: name.to_string(),
            schema,
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
            value_columns: value_columns.iter().map(|c| c.to_string()).collect(),
        })
    }

    /// Key columns followed by value columns, the order every generated
    /// statement uses.
    pub fn merge_columns(&self) -> Vec<&str> {
        self.key_columns
            .iter()
            .chain(self.value_columns.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn daily_prices() -> Self {
        let schema = TableSchema::new(&[
            (COL_DATE, SqlType::Date),
            (COL_SYMBOL, SqlType::Varchar(8)),
            (COL_DATE_LAST_ADJUSTED, SqlType::Date),
            (COL_OPEN, SqlType::Double),
            (COL_CLOSE, SqlType::Double),
            (COL_HIGH, SqlType::Double),
            (COL_LOW, SqlType::Double),
            (COL_VOLUME, SqlType::BigInt),
            (COL_UNADJUSTED_OPEN, SqlType::Double),
            (COL_UNADJUSTED_CLOSE, SqlType::Double),
            (COL_UNADJUSTED_HIGH, SqlType::Double),
            (COL_UNADJUSTED_LOW, SqlType::Double),
            (COL_UNADJUSTED_VOLUME, SqlType::BigInt),
        ])
        .expect("static schema");
        Self::new(
            TABLE_DAILY_PRICES,
            schema,
            &[COL_DATE, COL_SYMBOL],
            &[
                COL_DATE_LAST_ADJUSTED,
                COL_OPEN,
                COL_CLOSE,
                COL_HIGH,
                COL_LOW,
                COL_VOLUME,
                COL_UNADJUSTED_OPEN,
                COL_UNADJUSTED_CLOSE,
                COL_UNADJUSTED_HIGH,
                COL_UNADJUSTED_LOW,
                COL_UNADJUSTED_VOLUME,
            ],
        )
        .expect("static spec")
    }

    pub fn splits() -> Self {
        let schema = TableSchema::new(&[
            (COL_SYMBOL, SqlType::Varchar(8)),
            (COL_REFID, SqlType::BigInt),
            (COL_EXECUTION_DATE, SqlType::Date),
            (COL_DECLARED_DATE, SqlType::Date),
            (COL_FROM_FACTOR, SqlType::BigInt),
            (COL_TO_FACTOR, SqlType::BigInt),
            (COL_RATIO, SqlType::Double),
            (COL_DESCRIPTION, SqlType::Text),
            (COL_ID, SqlType::Text),
            (COL_KEY, SqlType::Text),
            (COL_SUBKEY, SqlType::Text),
            (COL_UPDATED, SqlType::Timestamp),
        ])
        .expect("static schema");
        Self::new(
            TABLE_SPLITS,
            schema,
            &[COL_SYMBOL, COL_REFID],
            &[
                COL_EXECUTION_DATE,
                COL_DECLARED_DATE,
                COL_FROM_FACTOR,
                COL_TO_FACTOR,
                COL_RATIO,
                COL_DESCRIPTION,
                COL_ID,
                COL_KEY,
                COL_SUBKEY,
                COL_UPDATED,
            ],
        )
        .expect("static spec")
    }

    pub fn dividends() -> Self {
        let schema = TableSchema::new(&[
            (COL_SYMBOL, SqlType::Varchar(8)),
            (COL_REFID, SqlType::BigInt),
            (COL_DATE, SqlType::Timestamp),
            (COL_EXECUTION_DATE, SqlType::Date),
            (COL_DECLARED_DATE, SqlType::Date),
            (COL_PAYMENT_DATE, SqlType::Date),
            (COL_RECORD_DATE, SqlType::Date),
            (COL_AMOUNT, SqlType::Double),
            (COL_CURRENCY, SqlType::Varchar(8)),
            (COL_DESCRIPTION, SqlType::Text),
            (COL_FLAG, SqlType::Text),
            (COL_FREQUENCY, SqlType::Text),
            (COL_ID, SqlType::Text),
            (COL_KEY, SqlType::Text),
            (COL_SUBKEY, SqlType::Text),
            (COL_UPDATED, SqlType::Timestamp),
        ])
        .expect("static schema");
        Self::new(
            TABLE_DIVIDENDS,
            schema,
            &[COL_SYMBOL, COL_REFID],
            &[
                COL_DATE,
                COL_EXECUTION_DATE,
                COL_DECLARED_DATE,
                COL_PAYMENT_DATE,
                COL_RECORD_DATE,
                COL_AMOUNT,
                COL_CURRENCY,
                COL_DESCRIPTION,
                COL_FLAG,
                COL_FREQUENCY,
                COL_ID,
                COL_KEY,
                COL_SUBKEY,
                COL_UPDATED,
            ],
        )
        .expect("static spec")
    }
}
