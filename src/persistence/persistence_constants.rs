/// Sink table names
pub const TABLE_DAILY_PRICES: &str = "daily_prices";
pub const TABLE_SPLITS: &str = "splits";
pub const TABLE_DIVIDENDS: &str = "dividends";

/// Suffix for the transaction-scoped staging table
pub const STAGING_TABLE_SUFFIX: &str = "_staging";

/// Rows per bulk-insert statement; bounds peak statement size during loads
pub const INSERT_CHUNK_ROWS: usize = 100;

/// Column names shared by the sink schemas
pub const COL_DATE: &str = "date";
pub const COL_DATE_LAST_ADJUSTED: &str = "date_last_adjusted";
pub const COL_SYMBOL: &str = "symbol";
pub const COL_OPEN: &str = "open";
pub const COL_CLOSE: &str = "close";
pub const COL_HIGH: &str = "high";
pub const COL_LOW: &str = "low";
pub const COL_VOLUME: &str = "volume";
pub const COL_UNADJUSTED_OPEN: &str = "unadjusted_open";
pub const COL_UNADJUSTED_CLOSE: &str = "unadjusted_close";
pub const COL_UNADJUSTED_HIGH: &str = "unadjusted_high";
pub const COL_UNADJUSTED_LOW: &str = "unadjusted_low";
pub const COL_UNADJUSTED_VOLUME: &str = "unadjusted_volume";

pub const COL_DECLARED_DATE: &str = "declared_date";
pub const COL_EXECUTION_DATE: &str = "execution_date";
pub const COL_FROM_FACTOR: &str = "from_factor";
pub const COL_TO_FACTOR: &str = "to_factor";
pub const COL_RATIO: &str = "ratio";
pub const COL_DESCRIPTION: &str = "description";
pub const COL_REFID: &str = "refid";
pub const COL_ID: &str = "id";
pub const COL_KEY: &str = "key";
pub const COL_SUBKEY: &str = "subkey";
pub const COL_UPDATED: &str = "updated";

pub const COL_AMOUNT: &str = "amount";
pub const COL_CURRENCY: &str = "currency";
pub const COL_FLAG: &str = "flag";
pub const COL_FREQUENCY: &str = "frequency";
pub const COL_PAYMENT_DATE: &str = "payment_date";
pub const COL_RECORD_DATE: &str = "record_date";
