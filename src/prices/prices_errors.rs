use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}
