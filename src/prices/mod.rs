pub(crate) mod prices_errors;
pub(crate) mod prices_model;

// Re-export the public interface
pub use prices_errors::PriceError;
pub use prices_model::{PriceBar, PriceSeries};
