pub(crate) mod corporate_actions_errors;
pub(crate) mod corporate_actions_model;
pub(crate) mod corporate_actions_registry;

// Re-export the public interface
pub use corporate_actions_errors::CorporateActionError;
pub use corporate_actions_model::{CorporateAction, Dividend, FromPayload, OrderedAction, Split};
pub use corporate_actions_registry::{ActionRegistry, DividendRegistry, SplitRegistry};

// The payload timestamp encoding is part of this module's parse surface.
pub use crate::utils::time_utils::TimestampFormat;
