pub(crate) mod snapshot_errors;
pub(crate) mod snapshot_frames;
pub(crate) mod snapshot_repository;

// Re-export the public interface
pub use snapshot_errors::SnapshotError;
pub use snapshot_frames::{
    dividends_to_frame, frame_to_dividends, frame_to_price_series, frame_to_splits,
    price_series_to_frame, splits_to_frame,
};
pub use snapshot_repository::SnapshotRepository;
