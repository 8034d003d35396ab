use thiserror::Error;

/// Tracker-level errors. Per-detection/per-track failures (`TrackingError`) are handled inline
/// by [`crate::PerClassTracker::update`] and never reach a caller; this enum is for
/// construction-time misconfiguration only.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
