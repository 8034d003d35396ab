use thiserror::Error;

/// Recoverable and fatal error taxonomy for the tracking core.
///
/// Most variants are handled locally by the producing component (the tracker drops a rejected
/// detection, the pose estimator returns a null position); they exist here mainly so the
/// decision can be logged with a stable reason rather than swallowed silently.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// A detection failed a rejection filter (size bounds, NaN, out-of-range depth). Non-fatal:
    /// the detection is dropped for this frame.
    #[error("measurement rejected: {0}")]
    MeasurementRejected(String),

    /// The filter's innovation covariance was near-singular or produced a non-finite state.
    /// Non-fatal: the caller is expected to reset the filter from the triggering measurement.
    #[error("filter instability: {0}")]
    FilterInstability(String),

    /// A 3D position was requested before the first camera-intrinsics update arrived.
    #[error("camera intrinsics not yet available")]
    IntrinsicsUnavailable,

    /// A configuration value is out of its valid domain (e.g. a non-positive threshold).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the tracking core.
pub type Result<T> = std::result::Result<T, TrackingError>;
