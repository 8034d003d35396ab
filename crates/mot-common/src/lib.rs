//! Shared geometry types, configuration structs, and the error taxonomy for the tracking core.

pub mod config;
pub mod error;
pub mod geometry;

pub use config::{BoxRejectionConfig, DetectionConfig, LocalizationConfig, TrackingConfig};
pub use error::{Result, TrackingError};
pub use geometry::{BoundingBox2D, BoundingBox3D};
