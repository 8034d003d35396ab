//! Gating and Hungarian (Kuhn-Munkres) assignment between predicted tracks and detections.

pub mod gating;
pub mod hungarian;

pub use gating::{cost_matrix, PredictedBox};
pub use hungarian::{solve, SENTINEL_COST};
