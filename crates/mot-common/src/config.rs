use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Detector-facing configuration: how raw frames and classes are described to the core.
///
/// Loading these from disk is a host concern; the struct itself is `serde`-capable so a host
/// can externalize tuning without a recompile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub image_rows: u32,
    pub image_cols: u32,
    pub num_classes: u32,
    pub class_map: HashMap<u32, String>,
    pub nms_thresh: f32,
    pub conf_thresh: f32,
    pub max_output_bbox_count: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            image_rows: 640,
            image_cols: 640,
            num_classes: 1,
            class_map: HashMap::new(),
            nms_thresh: 0.45,
            conf_thresh: 0.25,
            max_output_bbox_count: 100,
        }
    }
}

/// Per-class tracking tunables: gating thresholds, the `dt` the caller expects, and which
/// measurement components the Kalman filters observe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    pub max_frames_to_skip: u32,
    pub dist_threshold: f32,
    pub center_threshold: f32,
    pub area_threshold: f32,
    /// Target height/width ratio for a gated body-aspect-ratio penalty. `0.0` disables it.
    pub body_ratio: f32,
    pub dt: f32,
    pub use_dim: bool,
    pub use_vel: bool,
    pub process_noise_diag: Vec<f32>,
    pub measurement_noise_diag: Vec<f32>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_frames_to_skip: 10,
            dist_threshold: 1.0,
            center_threshold: 80.0,
            area_threshold: 1.0,
            body_ratio: 0.0,
            dt: 0.1,
            use_dim: true,
            use_vel: false,
            process_noise_diag: vec![1.0; 6],
            measurement_noise_diag: vec![1.0; 4],
        }
    }
}

/// Width/height bounds a new detection must clear before a track is born from it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoxRejectionConfig {
    pub min_bbox_width: f32,
    pub max_bbox_width: f32,
    pub min_bbox_height: f32,
    pub max_bbox_height: f32,
}

impl Default for BoxRejectionConfig {
    fn default() -> Self {
        Self {
            min_bbox_width: 1.0,
            max_bbox_width: 10_000.0,
            min_bbox_height: 1.0,
            max_bbox_height: 10_000.0,
        }
    }
}

impl BoxRejectionConfig {
    #[must_use]
    pub fn accepts(&self, w: f32, h: f32) -> bool {
        w >= self.min_bbox_width
            && w <= self.max_bbox_width
            && h >= self.min_bbox_height
            && h <= self.max_bbox_height
    }
}

/// Pinhole camera intrinsics plus the depth-sampling parameters the pose estimator needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocalizationConfig {
    /// Inset margin (in pixels) shrinking a box on each side before sampling depth within it.
    pub rejection_threshold: f32,
    pub min_range: f32,
    pub max_range: f32,
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    /// Lens distortion coefficients, carried through for callers that need them; the pinhole
    /// projection in this crate is unaffected by distortion (the source frame is assumed
    /// already rectified).
    pub distortion: Vec<f32>,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            rejection_threshold: 4.0,
            min_range: 0.1,
            max_range: 40.0,
            fx: 1.0,
            fy: 1.0,
            cx: 0.0,
            cy: 0.0,
            distortion: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_rejection_accepts_within_bounds() {
        let cfg = BoxRejectionConfig::default();
        assert!(cfg.accepts(50.0, 50.0));
        assert!(!cfg.accepts(0.5, 50.0));
    }
}
