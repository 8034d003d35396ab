//! Depth-to-position projection (§4.4): turns a 2D detection plus a depth frame into a 3D point
//! and, optionally, a 3D extent, using pinhole camera intrinsics.

use mot_common::{BoundingBox2D, BoundingBox3D, LocalizationConfig, Result, TrackingError};
use std::sync::RwLock;
use tracing::debug;

/// A single-channel depth frame in meters, row-major, one `f32` per pixel.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl DepthFrame {
    /// Build a depth frame, panicking if `data` doesn't match `width * height`. This is a
    /// construction-time invariant a caller is expected to uphold, not a runtime condition.
    #[must_use]
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), (width * height) as usize, "depth frame data/dimension mismatch");
        Self { width, height, data }
    }

    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }
}

/// Pinhole camera intrinsics plus lens distortion coefficients, swapped atomically by
/// [`PoseEstimator::update_camera_parameters`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

/// Projects 2D detections plus depth into the camera's 3D frame (§4.4).
///
/// Intrinsics arrive asynchronously relative to detections (a camera-info callback on one
/// thread, frame processing on another), so they're held behind a single-writer [`RwLock`]
/// rather than plumbed through every call: readers always see a complete old-or-new snapshot,
/// never a partially updated one.
#[derive(Debug)]
pub struct PoseEstimator {
    config: LocalizationConfig,
    intrinsics: RwLock<Option<Intrinsics>>,
    distortion: RwLock<Vec<f32>>,
}

impl PoseEstimator {
    #[must_use]
    pub fn new(config: LocalizationConfig) -> Self {
        let intrinsics = if config.fx > 0.0 && config.fy > 0.0 {
            Some(Intrinsics { fx: config.fx, fy: config.fy, cx: config.cx, cy: config.cy })
        } else {
            None
        };
        Self {
            distortion: RwLock::new(config.distortion.clone()),
            intrinsics: RwLock::new(intrinsics),
            config,
        }
    }

    /// Replace the camera intrinsics and distortion coefficients. Safe to call from a different
    /// thread than [`Self::localize`]; a reader mid-call either sees the old snapshot in full or
    /// the new one in full, never a mix.
    pub fn update_camera_parameters(&self, intrinsics: Intrinsics, distortion: Vec<f32>) {
        debug!(fx = intrinsics.fx, fy = intrinsics.fy, cx = intrinsics.cx, cy = intrinsics.cy, "camera intrinsics updated");
        *self.intrinsics.write().expect("intrinsics lock poisoned") = Some(intrinsics);
        *self.distortion.write().expect("intrinsics lock poisoned") = distortion;
    }

    #[must_use]
    pub fn has_intrinsics(&self) -> bool {
        self.intrinsics.read().expect("intrinsics lock poisoned").is_some()
    }

    /// Project one 2D box into the camera's 3D frame using `depth`.
    ///
    /// Returns [`TrackingError::IntrinsicsUnavailable`] if no intrinsics update has arrived yet.
    /// If intrinsics are known but no valid depth sample exists within the box, returns
    /// `Ok(BoundingBox3D::invalid(..))` rather than an error: the 2D detection still stands, only
    /// its 3D localization failed (§7 "measurement rejection").
    pub fn localize(&self, bbox: &BoundingBox2D, depth: &DepthFrame) -> Result<BoundingBox3D> {
        let intrinsics = self
            .intrinsics
            .read()
            .expect("intrinsics lock poisoned")
            .ok_or(TrackingError::IntrinsicsUnavailable)?;

        let Some(z) = self.robust_distance(bbox, depth) else {
            return Ok(BoundingBox3D::invalid(bbox.class_id));
        };

        let (u, v) = bbox.center();
        let x = (u - intrinsics.cx) * z / intrinsics.fx;
        let y = (v - intrinsics.cy) * z / intrinsics.fy;

        let w3 = z * bbox.w / intrinsics.fx;
        let h3 = z * bbox.h / intrinsics.fy;
        let d3 = w3;

        Ok(BoundingBox3D::new(x, y, z, w3, d3, h3, bbox.confidence, bbox.class_id))
    }

    /// Median depth over the valid samples within the box's inset rectangle, or `None` if the
    /// rectangle is empty or every sample is out of range.
    fn robust_distance(&self, bbox: &BoundingBox2D, depth: &DepthFrame) -> Option<f32> {
        let margin = self.config.rejection_threshold;
        let x_min = (bbox.x_min() + margin).max(0.0).round() as i64;
        let x_max = (bbox.x_max() - margin).min(depth.width as f32 - 1.0).round() as i64;
        let y_min = (bbox.y_min() + margin).max(0.0).round() as i64;
        let y_max = (bbox.y_max() - margin).min(depth.height as f32 - 1.0).round() as i64;

        if x_min > x_max || y_min > y_max {
            return None;
        }

        let mut samples = Vec::new();
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let Some(z) = depth.sample(x as u32, y as u32) else { continue };
                if z.is_finite() && z >= self.config.min_range && z <= self.config.max_range {
                    samples.push(z);
                }
            }
        }

        if samples.is_empty() {
            return None;
        }
        samples.sort_by(|a, b| a.partial_cmp(b).expect("range-checked depth samples are finite"));
        Some(samples[samples.len() / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_depth(width: u32, height: u32, z: f32) -> DepthFrame {
        DepthFrame::new(width, height, vec![z; (width * height) as usize])
    }

    fn localization_config() -> LocalizationConfig {
        LocalizationConfig {
            rejection_threshold: 2.0,
            min_range: 0.1,
            max_range: 40.0,
            fx: 500.0,
            fy: 500.0,
            cx: 320.0,
            cy: 240.0,
            distortion: Vec::new(),
        }
    }

    #[test]
    fn s6_center_box_projects_to_the_optical_axis() {
        let estimator = PoseEstimator::new(localization_config());
        let depth = flat_depth(640, 480, 2.0);
        let bbox = BoundingBox2D::new(320.0, 240.0, 40.0, 40.0, 0.9, 0);

        let pos = estimator.localize(&bbox, &depth).unwrap();
        assert!(pos.valid);
        assert_relative_eq!(pos.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(pos.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(pos.z, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn s6_off_center_box_offsets_proportionally_to_depth() {
        let estimator = PoseEstimator::new(localization_config());
        let depth = flat_depth(640, 480, 2.0);
        let bbox = BoundingBox2D::new(420.0, 240.0, 40.0, 40.0, 0.9, 0);

        let pos = estimator.localize(&bbox, &depth).unwrap();
        assert_relative_eq!(pos.x, 0.4, epsilon = 1e-4);
    }

    #[test]
    fn missing_intrinsics_is_an_error() {
        let cfg = LocalizationConfig { fx: 0.0, fy: 0.0, ..localization_config() };
        let estimator = PoseEstimator::new(cfg);
        let depth = flat_depth(640, 480, 2.0);
        let bbox = BoundingBox2D::new(320.0, 240.0, 40.0, 40.0, 0.9, 0);

        assert!(matches!(estimator.localize(&bbox, &depth), Err(TrackingError::IntrinsicsUnavailable)));
    }

    #[test]
    fn updated_intrinsics_take_effect_immediately() {
        let cfg = LocalizationConfig { fx: 0.0, fy: 0.0, ..localization_config() };
        let estimator = PoseEstimator::new(cfg);
        estimator.update_camera_parameters(Intrinsics { fx: 500.0, fy: 500.0, cx: 320.0, cy: 240.0 }, Vec::new());

        let depth = flat_depth(640, 480, 2.0);
        let bbox = BoundingBox2D::new(320.0, 240.0, 40.0, 40.0, 0.9, 0);
        assert!(estimator.localize(&bbox, &depth).is_ok());
    }

    #[test]
    fn out_of_range_depth_yields_an_invalid_box_not_an_error() {
        let estimator = PoseEstimator::new(localization_config());
        let depth = flat_depth(640, 480, 100.0);
        let bbox = BoundingBox2D::new(320.0, 240.0, 40.0, 40.0, 0.9, 0);

        let pos = estimator.localize(&bbox, &depth).unwrap();
        assert!(!pos.valid);
    }

    #[test]
    fn box_synthesis_is_isotropic_in_depth() {
        let estimator = PoseEstimator::new(localization_config());
        let depth = flat_depth(640, 480, 4.0);
        let bbox = BoundingBox2D::new(320.0, 240.0, 50.0, 80.0, 0.9, 0);

        let pos = estimator.localize(&bbox, &depth).unwrap();
        assert_relative_eq!(pos.d, pos.w, epsilon = 1e-6);
    }
}
