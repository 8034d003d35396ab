use crate::error::{Result, TrackerError};
use crate::per_class::{PerClassTracker, TrackSnapshot};
use mot_common::{BoundingBox2D, BoxRejectionConfig, TrackingConfig};
use mot_kalman::FilterKind;
use std::collections::HashMap;

/// Dispatches detections to one [`PerClassTracker`] per class (§3 TrackerPerClass, §4.3
/// "per-class isolation"). A class's tracker is created lazily on its first detection, so a
/// caller doesn't have to pre-enumerate every class it might see.
#[derive(Debug)]
pub struct MultiClassTracker {
    filter_kind: FilterKind,
    tracking_cfg: TrackingConfig,
    rejection_cfg: BoxRejectionConfig,
    per_class: HashMap<u32, PerClassTracker>,
}

impl MultiClassTracker {
    /// # Errors
    /// Returns [`TrackerError::InvalidConfig`] if `filter_kind` isn't `Linear2D` or
    /// `Extended2DH` — the only variants [`PerClassTracker`] can drive. Checked once here so
    /// the per-class trackers this struct lazily creates in [`Self::update`] never need to.
    pub fn new(filter_kind: FilterKind, tracking_cfg: TrackingConfig, rejection_cfg: BoxRejectionConfig) -> Result<Self> {
        if !matches!(filter_kind, FilterKind::Linear2D | FilterKind::Extended2DH) {
            return Err(TrackerError::InvalidConfig(format!(
                "MultiClassTracker only supports 2D filter variants, got {filter_kind:?}"
            )));
        }
        Ok(Self {
            filter_kind,
            tracking_cfg,
            rejection_cfg,
            per_class: HashMap::new(),
        })
    }

    /// Run one frame. `detections` may mix classes freely; each is routed to its class's own
    /// tracker, so a class with no detections this frame still gets its existing tracks
    /// predicted/coasted/aged via an empty update.
    pub fn update(&mut self, detections: &[BoundingBox2D], dt: f32) -> HashMap<u32, Vec<TrackSnapshot>> {
        let mut by_class: HashMap<u32, Vec<BoundingBox2D>> = HashMap::new();
        for det in detections {
            by_class.entry(det.class_id).or_default().push(*det);
        }

        for class_id in by_class.keys().copied() {
            self.per_class.entry(class_id).or_insert_with(|| {
                PerClassTracker::new(class_id, self.filter_kind, self.tracking_cfg.clone(), self.rejection_cfg)
                    .expect("filter_kind already validated by MultiClassTracker::new")
            });
        }

        let mut output = HashMap::new();
        for (class_id, tracker) in &mut self.per_class {
            let class_detections = by_class.get(class_id).map(Vec::as_slice).unwrap_or(&[]);
            output.insert(*class_id, tracker.update(class_detections, dt));
        }
        output
    }

    #[must_use]
    pub fn class_tracker(&self, class_id: u32) -> Option<&PerClassTracker> {
        self.per_class.get(&class_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32, y: f32, w: f32, h: f32, class_id: u32) -> BoundingBox2D {
        BoundingBox2D::new(x, y, w, h, 0.9, class_id)
    }

    #[test]
    fn s4_class_isolation_each_class_gets_its_own_id_zero() {
        let cfg = TrackingConfig {
            dist_threshold: 1_000.0,
            center_threshold: 1_000.0,
            area_threshold: 1_000.0,
            ..TrackingConfig::default()
        };
        let mut tracker = MultiClassTracker::new(FilterKind::Linear2D, cfg, BoxRejectionConfig::default()).unwrap();
        let output = tracker.update(&[det(100.0, 100.0, 40.0, 40.0, 0), det(100.0, 100.0, 40.0, 40.0, 1)], 0.1);
        assert_eq!(output.len(), 2);
        assert_eq!(output[&0].len(), 1);
        assert_eq!(output[&1].len(), 1);
        assert_eq!(output[&0][0].id, 0);
        assert_eq!(output[&1][0].id, 0);
    }

    #[test]
    fn a_3d_filter_kind_is_rejected_at_construction() {
        let err = MultiClassTracker::new(FilterKind::Fixed3D, TrackingConfig::default(), BoxRejectionConfig::default())
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidConfig(_)));
    }
}
