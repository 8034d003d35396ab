use crate::hungarian::SENTINEL_COST;
use mot_common::{BoundingBox2D, TrackingConfig};

/// A track's predicted box, reduced to the four numbers the cost function needs. Kept separate
/// from any particular Kalman variant so this crate doesn't depend on `mot-kalman`.
#[derive(Debug, Clone, Copy)]
pub struct PredictedBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Build the `tracks x detections` gated cost matrix (§4.3 step 2–3). Any pair exceeding any
/// individual threshold is set to [`SENTINEL_COST`], forbidding Hungarian from picking it except
/// against padding.
#[must_use]
pub fn cost_matrix(tracks: &[PredictedBox], detections: &[BoundingBox2D], cfg: &TrackingConfig) -> Vec<Vec<f32>> {
    tracks
        .iter()
        .map(|track| {
            detections
                .iter()
                .map(|det| pair_cost(track, det, cfg).unwrap_or(SENTINEL_COST))
                .collect()
        })
        .collect()
}

fn pair_cost(track: &PredictedBox, det: &BoundingBox2D, cfg: &TrackingConfig) -> Option<f32> {
    let dx = track.x - det.x;
    let dy = track.y - det.y;
    let center_distance = (dx * dx + dy * dy).sqrt();

    if center_distance > cfg.center_threshold {
        return None;
    }
    let dist_component = center_distance / cfg.dist_threshold.max(f32::EPSILON);
    if dist_component > 1.0 {
        return None;
    }

    let track_area = (track.w * track.h).max(f32::EPSILON);
    let det_area = (det.w * det.h).max(f32::EPSILON);
    let area_component = (det_area / track_area).ln().abs() / cfg.area_threshold.max(f32::EPSILON);
    if area_component > 1.0 {
        return None;
    }

    let mut cost = dist_component + area_component;

    if cfg.body_ratio > 0.0 {
        let aspect = det.h / det.w.max(f32::EPSILON);
        let penalty = (aspect - cfg.body_ratio).abs();
        if penalty > cfg.body_ratio {
            return None;
        }
        cost += penalty;
    }

    Some(cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permissive_config() -> TrackingConfig {
        TrackingConfig {
            dist_threshold: 1_000.0,
            center_threshold: 1_000.0,
            area_threshold: 1_000.0,
            body_ratio: 0.0,
            ..TrackingConfig::default()
        }
    }

    #[test]
    fn nearby_same_size_boxes_are_cheap() {
        let track = PredictedBox { x: 100.0, y: 100.0, w: 40.0, h: 60.0 };
        let det = BoundingBox2D::new(102.0, 100.0, 40.0, 60.0, 0.9, 0);
        let cost = cost_matrix(&[track], &[det], &permissive_config());
        assert!(cost[0][0] < SENTINEL_COST);
    }

    #[test]
    fn far_apart_pair_is_gated() {
        let cfg = TrackingConfig { center_threshold: 10.0, ..permissive_config() };
        let track = PredictedBox { x: 0.0, y: 0.0, w: 40.0, h: 60.0 };
        let det = BoundingBox2D::new(500.0, 500.0, 40.0, 60.0, 0.9, 0);
        let cost = cost_matrix(&[track], &[det], &cfg);
        assert_eq!(cost[0][0], SENTINEL_COST);
    }

    #[test]
    fn raising_threshold_never_increases_unmatched_count() {
        let track = PredictedBox { x: 0.0, y: 0.0, w: 40.0, h: 60.0 };
        let det = BoundingBox2D::new(90.0, 0.0, 40.0, 60.0, 0.9, 0);
        let tight = TrackingConfig { center_threshold: 50.0, ..permissive_config() };
        let loose = TrackingConfig { center_threshold: 200.0, ..permissive_config() };
        let tight_unmatched = cost_matrix(&[track], &[det], &tight)[0][0] >= SENTINEL_COST;
        let loose_unmatched = cost_matrix(&[track], &[det], &loose)[0][0] >= SENTINEL_COST;
        assert!(!(loose_unmatched && !tight_unmatched));
    }
}
