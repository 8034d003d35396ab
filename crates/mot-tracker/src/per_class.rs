use crate::error::{Result, TrackerError};
use crate::track::{Track, TrackStatus};
use mot_assignment::{cost_matrix, solve};
use mot_common::{BoundingBox2D, BoxRejectionConfig, TrackingConfig};
use mot_kalman::core::clamp_dt;
use mot_kalman::{Filter, FilterKind, KalmanFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A read-only view of one track's current state, returned from [`PerClassTracker::update`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: u32,
    pub class_id: u32,
    pub state: Vec<f32>,
    pub status: TrackStatus,
    pub total_hits: u32,
    pub frames_since_match: u32,
    pub last_observation_time: f32,
}

/// The per-frame, per-class life-cycle manager (§4.3, §4.5): one assignment problem, one id
/// space, one set of tracks, all scoped to a single detector class.
///
/// Restricted to the 2D filter variants (`Linear2D`, `Extended2DH`): the update algorithm's cost
/// function (§4.3 step 2) is defined entirely in terms of 2D box center/area/aspect, so a 3D or
/// fixed filter has no natural role here. Those variants remain available directly from
/// `mot-kalman` for a consumer building its own 3D-measurement association loop.
#[derive(Debug)]
pub struct PerClassTracker {
    class_id: u32,
    next_id: u32,
    filter_kind: FilterKind,
    tracking_cfg: TrackingConfig,
    rejection_cfg: BoxRejectionConfig,
    tracks: Vec<Track>,
    /// Cumulative clamped `dt` seen by this tracker, used as the clock for
    /// `Track::last_observation_time`.
    elapsed: f32,
}

impl PerClassTracker {
    /// # Errors
    /// Returns [`TrackerError::InvalidConfig`] if `filter_kind` isn't `Linear2D` or
    /// `Extended2DH` — the only variants this tracker's cost function can drive.
    pub fn new(
        class_id: u32,
        filter_kind: FilterKind,
        tracking_cfg: TrackingConfig,
        rejection_cfg: BoxRejectionConfig,
    ) -> Result<Self> {
        if !matches!(filter_kind, FilterKind::Linear2D | FilterKind::Extended2DH) {
            return Err(TrackerError::InvalidConfig(format!(
                "PerClassTracker only supports 2D filter variants, got {filter_kind:?}"
            )));
        }
        Ok(Self {
            class_id,
            next_id: 0,
            filter_kind,
            tracking_cfg,
            rejection_cfg,
            tracks: Vec::new(),
            elapsed: 0.0,
        })
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Run one frame of the update algorithm (§4.3 steps 1-7) for this class's detections. `dt`
    /// is the elapsed time since the previous call for this tracker; `mot-kalman` clamps a
    /// non-positive value to an epsilon internally.
    pub fn update(&mut self, detections: &[BoundingBox2D], dt: f32) -> Vec<TrackSnapshot> {
        debug_assert!(detections.iter().all(|d| d.class_id == self.class_id));

        self.elapsed += clamp_dt(dt);
        let now = self.elapsed;

        for track in &mut self.tracks {
            track.filter.predict(dt);
        }

        let predicted: Vec<_> = self.tracks.iter().map(Track::predicted_box).collect();
        let cost = cost_matrix(&predicted, detections, &self.tracking_cfg);
        let assignment = solve(&cost);

        let mut matched_detections: HashSet<usize> = HashSet::new();
        for (track, assigned) in self.tracks.iter_mut().zip(assignment.iter()) {
            match assigned {
                Some(j) => {
                    matched_detections.insert(*j);
                    let det = &detections[*j];
                    let measurement = build_measurement(det, self.tracking_cfg.use_dim);
                    match track.filter.correct(&measurement) {
                        Ok(()) => track.mark_matched(now),
                        Err(err) => {
                            warn!(track_id = track.id, %err, "filter instability, resetting from measurement");
                            track.reset_after_instability(&raw_detection(det), now);
                        }
                    }
                }
                None => track.mark_unmatched(),
            }
        }

        let max_skip = self.tracking_cfg.max_frames_to_skip;
        let before = self.tracks.len();
        self.tracks.retain(|t| t.is_alive(max_skip));
        if self.tracks.len() != before {
            debug!(class_id = self.class_id, destroyed = before - self.tracks.len(), "tracks destroyed");
        }

        for (j, det) in detections.iter().enumerate() {
            if matched_detections.contains(&j) {
                continue;
            }
            if !det.valid || !self.rejection_cfg.accepts(det.w, det.h) {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            let filter = KalmanFilter::new(
                self.filter_kind,
                &raw_detection(det),
                &self.tracking_cfg.process_noise_diag,
                &self.tracking_cfg.measurement_noise_diag,
                self.tracking_cfg.use_dim,
                false,
            );
            debug!(class_id = self.class_id, track_id = id, "track born");
            self.tracks.push(Track::new(id, self.class_id, filter, now));
        }

        self.tracks
            .iter()
            .map(|t| TrackSnapshot {
                id: t.id,
                class_id: t.class_id,
                state: t.state().to_vec(),
                status: t.status,
                total_hits: t.total_hits,
                frames_since_match: t.frames_since_match,
                last_observation_time: t.last_observation_time,
            })
            .collect()
    }
}

fn raw_detection(det: &BoundingBox2D) -> Vec<f32> {
    vec![det.x, det.y, det.w, det.h]
}

fn build_measurement(det: &BoundingBox2D, use_dim: bool) -> Vec<f32> {
    let mut m = vec![det.x, det.y];
    if use_dim {
        m.push(det.w);
        m.push(det.h);
    }
    m
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
            use_dim: true,
            use_vel: false,
            dt: 0.1,
            max_frames_to_skip: 3,
            process_noise_diag: vec![1.0; 6],
            measurement_noise_diag: vec![1.0; 4],
        }
    }

    fn det(x: f32, y: f32, w: f32, h: f32, class_id: u32) -> BoundingBox2D {
        BoundingBox2D::new(x, y, w, h, 0.9, class_id)
    }

    #[test]
    fn birth_on_first_detection() {
        let mut tracker = PerClassTracker::new(0, FilterKind::Linear2D, permissive_config(), BoxRejectionConfig::default()).unwrap();
        let snapshots = tracker.update(&[det(100.0, 100.0, 40.0, 60.0, 0)], 0.1);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].id, 0);
    }

    #[test]
    fn s1_steady_motion_tracks_one_object() {
        let mut tracker = PerClassTracker::new(0, FilterKind::Linear2D, permissive_config(), BoxRejectionConfig::default()).unwrap();
        tracker.update(&[det(100.0, 100.0, 40.0, 60.0, 0)], 0.1);
        tracker.update(&[det(110.0, 100.0, 40.0, 60.0, 0)], 0.1);
        let snapshots = tracker.update(&[det(120.0, 100.0, 40.0, 60.0, 0)], 0.1);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].id, 0);
        assert!((snapshots[0].state[0] - 120.0).abs() <= 2.0);
        assert!((snapshots[0].state[2] - 100.0).abs() <= 20.0);
    }

    #[test]
    fn s2_s3_death_boundary_and_rebirth_with_new_id() {
        let cfg = permissive_config();
        let max_skip = cfg.max_frames_to_skip;
        let mut tracker = PerClassTracker::new(0, FilterKind::Linear2D, cfg, BoxRejectionConfig::default()).unwrap();
        tracker.update(&[det(200.0, 200.0, 50.0, 50.0, 0)], 0.1);

        for _ in 0..max_skip {
            let snapshots = tracker.update(&[], 0.1);
            assert_eq!(snapshots.len(), 1, "track still coasting");
            assert_eq!(snapshots[0].id, 0);
        }

        let snapshots = tracker.update(&[], 0.1);
        assert!(snapshots.is_empty(), "track destroyed one frame past max_frames_to_skip");

        let snapshots = tracker.update(&[det(200.0, 200.0, 50.0, 50.0, 0)], 0.1);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].id, 1, "rebirth gets a fresh id, not the destroyed track's");
    }

    #[test]
    fn track_ids_are_strictly_increasing_within_a_class() {
        let mut tracker = PerClassTracker::new(0, FilterKind::Linear2D, permissive_config(), BoxRejectionConfig::default()).unwrap();
        tracker.update(&[det(10.0, 10.0, 20.0, 20.0, 0)], 0.1);
        tracker.update(&[det(10.0, 10.0, 20.0, 20.0, 0), det(500.0, 500.0, 20.0, 20.0, 0)], 0.1);
        let mut ids: Vec<u32> = tracker.tracks().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn rejected_tiny_box_does_not_birth_a_track() {
        let rejection = BoxRejectionConfig { min_bbox_width: 10.0, min_bbox_height: 10.0, ..BoxRejectionConfig::default() };
        let mut tracker = PerClassTracker::new(0, FilterKind::Linear2D, permissive_config(), rejection).unwrap();
        let snapshots = tracker.update(&[det(100.0, 100.0, 2.0, 2.0, 0)], 0.1);
        assert!(snapshots.is_empty());
    }

    #[test]
    fn last_observation_time_freezes_while_coasting_and_advances_on_rematch() {
        let mut tracker = PerClassTracker::new(0, FilterKind::Linear2D, permissive_config(), BoxRejectionConfig::default()).unwrap();
        let snapshots = tracker.update(&[det(200.0, 200.0, 50.0, 50.0, 0)], 0.1);
        let birth_time = snapshots[0].last_observation_time;

        let snapshots = tracker.update(&[], 0.1);
        assert_eq!(snapshots[0].last_observation_time, birth_time, "coasting must not advance the observation clock");

        let snapshots = tracker.update(&[det(200.0, 200.0, 50.0, 50.0, 0)], 0.1);
        assert!(snapshots[0].last_observation_time > birth_time, "a rematch must advance the observation clock");
    }

    #[test]
    fn a_3d_filter_kind_is_rejected_at_construction() {
        let err = PerClassTracker::new(0, FilterKind::Linear3D, permissive_config(), BoxRejectionConfig::default())
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidConfig(_)));
    }
}
