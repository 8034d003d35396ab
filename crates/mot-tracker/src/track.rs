use mot_assignment::PredictedBox;
use mot_kalman::{Filter, KalmanFilter};
use serde::{Deserialize, Serialize};

/// Where a track sits in the state machine (§4.5). `Destroyed` tracks are never stored — they're
/// dropped from [`crate::PerClassTracker`] the frame they expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    New,
    Active,
    Coast,
}

/// A single tracked object within one class's tracker.
#[derive(Debug)]
pub struct Track {
    pub id: u32,
    pub class_id: u32,
    pub status: TrackStatus,
    pub frames_since_match: u32,
    pub total_hits: u32,
    /// Elapsed tracker time (seconds, accumulated `dt`) at which this track was last actually
    /// matched to a detection, as opposed to merely coasted.
    pub last_observation_time: f32,
    pub(crate) filter: KalmanFilter,
}

impl Track {
    pub(crate) fn new(id: u32, class_id: u32, filter: KalmanFilter, observation_time: f32) -> Self {
        Self {
            id,
            class_id,
            status: TrackStatus::New,
            frames_since_match: 0,
            total_hits: 1,
            last_observation_time: observation_time,
            filter,
        }
    }

    #[must_use]
    pub fn predicted_box(&self) -> PredictedBox {
        let (x, y) = self.filter.center();
        let (w, h) = self.filter.size();
        PredictedBox { x, y, w, h }
    }

    #[must_use]
    pub fn state(&self) -> &[f32] {
        self.filter.state()
    }

    #[must_use]
    pub fn is_alive(&self, max_frames_to_skip: u32) -> bool {
        self.frames_since_match <= max_frames_to_skip
    }

    /// A track is "confirmed" once it has accumulated `n_confirm` matched frames. This is a
    /// consumer-facing convenience, not a core life-cycle invariant (§4.5).
    #[must_use]
    pub fn is_confirmed(&self, n_confirm: u32) -> bool {
        self.total_hits >= n_confirm
    }

    pub(crate) fn mark_matched(&mut self, observation_time: f32) {
        self.frames_since_match = 0;
        self.total_hits += 1;
        self.status = TrackStatus::Active;
        self.last_observation_time = observation_time;
    }

    pub(crate) fn mark_unmatched(&mut self) {
        self.frames_since_match += 1;
        self.status = TrackStatus::Coast;
    }

    pub(crate) fn reset_after_instability(&mut self, measurement: &[f32], observation_time: f32) {
        self.filter.reset(measurement);
        self.total_hits = 1;
        self.frames_since_match = 0;
        self.status = TrackStatus::Active;
        self.last_observation_time = observation_time;
    }
}
