//! Per-class track life-cycle management (§4.3, §4.5): birth, update, coast, and death, built on
//! `mot-kalman` for motion estimation and `mot-assignment` for gated Hungarian matching.

mod error;
mod multi_class;
mod per_class;
mod track;

pub use error::{Result, TrackerError};
pub use multi_class::MultiClassTracker;
pub use per_class::{PerClassTracker, TrackSnapshot};
pub use track::{Track, TrackStatus};
