//! The Kalman filter family used for per-track motion estimation.
//!
//! Four state layouts share one predict/correct skeleton (see [`core::KalmanCore`]) through a
//! single [`Filter`] trait, and are collected behind the [`KalmanFilter`] tagged union so a
//! tracker can hold a homogeneous collection of tracks whose filters differ in variant.

pub mod core;
mod extended2dh;
mod fixed3d;
mod linear2d;
mod linear3d;

pub use extended2dh::Extended2DHFilter;
pub use fixed3d::Fixed3DFilter;
pub use linear2d::Linear2DFilter;
pub use linear3d::Linear3DFilter;

use mot_common::Result;

/// Common contract implemented by every Kalman filter variant in this crate.
pub trait Filter: std::fmt::Debug {
    /// Propagate the state and covariance forward by `dt` seconds. `dt <= 0` is clamped to a
    /// small epsilon internally.
    fn predict(&mut self, dt: f32);

    /// Incorporate a measurement, whose length must equal [`Filter::measurement_len`].
    /// Returns `Err` (state left untouched) on a non-finite measurement or a singular
    /// innovation covariance; the caller decides whether to reset the filter instead.
    fn correct(&mut self, measurement: &[f32]) -> Result<()>;

    /// Re-initialize the filter from a fresh raw detection, discarding prior state. Used on
    /// birth and on recovery from filter instability, never on an ordinary update.
    fn reset(&mut self, measurement: &[f32]);

    /// The full state vector, in the variant's own layout. Position is always the first one to
    /// three components; width/height are always the last two.
    fn state(&self) -> &[f32];

    /// Diagonal of the state covariance, one entry per state component.
    fn uncertainty(&self) -> Vec<f32>;

    /// Expected length of the slice passed to [`Filter::correct`] given this filter's
    /// `use_dim`/`use_vel` configuration.
    fn measurement_len(&self) -> usize;
}

/// Which of the four filter flavors a track uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Linear2D,
    Linear3D,
    Extended2DH,
    Fixed3D,
}

/// Tagged union over the four concrete filter types, so a tracker can store a homogeneous
/// collection of tracks regardless of which variant each one uses.
#[derive(Debug, Clone)]
pub enum KalmanFilter {
    Linear2D(Linear2DFilter),
    Linear3D(Linear3DFilter),
    Extended2DH(Extended2DHFilter),
    Fixed3D(Fixed3DFilter),
}

impl KalmanFilter {
    /// Construct a filter of the given `kind`. `measurement` is the raw detection: `(x, y, w,
    /// h)` for `Linear2D`/`Extended2DH`, `(x, y, z, w, h)` for `Linear3D`/`Fixed3D`.
    #[must_use]
    pub fn new(
        kind: FilterKind,
        measurement: &[f32],
        process_noise_diag: &[f32],
        measurement_noise_diag: &[f32],
        use_dim: bool,
        use_vel: bool,
    ) -> Self {
        match kind {
            FilterKind::Linear2D => KalmanFilter::Linear2D(Linear2DFilter::new(
                measurement,
                process_noise_diag,
                measurement_noise_diag,
                use_dim,
                use_vel,
            )),
            FilterKind::Linear3D => KalmanFilter::Linear3D(Linear3DFilter::new(
                measurement,
                process_noise_diag,
                measurement_noise_diag,
                use_dim,
                use_vel,
            )),
            FilterKind::Extended2DH => KalmanFilter::Extended2DH(Extended2DHFilter::new(
                measurement,
                process_noise_diag,
                measurement_noise_diag,
                use_dim,
                use_vel,
            )),
            FilterKind::Fixed3D => {
                KalmanFilter::Fixed3D(Fixed3DFilter::new(measurement, process_noise_diag, measurement_noise_diag, use_dim))
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> FilterKind {
        match self {
            KalmanFilter::Linear2D(_) => FilterKind::Linear2D,
            KalmanFilter::Linear3D(_) => FilterKind::Linear3D,
            KalmanFilter::Extended2DH(_) => FilterKind::Extended2DH,
            KalmanFilter::Fixed3D(_) => FilterKind::Fixed3D,
        }
    }

    /// Center position, read generically regardless of variant: `(x, y)` are always the first
    /// two state components.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        let s = self.state();
        (s[0], s[1])
    }

    /// 2D extent, read generically regardless of variant: `w`, `h` are always the last two
    /// state components.
    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        let s = self.state();
        (s[s.len() - 2], s[s.len() - 1])
    }
}

impl Filter for KalmanFilter {
    fn predict(&mut self, dt: f32) {
        match self {
            KalmanFilter::Linear2D(f) => f.predict(dt),
            KalmanFilter::Linear3D(f) => f.predict(dt),
            KalmanFilter::Extended2DH(f) => f.predict(dt),
            KalmanFilter::Fixed3D(f) => f.predict(dt),
        }
    }

    fn correct(&mut self, measurement: &[f32]) -> Result<()> {
        match self {
            KalmanFilter::Linear2D(f) => f.correct(measurement),
            KalmanFilter::Linear3D(f) => f.correct(measurement),
            KalmanFilter::Extended2DH(f) => f.correct(measurement),
            KalmanFilter::Fixed3D(f) => f.correct(measurement),
        }
    }

    fn reset(&mut self, measurement: &[f32]) {
        match self {
            KalmanFilter::Linear2D(f) => f.reset(measurement),
            KalmanFilter::Linear3D(f) => f.reset(measurement),
            KalmanFilter::Extended2DH(f) => f.reset(measurement),
            KalmanFilter::Fixed3D(f) => f.reset(measurement),
        }
    }

    fn state(&self) -> &[f32] {
        match self {
            KalmanFilter::Linear2D(f) => f.state(),
            KalmanFilter::Linear3D(f) => f.state(),
            KalmanFilter::Extended2DH(f) => f.state(),
            KalmanFilter::Fixed3D(f) => f.state(),
        }
    }

    fn uncertainty(&self) -> Vec<f32> {
        match self {
            KalmanFilter::Linear2D(f) => f.uncertainty(),
            KalmanFilter::Linear3D(f) => f.uncertainty(),
            KalmanFilter::Extended2DH(f) => f.uncertainty(),
            KalmanFilter::Fixed3D(f) => f.uncertainty(),
        }
    }

    fn measurement_len(&self) -> usize {
        match self {
            KalmanFilter::Linear2D(f) => f.measurement_len(),
            KalmanFilter::Linear3D(f) => f.measurement_len(),
            KalmanFilter::Extended2DH(f) => f.measurement_len(),
            KalmanFilter::Fixed3D(f) => f.measurement_len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_union_dispatches_to_linear2d() {
        let mut f = KalmanFilter::new(FilterKind::Linear2D, &[0.0, 0.0, 10.0, 10.0], &[1.0; 6], &[1.0; 4], true, false);
        assert_eq!(f.kind(), FilterKind::Linear2D);
        f.predict(0.1);
        assert_eq!(f.center(), (0.0, 0.0));
        assert_eq!(f.size(), (10.0, 10.0));
    }
}
