use mot_common::{Result, TrackingError};
use nalgebra::{DMatrix, DVector};
use tracing::warn;

/// Small positive floor substituted for a non-positive `dt`, so `F` (and the covariance it
/// propagates) never collapses to a singular update.
pub const MIN_DT: f32 = 1.0e-4;

/// Shared state/covariance pair plus the linear-algebra skeleton every filter variant in this
/// crate builds on: propagate with a transition matrix, correct with a measurement matrix.
///
/// Dimensions are dynamic (`DVector`/`DMatrix`) rather than const-generic: the measurement
/// dimension changes at construction time depending on `use_dim`/`use_vel`, which would
/// otherwise force either runtime dimension checks on top of const generics or one concrete type
/// per `(use_dim, use_vel)` combination. A fixed-size `x`/`p` would still be possible, but mixing
/// fixed- and dynamically-sized matrices in the same expression is more friction than it's worth
/// here.
#[derive(Debug, Clone)]
pub struct KalmanCore {
    pub x: DVector<f32>,
    pub p: DMatrix<f32>,
}

impl KalmanCore {
    #[must_use]
    pub fn new(x: DVector<f32>, p: DMatrix<f32>) -> Self {
        Self { x, p }
    }

    /// Linear propagation: `x <- F x`, `p <- F P Fᵀ + Q`.
    pub fn predict_linear(&mut self, f: &DMatrix<f32>, q: &DMatrix<f32>) {
        self.x = f * &self.x;
        self.p = f * &self.p * f.transpose() + q;
    }

    /// Nonlinear propagation for the extended variant: caller supplies the already-evaluated
    /// next state `x_next` and the Jacobian `g` of the transition at the previous state.
    pub fn predict_nonlinear(&mut self, x_next: DVector<f32>, g: &DMatrix<f32>, q: &DMatrix<f32>) {
        self.x = x_next;
        self.p = g * &self.p * g.transpose() + q;
    }

    /// Correction step: `y = z - H x`, `S = H P Hᵀ + R`, `K = P Hᵀ S⁻¹`, `x <- x + K y`,
    /// `P <- (I - K H) P`. Returns `FilterInstability` if `S` is not invertible, and
    /// `MeasurementRejected` if `z` carries a non-finite component — neither mutates state.
    pub fn correct(&mut self, h: &DMatrix<f32>, r: &DMatrix<f32>, z: &DVector<f32>) -> Result<()> {
        if z.iter().any(|v| !v.is_finite()) {
            return Err(TrackingError::MeasurementRejected(
                "non-finite measurement component".to_string(),
            ));
        }

        let predicted = h * &self.x;
        let innovation = z - predicted;
        let s = h * &self.p * h.transpose() + r;

        let Some(s_inv) = s.clone().try_inverse() else {
            warn!("innovation covariance is singular, rejecting correction");
            return Err(TrackingError::FilterInstability(
                "singular innovation covariance".to_string(),
            ));
        };

        let gain = &self.p * h.transpose() * s_inv;
        self.x = &self.x + &gain * innovation;

        if self.x.iter().any(|v| !v.is_finite()) {
            return Err(TrackingError::FilterInstability(
                "non-finite state after correction".to_string(),
            ));
        }

        let identity = DMatrix::<f32>::identity(self.p.nrows(), self.p.ncols());
        self.p = (identity - &gain * h) * &self.p;
        Ok(())
    }
}

/// Clamp `dt` to a small positive epsilon, logging when a caller supplies a non-positive value
/// rather than silently reordering frames.
#[must_use]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt <= 0.0 {
        warn!(dt, "non-positive dt clamped to epsilon");
        MIN_DT
    } else {
        dt
    }
}

/// Wrap an angle to `(-pi, pi]`.
#[must_use]
pub fn wrap_angle(theta: f32) -> f32 {
    let two_pi = std::f32::consts::TAU;
    let mut wrapped = (theta + std::f32::consts::PI) % two_pi;
    if wrapped <= 0.0 {
        wrapped += two_pi;
    }
    wrapped - std::f32::consts::PI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_dt_replaces_non_positive() {
        assert_eq!(clamp_dt(0.1), 0.1);
        assert_eq!(clamp_dt(0.0), MIN_DT);
        assert_eq!(clamp_dt(-5.0), MIN_DT);
    }

    #[test]
    fn wrap_angle_stays_in_range() {
        use std::f32::consts::PI;
        assert!((wrap_angle(PI + 0.1) - (-PI + 0.1)).abs() < 1.0e-5);
        assert!((wrap_angle(0.5) - 0.5).abs() < 1.0e-6);
        assert!((wrap_angle(-PI) - PI).abs() < 1.0e-5);
    }
}
