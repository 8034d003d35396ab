use crate::core::{clamp_dt, wrap_angle, KalmanCore};
use crate::Filter;
use mot_common::Result;
use nalgebra::{DMatrix, DVector};

const DIM: usize = 8; // x, y, theta, vx, vy, vtheta, w, h
const INITIAL_POSITION_VAR: f32 = 10.0;
const INITIAL_VELOCITY_VAR: f32 = 1_000.0;

/// Extended (nonlinear) 2D Kalman filter over `(x, y, theta, vx, vy, vtheta, w, h)`: a unicycle
/// motion model where `vx` is forward speed in the body frame and `theta` is heading. The
/// Jacobian of the transition is linearized at the current state on every `predict`.
///
/// `theta` is not itself an observed quantity (detectors don't report heading); only position,
/// and optionally dimensions/velocity, are measured, same as the linear variants. `vy` is
/// carried in the state but unused by the motion model (constant-velocity in the body's lateral
/// axis isn't modeled); this mirrors the base filter having a velocity slot it doesn't drive.
#[derive(Debug, Clone)]
pub struct Extended2DHFilter {
    core: KalmanCore,
    use_dim: bool,
    use_vel: bool,
    process_noise_diag: Vec<f32>,
    measurement_noise_diag: Vec<f32>,
}

impl Extended2DHFilter {
    #[must_use]
    pub fn new(
        measurement: &[f32],
        process_noise_diag: &[f32],
        measurement_noise_diag: &[f32],
        use_dim: bool,
        use_vel: bool,
    ) -> Self {
        let mut filter = Self {
            core: KalmanCore::new(DVector::zeros(DIM), DMatrix::zeros(DIM, DIM)),
            use_dim,
            use_vel,
            process_noise_diag: resize_diag(process_noise_diag, DIM),
            measurement_noise_diag: measurement_noise_diag.to_vec(),
        };
        filter.reset(measurement);
        filter
    }

    fn measurement_indices(&self) -> Vec<usize> {
        let mut idx = vec![0, 1];
        if self.use_dim {
            idx.extend_from_slice(&[6, 7]);
        }
        if self.use_vel {
            idx.extend_from_slice(&[3, 4]);
        }
        idx
    }

    fn h_and_r(&self) -> (DMatrix<f32>, DMatrix<f32>) {
        let indices = self.measurement_indices();
        let mut h = DMatrix::<f32>::zeros(indices.len(), DIM);
        for (row, &col) in indices.iter().enumerate() {
            h[(row, col)] = 1.0;
        }
        let r_diag: Vec<f32> = (0..indices.len())
            .map(|i| *self.measurement_noise_diag.get(i).unwrap_or(&1.0))
            .collect();
        let r = DMatrix::from_diagonal(&DVector::from_vec(r_diag));
        (h, r)
    }

    /// Evaluate the nonlinear transition and its Jacobian at the current state.
    fn linearize(&self, dt: f32) -> (DVector<f32>, DMatrix<f32>) {
        let x = self.core.x[0];
        let y = self.core.x[1];
        let theta = self.core.x[2];
        let vx = self.core.x[3];
        let vy = self.core.x[4];
        let vtheta = self.core.x[5];
        let w = self.core.x[6];
        let h = self.core.x[7];

        let cos_t = theta.cos();
        let sin_t = theta.sin();

        let x_next = DVector::from_vec(vec![
            x + vx * cos_t * dt,
            y + vx * sin_t * dt,
            wrap_angle(theta + vtheta * dt),
            vx,
            vy,
            vtheta,
            w,
            h,
        ]);

        let mut g = DMatrix::<f32>::identity(DIM, DIM);
        g[(0, 2)] = -vx * sin_t * dt;
        g[(0, 3)] = cos_t * dt;
        g[(1, 2)] = vx * cos_t * dt;
        g[(1, 3)] = sin_t * dt;
        g[(2, 5)] = dt;

        (x_next, g)
    }
}

fn resize_diag(diag: &[f32], n: usize) -> Vec<f32> {
    let mut out = diag.to_vec();
    out.resize(n, *diag.last().unwrap_or(&1.0));
    out
}

impl Filter for Extended2DHFilter {
    fn predict(&mut self, dt: f32) {
        let dt = clamp_dt(dt);
        let (x_next, g) = self.linearize(dt);
        let q = DMatrix::from_diagonal(&DVector::from_vec(self.process_noise_diag.clone()));
        self.core.predict_nonlinear(x_next, &g, &q);
    }

    fn correct(&mut self, measurement: &[f32]) -> Result<()> {
        debug_assert_eq!(measurement.len(), self.measurement_len());
        let (h, r) = self.h_and_r();
        let z = DVector::from_row_slice(measurement);
        self.core.correct(&h, &r, &z)?;
        self.core.x[2] = wrap_angle(self.core.x[2]);
        Ok(())
    }

    fn reset(&mut self, measurement: &[f32]) {
        // raw detection: (x, y, w, h); heading and velocities start unknown.
        let x = measurement[0];
        let y = measurement[1];
        let w = measurement[2];
        let h = measurement[3];
        self.core.x = DVector::from_vec(vec![x, y, 0.0, 0.0, 0.0, 0.0, w, h]);
        let var = [
            INITIAL_POSITION_VAR,
            INITIAL_POSITION_VAR,
            INITIAL_POSITION_VAR,
            INITIAL_VELOCITY_VAR,
            INITIAL_VELOCITY_VAR,
            INITIAL_VELOCITY_VAR,
            INITIAL_POSITION_VAR,
            INITIAL_POSITION_VAR,
        ];
        self.core.p = DMatrix::from_diagonal(&DVector::from_row_slice(&var));
    }

    fn state(&self) -> &[f32] {
        self.core.x.as_slice()
    }

    fn uncertainty(&self) -> Vec<f32> {
        (0..DIM).map(|i| self.core.p[(i, i)]).collect()
    }

    fn measurement_len(&self) -> usize {
        self.measurement_indices().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_stays_wrapped() {
        let mut f = Extended2DHFilter::new(&[0.0, 0.0, 1.0, 1.0], &[1.0; 8], &[1.0; 4], true, false);
        f.core.x[2] = std::f32::consts::PI - 0.01;
        f.core.x[5] = 10.0; // large angular velocity
        f.predict(1.0);
        assert!(f.state()[2] > -std::f32::consts::PI && f.state()[2] <= std::f32::consts::PI);
    }

    #[test]
    fn forward_motion_moves_along_heading() {
        let mut f = Extended2DHFilter::new(&[0.0, 0.0, 1.0, 1.0], &[1.0; 8], &[1.0; 4], true, false);
        f.core.x[3] = 10.0; // vx
        f.predict(1.0);
        assert!(f.state()[0] > 9.0); // theta = 0, so x advances by ~vx*dt
    }
}
