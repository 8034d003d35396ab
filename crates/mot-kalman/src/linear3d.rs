use crate::core::{clamp_dt, KalmanCore};
use crate::Filter;
use mot_common::Result;
use nalgebra::{DMatrix, DVector};

const DIM: usize = 8; // x, y, z, vx, vy, vz, w, h
const INITIAL_POSITION_VAR: f32 = 10.0;
const INITIAL_VELOCITY_VAR: f32 = 1_000.0;

/// 3D Kalman filter over `(x, y, z, vx, vy, vz, w, h)`: constant-velocity motion in the camera
/// frame, width/height carried as a 2D extent (not a full 3D box; see `mot-pose` for the
/// depth-derived extent).
#[derive(Debug, Clone)]
pub struct Linear3DFilter {
    core: KalmanCore,
    use_dim: bool,
    use_vel: bool,
    process_noise_diag: Vec<f32>,
    measurement_noise_diag: Vec<f32>,
}

impl Linear3DFilter {
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
        let mut idx = vec![0, 1, 2];
        if self.use_dim {
            idx.extend_from_slice(&[6, 7]);
        }
        if self.use_vel {
            idx.extend_from_slice(&[3, 4, 5]);
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

    fn transition(&self, dt: f32) -> DMatrix<f32> {
        let mut f = DMatrix::<f32>::identity(DIM, DIM);
        f[(0, 3)] = dt;
        f[(1, 4)] = dt;
        f[(2, 5)] = dt;
        f
    }
}

fn resize_diag(diag: &[f32], n: usize) -> Vec<f32> {
    let mut out = diag.to_vec();
    out.resize(n, *diag.last().unwrap_or(&1.0));
    out
}

impl Filter for Linear3DFilter {
    fn predict(&mut self, dt: f32) {
        let dt = clamp_dt(dt);
        let f = self.transition(dt);
        let q = DMatrix::from_diagonal(&DVector::from_vec(self.process_noise_diag.clone()));
        self.core.predict_linear(&f, &q);
    }

    fn correct(&mut self, measurement: &[f32]) -> Result<()> {
        debug_assert_eq!(measurement.len(), self.measurement_len());
        let (h, r) = self.h_and_r();
        let z = DVector::from_row_slice(measurement);
        self.core.correct(&h, &r, &z)
    }

    fn reset(&mut self, measurement: &[f32]) {
        // raw detection: (x, y, z, w, h)
        let (x, y, z, w, h) = (
            measurement[0],
            measurement[1],
            measurement[2],
            measurement[3],
            measurement[4],
        );
        self.core.x = DVector::from_vec(vec![x, y, z, 0.0, 0.0, 0.0, w, h]);
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
    fn correction_does_not_increase_position_error() {
        let mut f = Linear3DFilter::new(&[1.0, 2.0, 5.0, 1.0, 1.0], &[1.0; 8], &[1.0; 5], true, false);
        f.predict(0.1);
        let before = (f.state()[2] - 5.2).abs();
        f.correct(&[1.0, 2.0, 5.2, 1.0, 1.0]).unwrap();
        let after = (f.state()[2] - 5.2).abs();
        assert!(after <= before + 1.0e-4);
    }
}
