use crate::core::{clamp_dt, KalmanCore};
use crate::Filter;
use mot_common::Result;
use nalgebra::{DMatrix, DVector};

const DIM: usize = 6; // x, y, vx, vy, w, h
const INITIAL_POSITION_VAR: f32 = 10.0;
const INITIAL_VELOCITY_VAR: f32 = 1_000.0;

/// 2D Kalman filter over `(x, y, vx, vy, w, h)`: constant-velocity motion in the image plane.
#[derive(Debug, Clone)]
pub struct Linear2DFilter {
    core: KalmanCore,
    use_dim: bool,
    use_vel: bool,
    process_noise_diag: Vec<f32>,
    measurement_noise_diag: Vec<f32>,
}

impl Linear2DFilter {
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
            idx.extend_from_slice(&[4, 5]);
        }
        if self.use_vel {
            idx.extend_from_slice(&[2, 3]);
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
        f[(0, 2)] = dt;
        f[(1, 3)] = dt;
        f
    }
}

fn resize_diag(diag: &[f32], n: usize) -> Vec<f32> {
    let mut out = diag.to_vec();
    out.resize(n, *diag.last().unwrap_or(&1.0));
    out
}

impl Filter for Linear2DFilter {
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
        // measurement here is always the raw detection (x, y, w, h), independent of use_dim/use_vel.
        let x = measurement[0];
        let y = measurement[1];
        let w = measurement[2];
        let h = measurement[3];
        self.core.x = DVector::from_vec(vec![x, y, 0.0, 0.0, w, h]);
        let var = [
            INITIAL_POSITION_VAR,
            INITIAL_POSITION_VAR,
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
