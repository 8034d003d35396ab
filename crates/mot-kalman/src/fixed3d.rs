use crate::core::{clamp_dt, KalmanCore};
use crate::Filter;
use mot_common::Result;
use nalgebra::{DMatrix, DVector};

const DIM: usize = 5; // x, y, z, w, h — no velocity
const INITIAL_POSITION_VAR: f32 = 10.0;

/// Fixed 3D Kalman filter over `(x, y, z, w, h)`: no velocity component, for objects whose
/// motion isn't worth modeling (e.g. static landmarks) but whose position still benefits from
/// measurement smoothing.
#[derive(Debug, Clone)]
pub struct Fixed3DFilter {
    core: KalmanCore,
    use_dim: bool,
    process_noise_diag: Vec<f32>,
    measurement_noise_diag: Vec<f32>,
}

impl Fixed3DFilter {
    #[must_use]
    pub fn new(
        measurement: &[f32],
        process_noise_diag: &[f32],
        measurement_noise_diag: &[f32],
        use_dim: bool,
    ) -> Self {
        let mut filter = Self {
            core: KalmanCore::new(DVector::zeros(DIM), DMatrix::zeros(DIM, DIM)),
            use_dim,
            process_noise_diag: resize_diag(process_noise_diag, DIM),
            measurement_noise_diag: measurement_noise_diag.to_vec(),
        };
        filter.reset(measurement);
        filter
    }

    fn measurement_indices(&self) -> Vec<usize> {
        let mut idx = vec![0, 1, 2];
        if self.use_dim {
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
}

fn resize_diag(diag: &[f32], n: usize) -> Vec<f32> {
    let mut out = diag.to_vec();
    out.resize(n, *diag.last().unwrap_or(&1.0));
    out
}

impl Filter for Fixed3DFilter {
    fn predict(&mut self, dt: f32) {
        // No velocity component: the state transition is the identity. `dt` is still clamped
        // and observed so the caller's ordering invariant (§5) is uniformly enforced even though
        // this variant doesn't use it for propagation.
        let _dt = clamp_dt(dt);
        let f = DMatrix::<f32>::identity(DIM, DIM);
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
        self.core.x = DVector::from_row_slice(&measurement[0..DIM]);
        let var = [INITIAL_POSITION_VAR; DIM];
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
    fn predict_is_identity_on_mean() {
        let mut f = Fixed3DFilter::new(&[1.0, 2.0, 3.0, 1.0, 1.0], &[0.1; 5], &[1.0; 5], true);
        f.predict(0.1);
        assert_eq!(f.state(), &[1.0, 2.0, 3.0, 1.0, 1.0]);
    }
}
