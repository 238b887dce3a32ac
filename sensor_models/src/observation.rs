//! Measurement models: noise covariance, linear selection, Cartesian → bearing/range.
//!
//! # Models supported
//! - **Linear Gaussian**: z = H·x + v, H selects the `mapping` components
//! - **Cartesian to bearing/range**: z = [φ, ρ] of the mapped position in the
//!   sensor frame, plus v
//!
//! v ~ N(0, R) is drawn through a square-root factor of R cached at construction.

use crate::error::{ensure_len, Result, SensorError};
use crate::geometry;
use nalgebra::{SymmetricEigen, Vector3};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracker_core::types::{Bearing, DMat, DVec, MeasurementValue, State};

// ---------------------------------------------------------------------------
// Noise selection
// ---------------------------------------------------------------------------

/// How measurement noise is applied to a projected state.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Noise {
    /// Noiseless projection (ground truth)
    Off,
    /// Draw v ~ N(0, R) from the supplied generator
    #[default]
    Sampled,
    /// Add this exact vector
    Fixed(DVec),
}

impl Noise {
    /// Ok when this selection can be applied to a `dim`-long measurement.
    pub fn check(&self, dim: usize) -> Result<()> {
        match self {
            Noise::Fixed(v) => ensure_len("noise vector", dim, v.len()),
            Noise::Off | Noise::Sampled => Ok(()),
        }
    }
}

impl From<bool> for Noise {
    fn from(noisy: bool) -> Self {
        if noisy {
            Noise::Sampled
        } else {
            Noise::Off
        }
    }
}

// ---------------------------------------------------------------------------
// Covariance
// ---------------------------------------------------------------------------

/// Symmetric positive semi-definite measurement noise covariance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DMat", into = "DMat")]
pub struct NoiseCovariance {
    matrix: DMat,
    /// L with L·Lᵀ = R
    sqrt: DMat,
}

impl NoiseCovariance {
    pub fn new(matrix: DMat) -> Result<Self> {
        if !matrix.is_square() || matrix.nrows() == 0 {
            return Err(SensorError::config(format!(
                "noise covariance must be square and non-empty, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(SensorError::config("noise covariance has non-finite entries"));
        }
        let scale = matrix.amax().max(1.0);
        if (&matrix - matrix.transpose()).amax() > 1e-9 * scale {
            return Err(SensorError::config("noise covariance is not symmetric"));
        }
        let sqrt = match matrix.clone().cholesky() {
            Some(chol) => chol.l(),
            None => {
                // Semi-definite: fall back to V·√Λ
                let eig = SymmetricEigen::new(matrix.clone());
                if eig.eigenvalues.iter().any(|&l| l < -1e-12 * scale) {
                    return Err(SensorError::config(
                        "noise covariance is not positive semi-definite",
                    ));
                }
                let root = eig.eigenvalues.map(|l| l.max(0.0).sqrt());
                eig.eigenvectors * DMat::from_diagonal(&root)
            }
        };
        Ok(Self { matrix, sqrt })
    }

    /// Diagonal covariance from per-component variances.
    pub fn diagonal(variances: &[f64]) -> Result<Self> {
        Self::new(DMat::from_diagonal(&DVec::from_column_slice(variances)))
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &DMat {
        &self.matrix
    }

    /// Row-major copy, the layout carried on [`tracker_core::types::Measurement`].
    pub fn to_row_major(&self) -> Vec<f64> {
        self.matrix.transpose().as_slice().to_vec()
    }

    /// One draw of v ~ N(0, R).
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DVec {
        let n = self.dim();
        let white = DVec::from_iterator(
            n,
            (0..n).map(|_| {
                let s: f64 = StandardNormal.sample(&mut *rng);
                s
            }),
        );
        &self.sqrt * white
    }
}

impl TryFrom<DMat> for NoiseCovariance {
    type Error = SensorError;

    fn try_from(matrix: DMat) -> Result<Self> {
        Self::new(matrix)
    }
}

impl From<NoiseCovariance> for DMat {
    fn from(cov: NoiseCovariance) -> Self {
        cov.matrix
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A mapping from state space to measurement space with additive Gaussian noise.
pub trait MeasurementModel: fmt::Debug + Send + Sync {
    /// Expected state dimension
    fn ndim_state(&self) -> usize;
    /// Measurement dimension
    fn ndim_meas(&self) -> usize;
    /// State indices this model reads
    fn mapping(&self) -> &[usize];
    /// Measurement noise covariance R
    fn noise_covar(&self) -> &NoiseCovariance;
    /// Noiseless projection h(x)
    fn project(&self, state: &State) -> Result<DVec>;

    /// Wrap a measurement vector into its typed value.
    fn to_value(&self, z: &DVec) -> MeasurementValue {
        MeasurementValue::Cartesian(z.iter().copied().collect())
    }

    /// Reject states whose dimension disagrees with `ndim_state`.
    fn check_state(&self, state: &State) -> Result<()> {
        ensure_len("state vector", self.ndim_state(), state.ndim())
    }
}

/// h(x) with the requested noise applied.
pub fn observe<M, R>(model: &M, state: &State, noise: &Noise, rng: &mut R) -> Result<DVec>
where
    M: MeasurementModel + ?Sized,
    R: Rng + ?Sized,
{
    let z = model.project(state)?;
    add_noise(model.noise_covar(), z, noise, rng)
}

pub(crate) fn add_noise<R: Rng + ?Sized>(
    covar: &NoiseCovariance,
    z: DVec,
    noise: &Noise,
    rng: &mut R,
) -> Result<DVec> {
    match noise {
        Noise::Off => Ok(z),
        Noise::Sampled => Ok(z + covar.sample(rng)),
        Noise::Fixed(v) => {
            noise.check(z.len())?;
            Ok(z + v)
        }
    }
}

fn check_mapping(ndim_state: usize, mapping: &[usize]) -> Result<()> {
    if mapping.is_empty() {
        return Err(SensorError::config("mapping must not be empty"));
    }
    if let Some(&bad) = mapping.iter().find(|&&idx| idx >= ndim_state) {
        return Err(SensorError::config(format!(
            "mapping index {bad} out of range for {ndim_state}-dimensional state"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Linear Gaussian
// ---------------------------------------------------------------------------

/// Linear model selecting `mapping` components of the state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinearGaussian {
    pub ndim_state: usize,
    pub mapping: Vec<usize>,
    pub noise_covar: NoiseCovariance,
}

impl LinearGaussian {
    pub fn new(ndim_state: usize, mapping: Vec<usize>, noise_covar: NoiseCovariance) -> Result<Self> {
        check_mapping(ndim_state, &mapping)?;
        if noise_covar.dim() != mapping.len() {
            return Err(SensorError::config(format!(
                "noise covariance is {}x{} but mapping selects {} components",
                noise_covar.dim(),
                noise_covar.dim(),
                mapping.len()
            )));
        }
        Ok(Self {
            ndim_state,
            mapping,
            noise_covar,
        })
    }

    /// Observation matrix H (ndim_meas × ndim_state).
    pub fn matrix(&self) -> DMat {
        let mut h = DMat::zeros(self.mapping.len(), self.ndim_state);
        for (row, &col) in self.mapping.iter().enumerate() {
            h[(row, col)] = 1.0;
        }
        h
    }
}

impl MeasurementModel for LinearGaussian {
    fn ndim_state(&self) -> usize {
        self.ndim_state
    }

    fn ndim_meas(&self) -> usize {
        self.mapping.len()
    }

    fn mapping(&self) -> &[usize] {
        &self.mapping
    }

    fn noise_covar(&self) -> &NoiseCovariance {
        &self.noise_covar
    }

    fn project(&self, state: &State) -> Result<DVec> {
        self.check_state(state)?;
        Ok(self.matrix() * &state.state_vector)
    }
}

// ---------------------------------------------------------------------------
// Cartesian → bearing/range
// ---------------------------------------------------------------------------

/// Planar bearing/range of the mapped position relative to a posed sensor.
/// z = [φ, ρ].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CartesianToBearingRange {
    pub ndim_state: usize,
    /// Position indices, 2 (x, y) or 3 (x, y, z)
    pub mapping: Vec<usize>,
    pub noise_covar: NoiseCovariance,
    /// Sensor position, same length as `mapping`
    pub translation_offset: Vec<f64>,
    /// Sensor orientation [θx, θy, θz]
    pub rotation_offset: Vector3<f64>,
}

impl CartesianToBearingRange {
    pub fn new(
        ndim_state: usize,
        mapping: Vec<usize>,
        noise_covar: NoiseCovariance,
        translation_offset: Vec<f64>,
        rotation_offset: Vector3<f64>,
    ) -> Result<Self> {
        check_mapping(ndim_state, &mapping)?;
        if !(2..=3).contains(&mapping.len()) {
            return Err(SensorError::config(format!(
                "bearing/range mapping needs 2 or 3 position indices, got {}",
                mapping.len()
            )));
        }
        if translation_offset.len() != mapping.len() {
            return Err(SensorError::config(format!(
                "translation offset has {} components, mapping has {}",
                translation_offset.len(),
                mapping.len()
            )));
        }
        if noise_covar.dim() != 2 {
            return Err(SensorError::config(format!(
                "bearing/range noise covariance must be 2x2, got {0}x{0}",
                noise_covar.dim()
            )));
        }
        Ok(Self {
            ndim_state,
            mapping,
            noise_covar,
            translation_offset,
            rotation_offset,
        })
    }

    /// Projection for an explicitly supplied orientation.
    pub fn project_oriented(&self, state: &State, orientation: &Vector3<f64>) -> Result<DVec> {
        self.check_state(state)?;
        let position = geometry::mapped_position(state, &self.mapping)?;
        let (bearing, range) =
            geometry::bearing_range(&position, &self.translation_offset, orientation)?;
        Ok(DVec::from_vec(vec![bearing.radians(), range]))
    }
}

impl MeasurementModel for CartesianToBearingRange {
    fn ndim_state(&self) -> usize {
        self.ndim_state
    }

    fn ndim_meas(&self) -> usize {
        2
    }

    fn mapping(&self) -> &[usize] {
        &self.mapping
    }

    fn noise_covar(&self) -> &NoiseCovariance {
        &self.noise_covar
    }

    fn project(&self, state: &State) -> Result<DVec> {
        self.project_oriented(state, &self.rotation_offset)
    }

    fn to_value(&self, z: &DVec) -> MeasurementValue {
        MeasurementValue::BearingRange {
            bearing: Bearing::new(z[0]),
            range: z[1],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn rejects_malformed_covariances() {
        assert!(NoiseCovariance::new(DMat::zeros(2, 3)).is_err());
        assert!(NoiseCovariance::new(DMat::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0])).is_err());
        assert!(NoiseCovariance::new(DMat::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0])).is_err());
        assert!(NoiseCovariance::diagonal(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn semi_definite_covariance_is_accepted() {
        let cov = NoiseCovariance::diagonal(&[4.0, 0.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            let v = cov.sample(&mut rng);
            assert_abs_diff_eq!(v[1], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn sample_covariance_converges() {
        let r = DMat::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 2.0]);
        let cov = NoiseCovariance::new(r.clone()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let n = 20_000;
        let mut acc = DMat::zeros(2, 2);
        for _ in 0..n {
            let v = cov.sample(&mut rng);
            acc += &v * v.transpose();
        }
        acc /= n as f64;
        for (a, b) in acc.iter().zip(r.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 0.15);
        }
    }

    #[test]
    fn covariance_round_trips_through_serde() {
        let cov = NoiseCovariance::diagonal(&[0.015, 0.1]).unwrap();
        let json = serde_json::to_string(&cov).unwrap();
        let back: NoiseCovariance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cov);
        assert_eq!(cov.to_row_major(), vec![0.015, 0.0, 0.0, 0.1]);
    }

    #[test]
    fn linear_gaussian_selects_mapping() {
        let model =
            LinearGaussian::new(6, vec![0, 2, 4], NoiseCovariance::diagonal(&[1.0; 3]).unwrap())
                .unwrap();
        let h = model.matrix();
        assert_eq!((h.nrows(), h.ncols()), (3, 6));
        let state = State::from_slice(&[1.0, 9.0, 2.0, 9.0, 3.0, 9.0], 0.0);
        let z = model.project(&state).unwrap();
        assert_eq!(z.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn linear_gaussian_rejects_bad_configuration() {
        let cov = NoiseCovariance::diagonal(&[1.0; 2]).unwrap();
        assert!(LinearGaussian::new(3, vec![0, 3], cov.clone()).is_err());
        assert!(LinearGaussian::new(3, vec![0, 1, 2], cov).is_err());
    }

    #[test]
    fn fixed_noise_must_match_dimension() {
        let model =
            LinearGaussian::new(2, vec![0, 1], NoiseCovariance::diagonal(&[1.0; 2]).unwrap())
                .unwrap();
        let state = State::from_slice(&[1.0, 2.0], 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let z = observe(&model, &state, &Noise::Fixed(DVec::from_vec(vec![0.5, -0.5])), &mut rng)
            .unwrap();
        assert_eq!(z.as_slice(), &[1.5, 1.5]);
        let err = observe(&model, &state, &Noise::Fixed(DVec::from_vec(vec![0.5])), &mut rng)
            .unwrap_err();
        assert!(matches!(err, SensorError::Dimension { .. }));
    }

    #[test]
    fn bearing_range_wraps_value() {
        let model = CartesianToBearingRange::new(
            2,
            vec![0, 1],
            NoiseCovariance::diagonal(&[0.015, 0.1]).unwrap(),
            vec![0.0, 0.0],
            Vector3::zeros(),
        )
        .unwrap();
        let value = model.to_value(&DVec::from_vec(vec![4.0, 10.0]));
        match value {
            MeasurementValue::BearingRange { bearing, range } => {
                assert_abs_diff_eq!(bearing.radians(), 4.0 - std::f64::consts::TAU, epsilon = 1e-12);
                assert_abs_diff_eq!(range, 10.0);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }
}
