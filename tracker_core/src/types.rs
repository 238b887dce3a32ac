//! Fundamental types shared between sensor models and the tracking side.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Generic dynamic-size vector (state vectors, measurement vectors)
pub type DVec = DVector<f64>;

/// Generic dynamic-size matrix (covariances, observation matrices)
pub type DMat = DMatrix<f64>;

// ---------------------------------------------------------------------------
// Identifier types
// ---------------------------------------------------------------------------

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SensorId(pub u32);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A kinematic state at an instant. Sensors only ever read it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Ordered state components, e.g. [px, py, pz, vx, vy, vz]
    pub state_vector: DVec,
    /// Simulation clock (seconds)
    pub timestamp: f64,
}

impl State {
    pub fn new(state_vector: DVec, timestamp: f64) -> Self {
        Self {
            state_vector,
            timestamp,
        }
    }

    pub fn from_slice(values: &[f64], timestamp: f64) -> Self {
        Self::new(DVec::from_column_slice(values), timestamp)
    }

    /// Number of state components.
    pub fn ndim(&self) -> usize {
        self.state_vector.len()
    }
}

// ---------------------------------------------------------------------------
// Angles
// ---------------------------------------------------------------------------

/// Wrap an angle into (−π, π]. Angles already in range are returned untouched.
pub fn wrap_pi(angle: f64) -> f64 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// A bearing in radians, always held in (−π, π].
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Bearing(f64);

impl Bearing {
    pub fn new(radians: f64) -> Self {
        Self(wrap_pi(radians))
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// Unsigned angular separation, in [0, π].
    pub fn separation(self, other: Bearing) -> f64 {
        (self - other).0.abs()
    }
}

impl From<f64> for Bearing {
    fn from(radians: f64) -> Self {
        Self::new(radians)
    }
}

impl From<Bearing> for f64 {
    fn from(bearing: Bearing) -> Self {
        bearing.0
    }
}

impl Add for Bearing {
    type Output = Bearing;
    fn add(self, rhs: Bearing) -> Bearing {
        Bearing::new(self.0 + rhs.0)
    }
}

impl Add<f64> for Bearing {
    type Output = Bearing;
    fn add(self, rhs: f64) -> Bearing {
        Bearing::new(self.0 + rhs)
    }
}

impl Sub for Bearing {
    type Output = Bearing;
    fn sub(self, rhs: Bearing) -> Bearing {
        Bearing::new(self.0 - rhs.0)
    }
}

impl Neg for Bearing {
    type Output = Bearing;
    fn neg(self) -> Bearing {
        Bearing::new(-self.0)
    }
}

impl fmt::Display for Bearing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// A single measurement produced by a sensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Which sensor produced this measurement
    pub sensor_id: SensorId,
    /// Timestamp of the observed state
    pub timestamp: f64,
    /// Observation value
    pub value: MeasurementValue,
    /// Noise covariance R of the generating model (row-major, dim × dim)
    pub noise_cov: Vec<f64>,
}

impl Measurement {
    /// The observation as a plain vector ([bearing, range] for polar values).
    pub fn state_vector(&self) -> DVec {
        match &self.value {
            MeasurementValue::BearingRange { bearing, range } => {
                DVec::from_vec(vec![bearing.radians(), *range])
            }
            MeasurementValue::Cartesian(values) => DVec::from_column_slice(values),
        }
    }

    /// Dimension of the observation vector
    pub fn dim(&self) -> usize {
        match &self.value {
            MeasurementValue::BearingRange { .. } => 2,
            MeasurementValue::Cartesian(values) => values.len(),
        }
    }

    /// Noise covariance as a DMatrix, `None` unless `noise_cov` holds `dim²` entries.
    pub fn noise_cov_matrix(&self) -> Option<DMat> {
        let d = self.dim();
        (self.noise_cov.len() == d * d).then(|| DMat::from_row_slice(d, d, &self.noise_cov))
    }
}

/// The actual observation value carried by a [`Measurement`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MeasurementValue {
    /// Sensor-relative polar coordinates (radians, meters)
    BearingRange { bearing: Bearing, range: f64 },
    /// Cartesian components in the order of the model's mapping
    Cartesian(Vec<f64>),
}

// ---------------------------------------------------------------------------
// RadarBatch — a timestamped batch of measurements from one sensor
// ---------------------------------------------------------------------------

/// All measurements one sensor produced during a single scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadarBatch {
    pub sensor_id: SensorId,
    /// Time the scan was taken (simulation clock)
    pub sensor_time: f64,
    pub measurements: Vec<Measurement>,
}
