//! Range/bearing radars.
//!
//! [`RadarRangeBearing`] always reports the target. [`RadarRotatingRangeBearing`]
//! carries a rotating beam and only reports targets inside its field of view
//! around the instantaneous boresight (sensor yaw + dwell centre angle).

use crate::beam_transition::{DwellCenter, FieldOfView, RotatingBeam};
use crate::error::Result;
use crate::observation::{add_noise, CartesianToBearingRange, MeasurementModel, Noise, NoiseCovariance};
use nalgebra::{DVector, Vector3};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracker_core::types::{Measurement, SensorId, State};

/// Anything that turns ground truth into (possibly absent) measurements.
pub trait Sensor {
    fn sensor_id(&self) -> SensorId;

    /// `Ok(None)` means the target was not detected or not in view.
    fn gen_measurement(
        &mut self,
        truth: &State,
        noise: &Noise,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Measurement>>;
}

/// Pose and noise of a range/bearing radar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RadarParams {
    /// Radar position, 2D or 3D (meters)
    pub position: Vec<f64>,
    /// Euler angles [θx, θy, θz] of the boresight (radians)
    pub orientation: [f64; 3],
    /// Dimension of the target state vector
    pub ndim_state: usize,
    /// State indices of the target position
    pub mapping: Vec<usize>,
    /// 2x2 covariance of [bearing, range]
    pub noise_covar: NoiseCovariance,
}

impl RadarParams {
    fn model(&self) -> Result<CartesianToBearingRange> {
        CartesianToBearingRange::new(
            self.ndim_state,
            self.mapping.clone(),
            self.noise_covar.clone(),
            self.position.clone(),
            Vector3::from(self.orientation),
        )
    }
}

fn to_measurement(
    sensor_id: SensorId,
    model: &CartesianToBearingRange,
    timestamp: f64,
    z: &DVector<f64>,
) -> Measurement {
    Measurement {
        sensor_id,
        timestamp,
        value: model.to_value(z),
        noise_cov: model.noise_covar.to_row_major(),
    }
}

// ---------------------------------------------------------------------------
// Plain
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct RadarRangeBearing {
    sensor_id: SensorId,
    model: CartesianToBearingRange,
}

impl RadarRangeBearing {
    pub fn new(sensor_id: SensorId, params: &RadarParams) -> Result<Self> {
        Ok(Self {
            sensor_id,
            model: params.model()?,
        })
    }

    pub fn measurement_model(&self) -> &CartesianToBearingRange {
        &self.model
    }

    /// Bearing/range of `truth`; never `None`.
    pub fn gen_measurement<R: Rng + ?Sized>(
        &self,
        truth: &State,
        noise: &Noise,
        rng: &mut R,
    ) -> Result<Option<Measurement>> {
        let z = self.model.project(truth)?;
        let z = add_noise(&self.model.noise_covar, z, noise, rng)?;
        Ok(Some(to_measurement(self.sensor_id, &self.model, truth.timestamp, &z)))
    }
}

impl Sensor for RadarRangeBearing {
    fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    fn gen_measurement(
        &mut self,
        truth: &State,
        noise: &Noise,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Measurement>> {
        RadarRangeBearing::gen_measurement(self, truth, noise, rng)
    }
}

// ---------------------------------------------------------------------------
// Rotating
// ---------------------------------------------------------------------------

/// Antenna rotation and coverage. Invariants: rpm > 0, fov_angle ∈ (0, 2π],
/// max_range > 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationParams {
    pub rpm: f64,
    pub max_range: f64,
    /// Full angular window (radians)
    pub fov_angle: f64,
    /// Initial dwell centre
    pub dwell_center: DwellCenter,
}

#[derive(Clone, Debug)]
pub struct RadarRotatingRangeBearing {
    sensor_id: SensorId,
    model: CartesianToBearingRange,
    beam: RotatingBeam,
    fov: FieldOfView,
}

impl RadarRotatingRangeBearing {
    pub fn new(sensor_id: SensorId, params: &RadarParams, rotation: &RotationParams) -> Result<Self> {
        let model = params.model()?;
        let beam = RotatingBeam::new(rotation.rpm, rotation.dwell_center)?;
        let fov = FieldOfView::new(rotation.fov_angle, rotation.max_range)?;
        Ok(Self {
            sensor_id,
            model,
            beam,
            fov,
        })
    }

    pub fn dwell_center(&self) -> DwellCenter {
        self.beam.dwell_center()
    }

    pub fn field_of_view(&self) -> FieldOfView {
        self.fov
    }

    pub fn measurement_model(&self) -> &CartesianToBearingRange {
        &self.model
    }

    /// Sensor orientation with the yaw advanced by the current dwell angle.
    pub fn boresight_orientation(&self) -> Vector3<f64> {
        let mut orientation = self.model.rotation_offset;
        orientation.z += self.beam.dwell_center().angle;
        orientation
    }

    /// Advance the beam to `truth.timestamp`, then report the target if it is
    /// in view. The dwell centre moves even when the target is gated out.
    pub fn gen_measurement<R: Rng + ?Sized>(
        &mut self,
        truth: &State,
        noise: &Noise,
        rng: &mut R,
    ) -> Result<Option<Measurement>> {
        self.model.check_state(truth)?;
        noise.check(self.model.ndim_meas())?;
        self.beam.rotate(truth.timestamp)?;

        let z = self.model.project_oriented(truth, &self.boresight_orientation())?;
        let (bearing, range) = (z[0], z[1]);
        if !self.fov.contains(bearing, range) {
            debug!(
                sensor = %self.sensor_id,
                t = truth.timestamp,
                bearing,
                range,
                "target outside field of view"
            );
            return Ok(None);
        }

        let z = add_noise(&self.model.noise_covar, z, noise, rng)?;
        Ok(Some(to_measurement(self.sensor_id, &self.model, truth.timestamp, &z)))
    }
}

impl Sensor for RadarRotatingRangeBearing {
    fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    fn gen_measurement(
        &mut self,
        truth: &State,
        noise: &Noise,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Measurement>> {
        RadarRotatingRangeBearing::gen_measurement(self, truth, noise, rng)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::{FRAC_PI_3, FRAC_PI_4, PI, SQRT_2};
    use tracker_core::types::MeasurementValue;

    fn params(position: [f64; 2], yaw: f64) -> RadarParams {
        RadarParams {
            position: position.to_vec(),
            orientation: [0.0, 0.0, yaw],
            ndim_state: 4,
            mapping: vec![0, 2],
            noise_covar: NoiseCovariance::diagonal(&[0.015, 0.1]).unwrap(),
        }
    }

    fn bearing_range(m: &Measurement) -> (f64, f64) {
        match m.value {
            MeasurementValue::BearingRange { bearing, range } => (bearing.radians(), range),
            ref other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn plain_radar_noiseless_projection() {
        let radar = RadarRangeBearing::new(SensorId(3), &params([1.0, 1.0], 0.0)).unwrap();
        let truth = State::from_slice(&[2.0, 1.0, 2.0, 1.0], 4.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let m = radar.gen_measurement(&truth, &Noise::Off, &mut rng).unwrap().unwrap();
        let (b, r) = bearing_range(&m);
        assert_abs_diff_eq!(b, FRAC_PI_4, epsilon = 1e-12);
        assert_abs_diff_eq!(r, SQRT_2, epsilon = 1e-12);
        assert_eq!(m.timestamp, 4.0);
        assert_eq!(m.sensor_id, SensorId(3));
        assert_eq!(m.noise_cov, vec![0.015, 0.0, 0.0, 0.1]);
    }

    #[test]
    fn plain_radar_noise_is_bounded() {
        let radar = RadarRangeBearing::new(SensorId(0), &params([0.0, 0.0], 0.0)).unwrap();
        let truth = State::from_slice(&[30.0, 0.0, 40.0, 0.0], 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        for _ in 0..100 {
            let m = radar.gen_measurement(&truth, &Noise::Sampled, &mut rng).unwrap().unwrap();
            let (b, r) = bearing_range(&m);
            assert!(b > -PI && b <= PI);
            // 6σ bounds
            assert!((r - 50.0).abs() < 6.0 * 0.1f64.sqrt());
        }
    }

    #[test]
    fn plain_radar_rejects_wrong_state_size() {
        let radar = RadarRangeBearing::new(SensorId(0), &params([0.0, 0.0], 0.0)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = radar
            .gen_measurement(&State::from_slice(&[1.0, 2.0], 0.0), &Noise::Off, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SensorError::Dimension { .. }));
    }

    #[test]
    fn rotating_radar_sweeps_target_into_view() {
        let rotation = RotationParams {
            rpm: 20.0,
            max_range: 100.0,
            fov_angle: FRAC_PI_3,
            dwell_center: DwellCenter::new(-PI, 0.0),
        };
        let mut radar =
            RadarRotatingRangeBearing::new(SensorId(1), &params([1.0, 1.0], PI), &rotation).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let at = |t: f64| State::from_slice(&[6.0, 0.0, 6.0, 0.0], t);
        assert!(radar.gen_measurement(&at(0.0), &Noise::Off, &mut rng).unwrap().is_none());

        let m = radar.gen_measurement(&at(0.5), &Noise::Off, &mut rng).unwrap().unwrap();
        let dwell = radar.dwell_center();
        assert_abs_diff_eq!(dwell.angle, -PI + FRAC_PI_3, epsilon = 1e-12);

        let manual = CartesianToBearingRange::new(
            4,
            vec![0, 2],
            NoiseCovariance::diagonal(&[0.015, 0.1]).unwrap(),
            vec![1.0, 1.0],
            Vector3::new(0.0, 0.0, PI + dwell.angle),
        )
        .unwrap()
        .project(&at(0.5))
        .unwrap();
        let (b, r) = bearing_range(&m);
        assert_abs_diff_eq!(b, manual[0], epsilon = 1e-12);
        assert_abs_diff_eq!(r, manual[1], epsilon = 1e-12);
        assert_abs_diff_eq!(b, FRAC_PI_4 - FRAC_PI_3, epsilon = 1e-12);
    }

    #[test]
    fn rotating_radar_gates_range_and_still_rotates() {
        let rotation = RotationParams {
            rpm: 20.0,
            max_range: 5.0,
            fov_angle: FRAC_PI_3,
            dwell_center: DwellCenter::new(0.0, 0.0),
        };
        let mut radar =
            RadarRotatingRangeBearing::new(SensorId(1), &params([0.0, 0.0], 0.0), &rotation).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // Dead ahead after a full revolution but out of range.
        let far = State::from_slice(&[50.0, 0.0, 0.0, 0.0], 3.0);
        assert!(radar.gen_measurement(&far, &Noise::Off, &mut rng).unwrap().is_none());
        assert_eq!(radar.dwell_center().timestamp, 3.0);
    }

    #[test]
    fn rotating_radar_rejects_regressing_time_without_mutation() {
        let rotation = RotationParams {
            rpm: 20.0,
            max_range: 100.0,
            fov_angle: FRAC_PI_3,
            dwell_center: DwellCenter::new(0.0, 2.0),
        };
        let mut radar =
            RadarRotatingRangeBearing::new(SensorId(1), &params([0.0, 0.0], 0.0), &rotation).unwrap();
        let before = radar.dwell_center();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = radar
            .gen_measurement(&State::from_slice(&[1.0, 0.0, 1.0, 0.0], 1.0), &Noise::Off, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SensorError::Sequence { .. }));
        assert_eq!(radar.dwell_center(), before);

        // A malformed state is rejected before the beam moves, too.
        let err = radar
            .gen_measurement(&State::from_slice(&[1.0, 1.0], 5.0), &Noise::Off, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SensorError::Dimension { .. }));
        assert_eq!(radar.dwell_center(), before);

        // So is a fixed noise vector of the wrong length.
        let short_noise = Noise::Fixed(DVector::from_vec(vec![0.1]));
        let err = radar
            .gen_measurement(&State::from_slice(&[1.0, 0.0, 1.0, 0.0], 5.0), &short_noise, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SensorError::Dimension { context: "noise vector", .. }));
        assert_eq!(radar.dwell_center(), before);
    }

    #[test]
    fn construction_validates_rotation_and_pose() {
        let ok = RotationParams {
            rpm: 20.0,
            max_range: 100.0,
            fov_angle: FRAC_PI_3,
            dwell_center: DwellCenter::new(0.0, 0.0),
        };
        let p = params([0.0, 0.0], 0.0);
        for bad in [
            RotationParams { rpm: 0.0, ..ok },
            RotationParams { fov_angle: 7.0, ..ok },
            RotationParams { max_range: -1.0, ..ok },
        ] {
            assert!(matches!(
                RadarRotatingRangeBearing::new(SensorId(0), &p, &bad),
                Err(SensorError::Configuration(_))
            ));
        }
        let short_position = RadarParams {
            position: vec![0.0],
            ..p
        };
        assert!(RadarRangeBearing::new(SensorId(0), &short_position).is_err());
    }

    #[test]
    fn sensors_work_through_trait_objects() {
        let mut sensors: Vec<Box<dyn Sensor>> = vec![
            Box::new(RadarRangeBearing::new(SensorId(0), &params([0.0, 0.0], 0.0)).unwrap()),
            Box::new(
                RadarRotatingRangeBearing::new(
                    SensorId(1),
                    &params([0.0, 0.0], 0.0),
                    &RotationParams {
                        rpm: 10.0,
                        max_range: 1e3,
                        fov_angle: 2.0 * PI,
                        dwell_center: DwellCenter::new(0.0, 0.0),
                    },
                )
                .unwrap(),
            ),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let truth = State::from_slice(&[10.0, 0.0, 5.0, 0.0], 1.0);
        for sensor in sensors.iter_mut() {
            let m = sensor.gen_measurement(&truth, &Noise::Sampled, &mut rng).unwrap();
            assert_eq!(m.unwrap().sensor_id, sensor.sensor_id());
        }
    }
}
