//! Radar measurement simulator.
//!
//! Polls every configured sensor on its own refresh schedule and collects
//! the measurements it produces into per-scan batches. Detection, field of
//! view gating and noise are entirely up to the sensor models.

use crate::target::Target;
use anyhow::{ensure, Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sensor_models::{
    AesaParams, AesaRadar, LinearGaussian, Noise, NoiseCovariance, RadarParams,
    RadarRangeBearing, RadarRotatingRangeBearing, RotationParams, Sensor,
};
use serde::{Deserialize, Serialize};
use tracing::trace;
use tracker_core::types::{RadarBatch, SensorId};

/// Which sensor model to build.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorKind {
    RangeBearing {
        radar: RadarParams,
    },
    RotatingRangeBearing {
        radar: RadarParams,
        rotation: RotationParams,
    },
    /// AESA radar reporting noisy Cartesian positions on detection.
    Aesa {
        params: AesaParams,
        /// Variances of the reported position components
        position_variances: Vec<f64>,
        /// Dimension of the truth state
        ndim_state: usize,
    },
}

/// One configured sensor in the simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensorSpec {
    pub id: SensorId,
    /// Scans per second
    pub refresh_rate: f64,
    pub kind: SensorKind,
}

impl SensorSpec {
    pub fn build(&self) -> Result<Box<dyn Sensor + Send>> {
        let sensor: Box<dyn Sensor + Send> = match &self.kind {
            SensorKind::RangeBearing { radar } => Box::new(RadarRangeBearing::new(self.id, radar)?),
            SensorKind::RotatingRangeBearing { radar, rotation } => {
                Box::new(RadarRotatingRangeBearing::new(self.id, radar, rotation)?)
            }
            SensorKind::Aesa {
                params,
                position_variances,
                ndim_state,
            } => {
                let model = LinearGaussian::new(
                    *ndim_state,
                    params.mapping.clone(),
                    NoiseCovariance::diagonal(position_variances)?,
                )?;
                Box::new(AesaRadar::new(self.id, params.clone())?.with_measurement_model(model)?)
            }
        };
        Ok(sensor)
    }
}

/// A built sensor plus its scan schedule.
pub struct SimSensor {
    pub id: SensorId,
    pub refresh_rate: f64,
    sensor: Box<dyn Sensor + Send>,
    /// Next scheduled scan time
    pub next_scan_time: f64,
}

impl SimSensor {
    pub fn new(spec: &SensorSpec) -> Result<Self> {
        ensure!(
            spec.refresh_rate.is_finite() && spec.refresh_rate > 0.0,
            "sensor {} refresh rate must be positive, got {}",
            spec.id,
            spec.refresh_rate
        );
        let sensor = spec
            .build()
            .with_context(|| format!("building sensor {}", spec.id))?;
        Ok(Self {
            id: spec.id,
            refresh_rate: spec.refresh_rate,
            sensor,
            next_scan_time: 0.0,
        })
    }

    /// Check if this sensor should fire at the current simulation time.
    pub fn should_scan(&self, t: f64) -> bool {
        t >= self.next_scan_time
    }

    /// Advance the schedule by one scan interval.
    pub fn advance_schedule(&mut self) {
        self.next_scan_time += 1.0 / self.refresh_rate;
    }
}

/// Generates radar measurement batches from a set of targets.
pub struct RadarSimulator {
    pub sensors: Vec<SimSensor>,
    noise: Noise,
    rng: ChaCha8Rng,
}

impl RadarSimulator {
    pub fn new(specs: &[SensorSpec], seed: u64) -> Result<Self> {
        let sensors = specs.iter().map(SimSensor::new).collect::<Result<Vec<_>>>()?;
        Ok(Self {
            sensors,
            noise: Noise::Sampled,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Noiseless ground-truth projections instead of sampled noise.
    pub fn noiseless(mut self) -> Self {
        self.noise = Noise::Off;
        self
    }

    /// Generate all batches that should fire at or before `sim_time`.
    /// Targets are observed where they are now, stamped with the scan time.
    pub fn generate_batches(&mut self, targets: &[Target], sim_time: f64) -> Result<Vec<RadarBatch>> {
        let mut batches = Vec::new();

        for sim_sensor in &mut self.sensors {
            if !sim_sensor.should_scan(sim_time) {
                continue;
            }
            let scan_time = sim_sensor.next_scan_time;
            sim_sensor.advance_schedule();

            let mut measurements = Vec::new();
            for target in targets {
                if !target.is_active(scan_time) {
                    continue;
                }
                let truth = target.truth(scan_time);
                let measurement = sim_sensor
                    .sensor
                    .gen_measurement(&truth, &self.noise, &mut self.rng)
                    .with_context(|| {
                        format!("sensor {} observing target {} at t={scan_time}", sim_sensor.id, target.id)
                    })?;
                if let Some(m) = measurement {
                    measurements.push(m);
                }
            }

            trace!(sensor = %sim_sensor.id, scan_time, n = measurements.len(), "scan complete");
            batches.push(RadarBatch {
                sensor_id: sim_sensor.id,
                sensor_time: scan_time,
                measurements,
            });
        }

        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{MotionSpec, POSITION_2D, STATE_DIM};
    use sensor_models::DwellCenter;

    fn planar_radar() -> RadarParams {
        RadarParams {
            position: vec![0.0, 0.0],
            orientation: [0.0; 3],
            ndim_state: STATE_DIM,
            mapping: POSITION_2D.to_vec(),
            noise_covar: NoiseCovariance::diagonal(&[1e-4, 4.0]).unwrap(),
        }
    }

    #[test]
    fn sensors_fire_on_their_schedule() {
        let specs = vec![
            SensorSpec {
                id: SensorId(0),
                refresh_rate: 1.0,
                kind: SensorKind::RangeBearing { radar: planar_radar() },
            },
            SensorSpec {
                id: SensorId(1),
                refresh_rate: 0.5,
                kind: SensorKind::RangeBearing { radar: planar_radar() },
            },
        ];
        let mut sim = RadarSimulator::new(&specs, 1).unwrap();
        let targets = vec![Target::new(0, [1000.0, 0.0, 0.0], [0.0; 3], MotionSpec::Static)];

        let mut fired = [0usize; 2];
        let mut t = 0.0;
        while t < 10.0 {
            for batch in sim.generate_batches(&targets, t).unwrap() {
                fired[batch.sensor_id.0 as usize] += 1;
                assert_eq!(batch.measurements.len(), 1);
            }
            t += 0.1;
        }
        assert_eq!(fired, [10, 5]);
    }

    #[test]
    fn rotating_sensor_only_reports_in_view() {
        let specs = vec![SensorSpec {
            id: SensorId(3),
            refresh_rate: 10.0,
            kind: SensorKind::RotatingRangeBearing {
                radar: planar_radar(),
                rotation: RotationParams {
                    rpm: 60.0,
                    max_range: 5000.0,
                    fov_angle: 0.5,
                    dwell_center: DwellCenter::new(0.0, 0.0),
                },
            },
        }];
        let mut sim = RadarSimulator::new(&specs, 2).unwrap().noiseless();
        let targets = vec![Target::new(0, [1000.0, 0.0, 0.0], [0.0; 3], MotionSpec::Static)];

        let mut hits = 0;
        let mut scans = 0;
        let mut t = 0.0;
        while t < 1.0 - 1e-9 {
            for batch in sim.generate_batches(&targets, t).unwrap() {
                scans += 1;
                hits += batch.measurements.len();
            }
            t += 0.1;
        }
        // One revolution per second, ±0.25 rad window: only the scan at t = 0 sees it.
        assert_eq!(scans, 10);
        assert_eq!(hits, 1);
    }

    #[test]
    fn bad_specs_are_rejected() {
        let spec = SensorSpec {
            id: SensorId(0),
            refresh_rate: 0.0,
            kind: SensorKind::RangeBearing { radar: planar_radar() },
        };
        assert!(RadarSimulator::new(&[spec], 0).is_err());

        let spec = SensorSpec {
            id: SensorId(0),
            refresh_rate: 1.0,
            kind: SensorKind::Aesa {
                params: AesaParams::default(),
                position_variances: vec![1.0, 1.0],
                ndim_state: STATE_DIM,
            },
        };
        assert!(RadarSimulator::new(&[spec], 0).is_err());
    }
}
