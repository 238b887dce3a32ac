//! Scenario definitions.
//!
//! Each scenario is a named configuration of targets and sensors.
//! All scenarios are deterministic given the same seed.

use crate::{
    radar_sim::{RadarSimulator, SensorKind, SensorSpec},
    replay::{GroundTruthFrame, MeasurementLog, TargetState},
    target::{MotionSpec, Target, POSITION_2D, POSITION_3D, STATE_DIM},
};
use anyhow::Result;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sensor_models::{
    AesaParams, BeamDirection, BeamTransition, DwellCenter, NoiseCovariance, RadarParams,
    RasterSweep, RotationParams, StationaryBeam,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::info;
use tracker_core::types::SensorId;

/// Which pre-defined scenario to load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// 12 targets, 2 mechanically rotating surveillance radars
    Surveillance,
    /// Inbound raid against an AESA with a fixed broadside beam, Swerling targets
    AesaStare,
    /// Spread targets searched by an AESA raster scan
    AesaRaster,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub duration: f64, // seconds
    pub sim_dt: f64,   // simulation step (s)
    pub targets: Vec<Target>,
    pub sensors: Vec<SensorSpec>,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Result<Self> {
        match kind {
            ScenarioKind::Surveillance => Self::surveillance(seed),
            ScenarioKind::AesaStare => Self::aesa_stare(seed),
            ScenarioKind::AesaRaster => Self::aesa_raster(seed),
        }
    }

    /// Step targets, poll sensors and record everything until `duration`.
    /// Every run starts from the scenario's initial target states.
    pub fn run(&self) -> Result<MeasurementLog> {
        let mut sim = RadarSimulator::new(&self.sensors, self.seed)?;
        let mut targets = self.targets.clone();
        let dt = self.sim_dt;
        let mut sim_time = 0.0f64;
        let mut batches = Vec::new();
        let mut ground_truth = Vec::new();

        info!(
            scenario = %self.name,
            seed = self.seed,
            duration = self.duration,
            sensors = self.sensors.len(),
            targets = self.targets.len(),
            "running scenario"
        );

        while sim_time < self.duration {
            for target in &mut targets {
                target.step(dt);
            }
            sim_time += dt;

            ground_truth.push(GroundTruthFrame {
                time: sim_time,
                targets: targets
                    .iter()
                    .filter(|t| t.is_active(sim_time))
                    .map(|t| TargetState {
                        id: t.id,
                        state: t.state,
                    })
                    .collect(),
            });

            batches.extend(sim.generate_batches(&targets, sim_time)?);
        }

        let n_meas: usize = batches.iter().map(|b| b.measurements.len()).sum();
        info!(
            scenario = %self.name,
            batches = batches.len(),
            measurements = n_meas,
            "scenario complete"
        );

        Ok(MeasurementLog {
            scenario_name: self.name.clone(),
            seed: self.seed,
            sim_dt: dt,
            duration: self.duration,
            batches,
            ground_truth,
        })
    }

    // -----------------------------------------------------------------------
    // Scenario 1: Surveillance
    // -----------------------------------------------------------------------
    fn surveillance(seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

        let targets = (0..12)
            .map(|i| {
                let angle = i as f64 * TAU / 12.0;
                let r = 20_000.0 + rng.gen::<f64>() * 20_000.0;
                let speed = 100.0 + rng.gen::<f64>() * 150.0;
                let heading = rng.gen::<f64>() * TAU;
                let motion = if rng.gen::<f64>() < 0.3 {
                    MotionSpec::ConstantTurn {
                        omega: (rng.gen::<f64>() - 0.5) * 0.05,
                    }
                } else {
                    MotionSpec::ConstantVelocity
                };
                Target::new(
                    i as u64,
                    [r * angle.cos(), r * angle.sin(), 3000.0],
                    [speed * heading.cos(), speed * heading.sin(), 0.0],
                    motion,
                )
            })
            .collect();

        let sensors = vec![
            rotating_radar(0, [-10_000.0, 0.0], 12.0, 0.0)?,
            rotating_radar(1, [10_000.0, 0.0], 15.0, std::f64::consts::PI)?,
        ];

        Ok(Scenario {
            name: "surveillance".into(),
            seed,
            duration: 120.0,
            sim_dt: 0.05,
            targets,
            sensors,
        })
    }

    // -----------------------------------------------------------------------
    // Scenario 2: AESA stare
    // -----------------------------------------------------------------------
    fn aesa_stare(seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(2));

        let targets = (0..6)
            .map(|i| {
                let lateral = (i as f64 - 2.5) * 2_000.0;
                let start = 150_000.0 + rng.gen::<f64>() * 10_000.0;
                let speed = 200.0 + rng.gen::<f64>() * 100.0;
                Target::new(
                    i as u64,
                    [start, lateral, 5_000.0],
                    [-speed, 0.0, 0.0],
                    MotionSpec::ConstantVelocity,
                )
            })
            .collect();

        let params = AesaParams {
            swerling_on: true,
            beam_transition: BeamTransition::Stationary(StationaryBeam::new(0.0, 0.0)),
            ..aesa_params()
        };

        Ok(Scenario {
            name: "aesa_stare".into(),
            seed,
            duration: 300.0,
            sim_dt: 0.1,
            targets,
            sensors: vec![aesa(0, 1.0, params)],
        })
    }

    // -----------------------------------------------------------------------
    // Scenario 3: AESA raster search
    // -----------------------------------------------------------------------
    fn aesa_raster(seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(3));

        let targets = (0..10)
            .map(|i| {
                let az = (rng.gen::<f64>() - 0.5) * 50f64.to_radians();
                let r = 40_000.0 + rng.gen::<f64>() * 30_000.0;
                let alt = 2_000.0 + rng.gen::<f64>() * 8_000.0;
                let motion = if i % 3 == 0 {
                    MotionSpec::Static
                } else {
                    MotionSpec::ConstantVelocity
                };
                Target::new(
                    i as u64,
                    [r * az.cos(), r * az.sin(), alt],
                    [-150.0 * az.cos(), -150.0 * az.sin(), 0.0],
                    motion,
                )
            })
            .collect();

        let params = AesaParams {
            beam_transition: BeamTransition::Raster(RasterSweep {
                angle_per_s: 2.0,
                frame: [60f64.to_radians(), 20f64.to_radians()],
                separation: 5f64.to_radians(),
                centre: BeamDirection::new(0.0, 8f64.to_radians()),
                init_time: 0.0,
            }),
            ..aesa_params()
        };

        Ok(Scenario {
            name: "aesa_raster".into(),
            seed,
            duration: 60.0,
            sim_dt: 0.05,
            targets,
            sensors: vec![aesa(0, 20.0, params)],
        })
    }
}

// ---------------------------------------------------------------------------
// Builder helpers
// ---------------------------------------------------------------------------

fn rotating_radar(id: u32, pos: [f64; 2], rpm: f64, initial_dwell: f64) -> Result<SensorSpec> {
    Ok(SensorSpec {
        id: SensorId(id),
        refresh_rate: 20.0,
        kind: SensorKind::RotatingRangeBearing {
            radar: RadarParams {
                position: pos.to_vec(),
                orientation: [0.0; 3],
                ndim_state: STATE_DIM,
                mapping: POSITION_2D.to_vec(),
                noise_covar: NoiseCovariance::diagonal(&[1e-4, 2500.0])?,
            },
            rotation: RotationParams {
                rpm,
                max_range: 60_000.0,
                fov_angle: 0.2,
                dwell_center: DwellCenter::new(initial_dwell, 0.0),
            },
        },
    })
}

fn aesa_params() -> AesaParams {
    AesaParams {
        mapping: POSITION_3D.to_vec(),
        ..AesaParams::default()
    }
}

fn aesa(id: u32, refresh_rate: f64, params: AesaParams) -> SensorSpec {
    SensorSpec {
        id: SensorId(id),
        refresh_rate,
        kind: SensorKind::Aesa {
            params,
            position_variances: vec![100.0; 3],
            ndim_state: STATE_DIM,
        },
    }
}
