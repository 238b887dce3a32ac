//! `sim` — Scenario simulator: target trajectories, scheduled radar polling,
//! Monte Carlo detection checks, measurement logs.

pub mod monte_carlo;
pub mod radar_sim;
pub mod replay;
pub mod scenarios;
pub mod target;

pub use monte_carlo::{density_histogram, detection_rate, swerling_samples, Histogram};
pub use radar_sim::{RadarSimulator, SensorKind, SensorSpec};
pub use replay::{load_log, save_log, LogSummary, MeasurementLog};
pub use scenarios::{Scenario, ScenarioKind};
pub use target::{MotionSpec, Target};
