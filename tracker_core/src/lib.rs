//! `tracker_core` — Types shared between sensor models and the tracking side.
//!
//! # Module layout
//! - [`types`] — IDs, kinematic state, wrapped bearings, measurements and batches

pub mod types;

pub use types::{
    wrap_pi, Bearing, DMat, DVec, Measurement, MeasurementValue, RadarBatch, SensorId, State,
};
