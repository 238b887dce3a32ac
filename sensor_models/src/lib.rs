//! `sensor_models` — Radar sensor models: geometry, beams, detection, measurement synthesis.
//!
//! # Module map
//! - [`geometry`]        — sensor-frame transform, polar/spherical conversion
//! - [`observation`]     — noise covariance, measurement models, noise selection
//! - [`beam_shape`]      — beam patterns and scan-loss spoiling
//! - [`beam_transition`] — stationary, rotating and raster beam pointing; field of view
//! - [`detection`]       — Pd laws, Swerling RCS sampling, dB helpers
//! - [`radar`]           — `Sensor` trait, plain and rotating range/bearing radars
//! - [`aesa`]            — AESA detection engine

pub mod aesa;
pub mod beam_shape;
pub mod beam_transition;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod observation;
pub mod radar;

pub use aesa::{AesaParams, AesaRadar, DetectionReport};
pub use beam_shape::{Beam2DGaussian, BeamShape, BeamShapeModel, SpoiledBeam, UniformAperture};
pub use beam_transition::{
    BeamDirection, BeamPattern, BeamTransition, DwellCenter, FieldOfView, RasterSweep,
    RotatingBeam, StationaryBeam,
};
pub use detection::DetectionLaw;
pub use error::{Result, SensorError};
pub use observation::{
    observe, CartesianToBearingRange, LinearGaussian, MeasurementModel, Noise, NoiseCovariance,
};
pub use radar::{RadarParams, RadarRangeBearing, RadarRotatingRangeBearing, RotationParams, Sensor};
