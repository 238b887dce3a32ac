//! Beam transition models: where the beam points at a given instant.
//!
//! # Variants
//! - [`StationaryBeam`] — fixed (azimuth, elevation) centre
//! - [`RotatingBeam`]   — mechanically rotating antenna; holds the dwell centre
//!   and advances it by `rpm·2π/60·Δt` on every query
//! - [`RasterSweep`]    — electronic raster over an az/el frame, alternating
//!   direction on each line
//!
//! All are reachable through [`BeamTransition`], which implements [`BeamPattern`].

use crate::error::{ensure_positive, Result, SensorError};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use tracker_core::types::wrap_pi;

/// Beam pointing direction relative to the sensor boresight (radians).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BeamDirection {
    pub azimuth: f64,
    pub elevation: f64,
}

impl BeamDirection {
    pub fn new(azimuth: f64, elevation: f64) -> Self {
        Self { azimuth, elevation }
    }
}

/// Time-indexed beam pointing.
pub trait BeamPattern {
    /// Beam direction at `timestamp`. Stateful variants advance their state.
    fn direction(&mut self, timestamp: f64) -> Result<BeamDirection>;
}

// ---------------------------------------------------------------------------
// Stationary
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationaryBeam {
    pub centre: BeamDirection,
}

impl StationaryBeam {
    pub fn new(azimuth: f64, elevation: f64) -> Self {
        Self {
            centre: BeamDirection::new(azimuth, elevation),
        }
    }
}

impl BeamPattern for StationaryBeam {
    fn direction(&mut self, _timestamp: f64) -> Result<BeamDirection> {
        Ok(self.centre)
    }
}

// ---------------------------------------------------------------------------
// Rotating
// ---------------------------------------------------------------------------

/// Beam azimuth offset from the sensor yaw, valid as of `timestamp`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DwellCenter {
    pub angle: f64,
    pub timestamp: f64,
}

impl DwellCenter {
    pub fn new(angle: f64, timestamp: f64) -> Self {
        Self { angle, timestamp }
    }
}

/// Mechanically rotating antenna.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatingBeam {
    rpm: f64,
    /// Fixed elevation of the rotating beam
    elevation: f64,
    dwell_center: DwellCenter,
}

impl RotatingBeam {
    pub fn new(rpm: f64, dwell_center: DwellCenter) -> Result<Self> {
        Self::with_elevation(rpm, 0.0, dwell_center)
    }

    pub fn with_elevation(rpm: f64, elevation: f64, dwell_center: DwellCenter) -> Result<Self> {
        let beam = Self {
            rpm,
            elevation,
            dwell_center: DwellCenter::new(wrap_pi(dwell_center.angle), dwell_center.timestamp),
        };
        beam.validate()?;
        Ok(beam)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("rpm", self.rpm)?;
        if !self.dwell_center.angle.is_finite() || !self.dwell_center.timestamp.is_finite() {
            return Err(SensorError::config("dwell centre must be finite"));
        }
        Ok(())
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    pub fn dwell_center(&self) -> DwellCenter {
        self.dwell_center
    }

    /// Angular rate (rad/s).
    pub fn angular_rate(&self) -> f64 {
        self.rpm * TAU / 60.0
    }

    /// Advance the dwell centre to `timestamp`. This is the only place the
    /// dwell centre changes; a regressing timestamp leaves it untouched.
    pub fn rotate(&mut self, timestamp: f64) -> Result<DwellCenter> {
        let elapsed = timestamp - self.dwell_center.timestamp;
        if elapsed.is_nan() || elapsed < 0.0 {
            return Err(SensorError::Sequence {
                query: timestamp,
                stored: self.dwell_center.timestamp,
            });
        }
        self.dwell_center = DwellCenter::new(
            wrap_pi(self.dwell_center.angle + self.angular_rate() * elapsed),
            timestamp,
        );
        Ok(self.dwell_center)
    }
}

impl BeamPattern for RotatingBeam {
    fn direction(&mut self, timestamp: f64) -> Result<BeamDirection> {
        let dwell = self.rotate(timestamp)?;
        Ok(BeamDirection::new(dwell.angle, self.elevation))
    }
}

// ---------------------------------------------------------------------------
// Raster
// ---------------------------------------------------------------------------

/// Raster scan: lines of `frame[0]` azimuth extent swept at `angle_per_s`,
/// stepped down by `separation` over `frame[1]` of elevation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterSweep {
    pub angle_per_s: f64,
    /// (azimuth extent, elevation extent)
    pub frame: [f64; 2],
    pub separation: f64,
    pub centre: BeamDirection,
    pub init_time: f64,
}

impl RasterSweep {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("angle_per_s", self.angle_per_s)?;
        ensure_positive("raster azimuth extent", self.frame[0])?;
        ensure_positive("separation", self.separation)?;
        if !(self.frame[1].is_finite() && self.frame[1] >= 0.0) {
            return Err(SensorError::config("raster elevation extent must be >= 0"));
        }
        Ok(())
    }

    /// Seconds to sweep one line.
    pub fn line_time(&self) -> f64 {
        self.frame[0] / self.angle_per_s
    }

    pub fn num_lines(&self) -> usize {
        (self.frame[1] / self.separation).floor() as usize + 1
    }

    /// Seconds to sweep the whole frame.
    pub fn frame_time(&self) -> f64 {
        self.num_lines() as f64 * self.line_time()
    }

    /// Beam direction `timestamp` seconds into the scan; pure.
    pub fn direction_at(&self, timestamp: f64) -> BeamDirection {
        let t = (timestamp - self.init_time).rem_euclid(self.frame_time());
        let line = ((t / self.line_time()).floor() as usize).min(self.num_lines() - 1);
        let into_line = t - line as f64 * self.line_time();
        let swept = into_line * self.angle_per_s;
        let elevation = self.centre.elevation + self.frame[1] / 2.0 - line as f64 * self.separation;
        let azimuth = if line % 2 == 0 {
            self.centre.azimuth - self.frame[0] / 2.0 + swept
        } else {
            self.centre.azimuth + self.frame[0] / 2.0 - swept
        };
        BeamDirection::new(azimuth, elevation)
    }
}

impl BeamPattern for RasterSweep {
    fn direction(&mut self, timestamp: f64) -> Result<BeamDirection> {
        Ok(self.direction_at(timestamp))
    }
}

// ---------------------------------------------------------------------------
// Closed set of variants
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BeamTransition {
    Stationary(StationaryBeam),
    Rotating(RotatingBeam),
    Raster(RasterSweep),
}

impl BeamTransition {
    pub fn validate(&self) -> Result<()> {
        match self {
            BeamTransition::Stationary(beam) => {
                let c = beam.centre;
                if !(c.azimuth.is_finite() && c.elevation.is_finite()) {
                    return Err(SensorError::config("stationary beam centre must be finite"));
                }
                Ok(())
            }
            BeamTransition::Rotating(beam) => beam.validate(),
            BeamTransition::Raster(beam) => beam.validate(),
        }
    }
}

impl Default for BeamTransition {
    fn default() -> Self {
        BeamTransition::Stationary(StationaryBeam::new(0.0, 0.0))
    }
}

impl BeamPattern for BeamTransition {
    fn direction(&mut self, timestamp: f64) -> Result<BeamDirection> {
        match self {
            BeamTransition::Stationary(beam) => beam.direction(timestamp),
            BeamTransition::Rotating(beam) => beam.direction(timestamp),
            BeamTransition::Raster(beam) => beam.direction(timestamp),
        }
    }
}

// ---------------------------------------------------------------------------
// Field of view
// ---------------------------------------------------------------------------

/// Angular window and range limit around the instantaneous boresight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    /// Full angular width (radians), in (0, 2π]
    pub fov_angle: f64,
    pub max_range: f64,
}

impl FieldOfView {
    pub fn new(fov_angle: f64, max_range: f64) -> Result<Self> {
        let fov = Self {
            fov_angle,
            max_range,
        };
        fov.validate()?;
        Ok(fov)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("max_range", self.max_range)?;
        if !(self.fov_angle > 0.0 && self.fov_angle <= 2.0 * PI) {
            return Err(SensorError::config(format!(
                "fov_angle must lie in (0, 2π], got {}",
                self.fov_angle
            )));
        }
        Ok(())
    }

    /// `bearing` is measured from the current boresight.
    pub fn contains(&self, bearing: f64, range: f64) -> bool {
        wrap_pi(bearing).abs() <= self.fov_angle / 2.0 && range <= self.max_range
    }
}
