//! Beam shapes: power radiated off boresight, and scan loss of a steered array.
//!
//! Steering an electronically scanned array by (az, el) off broadside projects
//! its aperture by cos(az)·cos(el): gain drops by that factor and the beam
//! widens by its inverse. Every shape shares that spoiling law and differs in
//! how power falls off with angular offset from the beam centre.

use crate::beam_transition::BeamDirection;
use crate::error::{ensure_positive, Result};
use serde::{Deserialize, Serialize};

/// 2√(2 ln 2): full width at half maximum of a unit-σ Gaussian.
const GAUSSIAN_FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949;

/// sinc²(x) = ½ at this x.
const SINC2_HALF_POWER: f64 = 1.391_557_378_251_51;

/// Gain and width of a steered beam.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpoiledBeam {
    /// dB
    pub gain_db: f64,
    /// radians
    pub width: f64,
}

pub trait BeamShape {
    /// Power on the beam centre (W)
    fn peak_power(&self) -> f64;

    /// Power (W) radiated toward an (azimuth, elevation) offset from the beam
    /// centre for a beam of the given width.
    fn beam_power(&self, azimuth: f64, elevation: f64, beam_width: f64) -> f64;

    /// Scan loss for a beam steered to `steer`. Past endfire the array
    /// radiates nothing forward: gain −∞ dB, width +∞.
    fn spoil(&self, steer: BeamDirection, antenna_gain_db: f64, beam_width: f64) -> SpoiledBeam {
        let projection = steer.azimuth.cos() * steer.elevation.cos();
        if projection <= 0.0 {
            return SpoiledBeam {
                gain_db: f64::NEG_INFINITY,
                width: f64::INFINITY,
            };
        }
        SpoiledBeam {
            gain_db: antenna_gain_db + 10.0 * projection.log10(),
            width: beam_width / projection,
        }
    }
}

/// Gaussian main lobe whose half-power full width is the beam width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Beam2DGaussian {
    pub peak_power: f64,
}

impl Beam2DGaussian {
    pub fn new(peak_power: f64) -> Result<Self> {
        ensure_positive("peak_power", peak_power)?;
        Ok(Self { peak_power })
    }
}

impl BeamShape for Beam2DGaussian {
    fn peak_power(&self) -> f64 {
        self.peak_power
    }

    fn beam_power(&self, azimuth: f64, elevation: f64, beam_width: f64) -> f64 {
        let sigma = beam_width / GAUSSIAN_FWHM_PER_SIGMA;
        let two_var = 2.0 * sigma * sigma;
        self.peak_power * (-(azimuth * azimuth) / two_var - (elevation * elevation) / two_var).exp()
    }
}

/// Uniformly illuminated rectangular aperture: sinc² in each axis, scaled so
/// the half-power points sit at ±beam_width/2.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformAperture {
    pub peak_power: f64,
}

impl UniformAperture {
    pub fn new(peak_power: f64) -> Result<Self> {
        ensure_positive("peak_power", peak_power)?;
        Ok(Self { peak_power })
    }
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        x.sin() / x
    }
}

impl BeamShape for UniformAperture {
    fn peak_power(&self) -> f64 {
        self.peak_power
    }

    fn beam_power(&self, azimuth: f64, elevation: f64, beam_width: f64) -> f64 {
        let k = 2.0 * SINC2_HALF_POWER / beam_width;
        self.peak_power * sinc(k * azimuth).powi(2) * sinc(k * elevation).powi(2)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BeamShapeModel {
    Gaussian(Beam2DGaussian),
    UniformAperture(UniformAperture),
}

impl BeamShapeModel {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("peak_power", self.peak_power())
    }
}

impl BeamShape for BeamShapeModel {
    fn peak_power(&self) -> f64 {
        match self {
            BeamShapeModel::Gaussian(b) => b.peak_power(),
            BeamShapeModel::UniformAperture(b) => b.peak_power(),
        }
    }

    fn beam_power(&self, azimuth: f64, elevation: f64, beam_width: f64) -> f64 {
        match self {
            BeamShapeModel::Gaussian(b) => b.beam_power(azimuth, elevation, beam_width),
            BeamShapeModel::UniformAperture(b) => b.beam_power(azimuth, elevation, beam_width),
        }
    }
}
