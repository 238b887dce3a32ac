//! Electronically steered (AESA) radar: detection probability and detections.
//!
//! # Detection pipeline (per call)
//! 1. Beam direction (az_b, el_b) from the beam transition model
//! 2. Scan loss → spoiled gain and width (see [`crate::beam_shape`])
//! 3. Target (r, az, el) in the sensor frame
//! 4. Directed power = beam shape at (az − az_b, el − el_b) for the spoiled width
//! 5. Effective RCS: configured, or one exponential draw when `swerling_on`
//! 6. SNR = K · σ · G_s² · P_dir / r⁴ with
//!    K = N·λ²·duty / ((4π)³·k·T₀·B·10^((NF + L)/10))
//! 7. Pd from the configured [`DetectionLaw`]
//!
//! Pulses and duty cycle enter through K (integrated energy on target).

use crate::beam_shape::{Beam2DGaussian, BeamShape, BeamShapeModel};
use crate::beam_transition::{BeamPattern, BeamTransition};
use crate::detection::{
    from_db, sample_swerling_rcs, to_db, DetectionLaw, BOLTZMANN, REFERENCE_TEMPERATURE,
    SPEED_OF_LIGHT,
};
use crate::error::{ensure_positive, Result, SensorError};
use crate::geometry;
use crate::observation::{observe, MeasurementModel, Noise};
use crate::radar::Sensor;
use nalgebra::Vector3;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, trace};
use tracker_core::types::{wrap_pi, Measurement, SensorId, State};

/// Physical configuration of an AESA radar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AesaParams {
    /// Broadside antenna gain (dB)
    pub antenna_gain: f64,
    /// Carrier frequency (Hz)
    pub frequency: f64,
    /// Pulses integrated per dwell
    pub number_pulses: u32,
    /// Fraction of time transmitting, in (0, 1]
    pub duty_cycle: f64,
    /// Receiver bandwidth (Hz)
    pub band_width: f64,
    /// Broadside beam width (radians)
    pub beam_width: f64,
    pub probability_false_alarm: f64,
    /// Mean radar cross-section (m²)
    pub rcs: f64,
    /// Receiver noise figure (dB)
    pub receiver_noise: f64,
    /// System loss (dB)
    pub loss: f64,
    /// Draw the RCS from a Swerling I/II (exponential) model on every call
    pub swerling_on: bool,
    pub detection_law: DetectionLaw,
    /// State indices of the target position (x, y, z)
    pub mapping: Vec<usize>,
    /// Radar position
    pub translation_offset: Vec<f64>,
    /// Radar orientation [θx, θy, θz]
    pub rotation_offset: [f64; 3],
    pub beam_shape: BeamShapeModel,
    pub beam_transition: BeamTransition,
}

impl Default for AesaParams {
    fn default() -> Self {
        Self {
            antenna_gain: 30.0,
            frequency: 100e6,
            number_pulses: 5,
            duty_cycle: 0.1,
            band_width: 30e6,
            beam_width: 10f64.to_radians(),
            probability_false_alarm: 1e-6,
            rcs: 10.0,
            receiver_noise: 3.0,
            loss: 0.0,
            swerling_on: false,
            detection_law: DetectionLaw::North,
            mapping: vec![0, 1, 2],
            translation_offset: vec![0.0; 3],
            rotation_offset: [0.0; 3],
            beam_shape: BeamShapeModel::Gaussian(Beam2DGaussian { peak_power: 50e3 }),
            beam_transition: BeamTransition::default(),
        }
    }
}

impl AesaParams {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("frequency", self.frequency)?;
        ensure_positive("band_width", self.band_width)?;
        ensure_positive("duty_cycle", self.duty_cycle)?;
        ensure_positive("beam_width", self.beam_width)?;
        ensure_positive("rcs", self.rcs)?;
        if self.duty_cycle > 1.0 {
            return Err(SensorError::config(format!(
                "duty_cycle must not exceed 1, got {}",
                self.duty_cycle
            )));
        }
        if self.number_pulses == 0 {
            return Err(SensorError::config("number_pulses must be at least 1"));
        }
        let pfa = self.probability_false_alarm;
        if !(pfa > 0.0 && pfa < 1.0) {
            return Err(SensorError::config(format!(
                "probability_false_alarm must lie in (0, 1), got {pfa}"
            )));
        }
        for (name, db) in [
            ("antenna_gain", self.antenna_gain),
            ("receiver_noise", self.receiver_noise),
            ("loss", self.loss),
        ] {
            if !db.is_finite() {
                return Err(SensorError::config(format!("{name} must be finite")));
            }
        }
        if self.mapping.len() != 3 {
            return Err(SensorError::config(format!(
                "AESA mapping needs 3 position indices, got {}",
                self.mapping.len()
            )));
        }
        if self.translation_offset.len() != 3 {
            return Err(SensorError::config(format!(
                "AESA translation offset needs 3 components, got {}",
                self.translation_offset.len()
            )));
        }
        self.beam_shape.validate()?;
        self.beam_transition.validate()
    }

    /// Part of the SNR independent of target, RCS, directed power and gain.
    pub fn snr_constant(&self) -> f64 {
        let wavelength = SPEED_OF_LIGHT / self.frequency;
        (self.number_pulses as f64 * wavelength * wavelength * self.duty_cycle)
            / ((4.0 * PI).powi(3)
                * BOLTZMANN
                * REFERENCE_TEMPERATURE
                * self.band_width
                * from_db(self.receiver_noise + self.loss))
    }
}

/// Everything `prob_gen` works out for one target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub probability_of_detection: f64,
    /// Linear power ratio
    pub snr: f64,
    /// RCS used (m²), sampled when Swerling fluctuation is on
    pub rcs: f64,
    /// Power directed at the target (W)
    pub transmit_power: f64,
    /// dB
    pub spoiled_gain: f64,
    /// radians
    pub spoiled_beamwidth: f64,
}

impl DetectionReport {
    pub fn snr_db(&self) -> f64 {
        to_db(self.snr)
    }

    /// (Pd, SNR, RCS, transmit power, spoiled gain, spoiled beam width)
    pub fn into_tuple(self) -> (f64, f64, f64, f64, f64, f64) {
        (
            self.probability_of_detection,
            self.snr,
            self.rcs,
            self.transmit_power,
            self.spoiled_gain,
            self.spoiled_beamwidth,
        )
    }
}

/// An AESA radar. Detections are synthesised by the attached measurement model.
#[derive(Debug)]
pub struct AesaRadar {
    sensor_id: SensorId,
    params: AesaParams,
    snr_constant: f64,
    measurement_model: Option<Box<dyn MeasurementModel>>,
}

impl AesaRadar {
    pub fn new(sensor_id: SensorId, params: AesaParams) -> Result<Self> {
        params.validate()?;
        let snr_constant = params.snr_constant();
        Ok(Self {
            sensor_id,
            params,
            snr_constant,
            measurement_model: None,
        })
    }

    /// Attach the model used to synthesise detections. The model's state
    /// must hold every index of `params.mapping`.
    pub fn with_measurement_model(mut self, model: impl MeasurementModel + 'static) -> Result<Self> {
        let needed = self.params.mapping.iter().copied().max().map_or(0, |m| m + 1);
        if needed > model.ndim_state() {
            return Err(SensorError::config(format!(
                "measurement model state has {} dimensions, mapping needs {needed}",
                model.ndim_state()
            )));
        }
        self.measurement_model = Some(Box::new(model));
        Ok(self)
    }

    pub fn params(&self) -> &AesaParams {
        &self.params
    }

    pub fn measurement_model(&self) -> Option<&dyn MeasurementModel> {
        self.measurement_model.as_deref()
    }

    pub fn snr_constant(&self) -> f64 {
        self.snr_constant
    }

    /// Detection figures for `truth`. Draws from `rng` only when Swerling
    /// fluctuation is on.
    pub fn prob_gen<R: Rng + ?Sized>(&mut self, truth: &State, rng: &mut R) -> Result<DetectionReport> {
        self.evaluate(truth, self.params.swerling_on, rng)
    }

    fn evaluate<R: Rng + ?Sized>(
        &mut self,
        truth: &State,
        fluctuate: bool,
        rng: &mut R,
    ) -> Result<DetectionReport> {
        let position = geometry::mapped_position(truth, &self.params.mapping)?;
        let steer = self.params.beam_transition.direction(truth.timestamp)?;
        let p = &self.params;

        let spoiled = p.beam_shape.spoil(steer, p.antenna_gain, p.beam_width);

        let orientation = Vector3::from(p.rotation_offset);
        let relative = geometry::to_sensor_frame(&position, &p.translation_offset, &orientation)?;
        let target = geometry::cart2sphere(&relative);

        let rel_az = wrap_pi(target.azimuth - steer.azimuth);
        let rel_el = target.elevation - steer.elevation;
        let transmit_power = p.beam_shape.beam_power(rel_az, rel_el, spoiled.width);

        let rcs = if fluctuate {
            sample_swerling_rcs(p.rcs, rng)
        } else {
            p.rcs
        };

        let gain = from_db(spoiled.gain_db);
        let snr = if target.range > 0.0 {
            self.snr_constant * rcs * gain * gain * transmit_power / target.range.powi(4)
        } else {
            f64::INFINITY
        };
        let snr = if snr.is_nan() { 0.0 } else { snr };
        let probability_of_detection = p.detection_law.probability(snr, p.probability_false_alarm);

        trace!(
            sensor = %self.sensor_id,
            range = target.range,
            snr,
            pd = probability_of_detection,
            "evaluated detection"
        );

        Ok(DetectionReport {
            probability_of_detection,
            snr,
            rcs,
            transmit_power,
            spoiled_gain: spoiled.gain_db,
            spoiled_beamwidth: spoiled.width,
        })
    }

    /// One detection trial. `Noise::Off` uses the mean RCS and detects
    /// deterministically when Pd ≥ ½; otherwise a Bernoulli(Pd) trial decides.
    pub fn gen_measurement<R: Rng + ?Sized>(
        &mut self,
        truth: &State,
        noise: &Noise,
        rng: &mut R,
    ) -> Result<Option<Measurement>> {
        {
            let model = self
                .measurement_model
                .as_deref()
                .ok_or_else(|| self.missing_model())?;
            model.check_state(truth)?;
            noise.check(model.ndim_meas())?;
        }
        let noiseless = matches!(noise, Noise::Off);
        let report = self.evaluate(truth, self.params.swerling_on && !noiseless, rng)?;
        let pd = report.probability_of_detection;
        let detected = if noiseless {
            pd >= 0.5
        } else {
            rng.gen::<f64>() < pd
        };
        if !detected {
            debug!(sensor = %self.sensor_id, pd, t = truth.timestamp, "missed detection");
            return Ok(None);
        }

        let model = self
            .measurement_model
            .as_deref()
            .ok_or_else(|| self.missing_model())?;
        let z = observe(model, truth, noise, rng)?;
        Ok(Some(Measurement {
            sensor_id: self.sensor_id,
            timestamp: truth.timestamp,
            value: model.to_value(&z),
            noise_cov: model.noise_covar().to_row_major(),
        }))
    }

    fn missing_model(&self) -> SensorError {
        SensorError::config(format!("AESA radar {} has no measurement model", self.sensor_id))
    }
}

impl Sensor for AesaRadar {
    fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    fn gen_measurement(
        &mut self,
        truth: &State,
        noise: &Noise,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Measurement>> {
        AesaRadar::gen_measurement(self, truth, noise, rng)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
