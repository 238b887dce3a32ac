//! Probability of detection and target fluctuation.
//!
//! # Laws
//! - **North**: Pd = ½·erfc(√(−ln Pfa) − √(SNR + ½)), evaluated at the SNR of
//!   the effective (possibly sampled) RCS.
//! - **Swerling I**: Pd = Pfa^(1/(1 + SNR)), the closed form for an
//!   exponentially fluctuating target with SNR taken at the mean RCS.
//!
//! Both are closed form; no numerical integration is involved.

use rand::Rng;
use rand_distr::{Distribution, Exp1};
use serde::{Deserialize, Serialize};

pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
pub const BOLTZMANN: f64 = 1.380_649e-23;
/// Standard noise reference temperature (K)
pub const REFERENCE_TEMPERATURE: f64 = 290.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionLaw {
    #[default]
    North,
    SwerlingOne,
}

impl DetectionLaw {
    /// Pd for a linear `snr` at false-alarm probability `pfa`, in [0, 1].
    pub fn probability(self, snr: f64, pfa: f64) -> f64 {
        let pd = match self {
            DetectionLaw::North => north(snr, pfa),
            DetectionLaw::SwerlingOne => swerling_one(snr, pfa),
        };
        if pd.is_nan() {
            0.0
        } else {
            pd.clamp(0.0, 1.0)
        }
    }
}

fn north(snr: f64, pfa: f64) -> f64 {
    0.5 * erfc((-pfa.ln()).sqrt() - (snr + 0.5).sqrt())
}

fn swerling_one(snr: f64, pfa: f64) -> f64 {
    pfa.powf(1.0 / (1.0 + snr))
}

/// Complementary error function, Abramowitz & Stegun 7.1.26 (|ε| < 1.5e-7).
pub fn erfc(x: f64) -> f64 {
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    poly * (-x * x).exp()
}

/// One Swerling I/II RCS draw: exponential with the given mean.
pub fn sample_swerling_rcs<R: Rng + ?Sized>(mean_rcs: f64, rng: &mut R) -> f64 {
    let unit: f64 = Exp1.sample(rng);
    mean_rcs * unit
}

pub fn to_db(ratio: f64) -> f64 {
    10.0 * ratio.log10()
}

pub fn from_db(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn erfc_reference_values() {
        assert_abs_diff_eq!(erfc(0.0), 1.0, epsilon = 1e-7);
        assert_abs_diff_eq!(erfc(0.5), 0.479_500_122, epsilon = 2e-7);
        assert_abs_diff_eq!(erfc(-1.0), 1.842_700_793, epsilon = 2e-7);
        assert_abs_diff_eq!(erfc(3.0), 2.209e-5, epsilon = 2e-7);
        assert_eq!(erfc(f64::INFINITY), 0.0);
    }

    #[test]
    fn north_reference_point() {
        let pd = DetectionLaw::North.probability(16.0089, 1e-6);
        assert_abs_diff_eq!(pd, 0.688, epsilon = 5e-4);
    }

    #[test]
    fn pd_rises_with_snr() {
        for law in [DetectionLaw::North, DetectionLaw::SwerlingOne] {
            let mut last = 0.0;
            for snr_db in [0.0, 5.0, 10.0, 15.0, 20.0, 30.0] {
                let pd = law.probability(from_db(snr_db), 1e-6);
                assert!(pd >= last, "{law:?} not monotone at {snr_db} dB");
                last = pd;
            }
            assert!(last > 0.9);
        }
    }

    #[test]
    fn swerling_one_needs_more_snr() {
        let snr = from_db(13.0);
        assert!(
            DetectionLaw::SwerlingOne.probability(snr, 1e-6)
                < DetectionLaw::North.probability(snr, 1e-6)
        );
        assert_abs_diff_eq!(DetectionLaw::SwerlingOne.probability(0.0, 1e-6), 1e-6, epsilon = 1e-12);
    }

    #[test]
    fn infinite_snr_detects() {
        assert_eq!(DetectionLaw::North.probability(f64::INFINITY, 1e-6), 1.0);
        assert_eq!(DetectionLaw::SwerlingOne.probability(f64::INFINITY, 1e-6), 1.0);
    }

    #[test]
    fn swerling_draws_have_requested_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 50_000;
        let mean: f64 = (0..n).map(|_| sample_swerling_rcs(10.0, &mut rng)).sum::<f64>() / n as f64;
        assert_abs_diff_eq!(mean, 10.0, epsilon = 0.2);
    }

    #[test]
    fn db_conversions_invert() {
        assert_abs_diff_eq!(to_db(from_db(16.01)), 16.01, epsilon = 1e-12);
        assert_abs_diff_eq!(from_db(30.0), 1000.0, epsilon = 1e-9);
    }
}
