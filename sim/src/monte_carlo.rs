//! Monte Carlo checks of the AESA detection engine.
//!
//! Trials are split into fixed-size chunks processed in parallel with rayon.
//! Chunk `k` owns its own radar and a `ChaCha8Rng` seeded with `seed + k`, so
//! results depend only on the seed and the trial count, never on scheduling.

use anyhow::{ensure, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use sensor_models::{AesaParams, AesaRadar, LinearGaussian, Noise, NoiseCovariance};
use serde::{Deserialize, Serialize};
use tracker_core::types::{SensorId, State};

const CHUNK: usize = 1024;

fn chunks(trials: usize) -> impl ParallelIterator<Item = (u64, usize)> {
    let n_chunks = trials.div_ceil(CHUNK);
    (0..n_chunks).into_par_iter().map(move |k| {
        let len = CHUNK.min(trials - k * CHUNK);
        (k as u64, len)
    })
}

/// `n` effective RCS draws with Swerling fluctuation forced on.
pub fn swerling_samples(params: &AesaParams, truth: &State, n: usize, seed: u64) -> Result<Vec<f64>> {
    let params = AesaParams {
        swerling_on: true,
        ..params.clone()
    };
    let per_chunk = chunks(n)
        .map(|(k, len)| -> Result<Vec<f64>> {
            let mut radar = AesaRadar::new(SensorId(0), params.clone())?;
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(k));
            (0..len)
                .map(|_| -> Result<f64> { Ok(radar.prob_gen(truth, &mut rng)?.rcs) })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;
    Ok(per_chunk.into_iter().flatten().collect())
}

/// Fraction of `trials` detection attempts that produced a measurement.
pub fn detection_rate(params: &AesaParams, truth: &State, trials: usize, seed: u64) -> Result<f64> {
    ensure!(trials > 0, "detection rate needs at least one trial");
    let hits = chunks(trials)
        .map(|(k, len)| -> Result<usize> {
            let model = LinearGaussian::new(
                truth.ndim(),
                params.mapping.clone(),
                NoiseCovariance::diagonal(&vec![1.0; params.mapping.len()])?,
            )?;
            let mut radar =
                AesaRadar::new(SensorId(0), params.clone())?.with_measurement_model(model)?;
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(k));
            let mut hits = 0usize;
            for _ in 0..len {
                if radar.gen_measurement(truth, &Noise::Sampled, &mut rng)?.is_some() {
                    hits += 1;
                }
            }
            Ok(hits)
        })
        .collect::<Result<Vec<usize>>>()?;
    Ok(hits.iter().sum::<usize>() as f64 / trials as f64)
}

/// Histogram normalised to unit area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` bin edges
    pub edges: Vec<f64>,
    /// Density per bin
    pub density: Vec<f64>,
}

impl Histogram {
    pub fn centres(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }
}

/// Equal-width histogram over [min, max] with the last bin closed. A
/// degenerate sample set spans [x − ½, x + ½]. `None` for empty input.
pub fn density_histogram(samples: &[f64], bins: usize) -> Option<Histogram> {
    if samples.is_empty() || bins == 0 {
        return None;
    }
    let mut lo = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(lo.is_finite() && hi.is_finite()) {
        return None;
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &x in samples {
        let idx = (((x - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let total = samples.len() as f64;
    Some(Histogram {
        edges: (0..=bins).map(|i| lo + i as f64 * width).collect(),
        density: counts.iter().map(|&c| c as f64 / (total * width)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sensor_models::{BeamTransition, StationaryBeam};

    fn reference() -> (AesaParams, State) {
        let params = AesaParams {
            mapping: vec![0, 1, 2],
            beam_transition: BeamTransition::Stationary(StationaryBeam::new(
                15f64.to_radians(),
                20f64.to_radians(),
            )),
            ..AesaParams::default()
        };
        (params, State::from_slice(&[75e3, 10e3, 20e3], 0.0))
    }

    #[test]
    fn swerling_samples_are_deterministic_and_exponential() {
        let (params, truth) = reference();
        let a = swerling_samples(&params, &truth, 10_000, 5).unwrap();
        let b = swerling_samples(&params, &truth, 10_000, 5).unwrap();
        assert_eq!(a.len(), 10_000);
        assert_eq!(a, b);

        let hist = density_histogram(&a, 20).unwrap();
        let area: f64 = hist.density.iter().sum::<f64>() * (hist.edges[1] - hist.edges[0]);
        assert_abs_diff_eq!(area, 1.0, epsilon = 1e-9);

        let max_height = hist.density.iter().copied().fold(0.0, f64::max);
        for (i, &h) in hist.density.iter().enumerate() {
            let (a, b) = (hist.edges[i], hist.edges[i + 1]);
            let expected = ((-a / params.rcs).exp() - (-b / params.rcs).exp()) / (b - a);
            assert!(
                (h - expected).abs() <= 0.01 * max_height + 0.05 * expected,
                "bin {i}: {h} vs {expected}"
            );
        }
    }

    #[test]
    fn detection_rate_tracks_pd() {
        let (params, truth) = reference();
        // Pd ≈ 0.688 at the reference geometry
        let rate = detection_rate(&params, &truth, 20_000, 1).unwrap();
        assert_abs_diff_eq!(rate, 0.688, epsilon = 0.02);
    }

    #[test]
    fn histogram_edge_cases() {
        assert!(density_histogram(&[], 10).is_none());
        let h = density_histogram(&[2.0, 2.0], 2).unwrap();
        assert_eq!(h.edges, vec![1.5, 2.0, 2.5]);
        assert_eq!(h.density, vec![0.0, 2.0]);
        assert_eq!(h.centres(), vec![1.75, 2.25]);
    }
}
