//! `radarsim` CLI: scenario runs, log summaries, detection-probability analysis.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sensor_models::{AesaParams, AesaRadar};
use sim::monte_carlo::{density_histogram, swerling_samples};
use sim::replay::{load_log, save_log};
use sim::scenarios::{Scenario, ScenarioKind};
use std::path::{Path, PathBuf};
use tracing::info;
use tracker_core::types::{SensorId, State};

#[derive(Parser)]
#[command(name = "radarsim", about = "Radar sensor simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named scenario and record every measurement.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Override the scenario duration (s)
        #[arg(long)]
        duration: Option<f64>,
        /// Save the measurement log as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Summarise a previously recorded measurement log.
    Summarize {
        /// Path to log JSON file
        input: PathBuf,
    },
    /// Evaluate detection probability and SNR for one target.
    Prob {
        /// AESA parameter JSON file (defaults to the built-in reference radar)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Target position x,y,z (m) in the frame of the configured mapping
        #[arg(long, required = true, value_delimiter = ',', num_args = 3, allow_negative_numbers = true)]
        target: Vec<f64>,
        /// Evaluation time (s)
        #[arg(long, default_value_t = 0.0)]
        time: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Swerling RCS Monte Carlo: print the density histogram as JSON.
    Swerling {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 10_000)]
        samples: usize,
        #[arg(long, default_value_t = 20)]
        bins: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            duration,
            output,
        } => run_scenario(scenario, seed, duration, output.as_deref())?,
        Commands::Summarize { input } => summarize(&input)?,
        Commands::Prob {
            config,
            target,
            time,
            seed,
        } => prob(config.as_deref(), &target, time, seed)?,
        Commands::Swerling {
            config,
            samples,
            bins,
            seed,
        } => swerling(config.as_deref(), samples, bins, seed)?,
    }

    Ok(())
}

fn load_params(path: Option<&Path>) -> Result<AesaParams> {
    match path {
        None => Ok(AesaParams::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
        }
    }
}

/// A state whose mapped components hold `position` and everything else is zero.
fn target_state(params: &AesaParams, position: &[f64], time: f64) -> Result<State> {
    anyhow::ensure!(
        position.len() == params.mapping.len(),
        "target needs {} coordinates, got {}",
        params.mapping.len(),
        position.len()
    );
    let ndim = params.mapping.iter().copied().max().map_or(0, |m| m + 1);
    let mut values = vec![0.0; ndim];
    for (&idx, &v) in params.mapping.iter().zip(position) {
        values[idx] = v;
    }
    Ok(State::from_slice(&values, time))
}

fn run_scenario(kind: ScenarioKind, seed: u64, duration: Option<f64>, output: Option<&Path>) -> Result<()> {
    let mut scenario = Scenario::build(kind, seed)?;
    if let Some(d) = duration {
        scenario.duration = d;
    }

    println!(
        "Running scenario '{}' (seed={}, duration={:.0}s)...",
        scenario.name, seed, scenario.duration
    );
    let start = std::time::Instant::now();
    let log = scenario.run()?;
    let elapsed = start.elapsed();

    let measurements: usize = log.batches.iter().map(|b| b.measurements.len()).sum();
    println!(
        "Done: {} batches, {} measurements, elapsed={:.2}s",
        log.batches.len(),
        measurements,
        elapsed.as_secs_f64(),
    );

    if let Some(path) = output {
        save_log(&log, path)?;
        println!("Log saved to {}", path.display());
    }
    Ok(())
}

fn summarize(input: &Path) -> Result<()> {
    let log = load_log(input)?;
    info!(path = %input.display(), batches = log.batches.len(), "loaded log");
    let summary = log.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn prob(config: Option<&Path>, target: &[f64], time: f64, seed: u64) -> Result<()> {
    let params = load_params(config)?;
    let truth = target_state(&params, target, time)?;
    let mut radar = AesaRadar::new(SensorId(0), params)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let report = radar.prob_gen(&truth, &mut rng)?;

    let json = serde_json::json!({
        "probability_of_detection": report.probability_of_detection,
        "snr": report.snr,
        "snr_db": report.snr_db(),
        "rcs": report.rcs,
        "transmit_power": report.transmit_power,
        "spoiled_gain": report.spoiled_gain,
        "spoiled_beamwidth": report.spoiled_beamwidth,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn swerling(config: Option<&Path>, samples: usize, bins: usize, seed: u64) -> Result<()> {
    let params = load_params(config)?;
    // Swerling draws do not depend on geometry; any in-beam position will do.
    let position: Vec<f64> = (0..params.mapping.len())
        .map(|i| if i == 0 { 10_000.0 } else { 0.0 })
        .collect();
    let truth = target_state(&params, &position, 0.0)?;

    let draws = swerling_samples(&params, &truth, samples, seed)?;
    let hist = density_histogram(&draws, bins).context("no samples drawn")?;
    let mean = draws.iter().sum::<f64>() / draws.len() as f64;
    info!(samples, mean, "swerling draws complete");

    let json = serde_json::json!({
        "mean_rcs": params.rcs,
        "sample_mean": mean,
        "edges": hist.edges,
        "density": hist.density,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
