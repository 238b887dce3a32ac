//! Measurement logs: serialize/deserialize simulation runs for offline analysis.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracker_core::types::{MeasurementValue, RadarBatch, SensorId};

/// A full recorded simulation log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeasurementLog {
    pub scenario_name: String,
    pub seed: u64,
    pub sim_dt: f64,
    pub duration: f64,
    /// All radar batches in chronological order
    pub batches: Vec<RadarBatch>,
    /// Ground-truth target states, sampled every `sim_dt`
    pub ground_truth: Vec<GroundTruthFrame>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthFrame {
    pub time: f64,
    pub targets: Vec<TargetState>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    pub id: u64,
    pub state: [f64; 6],
}

/// Per-sensor totals of a log.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    pub scans: usize,
    pub measurements: usize,
    /// Scans that produced at least one measurement
    pub productive_scans: usize,
    pub min_range: Option<f64>,
    pub max_range: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub scenario_name: String,
    pub seed: u64,
    pub duration: f64,
    pub sensors: BTreeMap<SensorId, SensorSummary>,
}

impl MeasurementLog {
    pub fn summary(&self) -> LogSummary {
        let mut sensors: BTreeMap<SensorId, SensorSummary> = BTreeMap::new();
        for batch in &self.batches {
            let entry = sensors.entry(batch.sensor_id).or_default();
            entry.scans += 1;
            entry.measurements += batch.measurements.len();
            if !batch.measurements.is_empty() {
                entry.productive_scans += 1;
            }
            for m in &batch.measurements {
                let range = match &m.value {
                    MeasurementValue::BearingRange { range, .. } => *range,
                    MeasurementValue::Cartesian(values) => {
                        values.iter().map(|v| v * v).sum::<f64>().sqrt()
                    }
                };
                entry.min_range = Some(entry.min_range.map_or(range, |r| r.min(range)));
                entry.max_range = Some(entry.max_range.map_or(range, |r| r.max(range)));
            }
        }
        LogSummary {
            scenario_name: self.scenario_name.clone(),
            seed: self.seed,
            duration: self.duration,
            sensors,
        }
    }
}

/// Save a log to a JSON file.
pub fn save_log(log: &MeasurementLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load a log from a JSON file.
pub fn load_log(path: &Path) -> anyhow::Result<MeasurementLog> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let log: MeasurementLog = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(log)
}
