//! Experiment drivers over generated instances.
//!
//! - **runtime**: one network, one demand set, `runs` exact solves; mean
//!   solver time.
//! - **lpgap**: one network, `runs` fresh demand sets, exact and relaxed
//!   solve of each; mean objectives.
//!
//! Records append to CSV so a sweep accumulates one row per setting.

use crate::admission::{solve_admission, AdmissionConfig, AdmissionError, FormulationStrategy};
use crate::generate::{generate_demands, generate_network, GenerateError, GenerationParams};
use rand::Rng;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error("failed to write results: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write results: {0}")]
    Csv(#[from] csv::Error),

    #[error("experiment needs at least one run")]
    NoRuns,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub params: GenerationParams,
    pub runs: usize,
    /// Solver settings and backend; the strategy is set per experiment.
    pub admission: AdmissionConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            params: GenerationParams::default(),
            runs: 5,
            admission: AdmissionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeRecord {
    pub num_clients: usize,
    pub num_repeaters: usize,
    pub rep_coeff: f64,
    pub nodes: usize,
    pub links: usize,
    pub runs: usize,
    pub mean_solve_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpGapRecord {
    pub num_clients: usize,
    pub num_repeaters: usize,
    pub rep_coeff: f64,
    pub runs: usize,
    pub mean_exact: f64,
    pub mean_relaxed: f64,
}

impl LpGapRecord {
    pub fn gap(&self) -> f64 {
        self.mean_relaxed - self.mean_exact
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn run_runtime<R: Rng + ?Sized>(
    config: &ExperimentConfig,
    rng: &mut R,
) -> Result<RuntimeRecord, ExperimentError> {
    if config.runs == 0 {
        return Err(ExperimentError::NoRuns);
    }
    let network = generate_network(&config.params, rng)?;
    let demands = generate_demands(&config.params, rng)?;
    let admission = config
        .admission
        .clone()
        .with_strategy(FormulationStrategy::Exact);

    let mut times = Vec::with_capacity(config.runs);
    for run in 0..config.runs {
        let solution = solve_admission(&network, &demands, &admission)?;
        info!(run, objective = solution.objective, "runtime run finished");
        times.push(solution.solve_time.as_secs_f64());
    }

    Ok(RuntimeRecord {
        num_clients: config.params.num_clients,
        num_repeaters: config.params.num_repeaters,
        rep_coeff: config.params.rep_coeff,
        nodes: network.graph.node_count(),
        links: network.graph.edge_count(),
        runs: config.runs,
        mean_solve_secs: mean(&times),
    })
}

pub fn run_lpgap<R: Rng + ?Sized>(
    config: &ExperimentConfig,
    rng: &mut R,
) -> Result<LpGapRecord, ExperimentError> {
    if config.runs == 0 {
        return Err(ExperimentError::NoRuns);
    }
    let network = generate_network(&config.params, rng)?;
    let exact = config
        .admission
        .clone()
        .with_strategy(FormulationStrategy::Exact);
    let relaxed = config
        .admission
        .clone()
        .with_strategy(FormulationStrategy::Relaxed);

    let mut exact_objectives = Vec::with_capacity(config.runs);
    let mut relaxed_objectives = Vec::with_capacity(config.runs);
    for run in 0..config.runs {
        let demands = generate_demands(&config.params, rng)?;
        let z = solve_admission(&network, &demands, &exact)?.objective;
        let lp = solve_admission(&network, &demands, &relaxed)?.objective;
        info!(run, exact = z, relaxed = lp, "lpgap run finished");
        exact_objectives.push(z);
        relaxed_objectives.push(lp);
    }

    Ok(LpGapRecord {
        num_clients: config.params.num_clients,
        num_repeaters: config.params.num_repeaters,
        rep_coeff: config.params.rep_coeff,
        runs: config.runs,
        mean_exact: mean(&exact_objectives),
        mean_relaxed: mean(&relaxed_objectives),
    })
}

/// Generation parameter varied by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAxis {
    Clients,
    Repeaters,
    RepCoeff,
}

impl SweepAxis {
    pub fn apply(&self, params: &GenerationParams, value: f64) -> GenerationParams {
        let mut out = params.clone();
        match self {
            SweepAxis::Clients => out.num_clients = value.max(0.0) as usize,
            SweepAxis::Repeaters => out.num_repeaters = value.max(0.0) as usize,
            SweepAxis::RepCoeff => out.rep_coeff = value,
        }
        out
    }
}

impl FromStr for SweepAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clients" => Ok(SweepAxis::Clients),
            "repeaters" => Ok(SweepAxis::Repeaters),
            "rep_coeff" | "rep-coeff" => Ok(SweepAxis::RepCoeff),
            other => Err(format!(
                "unknown sweep axis '{other}', expected clients, repeaters or rep_coeff"
            )),
        }
    }
}

/// Run `experiment` once per value along `axis`.
pub fn sweep<T, F>(
    base: &ExperimentConfig,
    axis: SweepAxis,
    values: &[f64],
    mut experiment: F,
) -> Result<Vec<T>, ExperimentError>
where
    F: FnMut(&ExperimentConfig) -> Result<T, ExperimentError>,
{
    values
        .iter()
        .map(|&value| {
            let config = ExperimentConfig {
                params: axis.apply(&base.params, value),
                ..base.clone()
            };
            experiment(&config)
        })
        .collect()
}

/// Append records to a CSV file, writing the header only into an empty file.
pub fn append_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), ExperimentError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_header = file.metadata()?.len() == 0;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
