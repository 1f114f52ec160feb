//! `qflow experiment runtime|lpgap`

use anyhow::{Context, Result};
use qflow_algo::experiments::{
    append_records, run_lpgap, run_runtime, sweep, ExperimentConfig, ExperimentError,
};
use qflow_algo::generate::{seeded_rng, StdRng};
use qflow_cli::{ExperimentArgs, ExperimentCommands, QflowConfig};
use serde::Serialize;
use std::path::Path;

use super::generate::resolve_params;

pub fn handle(command: &ExperimentCommands, config: &QflowConfig) -> Result<()> {
    match command {
        ExperimentCommands::Runtime(args) => {
            let records = run(args, config, |c, rng| run_runtime(c, rng))?;
            for r in &records {
                println!(
                    "clients={} repeaters={} rep_coeff={} -> mean solve {:.3}s over {} runs",
                    r.num_clients, r.num_repeaters, r.rep_coeff, r.mean_solve_secs, r.runs
                );
            }
            write(&args.out, &records)
        }
        ExperimentCommands::Lpgap(args) => {
            let records = run(args, config, |c, rng| run_lpgap(c, rng))?;
            for r in &records {
                println!(
                    "clients={} repeaters={} rep_coeff={} -> exact {:.3}, relaxed {:.3} (gap {:.3})",
                    r.num_clients,
                    r.num_repeaters,
                    r.rep_coeff,
                    r.mean_exact,
                    r.mean_relaxed,
                    r.gap()
                );
            }
            write(&args.out, &records)
        }
    }
}

fn run<T, F>(args: &ExperimentArgs, config: &QflowConfig, mut driver: F) -> Result<Vec<T>>
where
    F: FnMut(&ExperimentConfig, &mut StdRng) -> Result<T, ExperimentError>,
{
    let base = ExperimentConfig {
        params: resolve_params(args.params.as_deref(), config)?,
        runs: args.runs.unwrap_or(config.experiment.runs),
        admission: config.admission(),
    };
    let mut rng = seeded_rng(args.seed.or(config.generation.seed));

    let records = match args.sweep {
        Some(axis) => sweep(&base, axis, &args.values, |c| driver(c, &mut rng)),
        None => driver(&base, &mut rng).map(|r| vec![r]),
    };
    records.context("running experiment")
}

fn write<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    append_records(path, records).with_context(|| format!("appending to {}", path.display()))?;
    println!("Appended {} row(s) to {}", records.len(), path.display());
    Ok(())
}
