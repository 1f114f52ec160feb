//! `qflow solve`

use anyhow::{bail, Context, Result};
use qflow_algo::admission::{solve_admission, verify_solution};
use qflow_cli::{QflowConfig, SolveArgs};
use std::fs;
use std::time::Duration;
use tracing::info;

use super::{load_demands, load_network};

const VERIFY_TOL: f64 = 1e-6;

pub fn handle(args: &SolveArgs, config: &QflowConfig) -> Result<()> {
    let network = load_network(&args.graph)?;
    let demands = load_demands(&args.demands)?;
    println!("Network loaded: {}", network.stats());
    println!("Demands loaded: {}", demands.len());

    let mut admission = config.admission();
    if let Some(strategy) = args.strategy {
        admission.strategy = strategy;
    }
    if let Some(backend) = &args.backend {
        admission.backend = backend.clone();
    }
    if let Some(seconds) = args.time_limit {
        if !(seconds.is_finite() && seconds > 0.0) {
            bail!("--time-limit must be a positive number of seconds");
        }
        admission.settings.time_limit = Some(Duration::from_secs_f64(seconds));
    }
    if let Some(gap) = args.mip_gap {
        admission.settings.mip_gap = Some(gap);
    }
    if let Some(gap) = admission.settings.mip_gap {
        if !(gap.is_finite() && gap >= 0.0) {
            bail!("MIP gap must be a non-negative number, got {gap}");
        }
    }

    let solution =
        solve_admission(&network, &demands, &admission).context("solving admission model")?;
    println!("{}", solution.summary());

    if let Some(path) = &args.report {
        qflow_io::write_report(path, solution.report_entries(), solution.objective)
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    if let Some(path) = &args.out {
        let json = serde_json::to_string_pretty(&solution).context("serializing solution")?;
        fs::write(path, json).with_context(|| format!("writing solution to {}", path.display()))?;
        info!(path = %path.display(), "solution written");
    }

    if args.verify {
        let issues = verify_solution(&network, &solution, VERIFY_TOL)
            .context("verifying solution")?;
        if issues.is_empty() {
            println!("Verification: passed");
        } else {
            for issue in &issues {
                println!("  [VIOLATION] {issue}");
            }
            bail!("verification found {} violation(s)", issues.len());
        }
    }

    Ok(())
}
