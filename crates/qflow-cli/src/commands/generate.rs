//! `qflow generate`

use anyhow::{Context, Result};
use qflow_algo::generate::{generate_demands, generate_network, seeded_rng, GenerationParams};
use qflow_cli::QflowConfig;
use std::path::Path;
use tracing::info;

/// Generation parameters from `--params` if given, else from the config.
pub(crate) fn resolve_params(line: Option<&str>, config: &QflowConfig) -> Result<GenerationParams> {
    match line {
        Some(line) => GenerationParams::from_params_line(line)
            .with_context(|| format!("parsing parameter line '{line}'")),
        None => Ok(config.generation.params.clone()),
    }
}

pub fn handle(
    graph_out: &Path,
    demands_out: &Path,
    seed: Option<u64>,
    params_line: Option<&str>,
    config: &QflowConfig,
) -> Result<()> {
    let params = resolve_params(params_line, config)?;
    let seed = seed.or(config.generation.seed);
    let mut rng = seeded_rng(seed);

    let network = generate_network(&params, &mut rng).context("generating network")?;
    let demands = generate_demands(&params, &mut rng).context("generating demands")?;
    info!(?seed, "instance generated");

    qflow_io::write_gml(&network, graph_out)
        .with_context(|| format!("writing network to {}", graph_out.display()))?;
    qflow_io::write_demands(&demands, demands_out)
        .with_context(|| format!("writing demands to {}", demands_out.display()))?;

    println!("Network: {}", network.stats());
    println!("Demands: {}", demands.len());
    println!("Wrote {} and {}", graph_out.display(), demands_out.display());
    Ok(())
}
