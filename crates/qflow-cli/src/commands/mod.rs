pub mod experiment;
pub mod generate;
pub mod graph;
pub mod solve;
pub mod validate;

use anyhow::{Context, Result};
use qflow_core::{Demand, QuantumNetwork};
use std::path::Path;

pub(crate) fn load_network(path: &Path) -> Result<QuantumNetwork> {
    qflow_io::read_gml(path).with_context(|| format!("loading network from {}", path.display()))
}

pub(crate) fn load_demands(path: &Path) -> Result<Vec<Demand>> {
    qflow_io::read_demands(path).with_context(|| format!("loading demands from {}", path.display()))
}
