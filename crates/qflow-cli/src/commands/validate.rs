//! `qflow validate`

use anyhow::{bail, Result};
use qflow_core::{validate_demands_into, Diagnostics};
use std::path::Path;

use super::{load_demands, load_network};

pub fn handle(graph: &Path, demands: Option<&Path>) -> Result<()> {
    let network = load_network(graph)?;
    let mut diag = Diagnostics::new();
    network.validate_into(&mut diag);

    if let Some(path) = demands {
        let demands = load_demands(path)?;
        validate_demands_into(&network, &demands, &mut diag);
    }

    println!("Network: {}", network.stats());
    for issue in &diag.issues {
        println!("  {issue}");
    }
    println!("Validation: {}", diag.summary());

    if diag.has_errors() {
        bail!("validation failed with {}", diag.summary());
    }
    Ok(())
}
