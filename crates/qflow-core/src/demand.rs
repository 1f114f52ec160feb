//! Point-to-point demands routed over a [`QuantumNetwork`].
//!
//! A demand list is ordered: position `j` in the slice is the demand index
//! used for every variable and constraint that refers to it.

use crate::{Category, ClientId, Diagnostics, QuantumNetwork};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request to serve `quantity` pairs to both `source` and `destination`
/// within a hop budget of `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub source: ClientId,
    pub destination: ClientId,
    pub quantity: u64,
    pub threshold: f64,
}

impl Demand {
    pub fn new(source: ClientId, destination: ClientId, quantity: u64, threshold: f64) -> Self {
        Self {
            source,
            destination,
            quantity,
            threshold,
        }
    }

    /// Largest number of links a path may use and still respect the threshold.
    pub fn hop_budget(&self) -> usize {
        if self.threshold.is_finite() && self.threshold > 0.0 {
            self.threshold.floor() as usize
        } else {
            0
        }
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <-> {} (quantity {}, threshold {})",
            self.source, self.destination, self.quantity, self.threshold
        )
    }
}

/// Check every demand against the network, recording one issue per problem.
pub fn validate_demands_into(network: &QuantumNetwork, demands: &[Demand], diag: &mut Diagnostics) {
    for (j, demand) in demands.iter().enumerate() {
        let subject = format!("demand {j}");
        for client in [demand.source, demand.destination] {
            if network.client_node(client).is_none() {
                diag.error_on(
                    Category::Reference,
                    subject.as_str(),
                    format!("Client {} is not in the network", client.value()),
                );
            }
        }
        if demand.quantity == 0 {
            diag.error_on(Category::Demand, subject.as_str(), "Quantity must be positive");
        }
        if !demand.threshold.is_finite() || demand.threshold < 0.0 {
            diag.error_on(
                Category::Demand,
                subject.as_str(),
                format!("Threshold {} must be a non-negative number", demand.threshold),
            );
        } else if demand.threshold < 1.0 {
            diag.warning_on(
                Category::Demand,
                subject.as_str(),
                "Threshold below one hop; demand can never be admitted",
            );
        }
        if demand.source == demand.destination {
            diag.warning_on(Category::Demand, subject.as_str(), "Source and destination coincide");
        }
    }
}
