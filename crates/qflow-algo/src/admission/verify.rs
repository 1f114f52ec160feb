//! Independent check of an [`AdmissionSolution`] against the network.
//!
//! Works from link flows alone, so it applies to every strategy and catches
//! a model that lets the solver violate the physical rules.

use super::{AdmissionError, AdmissionSolution, IndexMaps};
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use qflow_core::QuantumNetwork;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationIssue {
    /// `None` for issues spanning all demands.
    pub demand: Option<usize>,
    pub message: String,
}

impl VerificationIssue {
    fn global(message: String) -> Self {
        Self {
            demand: None,
            message,
        }
    }

    fn demand(j: usize, message: String) -> Self {
        Self {
            demand: Some(j),
            message,
        }
    }
}

impl fmt::Display for VerificationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.demand {
            Some(j) => write!(f, "demand {j}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

fn is_binary(value: f64, tol: f64) -> bool {
    value.abs() <= tol || (value - 1.0).abs() <= tol
}

/// Check capacities, conservation, delivery, acyclicity and hop budgets.
/// An empty result means the solution is physically valid.
///
/// Acyclicity and hop budgets are only checked for demands with integral
/// gates; fractional LP routings have no path structure to check.
pub fn verify_solution(
    network: &QuantumNetwork,
    solution: &AdmissionSolution,
    tol: f64,
) -> Result<Vec<VerificationIssue>, AdmissionError> {
    let maps = IndexMaps::build(network)?;
    let mut issues = Vec::new();
    let n_edges = maps.num_edges();

    if let Some(bad) = solution.demands.iter().find(|d| d.flows.len() != n_edges) {
        issues.push(VerificationIssue::global(format!(
            "solution has {} links for demand {}, network has {n_edges} usable links",
            bad.flows.len(),
            bad.index
        )));
        return Ok(issues);
    }

    for e in 0..n_edges {
        let load = solution.link_load(e);
        let cap = maps.capacity(e) as f64;
        if load > cap + tol {
            issues.push(VerificationIssue::global(format!(
                "link {} carries {load} over capacity {cap}",
                maps.edge_label(e)
            )));
        }
    }

    for routing in &solution.demands {
        let j = routing.index;
        let flows = &routing.flows;
        let inflow = |v: usize| maps.incoming(v).iter().map(|&e| flows[e]).sum::<f64>();
        let outflow = |v: usize| maps.outgoing(v).iter().map(|&e| flows[e]).sum::<f64>();

        if let Some((e, f)) = flows.iter().copied().enumerate().find(|(_, f)| *f < -tol) {
            issues.push(VerificationIssue::demand(
                j,
                format!("negative flow {f} on {}", maps.edge_label(e)),
            ));
        }

        for v in (0..maps.num_nodes()).filter(|&v| maps.is_repeater(v)) {
            let imbalance = inflow(v) - outflow(v);
            if imbalance.abs() > tol {
                issues.push(VerificationIssue::demand(
                    j,
                    format!("{} is out of balance by {imbalance}", maps.node_label(v)),
                ));
            }
        }

        let demand = &routing.demand;
        let expected = demand.quantity as f64 * routing.admit;
        let mut ends = Vec::with_capacity(2);
        for client in [demand.source, demand.destination] {
            let Some(v) = maps.client(client) else {
                issues.push(VerificationIssue::demand(
                    j,
                    format!("{client} is not in the network"),
                ));
                continue;
            };
            ends.push(v);
            let delivered = inflow(v);
            if (delivered - expected).abs() > tol {
                issues.push(VerificationIssue::demand(
                    j,
                    format!("{client} receives {delivered}, expected {expected}"),
                ));
            }
            if let Some(p) = routing.potentials.as_ref().and_then(|p| p.get(v)) {
                if routing.admitted && *p > demand.threshold + tol {
                    issues.push(VerificationIssue::demand(
                        j,
                        format!("potential {p} at {client} exceeds threshold {}", demand.threshold),
                    ));
                }
            }
        }

        if !routing.admitted || !routing.gates.iter().all(|&g| is_binary(g, tol)) {
            continue;
        }

        let mut used: DiGraph<(), ()> = DiGraph::with_capacity(maps.num_nodes(), n_edges);
        for _ in 0..maps.num_nodes() {
            used.add_node(());
        }
        for (e, _) in routing.active_links() {
            let (u, w) = maps.endpoints(e);
            used.add_edge(NodeIndex::new(u), NodeIndex::new(w), ());
        }
        if is_cyclic_directed(&used) {
            issues.push(VerificationIssue::demand(j, "routing contains a cycle".into()));
            continue;
        }
        let Ok(order) = toposort(&used, None) else {
            continue;
        };
        let mut hops: Vec<Option<usize>> = vec![None; maps.num_nodes()];
        hops[maps.generator()] = Some(0);
        for u in order {
            let Some(du) = hops[u.index()] else {
                continue;
            };
            for w in used.neighbors(u) {
                let candidate = du + 1;
                if hops[w.index()].map_or(true, |dw| candidate > dw) {
                    hops[w.index()] = Some(candidate);
                }
            }
        }
        for v in ends {
            if let Some(h) = hops[v] {
                if h as f64 > demand.threshold + tol {
                    issues.push(VerificationIssue::demand(
                        j,
                        format!(
                            "route to {} uses {h} links, threshold is {}",
                            maps.node_label(v),
                            demand.threshold
                        ),
                    ));
                }
            }
        }
    }

    Ok(issues)
}
