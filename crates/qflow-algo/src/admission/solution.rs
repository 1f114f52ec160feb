//! Admission results read back from a solver assignment.

use super::{AdmissionModel, VariableLayout};
use crate::lp::{SolveOutcome, SolveStatus};
use qflow_core::Demand;
use serde::Serialize;
use std::time::Duration;

/// Flows below this are reported as unused links.
const FLOW_TOL: f64 = 1e-6;

/// Outcome for one demand.
#[derive(Debug, Clone, Serialize)]
pub struct DemandRouting {
    pub index: usize,
    pub demand: Demand,
    /// Raw value of `admit[j]`; fractional only for the relaxed strategy.
    pub admit: f64,
    pub admitted: bool,
    /// Pairs on each usable link, by link position.
    pub flows: Vec<f64>,
    /// Gate values by link position. The path strategy has no gate
    /// variables and reports 1 on every link carrying flow.
    pub gates: Vec<f64>,
    /// Potential per node position (edge strategies only).
    pub potentials: Option<Vec<f64>>,
}

impl DemandRouting {
    /// `(link position, flow)` for links carrying flow.
    pub fn active_links(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.flows
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, f)| *f > FLOW_TOL)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdmissionSolution {
    pub formulation: String,
    pub backend: String,
    pub status: SolveStatus,
    /// False when the solver stopped early; values are then the incumbent.
    pub proven_optimal: bool,
    pub objective: f64,
    #[serde(serialize_with = "serialize_secs")]
    pub solve_time: Duration,
    /// `tail->head` per usable link position.
    pub link_labels: Vec<String>,
    pub demands: Vec<DemandRouting>,
    /// Every variable in declaration order.
    #[serde(skip)]
    pub variables: Vec<(String, f64)>,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Integral values come back from floating-point solvers with noise.
fn clean(value: f64, integral: bool) -> f64 {
    if integral && (value - value.round()).abs() < 1e-6 {
        value.round() + 0.0
    } else {
        value
    }
}

impl AdmissionSolution {
    /// Result without a solve: nothing to admit, objective zero.
    pub fn empty(formulation: &str) -> Self {
        Self {
            formulation: formulation.to_string(),
            backend: "none".to_string(),
            status: SolveStatus::Optimal,
            proven_optimal: true,
            objective: 0.0,
            solve_time: Duration::ZERO,
            link_labels: Vec::new(),
            demands: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Map a solver assignment back onto demands and links.
    pub fn from_outcome(model: &AdmissionModel, demands: &[Demand], outcome: &SolveOutcome) -> Self {
        let program = &model.program;
        let values: Vec<f64> = program
            .variables()
            .iter()
            .enumerate()
            .map(|(i, decl)| clean(outcome.values.get(i).copied().unwrap_or(0.0), decl.is_integral()))
            .collect();
        let value = |var: crate::lp::VarId| values[var.index()];
        let n_edges = model.maps.num_edges();

        let routings = demands
            .iter()
            .enumerate()
            .map(|(j, demand)| {
                let admit = value(model.layout.admit()[j]);
                let (flows, gates, potentials) = match &model.layout {
                    VariableLayout::Edge(layout) => (
                        layout.flow[j].iter().map(|&v| value(v)).collect(),
                        layout.gate[j].iter().map(|&v| value(v)).collect(),
                        Some(layout.potential[j].iter().map(|&v| value(v)).collect()),
                    ),
                    VariableLayout::Path(layout) => {
                        let mut flows = vec![0.0; n_edges];
                        for path in &layout.paths[j] {
                            let amount = value(path.var);
                            for &e in &path.edges {
                                flows[e] += amount;
                            }
                        }
                        let gates = flows
                            .iter()
                            .map(|&f| if f > FLOW_TOL { 1.0 } else { 0.0 })
                            .collect();
                        (flows, gates, None)
                    }
                };
                DemandRouting {
                    index: j,
                    demand: demand.clone(),
                    admit,
                    admitted: admit > 0.5,
                    flows,
                    gates,
                    potentials,
                }
            })
            .collect();

        let variables = program
            .variables()
            .iter()
            .zip(&values)
            .map(|(decl, &v)| (decl.name.clone(), v))
            .collect();

        Self {
            formulation: model.formulation.clone(),
            backend: outcome.backend.clone(),
            status: outcome.status,
            proven_optimal: outcome.proven_optimal(),
            objective: program.objective_value(&values),
            solve_time: outcome.solve_time,
            link_labels: (0..n_edges).map(|e| model.maps.edge_label(e)).collect(),
            demands: routings,
            variables,
        }
    }

    pub fn admitted_count(&self) -> usize {
        self.demands.iter().filter(|d| d.admitted).count()
    }

    pub fn admitted(&self) -> Vec<usize> {
        self.demands
            .iter()
            .filter(|d| d.admitted)
            .map(|d| d.index)
            .collect()
    }

    /// Total flow on a link over all demands.
    pub fn link_load(&self, link: usize) -> f64 {
        self.demands.iter().map(|d| d.flows[link]).sum()
    }

    /// `(name, value)` pairs for the variable report.
    pub fn report_entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.variables.iter().map(|(name, v)| (name.as_str(), *v))
    }

    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Admission Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!(
            "Status: {}{}\n",
            self.status,
            if self.status.has_solution() && !self.proven_optimal {
                " (not proven optimal)"
            } else {
                ""
            }
        ));
        s.push_str(&format!("Formulation: {}\n", self.formulation));
        s.push_str(&format!("Backend: {}\n", self.backend));
        s.push_str(&format!("Objective: {:.4}\n", self.objective));
        s.push_str(&format!(
            "Admitted: {} of {}\n",
            self.admitted_count(),
            self.demands.len()
        ));
        s.push_str(&format!("Solve Time: {:.2?}\n", self.solve_time));

        if !self.demands.is_empty() {
            s.push_str("\nDemands:\n");
            for routing in &self.demands {
                if routing.admitted {
                    s.push_str(&format!("  [ADMIT]  #{} {}\n", routing.index, routing.demand));
                    for (e, flow) in routing.active_links() {
                        let label = self.link_labels.get(e).map(String::as_str).unwrap_or("?");
                        s.push_str(&format!("           {label}: {flow}\n"));
                    }
                } else {
                    s.push_str(&format!(
                        "  [REJECT] #{} {} (admit = {:.4})\n",
                        routing.index, routing.demand, routing.admit
                    ));
                }
            }
        }
        s
    }
}
