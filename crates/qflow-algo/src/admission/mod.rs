//! Admission control for hierarchical quantum networks.
//!
//! Selects the largest set of demands that can be served at once. Each
//! demand asks for `quantity` entangled pairs delivered from the generator
//! to *both* of its clients, over paths no longer than its `threshold`.
//!
//! ## Edge formulation (MILP)
//!
//! ```text
//! Variables (j = demand, e = link (u,w), v = node):
//!   admit[j]        ∈ {0,1}          demand j fully served
//!   flow[j,e]       ∈ ℤ, 0..cap(e)   pairs for j on e
//!   gate[j,e]       ∈ {0,1}          e carries flow for j
//!   potential[j,v]  ≥ 0              hop label of v for j
//!
//! maximize   Σ_j admit[j]
//! subject to
//!   Σ_j flow[j,e]                     ≤ cap(e)              ∀ e
//!   Σ_in(n) flow[j,·] − Σ_out(n) flow[j,·] = 0              ∀ repeater n, j
//!   flow[j,e] − cap(e)·gate[j,e]      ≤ 0                   ∀ e, j
//!   Σ_in(src_j) flow[j,·] − qty_j·admit[j] = 0              ∀ j
//!   Σ_in(dst_j) flow[j,·] − qty_j·admit[j] = 0              ∀ j
//!   potential[j,generator]            = 0                   ∀ j
//!   potential[j,src_j], potential[j,dst_j] ≤ thr_j          ∀ j
//!   potential[j,w] − potential[j,u] − gate[j,e] ≥ 0         ∀ e, j
//! ```
//!
//! ### Linear admission instead of `admit·flow`
//!
//! Coupling admission to flow with a product `admit[j]·flow[j,e]` makes the
//! capacity rows bilinear. Here the product never appears: the sink
//! equalities carry `qty·admit[j]` on their right-hand side. A rejected
//! demand must deliver zero pairs to its clients, and repeater conservation
//! carries that zero upstream along every path only that demand uses. The
//! whole model stays mixed-integer linear, and solves faster than both the
//! bilinear model and path enumeration. Do not reintroduce the product.
//!
//! ### Potentials bound path length
//!
//! A gated link forces the potential to rise by at least one, so the
//! potential of a client is at least the number of gated hops on any
//! route reaching it, and capping it at `thr` caps the hop count. Rising
//! potentials also rule out gated cycles.
//!
//! ## Strategies
//!
//! | strategy  | variables                         | class |
//! |-----------|-----------------------------------|-------|
//! | `exact`   | as above                          | MILP  |
//! | `relaxed` | same rows, continuous domains     | LP    |
//! | `path`    | one flow per enumerated path      | MILP  |
//!
//! The relaxed optimum bounds the exact optimum from above and is used to
//! measure the integrality gap. The path strategy enumerates every simple
//! generator→client path within the hop budget; it blows up on realistic
//! networks and exists as a cross-check on small ones.

mod edge;
mod index;
mod path;
mod solution;
mod solve;
mod validate;
mod verify;

pub use edge::EdgeFormulation;
pub use index::IndexMaps;
pub use path::{PathFormulation, DEFAULT_MAX_PATHS};
pub use solution::{AdmissionSolution, DemandRouting};
pub use solve::{solve_admission, solve_admission_with, AdmissionConfig};
pub use validate::validate_demands;
pub use verify::{verify_solution, VerificationIssue};

use crate::lp::{LinearProgram, ProblemClass, SolveError, SolveStatus, VarId};
use qflow_core::{Demand, QuantumNetwork};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("network has no nodes")]
    EmptyNetwork,

    #[error("network has no generator")]
    MissingGenerator,

    #[error("network has {0} generators, expected exactly one")]
    MultipleGenerators(usize),

    #[error("client {client} appears on more than one network node")]
    DuplicateClient { client: usize },

    #[error("demand {demand}: client {client} is not in the network")]
    UnknownClient { demand: usize, client: usize },

    #[error("demand {demand}: quantity must be positive")]
    NonPositiveQuantity { demand: usize },

    #[error("demand {demand}: threshold {threshold} must be a non-negative number")]
    InvalidThreshold { demand: usize, threshold: f64 },

    #[error("demand {demand}: more than {limit} candidate paths to client {client}")]
    PathLimitExceeded {
        demand: usize,
        client: usize,
        limit: usize,
    },

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("solver reported '{status}' although rejecting every demand is always feasible; the model is malformed")]
    FormulationBug { status: SolveStatus },
}

/// Which end of a demand a path serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandEnd {
    Source,
    Destination,
}

impl DemandEnd {
    pub fn tag(&self) -> &'static str {
        match self {
            DemandEnd::Source => "src",
            DemandEnd::Destination => "dst",
        }
    }
}

/// Variables of the edge strategies, indexed `[demand][edge]` or
/// `[demand][node]` by the positions in [`IndexMaps`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub admit: Vec<VarId>,
    pub flow: Vec<Vec<VarId>>,
    pub gate: Vec<Vec<VarId>>,
    pub potential: Vec<Vec<VarId>>,
}

/// One enumerated path and its flow variable.
#[derive(Debug, Clone, PartialEq)]
pub struct PathVar {
    pub var: VarId,
    pub end: DemandEnd,
    /// Edge positions from the generator outward.
    pub edges: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathLayout {
    pub admit: Vec<VarId>,
    pub paths: Vec<Vec<PathVar>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariableLayout {
    Edge(EdgeLayout),
    Path(PathLayout),
}

impl VariableLayout {
    pub fn admit(&self) -> &[VarId] {
        match self {
            VariableLayout::Edge(l) => &l.admit,
            VariableLayout::Path(l) => &l.admit,
        }
    }
}

/// Everything one formulation call produces. The index maps travel with
/// the program so results are read back with the same bijection.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionModel {
    pub formulation: String,
    pub program: LinearProgram,
    pub layout: VariableLayout,
    pub maps: IndexMaps,
}

/// Builds an [`AdmissionModel`] from a network and an ordered demand list.
///
/// Implementations are pure: no I/O, no shared state, identical inputs give
/// identical models.
pub trait Formulation: Send + Sync {
    /// Strategy name recorded in logs and on the solution: `exact`, `relaxed` or `path`.
    fn id(&self) -> &str;

    fn problem_class(&self) -> ProblemClass;

    fn formulate(
        &self,
        network: &QuantumNetwork,
        demands: &[Demand],
    ) -> Result<AdmissionModel, AdmissionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulationStrategy {
    #[default]
    Exact,
    Relaxed,
    Path,
}

impl FormulationStrategy {
    pub fn formulation(&self, max_paths: usize) -> Box<dyn Formulation> {
        match self {
            FormulationStrategy::Exact => Box::new(EdgeFormulation::exact()),
            FormulationStrategy::Relaxed => Box::new(EdgeFormulation::relaxed()),
            FormulationStrategy::Path => Box::new(PathFormulation::new(max_paths)),
        }
    }
}

impl fmt::Display for FormulationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulationStrategy::Exact => write!(f, "exact"),
            FormulationStrategy::Relaxed => write!(f, "relaxed"),
            FormulationStrategy::Path => write!(f, "path"),
        }
    }
}

impl FromStr for FormulationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" | "milp" => Ok(FormulationStrategy::Exact),
            "relaxed" | "lp" => Ok(FormulationStrategy::Relaxed),
            "path" | "paths" => Ok(FormulationStrategy::Path),
            other => Err(format!(
                "unknown formulation '{other}', expected one of: exact, relaxed, path"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_round_trips_through_str() {
        for strategy in [
            FormulationStrategy::Exact,
            FormulationStrategy::Relaxed,
            FormulationStrategy::Path,
        ] {
            assert_eq!(strategy.to_string().parse::<FormulationStrategy>(), Ok(strategy));
        }
        assert!("bilinear".parse::<FormulationStrategy>().is_err());
    }

    #[test]
    fn test_strategy_classes() {
        assert_eq!(
            FormulationStrategy::Exact.formulation(10).problem_class(),
            ProblemClass::MixedInteger
        );
        assert_eq!(
            FormulationStrategy::Relaxed.formulation(10).problem_class(),
            ProblemClass::LinearProgram
        );
        assert_eq!(FormulationStrategy::Path.formulation(10).id(), "path");
    }

    #[test]
    fn test_formulation_id_matches_strategy_name() {
        for strategy in [
            FormulationStrategy::Exact,
            FormulationStrategy::Relaxed,
            FormulationStrategy::Path,
        ] {
            assert_eq!(strategy.formulation(10).id(), strategy.to_string());
        }
    }

    #[test]
    fn test_formulation_is_object_safe() {
        fn _accepts(_f: &dyn Formulation) {}
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Box<dyn Formulation>>();
    }
}
