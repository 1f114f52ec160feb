//! The solver boundary: what a backend receives and what it must return.

use super::{LinearProgram, ProblemClass};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Terminal state reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Stopped by the time limit; values hold the best incumbent.
    TimeLimit,
}

impl SolveStatus {
    /// An assignment is available.
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::TimeLimit)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::TimeLimit => "time limit reached",
        };
        f.write_str(s)
    }
}

/// Knobs passed to every backend. Backends ignore what they cannot honour
/// and log a warning when they do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverSettings {
    pub time_limit: Option<Duration>,
    /// Relative MIP gap at which branch-and-bound may stop.
    pub mip_gap: Option<f64>,
    pub threads: Option<u32>,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Dense assignment indexed by `VarId`; empty without a solution.
    pub values: Vec<f64>,
    pub objective: Option<f64>,
    pub solve_time: Duration,
    pub backend: String,
}

impl SolveOutcome {
    /// Outcome for a solve that produced no assignment.
    pub fn without_solution(status: SolveStatus, backend: &str, solve_time: Duration) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: None,
            solve_time,
            backend: backend.to_string(),
        }
    }

    pub fn proven_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("backend '{backend}' cannot solve {class} problems")]
    UnsupportedClass {
        backend: String,
        class: ProblemClass,
    },

    #[error("backend '{0}' is not compiled into this build")]
    Unavailable(String),

    #[error("unknown backend '{0}'")]
    UnknownBackend(String),

    #[error("no available backend for {0} problems")]
    NoBackend(ProblemClass),

    #[error("backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },
}

/// Implements the actual solving of a [`LinearProgram`].
///
/// Backends are matched to programs via [`ProblemClass`]. Infeasible and
/// unbounded programs are reported through [`SolveOutcome::status`], not
/// as errors; errors mean the backend itself could not run.
pub trait SolverBackend: Send + Sync {
    /// Unique identifier (e.g., "microlp", "highs")
    fn id(&self) -> &str;

    fn supported_classes(&self) -> &[ProblemClass];

    /// Whether the backend was compiled in.
    fn is_available(&self) -> bool;

    fn solve(
        &self,
        program: &LinearProgram,
        settings: &SolverSettings,
    ) -> Result<SolveOutcome, SolveError>;

    fn supports(&self, class: ProblemClass) -> bool {
        self.supported_classes().contains(&class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe_and_send_sync() {
        fn _accepts(_b: &dyn SolverBackend) {}
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Box<dyn SolverBackend>>();
    }

    #[test]
    fn test_status_has_solution() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::TimeLimit.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::Unbounded.has_solution());
    }

    #[test]
    fn test_time_limit_is_not_proven_optimal() {
        let outcome = SolveOutcome {
            status: SolveStatus::TimeLimit,
            values: vec![1.0],
            objective: Some(1.0),
            solve_time: Duration::from_secs(5),
            backend: "highs".into(),
        };
        assert!(!outcome.proven_optimal());
    }

    #[test]
    fn test_error_messages() {
        let err = SolveError::UnsupportedClass {
            backend: "clarabel".into(),
            class: ProblemClass::MixedInteger,
        };
        assert_eq!(err.to_string(), "backend 'clarabel' cannot solve MILP problems");
    }
}
