//! Backends built on `good_lp`.
//!
//! | id         | classes   | feature           | limits honoured          |
//! |------------|-----------|-------------------|--------------------------|
//! | `microlp`  | LP, MILP  | `solver-microlp`  | none                     |
//! | `clarabel` | LP        | `solver-clarabel` | none                     |
//! | `highs`    | LP, MILP  | `solver-highs`    | time, MIP gap, threads   |

use super::backend::{SolveError, SolveOutcome, SolverBackend, SolverSettings};
use super::{LinearProgram, ProblemClass};
#[cfg(any(
    feature = "solver-microlp",
    feature = "solver-clarabel",
    feature = "solver-highs"
))]
use super::backend::SolveStatus;

const ALL_CLASSES: &[ProblemClass] = &[ProblemClass::LinearProgram, ProblemClass::MixedInteger];

/// Translation of a [`LinearProgram`] into a `good_lp` model and back.
#[cfg(any(
    feature = "solver-microlp",
    feature = "solver-clarabel",
    feature = "solver-highs"
))]
mod bridge {
    use crate::lp::backend::{SolveError, SolveOutcome, SolveStatus, SolverSettings};
    use crate::lp::{Comparison, LinearConstraint, LinearExpr, LinearProgram, Sense, VarDomain};
    use good_lp::solvers::Solver;
    use good_lp::{
        constraint, variable, Constraint, Expression, ProblemVariables, ResolutionError, Solution,
        SolverModel, Variable,
    };
    use tracing::{debug, warn};
    use web_time::Instant;

    fn expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
        let mut out = Expression::from(expr.constant());
        for (var, coef) in expr.terms() {
            out.add_mul(*coef, handles[var.index()]);
        }
        out
    }

    fn to_constraint(c: &LinearConstraint, handles: &[Variable]) -> Constraint {
        let lhs = expression(&c.lhs, handles);
        match c.cmp {
            Comparison::Le => constraint::leq(lhs, c.rhs),
            Comparison::Eq => constraint::eq(lhs, c.rhs),
            Comparison::Ge => constraint::geq(lhs, c.rhs),
        }
    }

    /// Declare variables, objective and constraints on a fresh model.
    pub(super) fn build_model<S: Solver>(
        program: &LinearProgram,
        solver: S,
    ) -> (S::Model, Vec<Variable>) {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = program
            .variables()
            .iter()
            .map(|decl| {
                let mut def = variable().name(decl.name.clone()).min(decl.lower);
                if let Some(upper) = decl.upper {
                    def = def.max(upper);
                }
                match decl.domain {
                    VarDomain::Continuous => {}
                    VarDomain::Integer => def = def.integer(),
                    VarDomain::Binary => def = def.binary(),
                }
                vars.add(def)
            })
            .collect();

        let objective = expression(program.objective(), &handles);
        let mut model = match program.sense() {
            Sense::Maximize => vars.maximise(objective).using(solver),
            Sense::Minimize => vars.minimise(objective).using(solver),
        };
        for c in program.constraints() {
            model.add_constraint(to_constraint(c, &handles));
        }
        debug!(
            variables = handles.len(),
            constraints = program.num_constraints(),
            "built good_lp model"
        );
        (model, handles)
    }

    /// Solve `model` and read every variable back in declaration order.
    pub(super) fn solve<M: SolverModel>(
        backend: &str,
        program: &LinearProgram,
        model: M,
        handles: &[Variable],
        status_of: impl FnOnce(&M::Solution) -> SolveStatus,
    ) -> Result<SolveOutcome, SolveError>
    where
        M::Error: Into<ResolutionError>,
    {
        let started = Instant::now();
        let result: Result<M::Solution, ResolutionError> = model.solve().map_err(Into::into);
        let solve_time = started.elapsed();
        match result {
            Ok(solution) => {
                let status = status_of(&solution);
                let values: Vec<f64> = handles.iter().map(|&v| solution.value(v)).collect();
                let objective = program.objective_value(&values);
                Ok(SolveOutcome {
                    status,
                    values,
                    objective: Some(objective),
                    solve_time,
                    backend: backend.to_string(),
                })
            }
            Err(ResolutionError::Infeasible) => Ok(SolveOutcome::without_solution(
                SolveStatus::Infeasible,
                backend,
                solve_time,
            )),
            Err(ResolutionError::Unbounded) => Ok(SolveOutcome::without_solution(
                SolveStatus::Unbounded,
                backend,
                solve_time,
            )),
            Err(other) => Err(SolveError::Backend {
                backend: backend.to_string(),
                message: other.to_string(),
            }),
        }
    }

    pub(super) fn warn_unsupported_limits(backend: &str, settings: &SolverSettings) {
        if settings.time_limit.is_some() || settings.mip_gap.is_some() {
            warn!(
                backend,
                "time limit and MIP gap are not supported by this backend; solving to completion"
            );
        }
    }
}

/// Pure-Rust simplex with branch-and-bound. Always the fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicrolpBackend;

impl SolverBackend for MicrolpBackend {
    fn id(&self) -> &str {
        "microlp"
    }

    fn supported_classes(&self) -> &[ProblemClass] {
        ALL_CLASSES
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "solver-microlp")
    }

    #[cfg(feature = "solver-microlp")]
    fn solve(
        &self,
        program: &LinearProgram,
        settings: &SolverSettings,
    ) -> Result<SolveOutcome, SolveError> {
        bridge::warn_unsupported_limits(self.id(), settings);
        let (model, handles) = bridge::build_model(program, good_lp::solvers::microlp::microlp);
        bridge::solve(self.id(), program, model, &handles, |_| SolveStatus::Optimal)
    }

    #[cfg(not(feature = "solver-microlp"))]
    fn solve(
        &self,
        _program: &LinearProgram,
        _settings: &SolverSettings,
    ) -> Result<SolveOutcome, SolveError> {
        Err(SolveError::Unavailable(self.id().to_string()))
    }
}

/// Interior-point conic solver; continuous programs only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClarabelBackend;

impl SolverBackend for ClarabelBackend {
    fn id(&self) -> &str {
        "clarabel"
    }

    fn supported_classes(&self) -> &[ProblemClass] {
        &[ProblemClass::LinearProgram]
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "solver-clarabel")
    }

    #[cfg(feature = "solver-clarabel")]
    fn solve(
        &self,
        program: &LinearProgram,
        settings: &SolverSettings,
    ) -> Result<SolveOutcome, SolveError> {
        let class = program.problem_class();
        if !self.supports(class) {
            return Err(SolveError::UnsupportedClass {
                backend: self.id().to_string(),
                class,
            });
        }
        bridge::warn_unsupported_limits(self.id(), settings);
        let (model, handles) = bridge::build_model(program, good_lp::solvers::clarabel::clarabel);
        bridge::solve(self.id(), program, model, &handles, |_| SolveStatus::Optimal)
    }

    #[cfg(not(feature = "solver-clarabel"))]
    fn solve(
        &self,
        _program: &LinearProgram,
        _settings: &SolverSettings,
    ) -> Result<SolveOutcome, SolveError> {
        Err(SolveError::Unavailable(self.id().to_string()))
    }
}

/// HiGHS through its C API. The only backend that honours time limits, so
/// the only one that can report an unproven incumbent.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighsBackend;

impl SolverBackend for HighsBackend {
    fn id(&self) -> &str {
        "highs"
    }

    fn supported_classes(&self) -> &[ProblemClass] {
        ALL_CLASSES
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "solver-highs")
    }

    #[cfg(feature = "solver-highs")]
    fn solve(
        &self,
        program: &LinearProgram,
        settings: &SolverSettings,
    ) -> Result<SolveOutcome, SolveError> {
        use good_lp::solvers::SolutionStatus;
        use good_lp::Solution as _;

        let (mut model, handles) = bridge::build_model(program, good_lp::solvers::highs::highs);
        model = model.set_verbose(settings.verbose);
        if let Some(limit) = settings.time_limit {
            model = model.set_time_limit(limit.as_secs_f64());
        }
        if let Some(gap) = settings.mip_gap {
            model = model.set_option("mip_rel_gap", gap);
        }
        if let Some(threads) = settings.threads {
            model = model.set_threads(threads);
        }
        bridge::solve(self.id(), program, model, &handles, |solution| {
            match solution.status() {
                SolutionStatus::TimeLimit => SolveStatus::TimeLimit,
                // Stopping inside the requested gap counts as solved.
                SolutionStatus::Optimal | SolutionStatus::GapLimit => SolveStatus::Optimal,
            }
        })
    }

    #[cfg(not(feature = "solver-highs"))]
    fn solve(
        &self,
        _program: &LinearProgram,
        _settings: &SolverSettings,
    ) -> Result<SolveOutcome, SolveError> {
        Err(SolveError::Unavailable(self.id().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::backend::SolveStatus;
    use crate::lp::{Comparison, LinearExpr, Sense, VarDecl};

    /// max 3x + 2y  s.t. x + y <= 4, x + 3y <= 6, x <= 3
    fn small_lp(integral: bool) -> LinearProgram {
        let mut lp = LinearProgram::new(Sense::Maximize);
        let make = |name: &str| {
            if integral {
                VarDecl::integer(name)
            } else {
                VarDecl::continuous(name)
            }
        };
        let x = lp.add_variable(make("x").with_upper(3.0));
        let y = lp.add_variable(make("y"));
        lp.set_objective(LinearExpr::new().term(x, 3.0).term(y, 2.0));
        lp.add_constraint("c1", LinearExpr::new().term(x, 1.0).term(y, 1.0), Comparison::Le, 4.0);
        lp.add_constraint("c2", LinearExpr::new().term(x, 1.0).term(y, 3.0), Comparison::Le, 6.0);
        lp
    }

    #[test]
    #[cfg(feature = "solver-microlp")]
    fn test_microlp_solves_milp() {
        let lp = small_lp(true);
        let outcome = MicrolpBackend.solve(&lp, &SolverSettings::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.objective.unwrap() - 11.0).abs() < 1e-6);
        assert!((outcome.values[0] - 3.0).abs() < 1e-6);
        assert!((outcome.values[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    #[cfg(feature = "solver-microlp")]
    fn test_microlp_reports_infeasible_status() {
        let mut lp = LinearProgram::new(Sense::Maximize);
        let x = lp.add_variable(VarDecl::continuous("x").with_upper(1.0));
        lp.set_objective(LinearExpr::from(x));
        lp.add_constraint("impossible", LinearExpr::from(x), Comparison::Ge, 2.0);
        let outcome = MicrolpBackend.solve(&lp, &SolverSettings::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.values.is_empty());
    }

    #[test]
    #[cfg(feature = "solver-clarabel")]
    fn test_clarabel_solves_lp() {
        let lp = small_lp(false);
        let outcome = ClarabelBackend.solve(&lp, &SolverSettings::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.objective.unwrap() - 11.0).abs() < 1e-4);
    }

    #[test]
    #[cfg(feature = "solver-clarabel")]
    fn test_clarabel_refuses_integer_programs() {
        let err = ClarabelBackend
            .solve(&small_lp(true), &SolverSettings::default())
            .unwrap_err();
        assert!(matches!(err, SolveError::UnsupportedClass { .. }));
    }

    #[test]
    fn test_availability_follows_features() {
        assert_eq!(MicrolpBackend.is_available(), cfg!(feature = "solver-microlp"));
        assert_eq!(HighsBackend.is_available(), cfg!(feature = "solver-highs"));
    }
}
