//! Solver-agnostic linear and mixed-integer programs.
//!
//! A [`LinearProgram`] is plain data: declared variables with domains and
//! bounds, one linear objective, and a flat list of named constraints
//! `lhs (<=|=|>=) rhs`. Nothing in here knows about a particular solver;
//! [`backend`] translates programs for the concrete solvers and
//! [`registry`] picks one for a problem class.

pub mod backend;
pub mod backends;
pub mod registry;

pub use backend::{SolveError, SolveOutcome, SolveStatus, SolverBackend, SolverSettings};
pub use registry::BackendRegistry;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Problem class used to match programs with backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemClass {
    /// Continuous variables only.
    LinearProgram,
    /// At least one integer or binary variable.
    MixedInteger,
}

impl fmt::Display for ProblemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemClass::LinearProgram => write!(f, "LP"),
            ProblemClass::MixedInteger => write!(f, "MILP"),
        }
    }
}

/// Handle to a declared variable; indexes [`LinearProgram::variables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarDomain {
    Continuous,
    Integer,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub domain: VarDomain,
    pub lower: f64,
    pub upper: Option<f64>,
}

impl VarDecl {
    /// Continuous, non-negative, unbounded above.
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: VarDomain::Continuous,
            lower: 0.0,
            upper: None,
        }
    }

    /// Integer, non-negative, unbounded above.
    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            domain: VarDomain::Integer,
            ..Self::continuous(name)
        }
    }

    /// Binary, bounds fixed to `[0, 1]`.
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            domain: VarDomain::Binary,
            upper: Some(1.0),
            ..Self::continuous(name)
        }
    }

    pub fn with_upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self
    }

    pub fn is_integral(&self) -> bool {
        self.domain != VarDomain::Continuous
    }
}

/// Sparse affine expression `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate against a dense assignment indexed by [`VarId`].
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::new().term(var, 1.0)
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
            constant: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Le,
    Eq,
    Ge,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Le => "<=",
            Comparison::Eq => "=",
            Comparison::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub lhs: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

impl LinearConstraint {
    /// How far the assignment is from satisfying the constraint (0 when satisfied).
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.lhs.evaluate(values);
        match self.cmp {
            Comparison::Le => (lhs - self.rhs).max(0.0),
            Comparison::Ge => (self.rhs - lhs).max(0.0),
            Comparison::Eq => (lhs - self.rhs).abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    Maximize,
    Minimize,
}

/// A constraint or bound that an assignment breaks.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    sense: Sense,
    variables: Vec<VarDecl>,
    objective: LinearExpr,
    constraints: Vec<LinearConstraint>,
}

impl LinearProgram {
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            variables: Vec::new(),
            objective: LinearExpr::new(),
            constraints: Vec::new(),
        }
    }

    pub fn add_variable(&mut self, decl: VarDecl) -> VarId {
        self.variables.push(decl);
        VarId(self.variables.len() - 1)
    }

    /// Add `lhs cmp rhs`. A left-hand side without terms carries no
    /// information about the variables and is dropped; returns whether the
    /// constraint was kept.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        lhs: LinearExpr,
        cmp: Comparison,
        rhs: f64,
    ) -> bool {
        if lhs.is_empty() {
            return false;
        }
        self.constraints.push(LinearConstraint {
            name: name.into(),
            lhs,
            cmp,
            rhs,
        });
        true
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn variables(&self) -> &[VarDecl] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &VarDecl {
        &self.variables[id.0]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn problem_class(&self) -> ProblemClass {
        if self.variables.iter().any(VarDecl::is_integral) {
            ProblemClass::MixedInteger
        } else {
            ProblemClass::LinearProgram
        }
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Every bound, integrality requirement, and constraint the assignment
    /// breaks by more than `tol`.
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<Violation> {
        let mut out = Vec::new();
        for (i, decl) in self.variables.iter().enumerate() {
            let value = values.get(i).copied().unwrap_or(0.0);
            if value < decl.lower - tol {
                out.push(Violation {
                    name: format!("{} lower bound", decl.name),
                    amount: decl.lower - value,
                });
            }
            if let Some(upper) = decl.upper {
                if value > upper + tol {
                    out.push(Violation {
                        name: format!("{} upper bound", decl.name),
                        amount: value - upper,
                    });
                }
            }
            if decl.is_integral() && (value - value.round()).abs() > tol {
                out.push(Violation {
                    name: format!("{} integrality", decl.name),
                    amount: (value - value.round()).abs(),
                });
            }
        }
        for constraint in &self.constraints {
            let amount = constraint.violation(values);
            if amount > tol {
                out.push(Violation {
                    name: constraint.name.clone(),
                    amount,
                });
            }
        }
        out
    }
}

impl fmt::Display for LinearProgram {
    /// LP-file style dump, handy with `--log-level trace`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |expr: &LinearExpr| -> String {
            let mut parts: Vec<String> = expr
                .terms()
                .iter()
                .map(|(var, coef)| format!("{:+} {}", coef, self.variables[var.0].name))
                .collect();
            if expr.constant() != 0.0 || parts.is_empty() {
                parts.push(format!("{:+}", expr.constant()));
            }
            parts.join(" ")
        };
        let sense = match self.sense {
            Sense::Maximize => "maximize",
            Sense::Minimize => "minimize",
        };
        writeln!(f, "{sense}\n  {}", render(&self.objective))?;
        writeln!(f, "subject to")?;
        for c in &self.constraints {
            writeln!(f, "  {}: {} {} {}", c.name, render(&c.lhs), c.cmp.symbol(), c.rhs)?;
        }
        writeln!(f, "bounds")?;
        for v in &self.variables {
            let upper = v.upper.map_or("inf".to_string(), |u| u.to_string());
            writeln!(f, "  {} <= {} <= {} ({:?})", v.lower, v.name, upper, v.domain)?;
        }
        Ok(())
    }
}
