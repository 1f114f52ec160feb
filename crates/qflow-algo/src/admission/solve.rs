use super::{AdmissionError, AdmissionSolution, FormulationStrategy, DEFAULT_MAX_PATHS};
use crate::lp::{BackendRegistry, SolveStatus, SolverSettings};
use qflow_core::{Demand, QuantumNetwork};
use tracing::{error, info, warn};

/// Configuration for one admission solve.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionConfig {
    pub strategy: FormulationStrategy,
    /// Backend id, or `"auto"` to pick by problem class.
    pub backend: String,
    pub settings: SolverSettings,
    /// Path strategy only.
    pub max_paths: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            strategy: FormulationStrategy::Exact,
            backend: "auto".to_string(),
            settings: SolverSettings::default(),
            max_paths: DEFAULT_MAX_PATHS,
        }
    }
}

impl AdmissionConfig {
    pub fn with_strategy(mut self, strategy: FormulationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Formulate and solve with the built-in backends.
///
/// ```no_run
/// use qflow_algo::admission::{solve_admission, AdmissionConfig};
/// # let network = qflow_core::QuantumNetwork::new();
/// # let demands: Vec<qflow_core::Demand> = vec![];
/// let solution = solve_admission(&network, &demands, &AdmissionConfig::default())?;
/// println!("{}", solution.summary());
/// # Ok::<(), qflow_algo::admission::AdmissionError>(())
/// ```
pub fn solve_admission(
    network: &QuantumNetwork,
    demands: &[Demand],
    config: &AdmissionConfig,
) -> Result<AdmissionSolution, AdmissionError> {
    solve_admission_with(&BackendRegistry::with_defaults(), network, demands, config)
}

/// Formulate and solve with backends from `registry`.
pub fn solve_admission_with(
    registry: &BackendRegistry,
    network: &QuantumNetwork,
    demands: &[Demand],
    config: &AdmissionConfig,
) -> Result<AdmissionSolution, AdmissionError> {
    let formulation = config.strategy.formulation(config.max_paths);
    let model = formulation.formulate(network, demands)?;
    if demands.is_empty() {
        info!("no demands; nothing to admit");
        return Ok(AdmissionSolution::empty(formulation.id()));
    }

    let class = model.program.problem_class();
    let backend = registry.resolve(&config.backend, class)?;
    info!(
        formulation = formulation.id(),
        backend = backend.id(),
        %class,
        demands = demands.len(),
        variables = model.program.num_variables(),
        constraints = model.program.num_constraints(),
        "solving admission model"
    );

    let outcome = backend.solve(&model.program, &config.settings)?;
    match outcome.status {
        SolveStatus::Infeasible | SolveStatus::Unbounded => {
            error!(
                status = %outcome.status,
                backend = backend.id(),
                "admission model has no optimum; rejecting every demand should be feasible"
            );
            return Err(AdmissionError::FormulationBug {
                status: outcome.status,
            });
        }
        SolveStatus::TimeLimit => {
            warn!(
                backend = backend.id(),
                "time limit reached; reporting the best incumbent"
            );
        }
        SolveStatus::Optimal => {}
    }

    let solution = AdmissionSolution::from_outcome(&model, demands, &outcome);
    info!(
        objective = solution.objective,
        admitted = solution.admitted_count(),
        proven_optimal = solution.proven_optimal,
        solve_time_ms = outcome.solve_time.as_millis() as u64,
        "admission solved"
    );
    Ok(solution)
}
