//! Admission control algorithms for hierarchical quantum networks.
//!
//! - [`lp`]: solver-agnostic linear programs and the `good_lp` backends
//! - [`admission`]: formulation strategies, solve driver, result readback
//!   and verification
//! - [`generate`]: random networks and demand sets
//! - [`experiments`]: runtime and LP-gap drivers with CSV output
//!
//! ```no_run
//! use qflow_algo::admission::{solve_admission, AdmissionConfig};
//! use qflow_algo::generate::{generate_demands, generate_network, seeded_rng, GenerationParams};
//!
//! let params = GenerationParams::default();
//! let mut rng = seeded_rng(Some(7));
//! let network = generate_network(&params, &mut rng)?;
//! let demands = generate_demands(&params, &mut rng)?;
//! let solution = solve_admission(&network, &demands, &AdmissionConfig::default())?;
//! println!("admitted {} of {}", solution.admitted_count(), demands.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod admission;
pub mod experiments;
pub mod generate;
pub mod lp;

pub use admission::{
    solve_admission, verify_solution, AdmissionConfig, AdmissionError, AdmissionModel,
    AdmissionSolution, DemandRouting, Formulation, FormulationStrategy,
};
pub use lp::{BackendRegistry, LinearProgram, SolveStatus, SolverSettings};
