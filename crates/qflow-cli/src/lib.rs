pub mod cli;
pub mod config;

pub use cli::{Cli, Commands, ExperimentArgs, ExperimentCommands, GraphCommands, SolveArgs};
pub use config::{load_config, QflowConfig};
