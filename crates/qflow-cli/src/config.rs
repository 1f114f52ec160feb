//! qflow configuration
//!
//! Looked up at `--config`, else `$QFLOW_HOME/config.toml`, else
//! `~/.qflow/config.toml`. Every key has a default; a missing default file
//! is not an error.

use anyhow::{anyhow, Context, Result};
use qflow_algo::admission::{AdmissionConfig, FormulationStrategy, DEFAULT_MAX_PATHS};
use qflow_algo::generate::GenerationParams;
use qflow_algo::lp::SolverSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct QflowConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub formulation: FormulationConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverConfig {
    /// Backend id, or "auto"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Solver time limit in seconds (0 = none)
    #[serde(default)]
    pub time_limit_seconds: u64,
    #[serde(default)]
    pub mip_gap: Option<f64>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub threads: Option<u32>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            time_limit_seconds: 0,
            mip_gap: None,
            verbose: false,
            threads: None,
        }
    }
}

fn default_backend() -> String {
    "auto".to_string()
}

impl SolverConfig {
    pub fn settings(&self) -> SolverSettings {
        SolverSettings {
            time_limit: (self.time_limit_seconds > 0)
                .then(|| Duration::from_secs(self.time_limit_seconds)),
            mip_gap: self.mip_gap,
            threads: self.threads,
            verbose: self.verbose,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormulationConfig {
    #[serde(default)]
    pub strategy: FormulationStrategy,
    /// Candidate paths per demand end before the path strategy gives up
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
}

impl Default for FormulationConfig {
    fn default() -> Self {
        Self {
            strategy: FormulationStrategy::default(),
            max_paths: default_max_paths(),
        }
    }
}

fn default_max_paths() -> usize {
    DEFAULT_MAX_PATHS
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationConfig {
    #[serde(flatten)]
    pub params: GenerationParams,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentConfig {
    #[serde(default = "default_runs")]
    pub runs: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
        }
    }
}

fn default_runs() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl QflowConfig {
    /// Admission settings before command-line overrides.
    pub fn admission(&self) -> AdmissionConfig {
        AdmissionConfig {
            strategy: self.formulation.strategy,
            backend: self.solver.backend.clone(),
            settings: self.solver.settings(),
            max_paths: self.formulation.max_paths,
        }
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| anyhow!("invalid [logging] level '{}'", self.logging.level))
    }
}

/// Default configuration location.
pub fn config_path() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("QFLOW_HOME") {
        return Ok(PathBuf::from(home).join("config.toml"));
    }
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Cannot determine home directory"))
        .map(|h| h.join(".qflow").join("config.toml"))
}

pub fn parse_config(contents: &str) -> Result<QflowConfig> {
    Ok(toml::from_str(contents)?)
}

/// Load from `explicit`, which must exist, or from the default location.
pub fn load_config(explicit: Option<&Path>) -> Result<QflowConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = config_path()?;
            if !path.exists() {
                return Ok(QflowConfig::default());
            }
            path
        }
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, QflowConfig::default());
        assert_eq!(config.solver.backend, "auto");
        assert_eq!(config.experiment.runs, 5);
        assert_eq!(config.solver.settings().time_limit, None);
        assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = parse_config(
            r#"
[solver]
backend = "microlp"
time_limit_seconds = 30

[formulation]
strategy = "path"
max_paths = 50

[generation]
num_clients = 15
num_repeaters = 300
seed = 9

[logging]
level = "debug"
"#,
        )
        .unwrap();
        let admission = config.admission();
        assert_eq!(admission.backend, "microlp");
        assert_eq!(admission.strategy, FormulationStrategy::Path);
        assert_eq!(admission.max_paths, 50);
        assert_eq!(admission.settings.time_limit, Some(Duration::from_secs(30)));
        assert_eq!(config.generation.params.num_clients, 15);
        assert_eq!(config.generation.params.mean_capacity, 10.0);
        assert_eq!(config.generation.seed, Some(9));
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
