use clap::{Args, Parser, Subcommand};
use qflow_algo::admission::FormulationStrategy;
use qflow_algo::experiments::SweepAxis;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "qflow",
    author,
    version,
    about = "Admission control for hierarchical quantum networks",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level [default: info, or [logging] level from the config]
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Configuration file [default: $QFLOW_HOME/config.toml, then ~/.qflow/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select the largest set of demands the network can serve
    Solve(SolveArgs),
    /// Check a network and optional demand file for structural problems
    Validate {
        /// Network in GML format
        #[arg(long)]
        graph: PathBuf,
        /// Demand file (.json or .csv)
        #[arg(long)]
        demands: Option<PathBuf>,
    },
    /// Generate a random network and demand set
    Generate {
        /// Where to write the network (GML)
        #[arg(long)]
        graph_out: PathBuf,
        /// Where to write the demands (.json or .csv)
        #[arg(long)]
        demands_out: PathBuf,
        /// RNG seed [default: [generation] seed, else entropy]
        #[arg(long)]
        seed: Option<u64>,
        /// Parameter line: "clients repeaters rep_coeff gen_coeff client_coeff mean_cap mean_demand"
        #[arg(long)]
        params: Option<String>,
    },
    /// Graph utilities
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },
    /// Experiments over generated instances
    Experiment {
        #[command(subcommand)]
        command: ExperimentCommands,
    },
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Network in GML format
    #[arg(long)]
    pub graph: PathBuf,
    /// Demand file (.json or .csv)
    #[arg(long)]
    pub demands: PathBuf,
    /// Formulation: exact, relaxed or path [default: [formulation] strategy]
    #[arg(long)]
    pub strategy: Option<FormulationStrategy>,
    /// Solver backend id or "auto" [default: [solver] backend]
    #[arg(long)]
    pub backend: Option<String>,
    /// Time limit in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,
    /// Relative MIP gap
    #[arg(long)]
    pub mip_gap: Option<f64>,
    /// Write one "name: value" line per variable and the objective
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Write the solution as JSON
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// Re-check the solution against the network; fails on any violation
    #[arg(long)]
    pub verify: bool,
}

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Graph stats summary
    Stats {
        /// Network in GML format
        graph: PathBuf,
    },
    /// Export graph to DOT or GML
    Export {
        /// Network in GML format
        graph: PathBuf,
        /// Output format: dot or gml
        #[arg(long, default_value = "dot")]
        format: String,
        /// Optional output file path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Remove repeaters with no path to any client
    Prune {
        /// Network in GML format
        graph: PathBuf,
        /// Where to write the pruned network (GML)
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExperimentCommands {
    /// Mean exact solve time over repeated runs on one instance
    Runtime(ExperimentArgs),
    /// Mean exact and relaxed objectives over fresh demand sets
    Lpgap(ExperimentArgs),
}

#[derive(Args, Debug)]
pub struct ExperimentArgs {
    /// CSV file to append results to
    #[arg(long)]
    pub out: PathBuf,
    /// Runs per setting [default: [experiment] runs]
    #[arg(long)]
    pub runs: Option<usize>,
    /// RNG seed [default: [generation] seed, else entropy]
    #[arg(long)]
    pub seed: Option<u64>,
    /// Parameter line: "clients repeaters rep_coeff gen_coeff client_coeff mean_cap mean_demand [alpha]"
    #[arg(long)]
    pub params: Option<String>,
    /// Vary one parameter: clients, repeaters or rep_coeff
    #[arg(long, requires = "values")]
    pub sweep: Option<SweepAxis>,
    /// Comma-separated values for --sweep
    #[arg(long, value_delimiter = ',')]
    pub values: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_solve_parses_strategy() {
        let cli = Cli::parse_from([
            "qflow", "solve", "--graph", "g.gml", "--demands", "d.json", "--strategy", "relaxed",
        ]);
        match cli.command {
            Commands::Solve(args) => {
                assert_eq!(args.strategy, Some(FormulationStrategy::Relaxed));
                assert!(!args.verify);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_sweep_values_are_comma_separated() {
        let cli = Cli::parse_from([
            "qflow", "experiment", "runtime", "--out", "o.csv", "--sweep", "clients", "--values",
            "10,15,20",
        ]);
        let Commands::Experiment {
            command: ExperimentCommands::Runtime(args),
        } = cli.command
        else {
            panic!("expected experiment runtime");
        };
        assert_eq!(args.sweep, Some(SweepAxis::Clients));
        assert_eq!(args.values, vec![10.0, 15.0, 20.0]);
    }
}
