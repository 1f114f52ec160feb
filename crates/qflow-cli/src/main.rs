use anyhow::{Context, Result};
use clap::Parser;
use qflow_cli::{load_config, Cli, Commands};
use tracing::debug;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let level = match cli.log_level {
        Some(level) => level,
        None => config.log_level()?,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;
    debug!(?config, "configuration loaded");

    match &cli.command {
        Commands::Solve(args) => commands::solve::handle(args, &config),
        Commands::Validate { graph, demands } => {
            commands::validate::handle(graph, demands.as_deref())
        }
        Commands::Generate {
            graph_out,
            demands_out,
            seed,
            params,
        } => commands::generate::handle(graph_out, demands_out, *seed, params.as_deref(), &config),
        Commands::Graph { command } => commands::graph::handle(command),
        Commands::Experiment { command } => commands::experiment::handle(command, &config),
    }
}
