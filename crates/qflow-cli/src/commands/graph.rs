use std::fs;

use anyhow::{bail, Context, Result};
use qflow_cli::GraphCommands;
use qflow_core::graph_utils;

use super::load_network;

pub fn handle(command: &GraphCommands) -> Result<()> {
    match command {
        GraphCommands::Stats { graph } => {
            let network = load_network(graph)?;
            let stats = graph_utils::graph_stats(&network);
            let summary = network.stats();
            println!("Graph statistics for {}:", graph.display());
            println!("  Generators    : {}", summary.num_generators);
            println!("  Repeaters     : {}", summary.num_repeaters);
            println!("  Clients       : {}", summary.num_clients);
            println!(
                "  Links         : {} ({} zero-capacity)",
                stats.edge_count, summary.zero_capacity_links
            );
            println!("  Total capacity: {}", summary.total_capacity);
            println!(
                "  Out-degree [min/avg/max]: {}/{:.2}/{}",
                stats.min_out_degree, stats.avg_out_degree, stats.max_out_degree
            );
            println!("  Density       : {:.4}", stats.density);
            println!(
                "  Reachable clients: {}/{}",
                stats.reachable_clients, summary.num_clients
            );
            println!("  Dead repeaters: {}", stats.dead_repeaters);
            Ok(())
        }
        GraphCommands::Export { graph, format, out } => {
            let network = load_network(graph)?;
            let text = match format.to_ascii_lowercase().as_str() {
                "gml" => qflow_io::to_gml_string(&network),
                "dot" | "graphviz" => graph_utils::export_graph(&network, "dot")?,
                other => bail!("unsupported export format '{other}', expected dot or gml"),
            };
            match out {
                Some(path) => {
                    fs::write(path, &text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Graph exported to {}", path.display());
                }
                None => print!("{text}"),
            }
            Ok(())
        }
        GraphCommands::Prune { graph, out } => {
            let mut network = load_network(graph)?;
            let removed = graph_utils::prune_dead_repeaters(&mut network);
            qflow_io::write_gml(&network, out)
                .with_context(|| format!("writing network to {}", out.display()))?;
            println!("Removed {removed} repeater(s); wrote {}", out.display());
            Ok(())
        }
    }
}
