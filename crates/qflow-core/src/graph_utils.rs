use crate::{NetworkError, NodeKind, QuantumNetwork};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashSet, VecDeque};

/// Summary statistics produced by `graph stats`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub usable_edge_count: usize,
    pub min_out_degree: usize,
    pub avg_out_degree: f64,
    pub max_out_degree: usize,
    pub density: f64,
    /// Clients reachable from the generator over usable links.
    pub reachable_clients: usize,
    pub dead_repeaters: usize,
}

/// Degree distribution, density (directed), and reachability counts.
pub fn graph_stats(network: &QuantumNetwork) -> GraphStats {
    let graph = &network.graph;
    let node_count = graph.node_count();
    let edge_count = graph.edge_count();
    let usable_edge_count = graph.edge_weights().filter(|l| l.is_usable()).count();
    let degrees: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.edges_directed(n, Direction::Outgoing).count())
        .collect();
    let min_out_degree = degrees.iter().copied().min().unwrap_or(0);
    let max_out_degree = degrees.iter().copied().max().unwrap_or(0);
    let avg_out_degree = if node_count == 0 {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / node_count as f64
    };
    let density = if node_count < 2 {
        0.0
    } else {
        edge_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
    };
    GraphStats {
        node_count,
        edge_count,
        usable_edge_count,
        min_out_degree,
        avg_out_degree,
        max_out_degree,
        density,
        reachable_clients: reachable_clients(network).len(),
        dead_repeaters: dead_repeaters(network).len(),
    }
}

/// Client nodes reachable from the generator following usable links.
pub fn reachable_clients(network: &QuantumNetwork) -> Vec<petgraph::graph::NodeIndex> {
    let Some(start) = network.generator() else {
        return Vec::new();
    };
    let graph = &network.graph;
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        if !visited.insert(node) {
            continue;
        }
        for edge in graph.edges_directed(node, Direction::Outgoing) {
            if edge.weight().is_usable() && !visited.contains(&edge.target()) {
                queue.push_back(edge.target());
            }
        }
    }
    let mut clients: Vec<_> = visited
        .into_iter()
        .filter(|&n| graph[n].kind() == NodeKind::Client)
        .collect();
    clients.sort();
    clients
}

/// Repeaters with no directed path of usable links to any client.
///
/// Walks backwards from every client; whatever repeater is never reached
/// cannot deliver pairs anywhere.
pub fn dead_repeaters(network: &QuantumNetwork) -> Vec<petgraph::graph::NodeIndex> {
    let graph = &network.graph;
    let mut alive = HashSet::new();
    let mut queue: VecDeque<_> = network.clients().into_iter().collect();
    while let Some(node) = queue.pop_front() {
        if !alive.insert(node) {
            continue;
        }
        for edge in graph.edges_directed(node, Direction::Incoming) {
            if edge.weight().is_usable() && !alive.contains(&edge.source()) {
                queue.push_back(edge.source());
            }
        }
    }
    network
        .repeaters()
        .into_iter()
        .filter(|n| !alive.contains(n))
        .collect()
}

/// Remove dead repeaters (and their links). Returns how many were removed.
///
/// Node indices are rebuilt, so any index taken before the call is stale.
pub fn prune_dead_repeaters(network: &mut QuantumNetwork) -> usize {
    let dead: HashSet<_> = dead_repeaters(network).into_iter().collect();
    if dead.is_empty() {
        return 0;
    }
    network.graph = network.graph.filter_map(
        |idx, node| (!dead.contains(&idx)).then(|| node.clone()),
        |_, link| Some(*link),
    );
    dead.len()
}

/// Export the topology to DOT (Graphviz) with capacities as edge labels.
pub fn export_graph(network: &QuantumNetwork, format: &str) -> Result<String, NetworkError> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(network)),
        other => Err(NetworkError::UnsupportedExportFormat(other.to_string())),
    }
}

fn render_dot(network: &QuantumNetwork) -> String {
    let mut buffer = String::new();
    buffer.push_str("digraph qflow_network {\n");
    for node in network.graph.node_indices() {
        let weight = &network.graph[node];
        let shape = match weight.kind() {
            NodeKind::Generator => "doublecircle",
            NodeKind::Repeater => "circle",
            NodeKind::Client => "box",
        };
        buffer.push_str(&format!(
            "  n{} [label=\"{}\", shape={}];\n",
            node.index(),
            sanitize_label(weight.label()),
            shape
        ));
    }
    for edge in network.graph.edge_references() {
        buffer.push_str(&format!(
            "  n{} -> n{} [label=\"{}\"];\n",
            edge.source().index(),
            edge.target().index(),
            edge.weight().capacity
        ));
    }
    buffer.push('}');
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientId, RepeaterId};

    /// generator -> r0 -> c0, generator -> r1 (dead end), r2 -> r1
    fn network_with_dead_ends() -> QuantumNetwork {
        let mut network = QuantumNetwork::new();
        let gen = network.add_generator();
        let r0 = network.add_repeater(RepeaterId::new(0));
        let r1 = network.add_repeater(RepeaterId::new(1));
        let r2 = network.add_repeater(RepeaterId::new(2));
        let c0 = network.add_client(ClientId::new(0));
        network.add_link(gen, r0, 4);
        network.add_link(r0, c0, 4);
        network.add_link(gen, r1, 4);
        network.add_link(r2, r1, 4);
        network
    }

    #[test]
    fn test_dead_repeaters_detected() {
        let network = network_with_dead_ends();
        let labels: Vec<&str> = dead_repeaters(&network)
            .into_iter()
            .map(|n| network.graph[n].label())
            .collect();
        assert_eq!(labels, vec!["repeater_1", "repeater_2"]);
    }

    #[test]
    fn test_prune_removes_dead_repeaters_and_links() {
        let mut network = network_with_dead_ends();
        assert_eq!(prune_dead_repeaters(&mut network), 2);
        assert_eq!(network.graph.node_count(), 3);
        assert_eq!(network.graph.edge_count(), 2);
        assert!(network.node_by_label("repeater_0").is_some());
        assert!(network.node_by_label("repeater_1").is_none());
        assert_eq!(prune_dead_repeaters(&mut network), 0);
    }

    #[test]
    fn test_zero_capacity_link_does_not_keep_repeater_alive() {
        let mut network = QuantumNetwork::new();
        let gen = network.add_generator();
        let r0 = network.add_repeater(RepeaterId::new(0));
        let c0 = network.add_client(ClientId::new(0));
        network.add_link(gen, r0, 3);
        network.add_link(r0, c0, 0);
        assert_eq!(dead_repeaters(&network).len(), 1);
        assert!(reachable_clients(&network).is_empty());
    }

    #[test]
    fn test_graph_stats() {
        let stats = graph_stats(&network_with_dead_ends());
        assert_eq!(stats.node_count, 5);
        assert_eq!(stats.edge_count, 4);
        assert_eq!(stats.max_out_degree, 2);
        assert_eq!(stats.reachable_clients, 1);
        assert_eq!(stats.dead_repeaters, 2);
    }

    #[test]
    fn test_export_dot() {
        let dot = export_graph(&network_with_dead_ends(), "dot").unwrap();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("n0 -> n1 [label=\"4\"]"));
        assert_eq!(
            export_graph(&network_with_dead_ends(), "svg"),
            Err(NetworkError::UnsupportedExportFormat("svg".into()))
        );
    }
}
