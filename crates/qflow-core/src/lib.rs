//! # qflow-core: Hierarchical Quantum Network Model
//!
//! Provides the data structures shared by every qflow crate: the three-tier
//! network graph and the demand list that is routed over it.
//!
//! ## Design Philosophy
//!
//! Networks are modeled as **directed graphs** where:
//! - **Nodes**: exactly one Generator, any number of Repeaters, and Clients
//! - **Edges**: capacitated links carrying entangled pairs downstream
//!
//! ```text
//!   generator ──► repeater_0 ──► repeater_1 ──► client_1
//!                     │
//!                     └────────► client_0
//! ```
//!
//! Flow only ever moves generator → repeaters → clients. Clients are pure
//! sinks and the generator is a pure source.
//!
//! ## Quick Start
//!
//! ```rust
//! use qflow_core::*;
//!
//! let mut network = QuantumNetwork::new();
//! let gen = network.add_generator();
//! let r0 = network.add_repeater(RepeaterId::new(0));
//! let c0 = network.add_client(ClientId::new(0));
//! network.add_link(gen, r0, 10);
//! network.add_link(r0, c0, 5);
//!
//! let demand = Demand::new(ClientId::new(0), ClientId::new(0), 4, 3.0);
//! assert_eq!(network.stats().num_clients, 1);
//! assert_eq!(demand.hop_budget(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`demand`] - Demand tuples and their validation
//! - [`diagnostics`] - Validation and diagnostic reporting
//! - [`graph_utils`] - Topological helpers (stats, pruning, DOT export)
//! - [`error`] - Errors raised by the network model

use petgraph::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub mod demand;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;

pub use demand::{validate_demands_into, Demand};
pub use diagnostics::{Category, Diagnostics, Issue, Severity};
pub use error::NetworkError;
pub use graph_utils::*;
pub use petgraph::graph::{EdgeIndex, NodeIndex};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepeaterId(usize);

impl ClientId {
    pub fn new(value: usize) -> Self {
        ClientId(value)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl RepeaterId {
    pub fn new(value: usize) -> Self {
        RepeaterId(value)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client_{}", self.0)
    }
}

impl fmt::Display for RepeaterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repeater_{}", self.0)
    }
}

/// Label used for the single entanglement source.
pub const GENERATOR_LABEL: &str = "generator";

/// Node tier in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Generator,
    Repeater,
    Client,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Generator => "generator",
            NodeKind::Repeater => "repeater",
            NodeKind::Client => "client",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generator" => Ok(NodeKind::Generator),
            "repeater" => Ok(NodeKind::Repeater),
            "client" => Ok(NodeKind::Client),
            other => Err(NetworkError::UnknownNodeKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            name: GENERATOR_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repeater {
    pub id: RepeaterId,
    pub name: String,
}

impl Repeater {
    pub fn new(id: RepeaterId) -> Self {
        Self {
            id,
            name: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
}

impl Client {
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            name: id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Generator(Generator),
    Repeater(Repeater),
    Client(Client),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Generator(_) => NodeKind::Generator,
            Node::Repeater(_) => NodeKind::Repeater,
            Node::Client(_) => NodeKind::Client,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Node::Generator(g) => &g.name,
            Node::Repeater(r) => &r.name,
            Node::Client(c) => &c.name,
        }
    }

    pub fn client_id(&self) -> Option<ClientId> {
        match self {
            Node::Client(c) => Some(c.id),
            _ => None,
        }
    }

    pub fn is_repeater(&self) -> bool {
        matches!(self, Node::Repeater(_))
    }
}

/// A directed link with an integral pair capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub capacity: u64,
}

impl Link {
    pub fn new(capacity: u64) -> Self {
        Self { capacity }
    }

    /// Zero-capacity links are kept in the graph but never carry flow.
    pub fn is_usable(&self) -> bool {
        self.capacity > 0
    }
}

/// The hierarchical quantum network graph
#[derive(Debug, Clone, Default)]
pub struct QuantumNetwork {
    pub graph: DiGraph<Node, Link>,
}

impl QuantumNetwork {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        self.graph.add_node(node)
    }

    pub fn add_generator(&mut self) -> NodeIndex {
        self.add_node(Node::Generator(Generator::default()))
    }

    pub fn add_repeater(&mut self, id: RepeaterId) -> NodeIndex {
        self.add_node(Node::Repeater(Repeater::new(id)))
    }

    pub fn add_client(&mut self, id: ClientId) -> NodeIndex {
        self.add_node(Node::Client(Client::new(id)))
    }

    pub fn add_link(&mut self, from: NodeIndex, to: NodeIndex, capacity: u64) -> EdgeIndex {
        self.graph.add_edge(from, to, Link::new(capacity))
    }

    /// All generator nodes. A well-formed network has exactly one.
    pub fn generators(&self) -> Vec<NodeIndex> {
        self.nodes_of_kind(NodeKind::Generator)
    }

    pub fn generator(&self) -> Option<NodeIndex> {
        self.generators().into_iter().next()
    }

    pub fn repeaters(&self) -> Vec<NodeIndex> {
        self.nodes_of_kind(NodeKind::Repeater)
    }

    pub fn clients(&self) -> Vec<NodeIndex> {
        self.nodes_of_kind(NodeKind::Client)
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].kind() == kind)
            .collect()
    }

    /// Look up the node carrying a client id.
    pub fn client_node(&self, id: ClientId) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].client_id() == Some(id))
    }

    pub fn node_by_label(&self, label: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].label() == label)
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();

        for node in self.graph.node_weights() {
            match node {
                Node::Generator(_) => stats.num_generators += 1,
                Node::Repeater(_) => stats.num_repeaters += 1,
                Node::Client(_) => stats.num_clients += 1,
            }
        }

        for link in self.graph.edge_weights() {
            stats.num_links += 1;
            stats.total_capacity += link.capacity;
            if !link.is_usable() {
                stats.zero_capacity_links += 1;
            }
        }
        stats
    }

    /// Validate the network structure for issues that make formulation impossible.
    ///
    /// Populates the provided `Diagnostics` with any warnings/errors found.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if self.graph.node_count() == 0 {
            diag.error(Category::Structure, "Network has no nodes");
            return;
        }

        match stats.num_generators {
            0 => diag.error(Category::Structure, "Network has no generator"),
            1 => {}
            n => diag.error(
                Category::Structure,
                format!("Network has {n} generators, expected exactly one"),
            ),
        }

        if stats.num_clients == 0 {
            diag.error(Category::Structure, "Network has no clients");
        }

        if stats.zero_capacity_links > 0 {
            diag.warning(
                Category::Capacity,
                format!(
                    "{} link(s) have zero capacity and will be ignored",
                    stats.zero_capacity_links
                ),
            );
        }

        let mut client_uses: HashMap<ClientId, usize> = HashMap::new();
        for node in self.graph.node_weights() {
            if let Some(id) = node.client_id() {
                *client_uses.entry(id).or_default() += 1;
            }
        }
        let mut duplicated: Vec<_> = client_uses.into_iter().filter(|&(_, n)| n > 1).collect();
        duplicated.sort();
        for (id, n) in duplicated {
            diag.error_on(
                Category::Reference,
                id.to_string(),
                format!("Client id {} is used by {n} nodes", id.value()),
            );
        }

        let mut seen = HashSet::new();
        for node in self.graph.node_weights() {
            if node.client_id().is_none() && !seen.insert(node.label()) {
                diag.error_on(Category::Reference, node.label(), "Duplicate node label");
            }
        }

        for edge in self.graph.edge_references() {
            let source = &self.graph[edge.source()];
            let target = &self.graph[edge.target()];
            let link = format!("{} -> {}", source.label(), target.label());
            if edge.source() == edge.target() {
                diag.warning_on(Category::Topology, link.as_str(), "Self-loop link");
            }
            if target.kind() == NodeKind::Generator {
                diag.warning_on(Category::Topology, link.as_str(), "Link enters the generator");
            }
            if source.kind() == NodeKind::Client {
                diag.warning_on(Category::Topology, link.as_str(), "Link leaves a client");
            }
        }

        for idx in graph_utils::dead_repeaters(self) {
            diag.warning_on(
                Category::Topology,
                self.graph[idx].label(),
                "Repeater has no path to any client",
            );
        }
    }
}

/// Network statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub num_generators: usize,
    pub num_repeaters: usize,
    pub num_clients: usize,
    pub num_links: usize,
    pub zero_capacity_links: usize,
    pub total_capacity: u64,
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} generator(s), {} repeaters, {} clients, {} links (total capacity {})",
            self.num_generators,
            self.num_repeaters,
            self.num_clients,
            self.num_links,
            self.total_capacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_network() -> QuantumNetwork {
        let mut network = QuantumNetwork::new();
        let gen = network.add_generator();
        let r0 = network.add_repeater(RepeaterId::new(0));
        let c0 = network.add_client(ClientId::new(0));
        network.add_link(gen, r0, 10);
        network.add_link(r0, c0, 0);
        network
    }

    #[test]
    fn test_labels_follow_kind() {
        let network = small_network();
        let labels: Vec<&str> = network.graph.node_weights().map(|n| n.label()).collect();
        assert_eq!(labels, vec!["generator", "repeater_0", "client_0"]);
    }

    #[test]
    fn test_client_lookup() {
        let network = small_network();
        let idx = network.client_node(ClientId::new(0)).unwrap();
        assert_eq!(network.graph[idx].label(), "client_0");
        assert!(network.client_node(ClientId::new(7)).is_none());
    }

    #[test]
    fn test_stats_counts_zero_capacity() {
        let stats = small_network().stats();
        assert_eq!(stats.num_generators, 1);
        assert_eq!(stats.num_repeaters, 1);
        assert_eq!(stats.num_clients, 1);
        assert_eq!(stats.num_links, 2);
        assert_eq!(stats.zero_capacity_links, 1);
        assert_eq!(stats.total_capacity, 10);
    }

    #[test]
    fn test_validate_reports_missing_generator() {
        let mut network = QuantumNetwork::new();
        network.add_client(ClientId::new(0));
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag.has_errors());
        assert!(diag
            .errors()
            .any(|i| i.category == Category::Structure && i.message.contains("no generator")));
    }

    #[test]
    fn test_validate_warns_on_zero_capacity() {
        let mut diag = Diagnostics::new();
        small_network().validate_into(&mut diag);
        assert!(!diag.has_errors());
        assert!(diag.warning_count() >= 1);
    }

    #[test]
    fn test_node_kind_parse() {
        assert_eq!("Repeater".parse::<NodeKind>().unwrap(), NodeKind::Repeater);
        assert_eq!(
            "switch".parse::<NodeKind>(),
            Err(NetworkError::UnknownNodeKind("switch".into()))
        );
    }

    #[test]
    fn test_duplicate_client_reported_by_validation() {
        let mut network = small_network();
        let r0 = network.node_by_label("repeater_0").unwrap();
        let again = network.add_client(ClientId::new(0));
        network.add_link(r0, again, 5);

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        let errors: Vec<&Issue> = diag.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category, Category::Reference);
        assert_eq!(errors[0].subject.as_deref(), Some("client_0"));
    }
}
