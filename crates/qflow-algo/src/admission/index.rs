//! Dense positions for nodes and usable links.
//!
//! Variables and constraints are addressed by position, never by petgraph
//! index, so a model is independent of how the graph was assembled. The
//! maps are rebuilt on every formulation call.

use super::AdmissionError;
use petgraph::graph::DiGraph;
use qflow_core::{ClientId, EdgeIndex, NodeIndex, NodeKind, QuantumNetwork};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexMaps {
    nodes: Vec<NodeIndex>,
    node_pos: HashMap<NodeIndex, usize>,
    node_labels: Vec<String>,
    node_kinds: Vec<NodeKind>,
    edges: Vec<EdgeIndex>,
    edge_pos: HashMap<EdgeIndex, usize>,
    endpoints: Vec<(usize, usize)>,
    capacities: Vec<u64>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
    clients: HashMap<ClientId, usize>,
    generator: usize,
    skipped_links: usize,
}

impl IndexMaps {
    /// Number nodes in graph order and usable links in graph order.
    /// Zero-capacity links get no position. A client id carried by more
    /// than one node is rejected, since a demand could not tell them apart.
    pub fn build(network: &QuantumNetwork) -> Result<Self, AdmissionError> {
        let graph = &network.graph;
        if graph.node_count() == 0 {
            return Err(AdmissionError::EmptyNetwork);
        }
        let generators = network.generators();
        let generator_idx = match generators.as_slice() {
            [] => return Err(AdmissionError::MissingGenerator),
            [single] => *single,
            many => return Err(AdmissionError::MultipleGenerators(many.len())),
        };

        let nodes: Vec<NodeIndex> = graph.node_indices().collect();
        let node_pos: HashMap<NodeIndex, usize> =
            nodes.iter().enumerate().map(|(pos, &idx)| (idx, pos)).collect();
        let node_labels = nodes.iter().map(|&idx| graph[idx].label().to_string()).collect();
        let node_kinds = nodes.iter().map(|&idx| graph[idx].kind()).collect();
        let mut clients = HashMap::new();
        for (pos, &idx) in nodes.iter().enumerate() {
            if let Some(id) = graph[idx].client_id() {
                if clients.insert(id, pos).is_some() {
                    return Err(AdmissionError::DuplicateClient { client: id.value() });
                }
            }
        }

        let mut edges = Vec::new();
        let mut endpoints = Vec::new();
        let mut capacities = Vec::new();
        let mut incoming = vec![Vec::new(); nodes.len()];
        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut skipped_links = 0;
        for edge in graph.edge_indices() {
            let link = &graph[edge];
            if !link.is_usable() {
                skipped_links += 1;
                continue;
            }
            let Some((tail, head)) = graph.edge_endpoints(edge) else {
                continue;
            };
            let (u, w) = (node_pos[&tail], node_pos[&head]);
            let pos = edges.len();
            edges.push(edge);
            endpoints.push((u, w));
            capacities.push(link.capacity);
            outgoing[u].push(pos);
            incoming[w].push(pos);
        }
        let edge_pos = edges.iter().enumerate().map(|(pos, &idx)| (idx, pos)).collect();

        Ok(Self {
            generator: node_pos[&generator_idx],
            nodes,
            node_pos,
            node_labels,
            node_kinds,
            edges,
            edge_pos,
            endpoints,
            capacities,
            incoming,
            outgoing,
            clients,
            skipped_links,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, pos: usize) -> NodeIndex {
        self.nodes[pos]
    }

    pub fn node_position(&self, idx: NodeIndex) -> Option<usize> {
        self.node_pos.get(&idx).copied()
    }

    pub fn node_label(&self, pos: usize) -> &str {
        &self.node_labels[pos]
    }

    pub fn node_labels(&self) -> &[String] {
        &self.node_labels
    }

    pub fn node_kind(&self, pos: usize) -> NodeKind {
        self.node_kinds[pos]
    }

    pub fn edge(&self, pos: usize) -> EdgeIndex {
        self.edges[pos]
    }

    /// `None` for zero-capacity links and links not in the network.
    pub fn edge_position(&self, idx: EdgeIndex) -> Option<usize> {
        self.edge_pos.get(&idx).copied()
    }

    /// `(tail, head)` node positions.
    pub fn endpoints(&self, edge: usize) -> (usize, usize) {
        self.endpoints[edge]
    }

    pub fn capacity(&self, edge: usize) -> u64 {
        self.capacities[edge]
    }

    pub fn edge_label(&self, edge: usize) -> String {
        let (u, w) = self.endpoints[edge];
        format!("{}->{}", self.node_labels[u], self.node_labels[w])
    }

    pub fn incoming(&self, node: usize) -> &[usize] {
        &self.incoming[node]
    }

    pub fn outgoing(&self, node: usize) -> &[usize] {
        &self.outgoing[node]
    }

    pub fn generator(&self) -> usize {
        self.generator
    }

    pub fn client(&self, id: ClientId) -> Option<usize> {
        self.clients.get(&id).copied()
    }

    pub fn is_repeater(&self, node: usize) -> bool {
        self.node_kinds[node] == NodeKind::Repeater
    }

    pub fn skipped_links(&self) -> usize {
        self.skipped_links
    }

    /// Usable links only, with node `i` of the result at position `i` and
    /// each edge weighted by its position.
    pub fn usable_graph(&self) -> DiGraph<(), usize> {
        let mut g = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        for _ in 0..self.nodes.len() {
            g.add_node(());
        }
        for (pos, &(u, w)) in self.endpoints.iter().enumerate() {
            g.add_edge(NodeIndex::new(u), NodeIndex::new(w), pos);
        }
        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qflow_core::RepeaterId;

    #[test]
    fn test_zero_capacity_links_get_no_position() {
        let mut net = QuantumNetwork::new();
        let g = net.add_generator();
        let r = net.add_repeater(RepeaterId::new(0));
        let c = net.add_client(ClientId::new(0));
        let dead = net.add_link(g, r, 0);
        let live = net.add_link(r, c, 3);

        let maps = IndexMaps::build(&net).unwrap();
        assert_eq!(maps.num_nodes(), 3);
        assert_eq!(maps.num_edges(), 1);
        assert_eq!(maps.skipped_links(), 1);
        assert_eq!(maps.edge_position(dead), None);
        assert_eq!(maps.edge_position(live), Some(0));
        assert_eq!(maps.edge_label(0), "repeater_0->client_0");
        assert!(maps.outgoing(maps.generator()).is_empty());
        assert_eq!(maps.incoming(2), &[0]);
    }

    #[test]
    fn test_generator_count_is_checked() {
        assert!(matches!(
            IndexMaps::build(&QuantumNetwork::new()),
            Err(AdmissionError::EmptyNetwork)
        ));

        let mut net = QuantumNetwork::new();
        net.add_client(ClientId::new(0));
        assert!(matches!(
            IndexMaps::build(&net),
            Err(AdmissionError::MissingGenerator)
        ));

        net.add_generator();
        net.add_generator();
        assert!(matches!(
            IndexMaps::build(&net),
            Err(AdmissionError::MultipleGenerators(2))
        ));
    }

    #[test]
    fn test_repeated_client_id_is_rejected() {
        let mut net = QuantumNetwork::new();
        let g = net.add_generator();
        let r = net.add_repeater(RepeaterId::new(0));
        net.add_link(g, r, 10);
        for id in [0, 1, 0] {
            let c = net.add_client(ClientId::new(id));
            net.add_link(r, c, 5);
        }
        assert!(matches!(
            IndexMaps::build(&net),
            Err(AdmissionError::DuplicateClient { client: 0 })
        ));
    }

    #[test]
    fn test_usable_graph_mirrors_positions() {
        let mut net = QuantumNetwork::new();
        let g = net.add_generator();
        let c0 = net.add_client(ClientId::new(0));
        let c1 = net.add_client(ClientId::new(1));
        net.add_link(g, c0, 0);
        net.add_link(g, c1, 2);

        let maps = IndexMaps::build(&net).unwrap();
        let topo = maps.usable_graph();
        assert_eq!(topo.node_count(), 3);
        assert_eq!(topo.edge_count(), 1);
        let e = topo.find_edge(NodeIndex::new(0), NodeIndex::new(2)).unwrap();
        assert_eq!(topo[e], 0);
        assert_eq!(maps.client(ClientId::new(1)), Some(2));
        assert_eq!(maps.client(ClientId::new(7)), None);
    }
}
