//! File-based tests for the GML, demand, and report writers.

use qflow_core::{ClientId, Demand, QuantumNetwork, RepeaterId};
use qflow_io::{read_demands, read_gml, write_demands, write_gml, write_report};
use tempfile::tempdir;

fn chain_network() -> QuantumNetwork {
    let mut network = QuantumNetwork::new();
    let gen = network.add_generator();
    let r0 = network.add_repeater(RepeaterId::new(0));
    let r1 = network.add_repeater(RepeaterId::new(1));
    let c0 = network.add_client(ClientId::new(0));
    let c1 = network.add_client(ClientId::new(1));
    network.add_link(gen, r0, 10);
    network.add_link(r0, c0, 5);
    network.add_link(r0, r1, 5);
    network.add_link(r1, c1, 4);
    network
}

#[test]
fn gml_file_preserves_kinds_and_capacities() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("network.gml");
    let network = chain_network();
    write_gml(&network, &path).unwrap();

    let loaded = read_gml(&path).unwrap();
    assert_eq!(loaded.stats(), network.stats());
    let r1 = loaded.node_by_label("repeater_1").unwrap();
    let c1 = loaded.client_node(ClientId::new(1)).unwrap();
    let link = loaded.graph.find_edge(r1, c1).expect("r1 -> c1 link");
    assert_eq!(loaded.graph[link].capacity, 4);
}

#[test]
fn missing_gml_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = read_gml(dir.path().join("absent.gml")).unwrap_err();
    assert!(err.to_string().contains("absent.gml"));
}

#[test]
fn demand_files_keep_order_in_both_formats() {
    let dir = tempdir().unwrap();
    let demands = vec![
        Demand::new(ClientId::new(1), ClientId::new(0), 3, 4.0),
        Demand::new(ClientId::new(0), ClientId::new(1), 4, 3.0),
    ];
    for name in ["demands.json", "demands.csv"] {
        let path = dir.path().join(name);
        write_demands(&demands, &path).unwrap();
        assert_eq!(read_demands(&path).unwrap(), demands, "format {name}");
    }
}

#[test]
fn report_file_ends_with_objective() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("solution.txt");
    write_report(&path, vec![("admit[0]", 0.0)], 0.0).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().last(), Some("Objective value: 0.0"));
}
