use super::{
    validate_demands, AdmissionError, AdmissionModel, DemandEnd, Formulation, IndexMaps,
    PathLayout, PathVar, VariableLayout,
};
use crate::lp::{Comparison, LinearExpr, LinearProgram, ProblemClass, Sense, VarDecl};
use petgraph::algo::all_simple_paths;
use petgraph::graph::NodeIndex;
use qflow_core::{Demand, QuantumNetwork};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Candidate paths per demand end before formulation gives up.
pub const DEFAULT_MAX_PATHS: usize = 10_000;

/// One integer flow per simple generator→client path within the hop budget.
///
/// Exponential in network size. Useful as an independent check of the edge
/// formulation on small networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathFormulation {
    pub max_paths: usize,
}

impl PathFormulation {
    pub fn new(max_paths: usize) -> Self {
        Self { max_paths }
    }
}

impl Default for PathFormulation {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PATHS)
    }
}

/// Edge positions of every simple path from `from` to `to` using at most
/// `hops` links, or `None` once more than `limit` are found.
///
/// Parallel links between the same two nodes give distinct paths, one per
/// link, so each keeps its own capacity.
fn enumerate_paths(
    topo: &petgraph::graph::DiGraph<(), usize>,
    from: usize,
    to: usize,
    hops: usize,
    limit: usize,
) -> Option<Vec<Vec<usize>>> {
    if hops == 0 || from == to {
        return Some(Vec::new());
    }
    let mut out = Vec::new();
    // all_simple_paths repeats a node sequence once per parallel link
    let mut seen = HashSet::new();
    let paths = all_simple_paths::<Vec<NodeIndex>, _>(
        topo,
        NodeIndex::new(from),
        NodeIndex::new(to),
        0,
        Some(hops - 1),
    );
    for nodes in paths {
        if !seen.insert(nodes.clone()) {
            continue;
        }
        let mut expanded: Vec<Vec<usize>> = vec![Vec::new()];
        for pair in nodes.windows(2) {
            let mut parallel: Vec<usize> = topo
                .edges_connecting(pair[0], pair[1])
                .map(|e| *e.weight())
                .collect();
            parallel.sort_unstable();
            expanded = expanded
                .into_iter()
                .flat_map(|prefix| {
                    parallel.iter().map(move |&edge| {
                        let mut path = prefix.clone();
                        path.push(edge);
                        path
                    })
                })
                .collect();
        }
        for edges in expanded {
            if out.len() == limit {
                return None;
            }
            out.push(edges);
        }
    }
    Some(out)
}

impl Formulation for PathFormulation {
    fn id(&self) -> &str {
        "path"
    }

    fn problem_class(&self) -> ProblemClass {
        ProblemClass::MixedInteger
    }

    fn formulate(
        &self,
        network: &QuantumNetwork,
        demands: &[Demand],
    ) -> Result<AdmissionModel, AdmissionError> {
        let maps = IndexMaps::build(network)?;
        validate_demands(&maps, demands)?;
        if maps.skipped_links() > 0 {
            warn!(
                links = maps.skipped_links(),
                "zero-capacity links left out of the model"
            );
        }
        let topo = maps.usable_graph();
        let mut program = LinearProgram::new(Sense::Maximize);

        let admit: Vec<_> = (0..demands.len())
            .map(|j| program.add_variable(VarDecl::binary(format!("admit[{j}]"))))
            .collect();

        let mut paths: Vec<Vec<PathVar>> = Vec::with_capacity(demands.len());
        for (j, demand) in demands.iter().enumerate() {
            let mut row = Vec::new();
            for (end, client) in [
                (DemandEnd::Source, demand.source),
                (DemandEnd::Destination, demand.destination),
            ] {
                let node = maps.client(client).ok_or(AdmissionError::UnknownClient {
                    demand: j,
                    client: client.value(),
                })?;
                let found = enumerate_paths(
                    &topo,
                    maps.generator(),
                    node,
                    demand.hop_budget(),
                    self.max_paths,
                )
                .ok_or(AdmissionError::PathLimitExceeded {
                    demand: j,
                    client: client.value(),
                    limit: self.max_paths,
                })?;
                for (k, edges) in found.into_iter().enumerate() {
                    let bottleneck = edges
                        .iter()
                        .map(|&e| maps.capacity(e))
                        .min()
                        .unwrap_or(0);
                    let var = program.add_variable(
                        VarDecl::integer(format!("path_flow[{j},{},{k}]", end.tag()))
                            .with_upper(bottleneck as f64),
                    );
                    row.push(PathVar { var, end, edges });
                }
            }
            paths.push(row);
        }

        program.set_objective(admit.iter().map(|&a| (a, 1.0)).collect());

        let mut by_edge: Vec<LinearExpr> = vec![LinearExpr::new(); maps.num_edges()];
        for path in paths.iter().flatten() {
            for &e in &path.edges {
                by_edge[e].add_term(path.var, 1.0);
            }
        }
        for (e, lhs) in by_edge.into_iter().enumerate() {
            program.add_constraint(
                format!("superimposed_flow_{e}"),
                lhs,
                Comparison::Le,
                maps.capacity(e) as f64,
            );
        }

        for (j, demand) in demands.iter().enumerate() {
            for end in [DemandEnd::Source, DemandEnd::Destination] {
                let mut lhs: LinearExpr = paths[j]
                    .iter()
                    .filter(|p| p.end == end)
                    .map(|p| (p.var, 1.0))
                    .collect();
                lhs.add_term(admit[j], -(demand.quantity as f64));
                program.add_constraint(
                    format!("admission_{}_{j}", end.tag()),
                    lhs,
                    Comparison::Eq,
                    0.0,
                );
            }
        }

        debug!(
            formulation = self.id(),
            demands = demands.len(),
            paths = paths.iter().map(Vec::len).sum::<usize>(),
            variables = program.num_variables(),
            constraints = program.num_constraints(),
            "formulated admission model"
        );

        Ok(AdmissionModel {
            formulation: self.id().to_string(),
            program,
            layout: VariableLayout::Path(PathLayout { admit, paths }),
            maps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qflow_core::{ClientId, RepeaterId};

    fn chain() -> QuantumNetwork {
        let mut net = QuantumNetwork::new();
        let g = net.add_generator();
        let r0 = net.add_repeater(RepeaterId::new(0));
        let r1 = net.add_repeater(RepeaterId::new(1));
        let c0 = net.add_client(ClientId::new(0));
        let c1 = net.add_client(ClientId::new(1));
        net.add_link(g, r0, 10);
        net.add_link(r0, c0, 5);
        net.add_link(r0, r1, 5);
        net.add_link(r1, c1, 4);
        net
    }

    fn layout(model: &AdmissionModel) -> &PathLayout {
        match &model.layout {
            VariableLayout::Path(layout) => layout,
            VariableLayout::Edge(_) => panic!("path layout expected"),
        }
    }

    #[test]
    fn test_one_variable_per_path_end() {
        let demands = [Demand::new(ClientId::new(0), ClientId::new(1), 4, 3.0)];
        let model = PathFormulation::default().formulate(&chain(), &demands).unwrap();
        let paths = &layout(&model).paths[0];
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].end, DemandEnd::Source);
        assert_eq!(paths[0].edges, vec![0, 1]);
        assert_eq!(paths[1].end, DemandEnd::Destination);
        assert_eq!(paths[1].edges, vec![0, 2, 3]);
        // bottleneck of generator -> r0 -> r1 -> c1
        assert_eq!(model.program.variable(paths[1].var).upper, Some(4.0));
        assert_eq!(model.program.variable(paths[1].var).name, "path_flow[0,dst,0]");
    }

    #[test]
    fn test_hop_budget_prunes_long_paths() {
        let demands = [Demand::new(ClientId::new(0), ClientId::new(1), 1, 2.5)];
        let model = PathFormulation::default().formulate(&chain(), &demands).unwrap();
        let paths = &layout(&model).paths[0];
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].end, DemandEnd::Source);
        // no destination paths: the row reduces to -qty * admit = 0
        let dst = model
            .program
            .constraints()
            .iter()
            .find(|c| c.name == "admission_dst_0")
            .unwrap();
        assert_eq!(dst.lhs.terms().len(), 1);
    }

    #[test]
    fn test_parallel_links_give_separate_paths() {
        let mut net = QuantumNetwork::new();
        let g = net.add_generator();
        let r0 = net.add_repeater(RepeaterId::new(0));
        let c0 = net.add_client(ClientId::new(0));
        let c1 = net.add_client(ClientId::new(1));
        net.add_link(g, r0, 3);
        net.add_link(g, r0, 4);
        net.add_link(r0, c0, 5);
        net.add_link(r0, c1, 5);

        let demands = [Demand::new(ClientId::new(0), ClientId::new(1), 3, 2.0)];
        let model = PathFormulation::default().formulate(&net, &demands).unwrap();
        let paths = &layout(&model).paths[0];
        let src: Vec<&Vec<usize>> = paths
            .iter()
            .filter(|p| p.end == DemandEnd::Source)
            .map(|p| &p.edges)
            .collect();
        assert_eq!(src, vec![&vec![0, 2], &vec![1, 2]]);
        let bounds: Vec<Option<f64>> = paths
            .iter()
            .filter(|p| p.end == DemandEnd::Source)
            .map(|p| model.program.variable(p.var).upper)
            .collect();
        assert_eq!(bounds, vec![Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_path_limit() {
        let mut net = QuantumNetwork::new();
        let g = net.add_generator();
        let c = net.add_client(ClientId::new(0));
        for i in 0..3 {
            let r = net.add_repeater(RepeaterId::new(i));
            net.add_link(g, r, 1);
            net.add_link(r, c, 1);
        }
        let demands = [Demand::new(ClientId::new(0), ClientId::new(0), 1, 2.0)];
        let err = PathFormulation::new(2).formulate(&net, &demands).unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::PathLimitExceeded {
                demand: 0,
                client: 0,
                limit: 2
            }
        ));
        assert!(PathFormulation::new(3).formulate(&net, &demands).is_ok());
    }
}
