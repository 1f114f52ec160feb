use super::{
    validate_demands, AdmissionError, AdmissionModel, EdgeLayout, Formulation, IndexMaps,
    VariableLayout,
};
use crate::lp::{Comparison, LinearExpr, LinearProgram, ProblemClass, Sense, VarDecl};
use qflow_core::{Demand, QuantumNetwork};
use tracing::{debug, warn};

/// Per-demand flows on every usable link, with potentials bounding hops.
///
/// `relaxed` swaps every binary and integer domain for its continuous
/// interval and leaves the rows untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFormulation {
    pub relaxed: bool,
}

impl EdgeFormulation {
    pub fn exact() -> Self {
        Self { relaxed: false }
    }

    pub fn relaxed() -> Self {
        Self { relaxed: true }
    }

    fn indicator(&self, name: String) -> VarDecl {
        if self.relaxed {
            VarDecl::continuous(name).with_upper(1.0)
        } else {
            VarDecl::binary(name)
        }
    }

    fn flow(&self, name: String, capacity: u64) -> VarDecl {
        let decl = if self.relaxed {
            VarDecl::continuous(name)
        } else {
            VarDecl::integer(name)
        };
        decl.with_upper(capacity as f64)
    }
}

impl Formulation for EdgeFormulation {
    fn id(&self) -> &str {
        if self.relaxed {
            "relaxed"
        } else {
            "exact"
        }
    }

    fn problem_class(&self) -> ProblemClass {
        if self.relaxed {
            ProblemClass::LinearProgram
        } else {
            ProblemClass::MixedInteger
        }
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

        let n_nodes = maps.num_nodes();
        let n_edges = maps.num_edges();
        let mut program = LinearProgram::new(Sense::Maximize);

        let admit: Vec<_> = (0..demands.len())
            .map(|j| program.add_variable(self.indicator(format!("admit[{j}]"))))
            .collect();
        let mut flow = Vec::with_capacity(demands.len());
        for j in 0..demands.len() {
            let row: Vec<_> = (0..n_edges)
                .map(|e| program.add_variable(self.flow(format!("flow[{j},{e}]"), maps.capacity(e))))
                .collect();
            flow.push(row);
        }
        let mut gate = Vec::with_capacity(demands.len());
        for j in 0..demands.len() {
            let row: Vec<_> = (0..n_edges)
                .map(|e| program.add_variable(self.indicator(format!("gate[{j},{e}]"))))
                .collect();
            gate.push(row);
        }
        let mut potential = Vec::with_capacity(demands.len());
        for j in 0..demands.len() {
            let row: Vec<_> = (0..n_nodes)
                .map(|v| program.add_variable(VarDecl::continuous(format!("potential[{j},{v}]"))))
                .collect();
            potential.push(row);
        }

        program.set_objective(admit.iter().map(|&a| (a, 1.0)).collect());

        for e in 0..n_edges {
            let lhs: LinearExpr = flow.iter().map(|row| (row[e], 1.0)).collect();
            program.add_constraint(
                format!("superimposed_flow_{e}"),
                lhs,
                Comparison::Le,
                maps.capacity(e) as f64,
            );
        }

        for v in (0..n_nodes).filter(|&v| maps.is_repeater(v)) {
            for (j, row) in flow.iter().enumerate() {
                let mut lhs = LinearExpr::new();
                for &e in maps.incoming(v) {
                    lhs.add_term(row[e], 1.0);
                }
                for &e in maps.outgoing(v) {
                    lhs.add_term(row[e], -1.0);
                }
                program.add_constraint(
                    format!("flow_conservation_{v}_{j}"),
                    lhs,
                    Comparison::Eq,
                    0.0,
                );
            }
        }

        for e in 0..n_edges {
            let cap = maps.capacity(e) as f64;
            for j in 0..demands.len() {
                program.add_constraint(
                    format!("flow_capacity_{e}_{j}"),
                    LinearExpr::new().term(flow[j][e], 1.0).term(gate[j][e], -cap),
                    Comparison::Le,
                    0.0,
                );
            }
        }

        for (j, demand) in demands.iter().enumerate() {
            let qty = demand.quantity as f64;
            for (tag, client) in [("src", demand.source), ("dst", demand.destination)] {
                let node = maps
                    .client(client)
                    .ok_or(AdmissionError::UnknownClient {
                        demand: j,
                        client: client.value(),
                    })?;
                let mut lhs = LinearExpr::new();
                for &e in maps.incoming(node) {
                    lhs.add_term(flow[j][e], 1.0);
                }
                lhs.add_term(admit[j], -qty);
                program.add_constraint(format!("admission_{tag}_{j}"), lhs, Comparison::Eq, 0.0);
            }
        }

        for (j, demand) in demands.iter().enumerate() {
            let endpoints = [maps.client(demand.source), maps.client(demand.destination)];
            for v in 0..n_nodes {
                let p = potential[j][v];
                if v == maps.generator() {
                    program.add_constraint(
                        format!("potential_generator_{j}_{v}"),
                        LinearExpr::from(p),
                        Comparison::Eq,
                        0.0,
                    );
                } else if endpoints.contains(&Some(v)) {
                    program.add_constraint(
                        format!("potential_client_{j}_{v}"),
                        LinearExpr::from(p),
                        Comparison::Le,
                        demand.threshold,
                    );
                }
            }
            for e in 0..n_edges {
                let (u, w) = maps.endpoints(e);
                program.add_constraint(
                    format!("potential_difference_{j}_{e}"),
                    LinearExpr::new()
                        .term(potential[j][w], 1.0)
                        .term(potential[j][u], -1.0)
                        .term(gate[j][e], -1.0),
                    Comparison::Ge,
                    0.0,
                );
            }
        }

        debug!(
            formulation = self.id(),
            demands = demands.len(),
            links = n_edges,
            variables = program.num_variables(),
            constraints = program.num_constraints(),
            "formulated admission model"
        );

        Ok(AdmissionModel {
            formulation: self.id().to_string(),
            program,
            layout: VariableLayout::Edge(EdgeLayout {
                admit,
                flow,
                gate,
                potential,
            }),
            maps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::VarDomain;
    use qflow_core::{ClientId, RepeaterId};

    /// generator -> r0 (10), r0 -> c0 (5), r0 -> r1 (5), r1 -> c1 (4)
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

    fn one_demand() -> Vec<Demand> {
        vec![Demand::new(ClientId::new(0), ClientId::new(1), 4, 3.0)]
    }

    fn names(program: &LinearProgram) -> Vec<&str> {
        program.constraints().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_model_size() {
        let model = EdgeFormulation::exact().formulate(&chain(), &one_demand()).unwrap();
        // 1 admit + 4 flow + 4 gate + 5 potential
        assert_eq!(model.program.num_variables(), 14);
        // 4 superimposed + 2 conservation + 4 gating + 2 admission
        // + 1 generator + 2 client + 4 potential difference
        assert_eq!(model.program.num_constraints(), 19);
        assert_eq!(model.program.problem_class(), ProblemClass::MixedInteger);
    }

    #[test]
    fn test_variable_names_and_domains() {
        let model = EdgeFormulation::exact().formulate(&chain(), &one_demand()).unwrap();
        let VariableLayout::Edge(layout) = &model.layout else {
            panic!("edge layout expected");
        };
        let admit = model.program.variable(layout.admit[0]);
        assert_eq!(admit.name, "admit[0]");
        assert_eq!(admit.domain, VarDomain::Binary);

        let flow = model.program.variable(layout.flow[0][3]);
        assert_eq!(flow.name, "flow[0,3]");
        assert_eq!(flow.domain, VarDomain::Integer);
        assert_eq!(flow.upper, Some(4.0));

        assert_eq!(model.program.variable(layout.gate[0][1]).name, "gate[0,1]");
        assert_eq!(
            model.program.variable(layout.potential[0][4]).name,
            "potential[0,4]"
        );
    }

    #[test]
    fn test_admission_rows_are_linear_in_admit() {
        let model = EdgeFormulation::exact().formulate(&chain(), &one_demand()).unwrap();
        let VariableLayout::Edge(layout) = &model.layout else {
            panic!("edge layout expected");
        };
        let src = model
            .program
            .constraints()
            .iter()
            .find(|c| c.name == "admission_src_0")
            .unwrap();
        assert_eq!(src.cmp, Comparison::Eq);
        assert_eq!(src.rhs, 0.0);
        // inflow of client_0 is link 1, then -qty * admit
        assert_eq!(
            src.lhs.terms(),
            &[(layout.flow[0][1], 1.0), (layout.admit[0], -4.0)]
        );
    }

    #[test]
    fn test_relaxed_has_no_integral_variables() {
        let model = EdgeFormulation::relaxed().formulate(&chain(), &one_demand()).unwrap();
        assert_eq!(model.program.problem_class(), ProblemClass::LinearProgram);
        assert!(model
            .program
            .variables()
            .iter()
            .filter(|v| v.name.starts_with("admit") || v.name.starts_with("gate"))
            .all(|v| v.upper == Some(1.0)));
        let exact = EdgeFormulation::exact().formulate(&chain(), &one_demand()).unwrap();
        assert_eq!(names(&model.program), names(&exact.program));
    }

    #[test]
    fn test_no_demands_means_no_rows() {
        let model = EdgeFormulation::exact().formulate(&chain(), &[]).unwrap();
        assert_eq!(model.program.num_variables(), 0);
        assert_eq!(model.program.num_constraints(), 0);
    }

    #[test]
    fn test_zero_capacity_link_has_no_variables() {
        let mut net = chain();
        let g = net.generator().unwrap();
        let c1 = net.client_node(ClientId::new(1)).unwrap();
        net.add_link(g, c1, 0);
        let with_dead = EdgeFormulation::exact().formulate(&net, &one_demand()).unwrap();
        let without = EdgeFormulation::exact().formulate(&chain(), &one_demand()).unwrap();
        assert_eq!(with_dead.program, without.program);
    }

    #[test]
    fn test_isolated_repeater_row_is_dropped() {
        let mut net = chain();
        net.add_repeater(RepeaterId::new(2));
        let model = EdgeFormulation::exact().formulate(&net, &one_demand()).unwrap();
        let names = names(&model.program);
        assert!(names.contains(&"flow_conservation_1_0"));
        assert!(!names.iter().any(|n| n.starts_with("flow_conservation_5_")));
    }
}
