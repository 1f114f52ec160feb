//! Random hierarchical networks and demand sets.
//!
//! Links are drawn tier by tier: generator→repeater with probability
//! `gen_coeff`, repeater→repeater with `rep_coeff`, repeater→client with
//! `client_coeff`. Every capacity is `ceil(N(mean, mean/2))`; a
//! non-positive draw produces no link.

use qflow_core::{prune_dead_repeaters, ClientId, Demand, QuantumNetwork, RepeaterId};
pub use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("invalid generation parameter: {0}")]
    InvalidParams(String),

    #[error("clients need at least one repeater to attach to")]
    NoRepeaters,

    #[error("client_coeff must be positive or clients can never be attached")]
    UnreachableClients,
}

/// Inputs of one generated instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub num_clients: usize,
    pub num_repeaters: usize,
    pub rep_coeff: f64,
    pub gen_coeff: f64,
    pub client_coeff: f64,
    pub mean_capacity: f64,
    pub mean_demand: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            num_clients: 3,
            num_repeaters: 7,
            rep_coeff: 0.25,
            gen_coeff: 0.40,
            client_coeff: 0.20,
            mean_capacity: 10.0,
            mean_demand: 7.0,
        }
    }
}

impl GenerationParams {
    /// Parse the whitespace-separated experiment line
    /// `clients repeaters rep_coeff gen_coeff client_coeff mean_cap mean_demand [alpha]`.
    /// A trailing alpha is accepted and ignored.
    pub fn from_params_line(line: &str) -> Result<Self, GenerateError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if !(7..=8).contains(&fields.len()) {
            return Err(GenerateError::InvalidParams(format!(
                "expected 7 or 8 fields, found {}",
                fields.len()
            )));
        }
        fn parse<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, GenerateError> {
            raw.parse()
                .map_err(|_| GenerateError::InvalidParams(format!("{name} = '{raw}'")))
        }
        let params = Self {
            num_clients: parse("num_clients", fields[0])?,
            num_repeaters: parse("num_repeaters", fields[1])?,
            rep_coeff: parse("rep_coeff", fields[2])?,
            gen_coeff: parse("gen_coeff", fields[3])?,
            client_coeff: parse("client_coeff", fields[4])?,
            mean_capacity: parse("mean_capacity", fields[5])?,
            mean_demand: parse("mean_demand", fields[6])?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        for (name, p) in [
            ("rep_coeff", self.rep_coeff),
            ("gen_coeff", self.gen_coeff),
            ("client_coeff", self.client_coeff),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GenerateError::InvalidParams(format!(
                    "{name} = {p} is not a probability"
                )));
            }
        }
        if !(self.mean_capacity.is_finite() && self.mean_capacity > 0.0) {
            return Err(GenerateError::InvalidParams(format!(
                "mean_capacity = {} must be positive",
                self.mean_capacity
            )));
        }
        if !(self.mean_demand.is_finite() && self.mean_demand > 0.0) {
            return Err(GenerateError::InvalidParams(format!(
                "mean_demand = {} must be positive",
                self.mean_demand
            )));
        }
        if self.num_clients > 0 {
            if self.num_repeaters == 0 {
                return Err(GenerateError::NoRepeaters);
            }
            if self.client_coeff <= 0.0 {
                return Err(GenerateError::UnreachableClients);
            }
        }
        Ok(())
    }
}

/// Fixed seed for reproducible runs, entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn draw_capacity<R: Rng + ?Sized>(normal: &Normal<f64>, rng: &mut R) -> Option<u64> {
    let capacity = normal.sample(rng).ceil();
    (capacity > 0.0).then_some(capacity as u64)
}

/// Random three-tier network. Each client is redrawn until it has at least
/// one incoming link; repeaters that cannot reach any client are pruned.
pub fn generate_network<R: Rng + ?Sized>(
    params: &GenerationParams,
    rng: &mut R,
) -> Result<QuantumNetwork, GenerateError> {
    params.validate()?;
    let normal = Normal::new(params.mean_capacity, params.mean_capacity / 2.0)
        .map_err(|e| GenerateError::InvalidParams(e.to_string()))?;

    let mut network = QuantumNetwork::new();
    let generator = network.add_generator();
    let repeaters: Vec<_> = (0..params.num_repeaters)
        .map(|i| network.add_repeater(RepeaterId::new(i)))
        .collect();
    let clients: Vec<_> = (0..params.num_clients)
        .map(|i| network.add_client(ClientId::new(i)))
        .collect();

    for &r in &repeaters {
        if rng.gen::<f64>() < params.gen_coeff {
            if let Some(cap) = draw_capacity(&normal, rng) {
                network.add_link(generator, r, cap);
            }
        }
    }

    for (i, &from) in repeaters.iter().enumerate() {
        for (j, &to) in repeaters.iter().enumerate() {
            if i != j && rng.gen::<f64>() < params.rep_coeff {
                if let Some(cap) = draw_capacity(&normal, rng) {
                    network.add_link(from, to, cap);
                }
            }
        }
    }

    for &c in &clients {
        let mut attached = false;
        while !attached {
            for &r in &repeaters {
                if rng.gen::<f64>() < params.client_coeff {
                    if let Some(cap) = draw_capacity(&normal, rng) {
                        network.add_link(r, c, cap);
                        attached = true;
                    }
                }
            }
        }
    }

    let pruned = prune_dead_repeaters(&mut network);
    debug!(
        nodes = network.graph.node_count(),
        links = network.graph.edge_count(),
        pruned,
        "generated network"
    );
    Ok(network)
}

/// One demand per client `i`, paired with client `(i + 1) mod n`.
pub fn generate_demands<R: Rng + ?Sized>(
    params: &GenerationParams,
    rng: &mut R,
) -> Result<Vec<Demand>, GenerateError> {
    params.validate()?;
    let quantity = Exp::new(1.0 / params.mean_demand)
        .map_err(|e| GenerateError::InvalidParams(e.to_string()))?;
    let threshold = Normal::new(3.0 * (params.num_repeaters as f64).sqrt(), 1.0)
        .map_err(|e| GenerateError::InvalidParams(e.to_string()))?;

    let n = params.num_clients;
    Ok((0..n)
        .map(|i| {
            let qty = (1.0 + quantity.sample(rng)).ceil() as u64;
            let thr = (1.0 + threshold.sample(rng)).abs().ceil();
            Demand::new(ClientId::new(i), ClientId::new((i + 1) % n), qty, thr)
        })
        .collect())
}
