use super::{AdmissionError, IndexMaps};
use qflow_core::Demand;

/// Reject demands no formulation can express. Stops at the first problem.
///
/// Thresholds below one are accepted: such a demand can never be served
/// and the model simply rejects it.
pub fn validate_demands(maps: &IndexMaps, demands: &[Demand]) -> Result<(), AdmissionError> {
    for (j, demand) in demands.iter().enumerate() {
        for client in [demand.source, demand.destination] {
            if maps.client(client).is_none() {
                return Err(AdmissionError::UnknownClient {
                    demand: j,
                    client: client.value(),
                });
            }
        }
        if demand.quantity == 0 {
            return Err(AdmissionError::NonPositiveQuantity { demand: j });
        }
        if !demand.threshold.is_finite() || demand.threshold < 0.0 {
            return Err(AdmissionError::InvalidThreshold {
                demand: j,
                threshold: demand.threshold,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qflow_core::{ClientId, QuantumNetwork};

    fn maps() -> IndexMaps {
        let mut net = QuantumNetwork::new();
        let g = net.add_generator();
        let c0 = net.add_client(ClientId::new(0));
        let c1 = net.add_client(ClientId::new(1));
        net.add_link(g, c0, 1);
        net.add_link(g, c1, 1);
        IndexMaps::build(&net).unwrap()
    }

    fn demand(src: usize, dst: usize, qty: u64, thr: f64) -> Demand {
        Demand::new(ClientId::new(src), ClientId::new(dst), qty, thr)
    }

    #[test]
    fn test_unknown_client_names_demand_and_client() {
        let err = validate_demands(&maps(), &[demand(0, 1, 1, 2.0), demand(0, 5, 1, 2.0)])
            .unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::UnknownClient {
                demand: 1,
                client: 5
            }
        ));
        assert_eq!(err.to_string(), "demand 1: client 5 is not in the network");
    }

    #[test]
    fn test_quantity_and_threshold_checks() {
        assert!(matches!(
            validate_demands(&maps(), &[demand(0, 1, 0, 2.0)]),
            Err(AdmissionError::NonPositiveQuantity { demand: 0 })
        ));
        assert!(matches!(
            validate_demands(&maps(), &[demand(0, 1, 1, f64::NAN)]),
            Err(AdmissionError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            validate_demands(&maps(), &[demand(0, 1, 1, -1.0)]),
            Err(AdmissionError::InvalidThreshold { .. })
        ));
        assert!(validate_demands(&maps(), &[demand(0, 1, 1, 0.5)]).is_ok());
        assert!(validate_demands(&maps(), &[]).is_ok());
    }
}
