use tracing::info;

use crate::domain::{Cluster, Vehicle};
use crate::error::DispatchResult;

/// One vehicle paired with the cluster of orders it will serve.
pub struct VehicleAssignment {
    pub vehicle: Vehicle,
    pub cluster: Cluster,
}

/// Greedy largest-first assignment (spec section 4.4): vehicles sorted by
/// capacity descending (ties by id ascending). For each vehicle in that
/// order, scan the still-unassigned clusters sorted by total demand
/// descending and take the first one that fits; if none fits, the vehicle
/// gets no cluster.
///
/// "Fits" is judged against the cluster's heaviest single order, not its
/// combined total: a vehicle makes one trip per sub-route, so a cluster
/// whose total demand exceeds one vehicle's capacity is still servable as
/// several sub-route trips, as long as no single order is itself too big
/// for any vehicle. A cluster where even the heaviest order exceeds every
/// vehicle's capacity is truly infeasible and is left unassigned — it
/// produces no Task, not an error (testable property 13).
pub fn assign_clusters(
    vehicles: &[Vehicle],
    clusters: Vec<Cluster>,
) -> DispatchResult<Vec<VehicleAssignment>> {
    let mut sorted_vehicles: Vec<Vehicle> = vehicles.to_vec();
    sorted_vehicles.sort_by(|a, b| b.capacity.total_cmp(&a.capacity).then(a.id.cmp(&b.id)));

    let mut remaining: Vec<Cluster> = clusters.into_iter().filter(|c| !c.is_empty()).collect();

    let mut result = Vec::with_capacity(sorted_vehicles.len());
    for vehicle in sorted_vehicles {
        if remaining.is_empty() {
            break;
        }
        remaining.sort_by(|a, b| b.total_demand().total_cmp(&a.total_demand()));

        let fit = remaining
            .iter()
            .position(|c| c.max_order_demand() <= vehicle.capacity);

        if let Some(idx) = fit {
            let cluster = remaining.remove(idx);
            result.push(VehicleAssignment { vehicle, cluster });
        }
    }

    info!(assigned = result.len(), "cluster-to-vehicle assignment complete");
    Ok(result)
}
