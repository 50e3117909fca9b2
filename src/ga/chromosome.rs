use crate::config::constant::CAPACITY_PENALTY;
use crate::distance::DistanceCache;
use crate::domain::Order;
use crate::error::DispatchResult;

/// A candidate solution: a permutation of the cluster's orders, never
/// including the depot. Split into capacity-respecting sub-routes at
/// evaluation time rather than carried as part of the encoding.
#[derive(Debug, Clone)]
pub struct Chromosome {
    pub permutation: Vec<usize>,
    pub fitness: f64,
}

impl Chromosome {
    pub fn new(permutation: Vec<usize>) -> Self {
        Self {
            permutation,
            fitness: f64::INFINITY,
        }
    }
}

/// Deterministic left-to-right greedy split: walk the permutation, start a
/// new sub-route whenever adding the next order would exceed `capacity`.
/// A single order whose own demand exceeds `capacity` still gets its own
/// sub-route (the capacity penalty in [`evaluate`] is what flags that as
/// infeasible, the split itself never drops an order).
pub fn greedy_split(permutation: &[usize], orders: &[Order], capacity: f64) -> Vec<Vec<usize>> {
    let mut routes = Vec::new();
    let mut current = Vec::new();
    let mut load = 0.0;

    for &idx in permutation {
        let demand = orders[idx].demand;
        if !current.is_empty() && load + demand > capacity {
            routes.push(std::mem::take(&mut current));
            load = 0.0;
        }
        current.push(idx);
        load += demand;
    }
    if !current.is_empty() {
        routes.push(current);
    }
    routes
}

/// Sum of per-route depot-to-depot distances: depot -> first stop -> ... ->
/// last stop -> depot, for every sub-route.
pub fn total_distance(
    routes: &[Vec<usize>],
    orders: &[Order],
    depot_id: u64,
    cache: &DistanceCache,
) -> DispatchResult<f64> {
    let mut total = 0.0;
    for route in routes {
        if route.is_empty() {
            continue;
        }
        let first = orders[route[0]].id;
        let last = orders[*route.last().unwrap()].id;
        total += cache.distance(depot_id, first)?;
        for pair in route.windows(2) {
            total += cache.distance(orders[pair[0]].id, orders[pair[1]].id)?;
        }
        total += cache.distance(last, depot_id)?;
    }
    Ok(total)
}

/// How much the heaviest sub-route's load exceeds `capacity`, summed across
/// every sub-route that is overloaded. Zero when every sub-route fits.
pub fn capacity_violation(routes: &[Vec<usize>], orders: &[Order], capacity: f64) -> f64 {
    routes
        .iter()
        .map(|route| {
            let load: f64 = route.iter().map(|&idx| orders[idx].demand).sum();
            (load - capacity).max(0.0)
        })
        .sum()
}

/// fitness = total_distance + CAPACITY_PENALTY * capacity_violation.
/// Fitness is always >= total_distance since the penalty term is never
/// negative.
pub fn evaluate(
    permutation: &[usize],
    orders: &[Order],
    capacity: f64,
    depot_id: u64,
    cache: &DistanceCache,
) -> DispatchResult<f64> {
    let routes = greedy_split(permutation, orders, capacity);
    let distance = total_distance(&routes, orders, depot_id, cache)?;
    let violation = capacity_violation(&routes, orders, capacity);
    Ok(distance + CAPACITY_PENALTY * violation)
}
