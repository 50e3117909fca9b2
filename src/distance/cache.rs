use std::collections::HashMap;

use tracing::info;

use crate::domain::Location;
use crate::error::{DispatchError, DispatchResult};
use crate::oracle::RoutingOracle;

/// All-pairs distances for one solve, built once from the routing oracle and
/// reused by the clusterer, the assignment step, and every GA fitness
/// evaluation. Keyed by location id rather than matrix index so callers never
/// need to track the depot-first ordering used to build it.
pub struct DistanceCache {
    ids: Vec<u64>,
    index_of: HashMap<u64, usize>,
    matrix: Vec<Vec<f64>>,
}

impl DistanceCache {
    /// Builds the cache from `depot` plus every point in `orders`, in that
    /// order, matching the oracle's `(lon, lat)` point-list convention.
    pub async fn build(
        oracle: &RoutingOracle,
        depot: Location,
        orders: &[Location],
    ) -> DispatchResult<Self> {
        let mut ids = Vec::with_capacity(orders.len() + 1);
        let mut points = Vec::with_capacity(orders.len() + 1);
        ids.push(depot.id);
        points.push((depot.x, depot.y));
        for o in orders {
            ids.push(o.id);
            points.push((o.x, o.y));
        }

        info!(n = points.len(), "building distance matrix cache");
        let matrix = oracle.matrix(&points).await?;

        let index_of = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        Ok(Self {
            ids,
            index_of,
            matrix,
        })
    }

    /// Distance between two locations by id. Fails with `InternalError`
    /// rather than panicking: a cache miss means the caller queried an id
    /// outside the set the cache was built from, which is a programming
    /// error in this crate, not a user-facing condition.
    pub fn distance(&self, from_id: u64, to_id: u64) -> DispatchResult<f64> {
        let i = *self.index_of.get(&from_id).ok_or_else(|| {
            DispatchError::InternalError(format!("distance cache miss for id {from_id}"))
        })?;
        let j = *self.index_of.get(&to_id).ok_or_else(|| {
            DispatchError::InternalError(format!("distance cache miss for id {to_id}"))
        })?;
        Ok(self.matrix[i][j])
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Builds a cache directly from a precomputed matrix, bypassing the
    /// oracle. Test-only: lets tests construct unreachable (`f64::INFINITY`)
    /// pairs that `EuclideanOracle` never produces.
    #[cfg(test)]
    pub(crate) fn from_raw(ids: Vec<u64>, matrix: Vec<Vec<f64>>) -> Self {
        let index_of = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        Self { ids, index_of, matrix }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::EuclideanOracle;

    #[tokio::test]
    async fn builds_and_looks_up_by_id() {
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let orders = vec![
            Location { id: 1, x: 3.0, y: 4.0, demand: 1.0 },
            Location { id: 2, x: 1.0, y: 1.0, demand: 1.0 },
        ];
        let cache = DistanceCache::build(&oracle, depot, &orders).await.unwrap();
        assert_eq!(cache.distance(0, 0).unwrap(), 0.0);
        assert!((cache.distance(0, 1).unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(cache.distance(0, 1).unwrap(), cache.distance(1, 0).unwrap());
    }

    #[tokio::test]
    async fn missing_id_is_internal_error() {
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let cache = DistanceCache::build(&oracle, depot, &[]).await.unwrap();
        assert!(cache.distance(0, 99).is_err());
    }
}
