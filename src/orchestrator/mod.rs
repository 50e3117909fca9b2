pub mod job;

pub use job::JobRunner;

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rayon::prelude::*;
use sqlx::SqlitePool;
use tracing::{info, instrument, span, Instrument, Level};

use crate::assignment::assign_clusters;
use crate::cluster::cluster_orders;
use crate::database::persist_task;
use crate::distance::DistanceCache;
use crate::domain::{DispatchOutcome, Location, Order, Task, TaskStatus, TaskStop, Vehicle};
use crate::error::{DispatchError, DispatchResult};
use crate::ga::{solve, SolveOutcome};
use crate::oracle::RoutingOracle;

/// Progress strings reported while a job runs. Kept as a flat sequence of
/// literal messages rather than an enum, since the only consumer is a
/// human-readable status field on [`crate::domain::DispatchJob`].
pub mod progress {
    pub const FETCHING_DATA: &str = "Fetching data...";
    pub const CLUSTERING_ORDERS: &str = "Clustering orders...";
    pub const ASSIGNING_AND_OPTIMIZING: &str = "Assigning clusters and optimizing routes...";
}

/// Runs the full dispatch pipeline for one depot, one fleet, and one batch
/// of orders: cluster, assign, solve every vehicle's route concurrently with
/// the genetic algorithm, then persist a Task per vehicle in assignment
/// order, and return the aggregate outcome.
///
/// Per-vehicle GA solves are independent (own population, own RNG, a
/// read-only shared distance matrix) and run in parallel via `rayon`; Task
/// persistence is still serialized through a single sequential pass so task
/// ids are assigned in assignment order regardless of solve parallelism.
///
/// A per-vehicle solve failure aborts the whole job: Tasks already persisted
/// for prior vehicles in this call are kept, and nothing is rolled back.
#[instrument(skip(depot, orders, vehicles, oracle, pool, on_progress), fields(orders = orders.len(), vehicles = vehicles.len()))]
pub async fn run_dispatch<F>(
    depot: Location,
    orders: Vec<Order>,
    vehicles: Vec<Vehicle>,
    oracle: &RoutingOracle,
    pool: &SqlitePool,
    mut on_progress: F,
) -> DispatchResult<DispatchOutcome>
where
    F: FnMut(&'static str),
{
    on_progress(progress::FETCHING_DATA);
    if vehicles.is_empty() {
        return Err(DispatchError::InvalidInput("no vehicles supplied".into()));
    }
    if orders.is_empty() {
        return Err(DispatchError::InvalidInput("no orders supplied".into()));
    }

    let order_locations: Vec<Location> = orders.iter().map(|o| o.customer).collect();

    let cache = Arc::new(
        DistanceCache::build(oracle, depot, &order_locations)
            .instrument(span!(Level::INFO, "distance_cache"))
            .await?,
    );

    on_progress(progress::CLUSTERING_ORDERS);
    let k = vehicles.len().min(orders.len());
    let clusters = cluster_orders(&orders, k)?;

    on_progress(progress::ASSIGNING_AND_OPTIMIZING);
    let assignments = assign_clusters(&vehicles, clusters)?;

    // A fresh seed per call, not a fixed constant (spec section 4.5): the GA
    // is deterministic given a seed, but the seed itself is not pinned by
    // default. Each vehicle's solver additionally gets its own seed so
    // concurrent solves don't share an RNG stream.
    let solve_inputs: Vec<(Vehicle, Vec<Order>, u64)> = assignments
        .into_iter()
        .map(|a| (a.vehicle, a.cluster.orders, rand::thread_rng().gen()))
        .collect();

    let depot_id = depot.id;
    let cache_for_solve = cache.clone();
    let solved: Vec<(Vehicle, Vec<Order>, DispatchResult<SolveOutcome>)> =
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "ga_solve_all_vehicles");
            let _guard = span.enter();
            solve_inputs
                .into_par_iter()
                .map(|(vehicle, cluster_orders, seed)| {
                    let outcome = solve(
                        &cluster_orders,
                        vehicle.capacity,
                        depot_id,
                        &cache_for_solve,
                        seed,
                    );
                    (vehicle, cluster_orders, outcome)
                })
                .collect()
        })
        .await
        .map_err(|e| DispatchError::InternalError(format!("GA solve task panicked: {e}")))?;

    let mut tasks = Vec::with_capacity(solved.len());

    for (vehicle, cluster_orders, outcome) in solved {
        let span = span!(Level::INFO, "vehicle_persist", vehicle_id = vehicle.id);
        let task = persist_vehicle_task(depot, vehicle, cluster_orders, outcome, oracle, pool)
            .instrument(span)
            .await?;
        tasks.push(task);
    }

    Ok(DispatchOutcome {
        total_tasks_created: tasks.len() as u32,
        tasks,
    })
}

/// Turns one vehicle's GA outcome into a persisted [`Task`]: builds the
/// ordered stop list and one polyline per sub-route, then inserts the row.
/// `stop_counter` is local to this call so stop numbering restarts at 1 for
/// every vehicle's Task, rather than accumulating across the whole job.
async fn persist_vehicle_task(
    depot: Location,
    vehicle: Vehicle,
    cluster_orders: Vec<Order>,
    outcome: DispatchResult<SolveOutcome>,
    oracle: &RoutingOracle,
    pool: &SqlitePool,
) -> DispatchResult<Task> {
    let outcome = outcome?;

    let mut stop_counter: u32 = 0;
    let mut stops = Vec::new();
    let mut path_geometries = Vec::with_capacity(outcome.routes.len());

    for route in &outcome.routes {
        let mut points = Vec::with_capacity(route.len() + 2);
        points.push((depot.x, depot.y));
        for &idx in route {
            let order = &cluster_orders[idx];
            stop_counter += 1;
            stops.push(TaskStop {
                customer_id: order.id,
                stop_order: stop_counter,
            });
            points.push((order.customer.x, order.customer.y));
        }
        points.push((depot.x, depot.y));

        let geometry = oracle.polyline(&points).await?;
        path_geometries.push(geometry);
    }

    let task = Task {
        id: 0,
        depot_id: depot.id,
        vehicle_id: vehicle.id,
        status: TaskStatus::Assigned,
        total_distance: outcome.fitness,
        stops,
        path_geometries,
        created_at: Utc::now(),
    };

    let task_id = persist_task(pool, &task).await?;
    info!(task_id, vehicle_id = vehicle.id, "task created");

    Ok(Task {
        id: task_id as u64,
        ..task
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::EuclideanOracle;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // max_connections(1): sqlite::memory: is a distinct database per
        // connection, so the pool must never hand out a second one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE tasks (id INTEGER PRIMARY KEY AUTOINCREMENT, depot_id INTEGER NOT NULL, \
             vehicle_id INTEGER NOT NULL, status TEXT NOT NULL, total_distance REAL NOT NULL, \
             path_geometries TEXT NOT NULL, created_at TEXT NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE task_stops (id INTEGER PRIMARY KEY AUTOINCREMENT, \
             task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE, \
             customer_id INTEGER NOT NULL, stop_order INTEGER NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    fn order(id: u64, x: f64, y: f64, demand: f64) -> Order {
        Order {
            id,
            customer: Location { id, x, y, demand },
            demand,
        }
    }

    #[tokio::test]
    async fn empty_vehicles_is_invalid_input() {
        let pool = test_pool().await;
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let result = run_dispatch(depot, vec![order(1, 1.0, 1.0, 1.0)], vec![], &oracle, &pool, |_| {}).await;
        assert!(matches!(result, Err(DispatchError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn empty_orders_is_invalid_input() {
        let pool = test_pool().await;
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let result = run_dispatch(
            depot,
            vec![],
            vec![Vehicle { id: 1, capacity: 10.0 }],
            &oracle,
            &pool,
            |_| {},
        )
        .await;
        assert!(matches!(result, Err(DispatchError::InvalidInput(_))));
    }

    // S1: depot=(0,0), C1=(1,0,demand=1), C2=(0,1,demand=1), one vehicle of
    // capacity 10 -> one Task visiting both stops, distance 2 + sqrt(2).
    #[tokio::test]
    async fn s1_single_vehicle_visits_both_customers() {
        let pool = test_pool().await;
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let orders = vec![order(1, 1.0, 0.0, 1.0), order(2, 0.0, 1.0, 1.0)];
        let vehicles = vec![Vehicle { id: 1, capacity: 10.0 }];

        let outcome = run_dispatch(depot, orders, vehicles, &oracle, &pool, |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.total_tasks_created, 1);
        let task = &outcome.tasks[0];
        assert_eq!(task.stops.len(), 2);
        assert!((task.total_distance - (2.0 + 2f64.sqrt())).abs() < 1e-6);
        let stop_orders: Vec<u32> = task.stops.iter().map(|s| s.stop_order).collect();
        assert_eq!(stop_orders, vec![1, 2]);
    }

    // S2: C1=(10,0,demand=6), C2=(-10,0,demand=6), one vehicle of capacity 10
    // -> one Task with two sub-routes, total_distance = 40.
    #[tokio::test]
    async fn s2_overloaded_cluster_splits_into_two_subroutes() {
        let pool = test_pool().await;
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let orders = vec![order(1, 10.0, 0.0, 6.0), order(2, -10.0, 0.0, 6.0)];
        let vehicles = vec![Vehicle { id: 1, capacity: 10.0 }];

        let outcome = run_dispatch(depot, orders, vehicles, &oracle, &pool, |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.total_tasks_created, 1);
        let task = &outcome.tasks[0];
        assert!((task.total_distance - 40.0).abs() < 1e-6);
        assert_eq!(task.path_geometries.len(), 2);
    }

    // Property 13: a single order whose demand exceeds every vehicle's
    // capacity produces zero Tasks, not a failure.
    #[tokio::test]
    async fn oversized_order_produces_no_tasks() {
        let pool = test_pool().await;
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let orders = vec![order(1, 1.0, 1.0, 100.0)];
        let vehicles = vec![Vehicle { id: 1, capacity: 10.0 }];

        let outcome = run_dispatch(depot, orders, vehicles, &oracle, &pool, |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.total_tasks_created, 0);
        assert!(outcome.tasks.is_empty());
    }

    // S3: two vehicles, two well-separated clusters, each getting its own
    // Task. Regression test for a bug where stop numbering carried over
    // between vehicles instead of restarting at 1 for each Task.
    #[tokio::test]
    async fn s3_two_vehicles_each_get_a_task_with_stop_order_reset() {
        let pool = test_pool().await;
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let orders = vec![
            order(1, 10.0, 0.0, 1.0),
            order(2, 11.0, 0.0, 1.0),
            order(3, -10.0, 0.0, 1.0),
            order(4, -11.0, 0.0, 1.0),
        ];
        let vehicles = vec![
            Vehicle { id: 1, capacity: 10.0 },
            Vehicle { id: 2, capacity: 10.0 },
        ];

        let outcome = run_dispatch(depot, orders, vehicles, &oracle, &pool, |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.total_tasks_created, 2);
        for task in &outcome.tasks {
            assert_eq!(task.stops.len(), 2);
            let stop_orders: Vec<u32> = task.stops.iter().map(|s| s.stop_order).collect();
            assert_eq!(stop_orders, vec![1, 2]);
        }
    }
}
