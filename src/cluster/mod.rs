use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::constant::{KMEANS_MAX_ITER, KMEANS_RESTARTS, KMEANS_SEED, KMEANS_TOLERANCE};
use crate::domain::{Cluster, Order};
use crate::error::DispatchResult;

/// Groups orders into `k` geographic clusters with k-means++ seeding,
/// `KMEANS_RESTARTS` independent restarts, and the best (lowest inertia) run
/// kept. Deterministic across runs given the fixed seed (spec section 4.3).
pub fn cluster_orders(orders: &[Order], k: usize) -> DispatchResult<Vec<Cluster>> {
    if orders.is_empty() || k == 0 {
        return Ok(Vec::new());
    }
    let k = k.min(orders.len());

    let mut rng = ChaCha8Rng::seed_from_u64(KMEANS_SEED);
    let mut best_assignment: Option<Vec<usize>> = None;
    let mut best_inertia = f64::INFINITY;

    for restart in 0..KMEANS_RESTARTS {
        let (assignment, inertia) = run_kmeans(orders, k, &mut rng);
        debug!(restart, inertia, "k-means restart complete");
        if inertia < best_inertia {
            best_inertia = inertia;
            best_assignment = Some(assignment);
        }
    }

    let assignment = best_assignment.expect("at least one restart always runs");
    info!(k, inertia = best_inertia, "clustering complete");

    let mut clusters = vec![Cluster::default(); k];
    for (order, &cluster_idx) in orders.iter().zip(assignment.iter()) {
        clusters[cluster_idx].orders.push(*order);
    }
    Ok(clusters)
}

fn run_kmeans(orders: &[Order], k: usize, rng: &mut ChaCha8Rng) -> (Vec<usize>, f64) {
    let mut centroids = kmeans_plus_plus_init(orders, k, rng);
    let mut assignment = vec![0usize; orders.len()];

    for _ in 0..KMEANS_MAX_ITER {
        let mut changed = false;
        for (i, order) in orders.iter().enumerate() {
            let (best_idx, _) = nearest_centroid(order, &centroids);
            if assignment[i] != best_idx {
                assignment[i] = best_idx;
                changed = true;
            }
        }

        let new_centroids = recompute_centroids(orders, &assignment, k, &centroids);
        let shift: f64 = centroids
            .iter()
            .zip(new_centroids.iter())
            .map(|((ax, ay), (bx, by))| ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt())
            .sum();
        centroids = new_centroids;

        if !changed || shift < KMEANS_TOLERANCE {
            break;
        }
    }

    let inertia = orders
        .iter()
        .enumerate()
        .map(|(i, order)| nearest_centroid(order, &centroids).1)
        .sum();

    (assignment, inertia)
}

fn kmeans_plus_plus_init(
    orders: &[Order],
    k: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<(f64, f64)> {
    let mut centroids = Vec::with_capacity(k);
    let first = rng.gen_range(0..orders.len());
    centroids.push((orders[first].customer.x, orders[first].customer.y));

    while centroids.len() < k {
        let weights: Vec<f64> = orders
            .iter()
            .map(|o| nearest_centroid(o, &centroids).1)
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            let idx = rng.gen_range(0..orders.len());
            centroids.push((orders[idx].customer.x, orders[idx].customer.y));
            continue;
        }
        let mut pick = rng.gen_range(0.0..total);
        let mut chosen = orders.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if pick < *w {
                chosen = i;
                break;
            }
            pick -= w;
        }
        centroids.push((orders[chosen].customer.x, orders[chosen].customer.y));
    }

    centroids
}

fn nearest_centroid(order: &Order, centroids: &[(f64, f64)]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, (cx, cy))| {
            let dx = order.customer.x - cx;
            let dy = order.customer.y - cy;
            (i, dx * dx + dy * dy)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .expect("centroids is never empty")
}

fn recompute_centroids(
    orders: &[Order],
    assignment: &[usize],
    k: usize,
    previous: &[(f64, f64)],
) -> Vec<(f64, f64)> {
    let mut sums = vec![(0.0, 0.0); k];
    let mut counts = vec![0usize; k];
    for (order, &cluster_idx) in orders.iter().zip(assignment.iter()) {
        sums[cluster_idx].0 += order.customer.x;
        sums[cluster_idx].1 += order.customer.y;
        counts[cluster_idx] += 1;
    }

    sums.into_iter()
        .zip(counts.iter())
        .enumerate()
        .map(|(i, ((sx, sy), &count))| {
            if count == 0 {
                previous[i]
            } else {
                (sx / count as f64, sy / count as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;

    fn order(id: u64, x: f64, y: f64, demand: f64) -> Order {
        Order {
            id,
            customer: Location { id, x, y, demand },
            demand,
        }
    }

    #[test]
    fn clusters_preserve_all_orders() {
        let orders = vec![
            order(1, 0.0, 0.0, 1.0),
            order(2, 0.1, 0.1, 1.0),
            order(3, 10.0, 10.0, 1.0),
            order(4, 10.1, 9.9, 1.0),
        ];
        let clusters = cluster_orders(&orders, 2).unwrap();
        let total: usize = clusters.iter().map(|c| c.orders.len()).sum();
        assert_eq!(total, orders.len());
    }

    #[test]
    fn k_greater_than_orders_is_clamped() {
        let orders = vec![order(1, 0.0, 0.0, 1.0)];
        let clusters = cluster_orders(&orders, 5).unwrap();
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn empty_orders_yields_no_clusters() {
        assert!(cluster_orders(&[], 3).unwrap().is_empty());
    }

    #[test]
    fn deterministic_across_runs() {
        let orders = vec![
            order(1, 0.0, 0.0, 1.0),
            order(2, 0.2, 0.1, 2.0),
            order(3, 9.0, 9.0, 1.0),
            order(4, 9.2, 8.8, 3.0),
            order(5, 5.0, 5.0, 1.0),
        ];
        let a = cluster_orders(&orders, 2).unwrap();
        let b = cluster_orders(&orders, 2).unwrap();
        let demands_a: Vec<f64> = a.iter().map(|c| c.total_demand()).collect();
        let demands_b: Vec<f64> = b.iter().map(|c| c.total_demand()).collect();
        assert_eq!(demands_a, demands_b);
    }
}
