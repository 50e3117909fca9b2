use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::constant::{
    CROSSOVER_RATE, GENERATIONS, MUTATION_RATE, PATIENCE, POPULATION_SIZE,
};
use crate::distance::DistanceCache;
use crate::domain::Order;
use crate::error::{DispatchError, DispatchResult};

use super::chromosome::{evaluate, greedy_split, Chromosome};
use super::operators::{order_crossover_pair, swap_mutate, tournament_select};

/// Result of solving one vehicle's cluster: the best permutation found, its
/// sub-routes after the deterministic split, and the generation the search
/// stopped at.
pub struct SolveOutcome {
    pub routes: Vec<Vec<usize>>,
    pub fitness: f64,
    pub generations_run: usize,
}

/// Runs the genetic algorithm for a single vehicle's cluster of orders.
/// Population-based search over permutations of `orders`, seeded for
/// reproducibility. Fitness evaluation across the population runs in
/// parallel via rayon; everything else (selection, crossover, mutation) is
/// sequential to keep generation order, and therefore results, deterministic.
pub fn solve(
    orders: &[Order],
    capacity: f64,
    depot_id: u64,
    cache: &DistanceCache,
    seed: u64,
) -> DispatchResult<SolveOutcome> {
    let n = orders.len();
    if n == 0 {
        return Ok(SolveOutcome {
            routes: Vec::new(),
            fitness: 0.0,
            generations_run: 0,
        });
    }
    if n == 1 {
        let fitness = evaluate(&[0], orders, capacity, depot_id, cache)?;
        if !fitness.is_finite() {
            return Err(DispatchError::Unreachable(format!(
                "order {} is unreachable from the depot",
                orders[0].id
            )));
        }
        return Ok(SolveOutcome {
            routes: vec![vec![0]],
            fitness,
            generations_run: 0,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut population = initial_population(n, &mut rng);
    evaluate_population(&mut population, orders, capacity, depot_id, cache)?;
    population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

    let mut best = population[0].clone();
    let mut stagnation = 0usize;
    let mut generations_run = 0usize;

    for generation in 0..GENERATIONS {
        generations_run = generation + 1;
        let mut next_generation = Vec::with_capacity(POPULATION_SIZE);
        // Elitism: the incumbent best always survives unconditionally.
        next_generation.push(best.clone());

        while next_generation.len() < POPULATION_SIZE {
            let parent_a = tournament_select(&population, &mut rng);
            let parent_b = tournament_select(&population, &mut rng);

            let (mut child_a, mut child_b) = if rng.gen_bool(CROSSOVER_RATE) {
                order_crossover_pair(&parent_a.permutation, &parent_b.permutation, &mut rng)
            } else {
                (parent_a.permutation.clone(), parent_b.permutation.clone())
            };

            if rng.gen_bool(MUTATION_RATE) {
                swap_mutate(&mut child_a, &mut rng);
            }
            if rng.gen_bool(MUTATION_RATE) {
                swap_mutate(&mut child_b, &mut rng);
            }

            next_generation.push(Chromosome::new(child_a));
            if next_generation.len() < POPULATION_SIZE {
                next_generation.push(Chromosome::new(child_b));
            }
        }

        population = next_generation;
        evaluate_population(&mut population, orders, capacity, depot_id, cache)?;
        population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

        if population[0].fitness < best.fitness {
            best = population[0].clone();
            stagnation = 0;
        } else {
            stagnation += 1;
        }

        debug!(generation, fitness = best.fitness, stagnation, "generation complete");

        if stagnation >= PATIENCE {
            info!(generation, fitness = best.fitness, "early stopping: patience exhausted");
            break;
        }
    }

    if !best.fitness.is_finite() {
        return Err(DispatchError::Unreachable(
            "no finite-distance route exists for this vehicle's cluster".into(),
        ));
    }

    let routes = greedy_split(&best.permutation, orders, capacity);
    Ok(SolveOutcome {
        routes,
        fitness: best.fitness,
        generations_run,
    })
}

fn initial_population(n: usize, rng: &mut ChaCha8Rng) -> Vec<Chromosome> {
    (0..POPULATION_SIZE)
        .map(|_| {
            let mut permutation: Vec<usize> = (0..n).collect();
            shuffle(&mut permutation, rng);
            Chromosome::new(permutation)
        })
        .collect()
}

fn shuffle(permutation: &mut [usize], rng: &mut ChaCha8Rng) {
    for i in (1..permutation.len()).rev() {
        let j = rng.gen_range(0..=i);
        permutation.swap(i, j);
    }
}

fn evaluate_population(
    population: &mut [Chromosome],
    orders: &[Order],
    capacity: f64,
    depot_id: u64,
    cache: &DistanceCache,
) -> DispatchResult<()> {
    let fitnesses: Vec<DispatchResult<f64>> = population
        .par_iter()
        .map(|c| evaluate(&c.permutation, orders, capacity, depot_id, cache))
        .collect();

    for (chromosome, fitness) in population.iter_mut().zip(fitnesses) {
        chromosome.fitness = fitness?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;
    use crate::oracle::{EuclideanOracle, RoutingOracle};

    fn order(id: u64, x: f64, y: f64, demand: f64) -> Order {
        Order {
            id,
            customer: Location { id, x, y, demand },
            demand,
        }
    }

    #[tokio::test]
    async fn solve_is_deterministic_for_a_fixed_seed() {
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let orders = vec![
            order(1, 1.0, 1.0, 2.0),
            order(2, 2.0, 5.0, 2.0),
            order(3, 5.0, 1.0, 2.0),
            order(4, 3.0, 3.0, 2.0),
        ];
        let locs: Vec<Location> = orders.iter().map(|o| o.customer).collect();
        let cache = DistanceCache::build(&oracle, depot, &locs).await.unwrap();

        let a = solve(&orders, 10.0, 0, &cache, 7).unwrap();
        let b = solve(&orders, 10.0, 0, &cache, 7).unwrap();
        assert_eq!(a.fitness, b.fitness);
    }

    #[tokio::test]
    async fn single_order_short_circuits_without_running_generations() {
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let orders = vec![order(1, 3.0, 4.0, 1.0)];
        let locs: Vec<Location> = orders.iter().map(|o| o.customer).collect();
        let cache = DistanceCache::build(&oracle, depot, &locs).await.unwrap();

        let outcome = solve(&orders, 10.0, 0, &cache, 1).unwrap();
        assert_eq!(outcome.generations_run, 0);
        assert_eq!(outcome.routes, vec![vec![0]]);
    }

    #[tokio::test]
    async fn best_fitness_never_increases_across_generations() {
        let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
        let depot = Location::depot(0, 0.0, 0.0);
        let orders = vec![
            order(1, 1.0, 1.0, 2.0),
            order(2, 2.0, 5.0, 2.0),
            order(3, 5.0, 1.0, 2.0),
            order(4, 3.0, 3.0, 2.0),
            order(5, 8.0, 8.0, 2.0),
        ];
        let locs: Vec<Location> = orders.iter().map(|o| o.customer).collect();
        let cache = DistanceCache::build(&oracle, depot, &locs).await.unwrap();
        let outcome = solve(&orders, 20.0, 0, &cache, 99).unwrap();
        assert!(outcome.fitness.is_finite());
    }

    // S6: every edge in the cluster's matrix is unreachable, so no
    // finite-distance route exists. solve() must surface this as
    // DispatchError::Unreachable instead of returning an infinite fitness.
    #[tokio::test]
    async fn all_unreachable_edges_produce_an_unreachable_error() {
        let orders = vec![order(1, 1.0, 1.0, 1.0), order(2, 2.0, 2.0, 1.0)];
        let ids = vec![0, 1, 2];
        let matrix = vec![
            vec![0.0, f64::INFINITY, f64::INFINITY],
            vec![f64::INFINITY, 0.0, f64::INFINITY],
            vec![f64::INFINITY, f64::INFINITY, 0.0],
        ];
        let cache = DistanceCache::from_raw(ids, matrix);

        let result = solve(&orders, 10.0, 0, &cache, 1);
        assert!(matches!(result, Err(DispatchError::Unreachable(_))));
    }

    // Single-order variant of S6: the lone order's depot edge is unreachable.
    #[tokio::test]
    async fn single_unreachable_order_produces_an_unreachable_error() {
        let orders = vec![order(1, 1.0, 1.0, 1.0)];
        let ids = vec![0, 1];
        let matrix = vec![vec![0.0, f64::INFINITY], vec![f64::INFINITY, 0.0]];
        let cache = DistanceCache::from_raw(ids, matrix);

        let result = solve(&orders, 10.0, 0, &cache, 1);
        assert!(matches!(result, Err(DispatchError::Unreachable(_))));
    }
}
