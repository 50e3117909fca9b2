use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::constant::FIXTURE_SEED;
use crate::domain::{Location, Order, Vehicle};

/// A demo CVRP instance: one depot, a batch of orders, and a fleet.
pub struct GeneratedInstance {
    pub depot: Location,
    pub orders: Vec<Order>,
    pub vehicles: Vec<Vehicle>,
}

/// Builds a reproducible random instance for demos and manual testing.
/// Orders and vehicle capacities are drawn from a seeded RNG so repeated
/// runs compare like-for-like, the same way the teacher's fixture generator
/// used a fixed `SEED` for its postal-code/demand draws.
pub fn generate_instance(num_orders: usize, num_vehicles: usize) -> GeneratedInstance {
    let mut rng = ChaCha8Rng::seed_from_u64(FIXTURE_SEED);

    let depot = Location::depot(0, 50.0, 50.0);

    let orders: Vec<Order> = (1..=num_orders as u64)
        .map(|id| {
            let x = rng.gen_range(0.0..100.0);
            let y = rng.gen_range(0.0..100.0);
            let demand = rng.gen_range(1.0..10.0);
            Order {
                id,
                customer: Location { id, x, y, demand },
                demand,
            }
        })
        .collect();

    let vehicles: Vec<Vehicle> = (1..=num_vehicles as u64)
        .map(|id| Vehicle {
            id,
            capacity: rng.gen_range(20.0..50.0),
        })
        .collect();

    info!(
        orders = orders.len(),
        vehicles = vehicles.len(),
        "generated demo instance"
    );

    GeneratedInstance {
        depot,
        orders,
        vehicles,
    }
}
