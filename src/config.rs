pub mod constant {
    // GA defaults (spec section 4.5)
    pub(crate) const POPULATION_SIZE: usize = 50;
    pub(crate) const MUTATION_RATE: f64 = 0.01;
    pub(crate) const CROSSOVER_RATE: f64 = 0.9;
    pub(crate) const GENERATIONS: usize = 200;
    pub(crate) const PATIENCE: usize = 20;
    pub(crate) const TOURNAMENT_SIZE: usize = 5;
    pub(crate) const CAPACITY_PENALTY: f64 = 1000.0;

    // Clusterer defaults (spec section 4.3)
    pub(crate) const KMEANS_SEED: u64 = 42;
    pub(crate) const KMEANS_RESTARTS: usize = 10;
    pub(crate) const KMEANS_MAX_ITER: usize = 300;
    pub(crate) const KMEANS_TOLERANCE: f64 = 1e-4;

    // Routing oracle limits (spec sections 4.1, 6)
    pub(crate) const MAX_MATRIX_POINTS: usize = 50;
    pub(crate) const ORS_BASE_URL: &str = "https://api.openrouteservice.org";
    pub(crate) const ORS_PROFILE: &str = "driving-car";

    // Demo fixture defaults
    pub(crate) const FIXTURE_SEED: u64 = 64;
}
