use std::error::Error;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dispatch_engine::database::db_connection;
use dispatch_engine::domain::JobState;
use dispatch_engine::fixtures::generate_instance;
use dispatch_engine::oracle::{EuclideanOracle, RoutingOracle};
use dispatch_engine::orchestrator::JobRunner;

const DEMO_ORDERS: usize = 30;
const DEMO_VEHICLES: usize = 4;

/// CLI entry point exercising the async job surface end to end: submit a
/// job, then poll it to completion the way an HTTP handler would.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().compact())
        .init();

    let db_pool = db_connection().await?;
    let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));
    let runner = JobRunner::new(oracle, db_pool);

    let instance = generate_instance(DEMO_ORDERS, DEMO_VEHICLES);
    let job_id = runner
        .submit(
            "demo-job-1".to_string(),
            instance.depot,
            instance.orders,
            instance.vehicles,
        )
        .await;

    loop {
        let job = runner.status(&job_id).expect("job was just submitted");
        info!(state = ?job.state, message = ?job.progress_message, "job status");
        match job.state {
            JobState::Success => {
                let outcome = job.result.expect("Success always carries a result");
                println!("dispatch complete: {} tasks created", outcome.total_tasks_created);
                break;
            }
            JobState::Failure => {
                let error = job.error.unwrap_or_default();
                eprintln!("dispatch failed: {error}");
                break;
            }
            _ => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }

    Ok(())
}
