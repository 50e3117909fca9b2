use std::error::Error;

use colored::*;
use csv::Writer;
use tracing::{info, span, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dispatch_engine::database::db_connection;
use dispatch_engine::fixtures::generate_instance;
use dispatch_engine::oracle::{EuclideanOracle, RoutingOracle};
use dispatch_engine::orchestrator::run_dispatch;

const DEMO_ORDERS: usize = 30;
const DEMO_VEHICLES: usize = 4;

#[tokio::main]
#[tracing::instrument(name = "Dispatch Engine", level = "info")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            fmt::layer()
                .with_span_events(fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE)
                .pretty(),
        )
        .init();

    let db_pool = db_connection().await?;

    info!(
        "Starting dispatch engine with {} orders and {} vehicles",
        DEMO_ORDERS, DEMO_VEHICLES
    );

    let instance = {
        let span = span!(Level::INFO, "fixtures");
        let _guard = span.enter();
        generate_instance(DEMO_ORDERS, DEMO_VEHICLES)
    };

    let oracle = RoutingOracle::Euclidean(EuclideanOracle::new(1.0));

    let outcome = run_dispatch(
        instance.depot,
        instance.orders,
        instance.vehicles,
        &oracle,
        &db_pool,
        |message| info!("{message}"),
    )
    .await?;

    println!(
        "{}",
        format!("Created {} tasks", outcome.total_tasks_created).green()
    );
    for task in &outcome.tasks {
        println!(
            "vehicle {}: {} -> {}",
            task.vehicle_id,
            format!("distance {:.2}", task.total_distance).cyan(),
            format!("{} stops", task.stops.len())
        );
    }

    save_summary_to_csv(&outcome.tasks, "dispatch_summary.csv")?;

    Ok(())
}

fn save_summary_to_csv(
    tasks: &[dispatch_engine::domain::Task],
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(filename)?;
    wtr.write_record(["vehicle_id", "total_distance", "stop_count"])?;
    for task in tasks {
        wtr.write_record([
            task.vehicle_id.to_string(),
            task.total_distance.to_string(),
            task.stops.len().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
