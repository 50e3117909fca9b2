pub mod sqlx;

pub use sqlx::db_connection;

use ::sqlx::SqlitePool;
use tracing::info;

use crate::domain::Task;
use crate::error::{DispatchError, DispatchResult};

/// Persists one Task and its TaskStops. Matches the two-phase write the
/// dispatch pipeline was distilled from: the Task row is inserted first to
/// obtain its id, then every TaskStop references it. `stop_order` is taken
/// verbatim from the caller rather than recomputed here, since stop
/// numbering is a global counter owned by the orchestrator across the whole
/// job, not something a single Task can derive on its own.
pub async fn persist_task(pool: &SqlitePool, task: &Task) -> DispatchResult<i64> {
    let geometries_json = serde_json::to_string(&task.path_geometries)
        .map_err(|e| DispatchError::InternalError(format!("failed to encode geometries: {e}")))?;

    let row = ::sqlx::query(
        r#"
        INSERT INTO tasks (depot_id, vehicle_id, status, total_distance, path_geometries, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(task.depot_id as i64)
    .bind(task.vehicle_id as i64)
    .bind(task.status.as_str())
    .bind(task.total_distance)
    .bind(geometries_json)
    .bind(task.created_at.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| DispatchError::InternalError(format!("failed to insert task: {e}")))?;

    let task_id = row.last_insert_rowid();

    for stop in &task.stops {
        ::sqlx::query(
            r#"
            INSERT INTO task_stops (task_id, customer_id, stop_order)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(task_id)
        .bind(stop.customer_id as i64)
        .bind(stop.stop_order as i64)
        .execute(pool)
        .await
        .map_err(|e| DispatchError::InternalError(format!("failed to insert task stop: {e}")))?;
    }

    info!(task_id, stops = task.stops.len(), "persisted task");
    Ok(task_id)
}
