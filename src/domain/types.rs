use chrono::{DateTime, Utc};

/// A point the fleet can visit: a customer, or the depot when `demand == 0.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub demand: f64,
}

impl Location {
    pub fn depot(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            demand: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vehicle {
    pub id: u64,
    pub capacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub id: u64,
    pub customer: Location,
    pub demand: f64,
}

/// An unordered group of orders assigned to the same vehicle by the clusterer.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    pub orders: Vec<Order>,
}

impl Cluster {
    pub fn total_demand(&self) -> f64 {
        self.orders.iter().map(|o| o.demand).sum()
    }

    /// The heaviest single order in the cluster. A vehicle that can carry
    /// this much can always serve the cluster as multiple sub-route trips,
    /// even if the cluster's combined demand exceeds one trip's capacity.
    pub fn max_order_demand(&self) -> f64 {
        self.orders.iter().map(|o| o.demand).fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Assigned => "ASSIGNED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskStop {
    pub customer_id: u64,
    pub stop_order: u32,
}

/// A persisted dispatch outcome for one vehicle. Never mutated by the core
/// once created; the orchestrator writes it once with `status = Assigned`.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: u64,
    pub depot_id: u64,
    pub vehicle_id: u64,
    pub status: TaskStatus,
    pub total_distance: f64,
    pub stops: Vec<TaskStop>,
    pub path_geometries: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Progress,
    Success,
    Failure,
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub total_tasks_created: u32,
    pub tasks: Vec<Task>,
}

/// A submitted dispatch job as tracked by the orchestrator's job surface.
/// State transitions: Pending -> Progress -> Success, or ... -> Failure.
/// Terminal states (Success, Failure) are sticky.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub job_id: String,
    pub state: JobState,
    pub progress_message: Option<String>,
    pub result: Option<DispatchOutcome>,
    pub error: Option<String>,
}

impl DispatchJob {
    pub fn pending(job_id: String) -> Self {
        Self {
            job_id,
            state: JobState::Pending,
            progress_message: None,
            result: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Success | JobState::Failure)
    }
}

#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub vehicle_ids: Vec<u64>,
    pub order_ids: Vec<u64>,
    pub depot_id: u64,
}
