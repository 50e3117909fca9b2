pub mod types;

pub use types::{
    Cluster, DispatchJob, DispatchOutcome, DispatchRequest, JobState, Location, Order, Task,
    TaskStatus, TaskStop, Vehicle,
};
