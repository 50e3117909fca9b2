use thiserror::Error;

/// Error taxonomy for every public entry point of the dispatch engine.
///
/// Propagation policy: a per-vehicle solve failure aborts the whole job with
/// no partial Tasks for that vehicle, but Tasks already persisted for prior
/// vehicles in the same job are kept (no rollback).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("too many points for a single matrix call: {requested} (max {max})")]
    TooManyPoints { requested: usize, max: usize },

    #[error("routing oracle error: {0}")]
    RoutingOracleError(String),

    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
