//! Error types for the connection pool

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced to `acquire` callers.
///
/// Generic over the factory error so a creation failure reaches the caller
/// unchanged; the pool performs no retries of its own. Cleanup failures
/// (close, rollback) are deliberately absent here: they are always caught,
/// logged and discarded, so cleanup can never mask a caller's in-flight
/// error.
#[derive(Error, Debug)]
pub enum PoolError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to open a new resource: {0}")]
    OpenFailed(#[source] E),

    #[error("failed to prepare a resource for checkout: {0}")]
    PrepareFailed(#[source] E),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation was cancelled")]
    Cancelled,
}

pub type PoolResult<T, E> = Result<T, PoolError<E>>;
