use doppel_storage::StorageError;
use thiserror::Error;

/// Result type for dispatch operations.
pub type EndpointResult<T> = Result<T, EndpointError>;

/// Dispatch-layer errors.
///
/// Injected simulated failures are never errors; they surface as normal
/// outcomes flagged `error_injected`.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("environment not found: {0}")]
    EnvironmentNotFound(String),

    #[error("rng lock poisoned")]
    RngPoisoned,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
