use doppel_endpoint::EndpointError;
use doppel_storage::StorageError;
use thiserror::Error;

/// Result type for facade operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Facade-layer errors. Storage failures propagate unmodified; there are
/// no retries and no partial-success reporting.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("rng lock poisoned")]
    RngPoisoned,
}
