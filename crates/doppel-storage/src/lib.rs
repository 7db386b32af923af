//! Doppel storage abstractions.
//!
//! The harness persists four families of state behind explicit traits:
//! environments, endpoint configurations, the append-only call log, and
//! fabricated business records. The in-memory adapter is deterministic and
//! test-friendly; PostgreSQL (behind the `postgres` feature) is the
//! transactional backend for shared deployments.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod chain;
mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
mod traits;

pub use error::{StorageError, StorageResult};
pub use traits::{
    CallLogStore, ClearFilter, EndpointStore, EnvironmentStore, QueryWindow, RecordStore,
    SimulatorStorage,
};
