//! Simulated endpoint execution.
//!
//! The executor runs one configured endpoint through its state machine:
//! latency delay → error roll → transform or template render. The
//! dispatcher sits above it: it resolves inbound request snapshots against
//! the endpoint store, appends exactly one call-log row per invocation,
//! and records probe results on matched endpoints.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod dispatcher;
pub mod executor;

mod error;

pub use dispatcher::{DispatchResult, Dispatcher};
pub use error::{EndpointError, EndpointResult};
pub use executor::{execute, not_configured_body, simulated_failure_body, ExecutionOutcome};
