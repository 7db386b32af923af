//! Doppel service facade.
//!
//! The two entry points an external REST layer consumes in-process:
//! - [`SimulationService`]: dispatch inbound request snapshots against
//!   registered endpoints and read the call log back.
//! - [`DataService`]: sample distributions, bulk-generate synthetic
//!   business records, and clear them selectively.
//!
//! Both hold an `Arc<dyn SimulatorStorage>`; swap the in-memory adapter
//! for the PostgreSQL one without touching callers.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod config;
mod data;
mod error;
mod simulation;

pub use config::HarnessConfig;
pub use data::DataService;
pub use error::{ServiceError, ServiceResult};
pub use simulation::SimulationService;
