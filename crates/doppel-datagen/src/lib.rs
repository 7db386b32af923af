//! Synthetic business-record generation.
//!
//! Build order, leaves first: distribution samplers → seasonality adjuster →
//! record fabricators → anomaly injector → bulk pipeline. Every function
//! takes its random source as `&mut impl Rng`; nothing reads a thread-local
//! RNG or the wall clock.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod anomaly;
pub mod fabricate;
pub mod pipeline;
pub mod sampler;
pub mod seasonality;

pub use anomaly::{inject, AnomalyTarget, INVALID_STATUS_SENTINEL};
pub use fabricate::{fabricate_event, fabricate_transaction};
pub use pipeline::{build_batch, GeneratedBatch};
pub use sampler::{sample, sample_amount, sample_duration_secs};
pub use seasonality::sample_timestamp;
