//! Doppel shared domain types.
//!
//! Doppel is a test-double for an external orchestrator platform. This crate
//! carries the data model every other workspace member speaks:
//! - environments and simulated endpoint configurations
//! - request snapshots and simulated responses
//! - append-only call-log records
//! - distribution specs, anomaly configs, and fabricated business records
//!
//! Behavior lives elsewhere (`doppel-template`, `doppel-datagen`,
//! `doppel-endpoint`); these types are plain serde data.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod calllog;
pub mod clock;
pub mod datagen;
pub mod endpoint;
pub mod environment;
pub mod ids;
pub mod request;
pub mod transform;

pub use calllog::{CallLogAppend, CallLogRecord};
pub use clock::{Clock, FixedClock, SystemClock};
pub use datagen::{
    AnomalyConfig, AnomalyKind, AnomalySummary, ClearReport, ClearRequest, ClearTarget,
    DistributionSpec, Distributions, GenerationReport, GenerationRequest, GenerationWindow,
    OperationalEvent, RecordMetadata, RecordOrigin, TargetKind, Transaction,
};
pub use endpoint::{HttpMethod, MethodParseError, SimulatedEndpoint};
pub use environment::Environment;
pub use ids::{BatchId, CallId, CorrelationId, EndpointId, EnvironmentId, RecordId};
pub use request::{RequestContext, RequestSnapshot, SimulatedResponse};
pub use transform::{RequestSource, TransformOp, TransformProgram};
