//! Append-only call-log records.

use crate::ids::{CallId, CorrelationId, EndpointId, EnvironmentId};
use crate::request::RequestSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Call-log append payload. Hashes and sequencing are assigned by storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLogAppend {
    pub correlation_id: CorrelationId,
    pub environment_id: EnvironmentId,
    /// `None` for invocations that matched no configured endpoint; those
    /// are logged too.
    pub endpoint_id: Option<EndpointId>,
    pub request: RequestSnapshot,
    pub response_status: u16,
    pub response_body: Value,
    pub latency_ms: u64,
    /// True when the response is the injected-failure fixture, so logs can
    /// distinguish fixtures from genuine failures.
    pub error_injected: bool,
    pub transform_applied: bool,
    pub transform_failed: bool,
    pub created_at: DateTime<Utc>,
}

/// Persistent tamper-evident record of one simulated invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLogRecord {
    pub id: CallId,
    pub sequence: u64,
    pub correlation_id: CorrelationId,
    pub environment_id: EnvironmentId,
    pub endpoint_id: Option<EndpointId>,
    pub request: RequestSnapshot,
    pub response_status: u16,
    pub response_body: Value,
    pub latency_ms: u64,
    pub error_injected: bool,
    pub transform_applied: bool,
    pub transform_failed: bool,
    pub created_at: DateTime<Utc>,
    pub previous_hash: Option<String>,
    pub hash: String,
}
