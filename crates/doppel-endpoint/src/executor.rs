//! The endpoint execution state machine.
//!
//! `PENDING → (latency delay) → ERROR ROLL → {FORCED_ERROR | TRANSFORMED |
//! TEMPLATED} → outcome`. Logging is the dispatcher's job so the executor
//! stays a pure async function over config + request + rng.

use doppel_template::{apply, render};
use doppel_types::{HttpMethod, RequestSnapshot, SimulatedEndpoint, SimulatedResponse};
use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// The fixed body returned when the error roll fires.
pub fn simulated_failure_body() -> Value {
    json!({
        "error": "Simulated failure",
        "simulated": true,
    })
}

/// The fixed body returned when no endpoint matches a dispatched request.
pub fn not_configured_body(method: HttpMethod, path: &str) -> Value {
    json!({
        "error": "No simulated endpoint configured",
        "method": method.as_str(),
        "path": path,
    })
}

/// What one invocation resolved to, plus the flags the call log records.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub status: u16,
    pub body: Value,
    pub latency_ms: u64,
    /// The response is the injected-failure fixture, not a genuine failure.
    pub error_injected: bool,
    pub transform_applied: bool,
    pub transform_failed: bool,
}

impl ExecutionOutcome {
    pub fn response(&self) -> SimulatedResponse {
        SimulatedResponse {
            status: self.status,
            body: self.body.clone(),
        }
    }
}

/// Run one endpoint invocation.
///
/// The latency delay is a non-blocking timed suspension; concurrent
/// executions proceed. A transform failure is swallowed: the raw,
/// unrendered template comes back with `transform_failed` set, and the
/// invocation still counts as a success.
pub async fn execute<R: Rng + Send>(
    endpoint: &SimulatedEndpoint,
    request: &RequestSnapshot,
    rng: &mut R,
) -> ExecutionOutcome {
    if endpoint.latency_ms > 0 {
        tokio::time::sleep(Duration::from_millis(endpoint.latency_ms)).await;
    }

    let roll: f64 = rng.gen_range(0.0..100.0);
    if roll < endpoint.error_rate_percent {
        debug!(endpoint_id = %endpoint.id, roll, "injected simulated failure");
        return ExecutionOutcome {
            status: 500,
            body: simulated_failure_body(),
            latency_ms: endpoint.latency_ms,
            error_injected: true,
            transform_applied: false,
            transform_failed: false,
        };
    }

    let ctx = request.context();

    if let Some(program) = &endpoint.transform {
        let seeded = render(&endpoint.response_template, &ctx);
        match apply(program, endpoint.status_code, seeded, &ctx) {
            Ok(response) => {
                return ExecutionOutcome {
                    status: response.status,
                    body: response.body,
                    latency_ms: endpoint.latency_ms,
                    error_injected: false,
                    transform_applied: true,
                    transform_failed: false,
                };
            }
            Err(err) => {
                warn!(
                    endpoint_id = %endpoint.id,
                    error = %err,
                    "transform program failed; falling back to raw template"
                );
                return ExecutionOutcome {
                    status: endpoint.status_code,
                    body: endpoint.response_template.clone(),
                    latency_ms: endpoint.latency_ms,
                    error_injected: false,
                    transform_applied: false,
                    transform_failed: true,
                };
            }
        }
    }

    ExecutionOutcome {
        status: endpoint.status_code,
        body: render(&endpoint.response_template, &ctx),
        latency_ms: endpoint.latency_ms,
        error_injected: false,
        transform_applied: false,
        transform_failed: false,
    }
}
