//! Routing of inbound request snapshots to configured endpoints.
//!
//! Every dispatched call, matched or not, appends exactly one call-log
//! row. Matched calls additionally update the endpoint's probe fields,
//! last-write-wins.

use crate::error::{EndpointError, EndpointResult};
use crate::executor::{execute, not_configured_body, ExecutionOutcome};
use doppel_storage::SimulatorStorage;
use doppel_types::{
    CallLogAppend, CallLogRecord, Clock, CorrelationId, EndpointId, EnvironmentId,
    RequestSnapshot, SimulatedEndpoint, SimulatedResponse,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

/// What one dispatched invocation produced.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub correlation_id: CorrelationId,
    pub endpoint_id: Option<EndpointId>,
    pub response: SimulatedResponse,
    pub error_injected: bool,
    pub transform_applied: bool,
    pub transform_failed: bool,
    /// The log row this invocation appended.
    pub call: CallLogRecord,
}

/// Routes request snapshots to endpoints and owns the per-call randomness.
pub struct Dispatcher {
    storage: Arc<dyn SimulatorStorage>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
}

impl Dispatcher {
    pub fn new(storage: Arc<dyn SimulatorStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeded constructor for deterministic error rolls.
    pub fn with_seed(storage: Arc<dyn SimulatorStorage>, clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self {
            storage,
            clock,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Fork a per-call rng so the shared lock is never held across awaits.
    fn fork_rng(&self) -> EndpointResult<StdRng> {
        let mut guard = self.rng.lock().map_err(|_| EndpointError::RngPoisoned)?;
        Ok(StdRng::seed_from_u64(guard.gen()))
    }

    /// Dispatch a request against an environment's registered endpoints.
    ///
    /// An unknown environment is an error. Unmatched or disabled routes
    /// produce the fixed not-configured 404 body; they are still logged,
    /// with `endpoint_id = None`.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn dispatch(
        &self,
        environment_id: &EnvironmentId,
        request: RequestSnapshot,
    ) -> EndpointResult<DispatchResult> {
        self.storage
            .get_environment(environment_id)
            .await?
            .ok_or_else(|| EndpointError::EnvironmentNotFound(environment_id.to_string()))?;

        let endpoint = self
            .storage
            .resolve_endpoint(environment_id, request.method, &request.path)
            .await?
            .filter(|e| e.enabled);

        match endpoint {
            Some(endpoint) => {
                self.run_endpoint(*environment_id, &endpoint, request)
                    .await
            }
            None => {
                debug!("no enabled endpoint matched; serving not-configured fixture");
                let outcome = ExecutionOutcome {
                    status: 404,
                    body: not_configured_body(request.method, &request.path),
                    latency_ms: 0,
                    error_injected: false,
                    transform_applied: false,
                    transform_failed: false,
                };
                self.log_outcome(*environment_id, None, request, outcome)
                    .await
            }
        }
    }

    /// Run a specific endpoint by id (the "test this endpoint" flow).
    /// Unknown ids are errors here, not 404 simulations.
    #[instrument(skip(self, request))]
    pub async fn execute_by_id(
        &self,
        endpoint_id: &EndpointId,
        request: RequestSnapshot,
    ) -> EndpointResult<DispatchResult> {
        let endpoint = self
            .storage
            .get_endpoint(endpoint_id)
            .await?
            .ok_or_else(|| EndpointError::EndpointNotFound(endpoint_id.to_string()))?;
        self.run_endpoint(endpoint.environment_id, &endpoint, request)
            .await
    }

    async fn run_endpoint(
        &self,
        environment_id: EnvironmentId,
        endpoint: &SimulatedEndpoint,
        request: RequestSnapshot,
    ) -> EndpointResult<DispatchResult> {
        let mut rng = self.fork_rng()?;
        let outcome = execute(endpoint, &request, &mut rng).await;

        let result = self
            .log_outcome(environment_id, Some(endpoint.id), request, outcome)
            .await?;

        self.storage
            .record_probe(&endpoint.id, result.response.status, self.clock.now())
            .await?;

        Ok(result)
    }

    async fn log_outcome(
        &self,
        environment_id: EnvironmentId,
        endpoint_id: Option<EndpointId>,
        request: RequestSnapshot,
        outcome: ExecutionOutcome,
    ) -> EndpointResult<DispatchResult> {
        let correlation_id = CorrelationId::generate();
        let call = self
            .storage
            .append_call(CallLogAppend {
                correlation_id,
                environment_id,
                endpoint_id,
                request,
                response_status: outcome.status,
                response_body: outcome.body.clone(),
                latency_ms: outcome.latency_ms,
                error_injected: outcome.error_injected,
                transform_applied: outcome.transform_applied,
                transform_failed: outcome.transform_failed,
                created_at: self.clock.now(),
            })
            .await?;

        Ok(DispatchResult {
            correlation_id,
            endpoint_id,
            response: outcome.response(),
            error_injected: outcome.error_injected,
            transform_applied: outcome.transform_applied,
            transform_failed: outcome.transform_failed,
            call,
        })
    }
}
