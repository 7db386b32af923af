//! Simulation facade: dispatch + call-log reads.

use crate::config::HarnessConfig;
use crate::error::ServiceResult;
use doppel_endpoint::{DispatchResult, Dispatcher};
use doppel_storage::{QueryWindow, SimulatorStorage};
use doppel_types::{CallLogRecord, Clock, EndpointId, EnvironmentId, RequestSnapshot};
use std::sync::Arc;
use tracing::instrument;

/// Dispatches simulated calls and exposes the call log.
pub struct SimulationService {
    dispatcher: Dispatcher,
    storage: Arc<dyn SimulatorStorage>,
}

impl SimulationService {
    pub fn new(
        storage: Arc<dyn SimulatorStorage>,
        clock: Arc<dyn Clock>,
        config: &HarnessConfig,
    ) -> Self {
        let dispatcher = match config.seed {
            Some(seed) => Dispatcher::with_seed(Arc::clone(&storage), clock, seed),
            None => Dispatcher::new(Arc::clone(&storage), clock),
        };
        Self {
            dispatcher,
            storage,
        }
    }

    /// Route one inbound request against an environment; always logs.
    #[instrument(skip(self, request), fields(environment = %environment_id))]
    pub async fn dispatch(
        &self,
        environment_id: &EnvironmentId,
        request: RequestSnapshot,
    ) -> ServiceResult<DispatchResult> {
        Ok(self.dispatcher.dispatch(environment_id, request).await?)
    }

    /// Invoke one endpoint by id; unknown ids are errors, not simulations.
    #[instrument(skip(self, request), fields(endpoint = %endpoint_id))]
    pub async fn execute_endpoint(
        &self,
        endpoint_id: &EndpointId,
        request: RequestSnapshot,
    ) -> ServiceResult<DispatchResult> {
        Ok(self.dispatcher.execute_by_id(endpoint_id, request).await?)
    }

    /// Read the call log newest-first.
    pub async fn call_log(&self, window: QueryWindow) -> ServiceResult<Vec<CallLogRecord>> {
        Ok(self.storage.list_calls(window).await?)
    }

    /// Read one endpoint's calls newest-first.
    pub async fn calls_for_endpoint(
        &self,
        endpoint_id: &EndpointId,
        window: QueryWindow,
    ) -> ServiceResult<Vec<CallLogRecord>> {
        Ok(self.storage.calls_for_endpoint(endpoint_id, window).await?)
    }
}
