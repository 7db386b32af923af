use crate::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doppel_types::{
    CallLogAppend, CallLogRecord, EndpointId, Environment, EnvironmentId, HttpMethod,
    OperationalEvent, SimulatedEndpoint, Transaction,
};

/// Generic query window for paged reads. `limit == 0` means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

/// Filter for bulk record deletion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearFilter {
    /// Only delete rows carrying the simulator-origin marker.
    pub only_simulator_data: bool,
    /// Inclusive lower bound on `occurred_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `occurred_at`.
    pub to: Option<DateTime<Utc>>,
}

impl ClearFilter {
    pub fn matches(&self, occurred_at: DateTime<Utc>, simulator_origin: bool) -> bool {
        if self.only_simulator_data && !simulator_origin {
            return false;
        }
        if let Some(from) = self.from {
            if occurred_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if occurred_at > to {
                return false;
            }
        }
        true
    }
}

/// Storage for environments.
#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    /// Create or update an environment.
    async fn upsert_environment(&self, environment: Environment) -> StorageResult<()>;

    /// Get an environment by id.
    async fn get_environment(&self, id: &EnvironmentId) -> StorageResult<Option<Environment>>;

    /// List environments newest-first.
    async fn list_environments(&self, window: QueryWindow) -> StorageResult<Vec<Environment>>;

    /// Delete an environment and its endpoints.
    async fn delete_environment(&self, id: &EnvironmentId) -> StorageResult<bool>;
}

/// Storage for simulated endpoint configurations.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Create or update an endpoint. Fails with `Conflict` when another
    /// endpoint already claims the same `(environment, method, path)`.
    async fn upsert_endpoint(&self, endpoint: SimulatedEndpoint) -> StorageResult<()>;

    /// Get an endpoint by id.
    async fn get_endpoint(&self, id: &EndpointId) -> StorageResult<Option<SimulatedEndpoint>>;

    /// Resolve the endpoint registered under `(environment, method, path)`.
    async fn resolve_endpoint(
        &self,
        environment_id: &EnvironmentId,
        method: HttpMethod,
        path: &str,
    ) -> StorageResult<Option<SimulatedEndpoint>>;

    /// List an environment's endpoints newest-first.
    async fn list_endpoints(
        &self,
        environment_id: &EnvironmentId,
        window: QueryWindow,
    ) -> StorageResult<Vec<SimulatedEndpoint>>;

    /// Delete an endpoint by id.
    async fn delete_endpoint(&self, id: &EndpointId) -> StorageResult<bool>;

    /// Record a probe result; last-write-wins under concurrent calls.
    async fn record_probe(
        &self,
        id: &EndpointId,
        status: u16,
        at: DateTime<Utc>,
    ) -> StorageResult<()>;
}

/// Storage for the append-only, hash-chained call log.
#[async_trait]
pub trait CallLogStore: Send + Sync {
    /// Append one call and return the canonical, hash-linked stored record.
    async fn append_call(&self, call: CallLogAppend) -> StorageResult<CallLogRecord>;

    /// Read calls newest-first.
    async fn list_calls(&self, window: QueryWindow) -> StorageResult<Vec<CallLogRecord>>;

    /// Read one endpoint's calls newest-first.
    async fn calls_for_endpoint(
        &self,
        endpoint_id: &EndpointId,
        window: QueryWindow,
    ) -> StorageResult<Vec<CallLogRecord>>;

    /// Get the latest call-log hash anchor.
    async fn latest_call_hash(&self) -> StorageResult<Option<String>>;
}

/// Storage for fabricated business records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Bulk-insert a batch in one round trip; returns rows inserted.
    async fn insert_transactions(&self, rows: Vec<Transaction>) -> StorageResult<usize>;

    /// Bulk-insert a batch in one round trip; returns rows inserted.
    async fn insert_events(&self, rows: Vec<OperationalEvent>) -> StorageResult<usize>;

    /// Read transactions newest-first by `occurred_at`.
    async fn list_transactions(&self, window: QueryWindow) -> StorageResult<Vec<Transaction>>;

    /// Read events newest-first by `occurred_at`.
    async fn list_events(&self, window: QueryWindow) -> StorageResult<Vec<OperationalEvent>>;

    /// Filtered bulk delete; returns rows removed.
    async fn delete_transactions(&self, filter: &ClearFilter) -> StorageResult<u64>;

    /// Filtered bulk delete; returns rows removed.
    async fn delete_events(&self, filter: &ClearFilter) -> StorageResult<u64>;
}

/// Unified storage bundle the service facade holds.
pub trait SimulatorStorage:
    EnvironmentStore + EndpointStore + CallLogStore + RecordStore + Send + Sync
{
}

impl<T> SimulatorStorage for T where
    T: EnvironmentStore + EndpointStore + CallLogStore + RecordStore + Send + Sync
{
}
