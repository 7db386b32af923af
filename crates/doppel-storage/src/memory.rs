//! In-memory reference implementation for Doppel storage traits.
//!
//! This adapter is deterministic and test-friendly. Shared deployments
//! should use the PostgreSQL adapter as the source of truth.

use crate::chain::compute_call_hash;
use crate::traits::{
    CallLogStore, ClearFilter, EndpointStore, EnvironmentStore, QueryWindow, RecordStore,
};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doppel_types::{
    CallId, CallLogAppend, CallLogRecord, EndpointId, Environment, EnvironmentId, HttpMethod,
    OperationalEvent, SimulatedEndpoint, Transaction,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory Doppel storage adapter.
#[derive(Default)]
pub struct InMemorySimulatorStorage {
    environments: RwLock<HashMap<EnvironmentId, Environment>>,
    endpoints: RwLock<HashMap<EndpointId, SimulatedEndpoint>>,
    calls: RwLock<Vec<CallLogRecord>>,
    transactions: RwLock<Vec<Transaction>>,
    events: RwLock<Vec<OperationalEvent>>,
}

impl InMemorySimulatorStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnvironmentStore for InMemorySimulatorStorage {
    async fn upsert_environment(&self, environment: Environment) -> StorageResult<()> {
        let mut guard = self
            .environments
            .write()
            .map_err(|_| StorageError::Backend("environments lock poisoned".to_string()))?;
        guard.insert(environment.id, environment);
        Ok(())
    }

    async fn get_environment(&self, id: &EnvironmentId) -> StorageResult<Option<Environment>> {
        let guard = self
            .environments
            .read()
            .map_err(|_| StorageError::Backend("environments lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn list_environments(&self, window: QueryWindow) -> StorageResult<Vec<Environment>> {
        let guard = self
            .environments
            .read()
            .map_err(|_| StorageError::Backend("environments lock poisoned".to_string()))?;
        let mut values = guard.values().cloned().collect::<Vec<_>>();
        values.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(apply_window(values, window))
    }

    async fn delete_environment(&self, id: &EnvironmentId) -> StorageResult<bool> {
        let mut guard = self
            .environments
            .write()
            .map_err(|_| StorageError::Backend("environments lock poisoned".to_string()))?;
        let removed = guard.remove(id).is_some();
        drop(guard);

        if removed {
            let mut endpoints = self
                .endpoints
                .write()
                .map_err(|_| StorageError::Backend("endpoints lock poisoned".to_string()))?;
            endpoints.retain(|_, e| e.environment_id != *id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl EndpointStore for InMemorySimulatorStorage {
    async fn upsert_endpoint(&self, endpoint: SimulatedEndpoint) -> StorageResult<()> {
        let mut guard = self
            .endpoints
            .write()
            .map_err(|_| StorageError::Backend("endpoints lock poisoned".to_string()))?;

        let taken = guard.values().any(|existing| {
            existing.id != endpoint.id
                && existing.environment_id == endpoint.environment_id
                && existing.method == endpoint.method
                && existing.path == endpoint.path
        });
        if taken {
            return Err(StorageError::Conflict(format!(
                "{} {} already registered in environment {}",
                endpoint.method, endpoint.path, endpoint.environment_id
            )));
        }

        guard.insert(endpoint.id, endpoint);
        Ok(())
    }

    async fn get_endpoint(&self, id: &EndpointId) -> StorageResult<Option<SimulatedEndpoint>> {
        let guard = self
            .endpoints
            .read()
            .map_err(|_| StorageError::Backend("endpoints lock poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }

    async fn resolve_endpoint(
        &self,
        environment_id: &EnvironmentId,
        method: HttpMethod,
        path: &str,
    ) -> StorageResult<Option<SimulatedEndpoint>> {
        let guard = self
            .endpoints
            .read()
            .map_err(|_| StorageError::Backend("endpoints lock poisoned".to_string()))?;
        Ok(guard
            .values()
            .find(|e| {
                e.environment_id == *environment_id && e.method == method && e.path == path
            })
            .cloned())
    }

    async fn list_endpoints(
        &self,
        environment_id: &EnvironmentId,
        window: QueryWindow,
    ) -> StorageResult<Vec<SimulatedEndpoint>> {
        let guard = self
            .endpoints
            .read()
            .map_err(|_| StorageError::Backend("endpoints lock poisoned".to_string()))?;
        let mut values = guard
            .values()
            .filter(|e| e.environment_id == *environment_id)
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(apply_window(values, window))
    }

    async fn delete_endpoint(&self, id: &EndpointId) -> StorageResult<bool> {
        let mut guard = self
            .endpoints
            .write()
            .map_err(|_| StorageError::Backend("endpoints lock poisoned".to_string()))?;
        Ok(guard.remove(id).is_some())
    }

    async fn record_probe(
        &self,
        id: &EndpointId,
        status: u16,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let mut guard = self
            .endpoints
            .write()
            .map_err(|_| StorageError::Backend("endpoints lock poisoned".to_string()))?;
        let endpoint = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("endpoint {} not found", id)))?;
        endpoint.last_tested_at = Some(at);
        endpoint.last_test_status = Some(status);
        Ok(())
    }
}

#[async_trait]
impl CallLogStore for InMemorySimulatorStorage {
    async fn append_call(&self, call: CallLogAppend) -> StorageResult<CallLogRecord> {
        let mut guard = self
            .calls
            .write()
            .map_err(|_| StorageError::Backend("call log lock poisoned".to_string()))?;

        let previous_hash = guard.last().map(|c| c.hash.clone());
        let sequence = guard.len() as u64 + 1;
        let hash = compute_call_hash(&call, previous_hash.as_deref(), sequence)?;

        let record = CallLogRecord {
            id: CallId::generate(),
            sequence,
            correlation_id: call.correlation_id,
            environment_id: call.environment_id,
            endpoint_id: call.endpoint_id,
            request: call.request,
            response_status: call.response_status,
            response_body: call.response_body,
            latency_ms: call.latency_ms,
            error_injected: call.error_injected,
            transform_applied: call.transform_applied,
            transform_failed: call.transform_failed,
            created_at: call.created_at,
            previous_hash,
            hash,
        };

        guard.push(record.clone());
        Ok(record)
    }

    async fn list_calls(&self, window: QueryWindow) -> StorageResult<Vec<CallLogRecord>> {
        let guard = self
            .calls
            .read()
            .map_err(|_| StorageError::Backend("call log lock poisoned".to_string()))?;
        let mut values = guard.clone();
        values.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(apply_window(values, window))
    }

    async fn calls_for_endpoint(
        &self,
        endpoint_id: &EndpointId,
        window: QueryWindow,
    ) -> StorageResult<Vec<CallLogRecord>> {
        let guard = self
            .calls
            .read()
            .map_err(|_| StorageError::Backend("call log lock poisoned".to_string()))?;
        let mut values = guard
            .iter()
            .filter(|c| c.endpoint_id == Some(*endpoint_id))
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(apply_window(values, window))
    }

    async fn latest_call_hash(&self) -> StorageResult<Option<String>> {
        let guard = self
            .calls
            .read()
            .map_err(|_| StorageError::Backend("call log lock poisoned".to_string()))?;
        Ok(guard.last().map(|c| c.hash.clone()))
    }
}

#[async_trait]
impl RecordStore for InMemorySimulatorStorage {
    async fn insert_transactions(&self, rows: Vec<Transaction>) -> StorageResult<usize> {
        let mut guard = self
            .transactions
            .write()
            .map_err(|_| StorageError::Backend("transactions lock poisoned".to_string()))?;
        let inserted = rows.len();
        guard.extend(rows);
        Ok(inserted)
    }

    async fn insert_events(&self, rows: Vec<OperationalEvent>) -> StorageResult<usize> {
        let mut guard = self
            .events
            .write()
            .map_err(|_| StorageError::Backend("events lock poisoned".to_string()))?;
        let inserted = rows.len();
        guard.extend(rows);
        Ok(inserted)
    }

    async fn list_transactions(&self, window: QueryWindow) -> StorageResult<Vec<Transaction>> {
        let guard = self
            .transactions
            .read()
            .map_err(|_| StorageError::Backend("transactions lock poisoned".to_string()))?;
        let mut values = guard.clone();
        values.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(apply_window(values, window))
    }

    async fn list_events(&self, window: QueryWindow) -> StorageResult<Vec<OperationalEvent>> {
        let guard = self
            .events
            .read()
            .map_err(|_| StorageError::Backend("events lock poisoned".to_string()))?;
        let mut values = guard.clone();
        values.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(apply_window(values, window))
    }

    async fn delete_transactions(&self, filter: &ClearFilter) -> StorageResult<u64> {
        let mut guard = self
            .transactions
            .write()
            .map_err(|_| StorageError::Backend("transactions lock poisoned".to_string()))?;
        let before = guard.len();
        guard.retain(|t| !filter.matches(t.occurred_at, t.metadata.is_simulator_origin()));
        Ok((before - guard.len()) as u64)
    }

    async fn delete_events(&self, filter: &ClearFilter) -> StorageResult<u64> {
        let mut guard = self
            .events
            .write()
            .map_err(|_| StorageError::Backend("events lock poisoned".to_string()))?;
        let before = guard.len();
        guard.retain(|e| !filter.matches(e.occurred_at, e.metadata.is_simulator_origin()));
        Ok((before - guard.len()) as u64)
    }
}

fn apply_window<T>(items: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = items.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_types::{CorrelationId, RecordId, RecordMetadata, RequestSnapshot};
    use serde_json::json;

    fn environment() -> Environment {
        Environment::new("staging", "https://orchestrator.test", Utc::now())
    }

    fn endpoint(environment_id: EnvironmentId, path: &str) -> SimulatedEndpoint {
        SimulatedEndpoint::new(
            environment_id,
            HttpMethod::Get,
            path,
            json!({"ok": true}),
            Utc::now(),
        )
    }

    fn call(environment_id: EnvironmentId, endpoint_id: Option<EndpointId>) -> CallLogAppend {
        CallLogAppend {
            correlation_id: CorrelationId::generate(),
            environment_id,
            endpoint_id,
            request: RequestSnapshot::new(HttpMethod::Get, "/ping"),
            response_status: 200,
            response_body: json!({"ok": true}),
            latency_ms: 0,
            error_injected: false,
            transform_applied: false,
            transform_failed: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn call_log_hashes_are_linked() {
        let storage = InMemorySimulatorStorage::new();
        let env = environment();
        let first = storage.append_call(call(env.id, None)).await.unwrap();
        let second = storage.append_call(call(env.id, None)).await.unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(second.previous_hash, Some(first.hash.clone()));
        assert_eq!(
            storage.latest_call_hash().await.unwrap(),
            Some(second.hash)
        );
    }

    #[tokio::test]
    async fn duplicate_route_registration_conflicts() {
        let storage = InMemorySimulatorStorage::new();
        let env = environment();
        storage.upsert_environment(env.clone()).await.unwrap();

        let first = endpoint(env.id, "/orders");
        storage.upsert_endpoint(first.clone()).await.unwrap();

        // Same id re-registers fine; a different id on the same route conflicts.
        storage.upsert_endpoint(first.clone()).await.unwrap();
        let clash = endpoint(env.id, "/orders");
        let err = storage.upsert_endpoint(clash).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_an_environment_cascades_to_endpoints() {
        let storage = InMemorySimulatorStorage::new();
        let env = environment();
        storage.upsert_environment(env.clone()).await.unwrap();
        storage
            .upsert_endpoint(endpoint(env.id, "/orders"))
            .await
            .unwrap();

        assert!(storage.delete_environment(&env.id).await.unwrap());
        let left = storage
            .list_endpoints(&env.id, QueryWindow::default())
            .await
            .unwrap();
        assert!(left.is_empty());
    }

    #[tokio::test]
    async fn probe_recording_is_last_write_wins() {
        let storage = InMemorySimulatorStorage::new();
        let env = environment();
        let ep = endpoint(env.id, "/health");
        storage.upsert_endpoint(ep.clone()).await.unwrap();

        let early = Utc::now();
        let late = early + chrono::Duration::seconds(5);
        storage.record_probe(&ep.id, 200, early).await.unwrap();
        storage.record_probe(&ep.id, 500, late).await.unwrap();

        let stored = storage.get_endpoint(&ep.id).await.unwrap().unwrap();
        assert_eq!(stored.last_test_status, Some(500));
        assert_eq!(stored.last_tested_at, Some(late));
    }

    #[tokio::test]
    async fn clear_filter_scopes_by_origin_and_date() {
        let storage = InMemorySimulatorStorage::new();
        let batch_id = doppel_types::BatchId::generate();
        let at = Utc::now();

        let simulator = Transaction {
            id: RecordId::generate(),
            reference: "TXN-1".to_string(),
            amount: 10.0,
            currency: "USD".to_string(),
            status: "COMPLETED".to_string(),
            channel: "WEB".to_string(),
            account_ref: None,
            occurred_at: at,
            metadata: RecordMetadata::simulator(batch_id, None),
        };
        let external = Transaction {
            metadata: RecordMetadata::external(),
            id: RecordId::generate(),
            ..simulator.clone()
        };
        storage
            .insert_transactions(vec![simulator, external])
            .await
            .unwrap();

        let filter = ClearFilter {
            only_simulator_data: true,
            from: None,
            to: None,
        };
        assert_eq!(storage.delete_transactions(&filter).await.unwrap(), 1);

        let left = storage
            .list_transactions(QueryWindow::default())
            .await
            .unwrap();
        assert_eq!(left.len(), 1);
        assert!(!left[0].metadata.is_simulator_origin());
    }
}
