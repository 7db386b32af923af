//! PostgreSQL adapter for Doppel storage.
//!
//! Designed as the transactional source-of-truth backend for shared
//! deployments. Full records are stored as JSONB next to the handful of
//! columns the queries filter and order on.

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
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Acquire, Row};
use uuid::Uuid;

/// PostgreSQL-backed storage adapter.
#[derive(Clone)]
pub struct PostgresSimulatorStorage {
    pool: PgPool,
}

impl PostgresSimulatorStorage {
    /// Connect to PostgreSQL and initialize required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Backend(format!("failed to connect postgres: {e}")))?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS doppel_environments (
                id UUID PRIMARY KEY,
                updated_at TIMESTAMPTZ NOT NULL,
                record JSONB NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS doppel_endpoints (
                id UUID PRIMARY KEY,
                environment_id UUID NOT NULL,
                method TEXT NOT NULL,
                path TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                record JSONB NOT NULL,
                UNIQUE (environment_id, method, path)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS doppel_call_log (
                id UUID PRIMARY KEY,
                sequence BIGINT NOT NULL UNIQUE,
                endpoint_id UUID,
                created_at TIMESTAMPTZ NOT NULL,
                record JSONB NOT NULL,
                previous_hash TEXT,
                hash TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS doppel_transactions (
                id UUID PRIMARY KEY,
                occurred_at TIMESTAMPTZ NOT NULL,
                simulator_origin BOOLEAN NOT NULL,
                record JSONB NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS doppel_operational_events (
                id UUID PRIMARY KEY,
                occurred_at TIMESTAMPTZ NOT NULL,
                simulator_origin BOOLEAN NOT NULL,
                record JSONB NOT NULL
            )
            "#,
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl EnvironmentStore for PostgresSimulatorStorage {
    async fn upsert_environment(&self, environment: Environment) -> StorageResult<()> {
        let record = to_json(&environment)?;
        sqlx::query(
            r#"
            INSERT INTO doppel_environments (id, updated_at, record)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                updated_at = EXCLUDED.updated_at,
                record = EXCLUDED.record
            "#,
        )
        .bind(*environment.id.as_uuid())
        .bind(environment.updated_at)
        .bind(record)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get_environment(&self, id: &EnvironmentId) -> StorageResult<Option<Environment>> {
        let row = sqlx::query("SELECT record FROM doppel_environments WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        row.map(|r| record_column(&r)).transpose()
    }

    async fn list_environments(&self, window: QueryWindow) -> StorageResult<Vec<Environment>> {
        let rows = paged_query(
            &self.pool,
            "SELECT record FROM doppel_environments ORDER BY updated_at DESC",
            window,
        )
        .await?;
        rows.iter().map(record_column).collect()
    }

    async fn delete_environment(&self, id: &EnvironmentId) -> StorageResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        sqlx::query("DELETE FROM doppel_endpoints WHERE environment_id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let result = sqlx::query("DELETE FROM doppel_environments WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EndpointStore for PostgresSimulatorStorage {
    async fn upsert_endpoint(&self, endpoint: SimulatedEndpoint) -> StorageResult<()> {
        let record = to_json(&endpoint)?;
        sqlx::query(
            r#"
            INSERT INTO doppel_endpoints (id, environment_id, method, path, updated_at, record)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                environment_id = EXCLUDED.environment_id,
                method = EXCLUDED.method,
                path = EXCLUDED.path,
                updated_at = EXCLUDED.updated_at,
                record = EXCLUDED.record
            "#,
        )
        .bind(*endpoint.id.as_uuid())
        .bind(*endpoint.environment_id.as_uuid())
        .bind(endpoint.method.as_str())
        .bind(endpoint.path.clone())
        .bind(endpoint.updated_at)
        .bind(record)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        Ok(())
    }

    async fn get_endpoint(&self, id: &EndpointId) -> StorageResult<Option<SimulatedEndpoint>> {
        let row = sqlx::query("SELECT record FROM doppel_endpoints WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        row.map(|r| record_column(&r)).transpose()
    }

    async fn resolve_endpoint(
        &self,
        environment_id: &EnvironmentId,
        method: HttpMethod,
        path: &str,
    ) -> StorageResult<Option<SimulatedEndpoint>> {
        let row = sqlx::query(
            r#"
            SELECT record FROM doppel_endpoints
             WHERE environment_id = $1 AND method = $2 AND path = $3
            "#,
        )
        .bind(*environment_id.as_uuid())
        .bind(method.as_str())
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;
        row.map(|r| record_column(&r)).transpose()
    }

    async fn list_endpoints(
        &self,
        environment_id: &EnvironmentId,
        window: QueryWindow,
    ) -> StorageResult<Vec<SimulatedEndpoint>> {
        let rows = paged_query_scoped(
            &self.pool,
            "SELECT record FROM doppel_endpoints WHERE environment_id = $1 ORDER BY updated_at DESC",
            *environment_id.as_uuid(),
            window,
        )
        .await?;
        rows.iter().map(record_column).collect()
    }

    async fn delete_endpoint(&self, id: &EndpointId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM doppel_endpoints WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_probe(
        &self,
        id: &EndpointId,
        status: u16,
        at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let at_json = to_json(&at)?;
        let status_json = to_json(&status)?;
        let result = sqlx::query(
            r#"
            UPDATE doppel_endpoints
               SET record = jsonb_set(
                       jsonb_set(record, '{last_tested_at}', $2),
                       '{last_test_status}', $3)
             WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .bind(at_json)
        .bind(status_json)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("endpoint {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CallLogStore for PostgresSimulatorStorage {
    async fn append_call(&self, call: CallLogAppend) -> StorageResult<CallLogRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let conn = tx
            .acquire()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        sqlx::query("LOCK TABLE doppel_call_log IN EXCLUSIVE MODE")
            .execute(&mut *conn)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let last =
            sqlx::query("SELECT sequence, hash FROM doppel_call_log ORDER BY sequence DESC LIMIT 1")
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;

        let (sequence, previous_hash) = if let Some(row) = last {
            let seq: i64 = row
                .try_get("sequence")
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            let prev: String = row
                .try_get("hash")
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            (seq + 1, Some(prev))
        } else {
            (1_i64, None)
        };

        let hash = compute_call_hash(&call, previous_hash.as_deref(), sequence as u64)?;
        let record = CallLogRecord {
            id: CallId::generate(),
            sequence: sequence as u64,
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
            previous_hash: previous_hash.clone(),
            hash: hash.clone(),
        };
        let record_json = to_json(&record)?;

        sqlx::query(
            r#"
            INSERT INTO doppel_call_log
                (id, sequence, endpoint_id, created_at, record, previous_hash, hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*record.id.as_uuid())
        .bind(sequence)
        .bind(record.endpoint_id.map(|id| *id.as_uuid()))
        .bind(record.created_at)
        .bind(record_json)
        .bind(previous_hash)
        .bind(hash)
        .execute(&mut *conn)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(record)
    }

    async fn list_calls(&self, window: QueryWindow) -> StorageResult<Vec<CallLogRecord>> {
        let rows = paged_query(
            &self.pool,
            "SELECT record FROM doppel_call_log ORDER BY sequence DESC",
            window,
        )
        .await?;
        rows.iter().map(record_column).collect()
    }

    async fn calls_for_endpoint(
        &self,
        endpoint_id: &EndpointId,
        window: QueryWindow,
    ) -> StorageResult<Vec<CallLogRecord>> {
        let rows = paged_query_scoped(
            &self.pool,
            "SELECT record FROM doppel_call_log WHERE endpoint_id = $1 ORDER BY sequence DESC",
            *endpoint_id.as_uuid(),
            window,
        )
        .await?;
        rows.iter().map(record_column).collect()
    }

    async fn latest_call_hash(&self) -> StorageResult<Option<String>> {
        let row = sqlx::query("SELECT hash FROM doppel_call_log ORDER BY sequence DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(row
            .map(|r| r.try_get::<String, _>("hash"))
            .transpose()
            .map_err(|e| StorageError::Backend(e.to_string()))?)
    }
}

#[async_trait]
impl RecordStore for PostgresSimulatorStorage {
    async fn insert_transactions(&self, rows: Vec<Transaction>) -> StorageResult<usize> {
        bulk_insert(
            &self.pool,
            "doppel_transactions",
            rows.iter()
                .map(|t| {
                    Ok((
                        *t.id.as_uuid(),
                        t.occurred_at,
                        t.metadata.is_simulator_origin(),
                        to_json(t)?,
                    ))
                })
                .collect::<StorageResult<Vec<_>>>()?,
        )
        .await
    }

    async fn insert_events(&self, rows: Vec<OperationalEvent>) -> StorageResult<usize> {
        bulk_insert(
            &self.pool,
            "doppel_operational_events",
            rows.iter()
                .map(|e| {
                    Ok((
                        *e.id.as_uuid(),
                        e.occurred_at,
                        e.metadata.is_simulator_origin(),
                        to_json(e)?,
                    ))
                })
                .collect::<StorageResult<Vec<_>>>()?,
        )
        .await
    }

    async fn list_transactions(&self, window: QueryWindow) -> StorageResult<Vec<Transaction>> {
        let rows = paged_query(
            &self.pool,
            "SELECT record FROM doppel_transactions ORDER BY occurred_at DESC",
            window,
        )
        .await?;
        rows.iter().map(record_column).collect()
    }

    async fn list_events(&self, window: QueryWindow) -> StorageResult<Vec<OperationalEvent>> {
        let rows = paged_query(
            &self.pool,
            "SELECT record FROM doppel_operational_events ORDER BY occurred_at DESC",
            window,
        )
        .await?;
        rows.iter().map(record_column).collect()
    }

    async fn delete_transactions(&self, filter: &ClearFilter) -> StorageResult<u64> {
        filtered_delete(&self.pool, "doppel_transactions", filter).await
    }

    async fn delete_events(&self, filter: &ClearFilter) -> StorageResult<u64> {
        filtered_delete(&self.pool, "doppel_operational_events", filter).await
    }
}

async fn bulk_insert(
    pool: &PgPool,
    table: &str,
    rows: Vec<(Uuid, DateTime<Utc>, bool, Value)>,
) -> StorageResult<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut ids = Vec::with_capacity(rows.len());
    let mut occurred = Vec::with_capacity(rows.len());
    let mut origins = Vec::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());
    for (id, at, origin, record) in rows {
        ids.push(id);
        occurred.push(at);
        origins.push(origin);
        records.push(record);
    }

    let inserted = ids.len();
    let stmt = format!(
        r#"
        INSERT INTO {table} (id, occurred_at, simulator_origin, record)
        SELECT * FROM UNNEST($1::uuid[], $2::timestamptz[], $3::boolean[], $4::jsonb[])
        "#
    );
    sqlx::query(&stmt)
        .bind(ids)
        .bind(occurred)
        .bind(origins)
        .bind(records)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;
    Ok(inserted)
}

async fn filtered_delete(pool: &PgPool, table: &str, filter: &ClearFilter) -> StorageResult<u64> {
    let stmt = format!(
        r#"
        DELETE FROM {table}
         WHERE ($1 = FALSE OR simulator_origin)
           AND ($2::timestamptz IS NULL OR occurred_at >= $2)
           AND ($3::timestamptz IS NULL OR occurred_at <= $3)
        "#
    );
    let result = sqlx::query(&stmt)
        .bind(filter.only_simulator_data)
        .bind(filter.from)
        .bind(filter.to)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;
    Ok(result.rows_affected())
}

async fn paged_query(pool: &PgPool, base: &str, window: QueryWindow) -> StorageResult<Vec<PgRow>> {
    let rows = if window.limit == 0 {
        let stmt = format!("{base} OFFSET $1");
        sqlx::query(&stmt)
            .bind(to_i64(window.offset)?)
            .fetch_all(pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?
    } else {
        let stmt = format!("{base} LIMIT $1 OFFSET $2");
        sqlx::query(&stmt)
            .bind(to_i64(window.limit)?)
            .bind(to_i64(window.offset)?)
            .fetch_all(pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?
    };
    Ok(rows)
}

async fn paged_query_scoped(
    pool: &PgPool,
    base: &str,
    scope: Uuid,
    window: QueryWindow,
) -> StorageResult<Vec<PgRow>> {
    let rows = if window.limit == 0 {
        let stmt = format!("{base} OFFSET $2");
        sqlx::query(&stmt)
            .bind(scope)
            .bind(to_i64(window.offset)?)
            .fetch_all(pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?
    } else {
        let stmt = format!("{base} LIMIT $2 OFFSET $3");
        sqlx::query(&stmt)
            .bind(scope)
            .bind(to_i64(window.limit)?)
            .bind(to_i64(window.offset)?)
            .fetch_all(pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?
    };
    Ok(rows)
}

fn record_column<T: serde::de::DeserializeOwned>(row: &PgRow) -> StorageResult<T> {
    let value: Value = row
        .try_get("record")
        .map_err(|e| StorageError::Backend(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> StorageResult<Value> {
    serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn map_sqlx_conflict(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StorageError::Conflict(db_err.message().to_string());
        }
    }
    StorageError::Backend(err.to_string())
}

fn to_i64(value: usize) -> StorageResult<i64> {
    i64::try_from(value)
        .map_err(|_| StorageError::InvalidInput("window value too large".to_string()))
}
