//! Synthetic-data generation types: distribution recipes, anomaly
//! configuration, and the fabricated business records themselves.

use crate::ids::{BatchId, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A value-generation recipe. Not persisted; supplied per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionSpec {
    /// Linear interpolation of a uniform `[0,1)` draw into `[min, max)`.
    Uniform { min: f64, max: f64 },
    /// Box–Muller normal.
    Normal { mean: f64, std_dev: f64 },
    /// Inverse-CDF exponential.
    Exponential { lambda: f64 },
}

/// Per-field distribution overrides; omitted fields use hardcoded defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Distributions {
    /// Monetary amount on transactions.
    pub amount: Option<DistributionSpec>,
    /// Duration in seconds on operational events.
    pub duration_secs: Option<DistributionSpec>,
}

/// The anomaly kinds the injector can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Multiply the designated numeric field by a factor in `[10, 100)`.
    Outlier,
    /// Append a structural copy with a fresh id; the batch grows.
    Duplicate,
    /// Null out the designated reference field.
    NullValue,
    /// Overwrite the status field with a sentinel invalid value.
    InvalidStatus,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::Outlier => "outlier",
            AnomalyKind::Duplicate => "duplicate",
            AnomalyKind::NullValue => "null_value",
            AnomalyKind::InvalidStatus => "invalid_status",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many anomaly actions to apply, drawn from which kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyConfig {
    pub count: usize,
    pub kinds: Vec<AnomalyKind>,
}

/// Tally of what the injector actually did to a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalySummary {
    /// Actions applied; each action tags exactly one marker.
    pub applied: usize,
    /// How many of those actions appended a duplicate row.
    pub duplicates_added: usize,
}

/// Where a stored record came from.
///
/// Every generated row carries `Simulator` so cleanup can selectively
/// remove synthetic rows and leave organically inserted ones untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    Simulator,
    External,
}

/// Generator metadata attached to every fabricated record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub origin: RecordOrigin,
    pub batch_id: Option<BatchId>,
    /// Ordered list of anomaly actions this record received; one entry per
    /// applied action, so a record hit repeatedly carries several markers.
    #[serde(default)]
    pub anomalies: Vec<AnomalyKind>,
    pub seed: Option<u64>,
}

impl RecordMetadata {
    pub fn simulator(batch_id: BatchId, seed: Option<u64>) -> Self {
        Self {
            origin: RecordOrigin::Simulator,
            batch_id: Some(batch_id),
            anomalies: Vec::new(),
            seed,
        }
    }

    pub fn external() -> Self {
        Self {
            origin: RecordOrigin::External,
            batch_id: None,
            anomalies: Vec::new(),
            seed: None,
        }
    }

    pub fn is_simulator_origin(&self) -> bool {
        self.origin == RecordOrigin::Simulator
    }
}

/// A fabricated financial transaction row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub channel: String,
    pub account_ref: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub metadata: RecordMetadata,
}

/// A fabricated operational event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalEvent {
    pub id: RecordId,
    pub event_type: String,
    pub severity: String,
    pub resource_ref: Option<String>,
    pub status: String,
    pub duration_secs: i64,
    pub occurred_at: DateTime<Utc>,
    pub metadata: RecordMetadata,
}

/// Which record table a generation request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Transactions,
    OperationalEvents,
}

/// Which record tables a clear request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearTarget {
    Transactions,
    OperationalEvents,
    All,
}

/// Inclusive timestamp window records are generated within.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl GenerationWindow {
    /// The `days` days ending at `end`.
    pub fn trailing_days(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - chrono::Duration::days(days),
            end,
        }
    }
}

/// One bulk-generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub kind: TargetKind,
    pub rows: usize,
    /// Defaults to the 30 days ending at the service clock's "now".
    pub window: Option<GenerationWindow>,
    pub distributions: Option<Distributions>,
    pub seasonality: bool,
    pub anomalies: Option<AnomalyConfig>,
    /// Seed for a deterministic batch; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl GenerationRequest {
    pub fn new(kind: TargetKind, rows: usize) -> Self {
        Self {
            kind,
            rows,
            window: None,
            distributions: None,
            seasonality: false,
            anomalies: None,
            seed: None,
        }
    }
}

/// What a bulk-generation call reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Rows actually inserted, duplicate growth included.
    pub generated_rows: usize,
    /// The first 10 records, serialized.
    pub preview_sample: Vec<Value>,
    pub batch_id: BatchId,
    pub anomaly_summary: AnomalySummary,
}

/// Filtered bulk-delete request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearRequest {
    pub target: ClearTarget,
    pub only_simulator_data: bool,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// What a clear call reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReport {
    pub transactions_deleted: u64,
    pub operational_events_deleted: u64,
}
