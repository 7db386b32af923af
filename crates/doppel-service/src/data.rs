//! Data facade: sample, generate, clear.

use crate::config::HarnessConfig;
use crate::error::{ServiceError, ServiceResult};
use doppel_datagen::pipeline::{build_batch, GeneratedBatch};
use doppel_datagen::sampler;
use doppel_storage::{ClearFilter, QueryWindow, SimulatorStorage};
use doppel_types::{
    BatchId, ClearReport, ClearRequest, ClearTarget, Clock, DistributionSpec, GenerationReport,
    GenerationRequest, GenerationWindow, OperationalEvent, Transaction,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

/// Generates and clears synthetic business records.
pub struct DataService {
    storage: Arc<dyn SimulatorStorage>,
    clock: Arc<dyn Clock>,
    config: HarnessConfig,
    rng: Mutex<StdRng>,
}

impl DataService {
    pub fn new(
        storage: Arc<dyn SimulatorStorage>,
        clock: Arc<dyn Clock>,
        config: HarnessConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            storage,
            clock,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Draw one value from a distribution spec.
    pub fn sample(&self, spec: &DistributionSpec) -> ServiceResult<f64> {
        let mut guard = self.rng.lock().map_err(|_| ServiceError::RngPoisoned)?;
        Ok(sampler::sample(spec, &mut *guard))
    }

    /// Assemble, inject, and bulk-insert one synthetic batch.
    ///
    /// CPU-bound and synchronous up to the single storage round trip; a
    /// storage failure aborts the whole batch and propagates unmodified.
    #[instrument(skip(self, request), fields(kind = ?request.kind, rows = request.rows))]
    pub async fn generate(&self, mut request: GenerationRequest) -> ServiceResult<GenerationReport> {
        let batch_id = BatchId::generate();
        let mut rng = self.batch_rng(request.seed)?;

        if request.window.is_none() {
            request.window = Some(GenerationWindow::trailing_days(
                self.clock.now(),
                self.config.default_window_days,
            ));
        }
        let (batch, anomaly_summary) = build_batch(&request, batch_id, self.clock.now(), &mut rng);

        let (generated_rows, preview_sample) = match batch {
            GeneratedBatch::Transactions(rows) => {
                let preview = preview(&rows, self.config.preview_rows)?;
                let inserted = self.storage.insert_transactions(rows).await?;
                (inserted, preview)
            }
            GeneratedBatch::OperationalEvents(rows) => {
                let preview = preview(&rows, self.config.preview_rows)?;
                let inserted = self.storage.insert_events(rows).await?;
                (inserted, preview)
            }
        };

        debug!(batch_id = %batch_id, generated_rows, "synthetic batch inserted");
        Ok(GenerationReport {
            generated_rows,
            preview_sample,
            batch_id,
            anomaly_summary,
        })
    }

    /// Filtered bulk delete, scoped by the simulator-origin marker when
    /// `only_simulator_data` and an optional `occurred_at` range.
    #[instrument(skip(self, request), fields(target = ?request.target))]
    pub async fn clear(&self, request: ClearRequest) -> ServiceResult<ClearReport> {
        let filter = ClearFilter {
            only_simulator_data: request.only_simulator_data,
            from: request.from,
            to: request.to,
        };

        let mut report = ClearReport::default();
        if matches!(request.target, ClearTarget::Transactions | ClearTarget::All) {
            report.transactions_deleted = self.storage.delete_transactions(&filter).await?;
        }
        if matches!(
            request.target,
            ClearTarget::OperationalEvents | ClearTarget::All
        ) {
            report.operational_events_deleted = self.storage.delete_events(&filter).await?;
        }
        Ok(report)
    }

    /// List stored transactions newest-first.
    pub async fn transactions(&self, window: QueryWindow) -> ServiceResult<Vec<Transaction>> {
        Ok(self.storage.list_transactions(window).await?)
    }

    /// List stored operational events newest-first.
    pub async fn events(&self, window: QueryWindow) -> ServiceResult<Vec<OperationalEvent>> {
        Ok(self.storage.list_events(window).await?)
    }

    /// Per-batch rng: the request's own seed when given, otherwise a fork
    /// of the service rng so the lock is never held across awaits.
    fn batch_rng(&self, seed: Option<u64>) -> ServiceResult<StdRng> {
        if let Some(seed) = seed {
            return Ok(StdRng::seed_from_u64(seed));
        }
        let mut guard = self.rng.lock().map_err(|_| ServiceError::RngPoisoned)?;
        Ok(StdRng::seed_from_u64(guard.gen()))
    }
}

fn preview<T: serde::Serialize>(rows: &[T], count: usize) -> ServiceResult<Vec<Value>> {
    rows.iter()
        .take(count)
        .map(|row| {
            serde_json::to_value(row).map_err(|e| ServiceError::Serialization(e.to_string()))
        })
        .collect()
}
