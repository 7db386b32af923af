//! Bulk batch assembly.
//!
//! Pure and synchronous: given a request, a batch id, "now", and a random
//! source, build the full in-memory batch and run anomaly injection over
//! it. Persistence and reporting are the service layer's job, so a storage
//! failure there aborts the whole batch without partial accounting here.

use crate::anomaly::inject;
use crate::fabricate::{fabricate_event, fabricate_transaction, FabricationContext};
use chrono::{DateTime, Utc};
use doppel_types::{
    AnomalySummary, BatchId, GenerationRequest, GenerationWindow, OperationalEvent, TargetKind,
    Transaction,
};
use rand::Rng;
use tracing::debug;

/// One fully assembled batch, ready for a single storage round trip.
#[derive(Debug, Clone)]
pub enum GeneratedBatch {
    Transactions(Vec<Transaction>),
    OperationalEvents(Vec<OperationalEvent>),
}

impl GeneratedBatch {
    pub fn len(&self) -> usize {
        match self {
            GeneratedBatch::Transactions(rows) => rows.len(),
            GeneratedBatch::OperationalEvents(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Days of history generated when the request carries no window.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Assemble the batch: fabricate `rows` records, then apply anomalies.
/// The batch may grow past `rows` through duplication.
pub fn build_batch<R: Rng + ?Sized>(
    request: &GenerationRequest,
    batch_id: BatchId,
    now: DateTime<Utc>,
    rng: &mut R,
) -> (GeneratedBatch, AnomalySummary) {
    let window = request
        .window
        .unwrap_or_else(|| GenerationWindow::trailing_days(now, DEFAULT_WINDOW_DAYS));
    let distributions = request.distributions.unwrap_or_default();
    let ctx = FabricationContext {
        batch_id,
        window: &window,
        distributions: &distributions,
        seasonality: request.seasonality,
        seed: request.seed,
    };

    let (batch, summary) = match request.kind {
        TargetKind::Transactions => {
            let mut rows: Vec<Transaction> = (0..request.rows)
                .map(|_| fabricate_transaction(&ctx, rng))
                .collect();
            let summary = match &request.anomalies {
                Some(config) => inject(&mut rows, config, rng),
                None => AnomalySummary::default(),
            };
            (GeneratedBatch::Transactions(rows), summary)
        }
        TargetKind::OperationalEvents => {
            let mut rows: Vec<OperationalEvent> = (0..request.rows)
                .map(|_| fabricate_event(&ctx, rng))
                .collect();
            let summary = match &request.anomalies {
                Some(config) => inject(&mut rows, config, rng),
                None => AnomalySummary::default(),
            };
            (GeneratedBatch::OperationalEvents(rows), summary)
        }
    };

    debug!(
        batch_id = %batch_id,
        rows = batch.len(),
        anomalies = summary.applied,
        "assembled synthetic batch"
    );

    (batch, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_types::{AnomalyConfig, AnomalyKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn builds_the_requested_row_count() {
        let mut rng = StdRng::seed_from_u64(51);
        let request = GenerationRequest::new(TargetKind::Transactions, 250);
        let (batch, summary) = build_batch(&request, BatchId::generate(), now(), &mut rng);

        assert_eq!(batch.len(), 250);
        assert_eq!(summary, AnomalySummary::default());
    }

    #[test]
    fn default_window_is_the_trailing_thirty_days() {
        let mut rng = StdRng::seed_from_u64(52);
        let request = GenerationRequest::new(TargetKind::OperationalEvents, 100);
        let (batch, _) = build_batch(&request, BatchId::generate(), now(), &mut rng);

        let GeneratedBatch::OperationalEvents(rows) = batch else {
            panic!("expected events");
        };
        let floor = now() - chrono::Duration::days(DEFAULT_WINDOW_DAYS);
        for row in rows {
            assert!(row.occurred_at >= floor && row.occurred_at <= now());
        }
    }

    #[test]
    fn duplicates_grow_the_batch_past_the_requested_rows() {
        let mut rng = StdRng::seed_from_u64(53);
        let mut request = GenerationRequest::new(TargetKind::Transactions, 50);
        request.anomalies = Some(AnomalyConfig {
            count: 10,
            kinds: vec![AnomalyKind::Duplicate],
        });

        let (batch, summary) = build_batch(&request, BatchId::generate(), now(), &mut rng);
        assert_eq!(summary.duplicates_added, 10);
        assert_eq!(batch.len(), 60);
    }

    #[test]
    fn seeded_requests_are_reproducible() {
        let request = GenerationRequest {
            seed: Some(7),
            seasonality: true,
            ..GenerationRequest::new(TargetKind::Transactions, 20)
        };
        let batch_id = BatchId::generate();

        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let (a, _) = build_batch(&request, batch_id, now(), &mut rng_a);
        let (b, _) = build_batch(&request, batch_id, now(), &mut rng_b);

        let (GeneratedBatch::Transactions(a), GeneratedBatch::Transactions(b)) = (a, b) else {
            panic!("expected transactions");
        };
        let a: Vec<(f64, String)> = a.into_iter().map(|t| (t.amount, t.status)).collect();
        let b: Vec<(f64, String)> = b.into_iter().map(|t| (t.amount, t.status)).collect();
        assert_eq!(a, b);
    }
}
