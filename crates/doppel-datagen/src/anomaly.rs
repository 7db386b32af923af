//! Post-hoc anomaly injection over an in-memory batch.
//!
//! Each iteration draws a fresh uniform index, so one record can
//! accumulate several anomalies and duplicates can themselves be picked
//! later. That clustering mirrors messy real-world data and is preserved
//! on purpose.

use crate::sampler::round2;
use doppel_types::{
    AnomalyConfig, AnomalyKind, AnomalySummary, OperationalEvent, RecordId, RecordMetadata,
    Transaction,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// Sentinel written by the `invalid_status` anomaly.
pub const INVALID_STATUS_SENTINEL: &str = "INVALID_STATUS";

/// A record kind the injector can operate on.
pub trait AnomalyTarget: Clone {
    /// Multiply the designated numeric field.
    fn scale_primary_metric(&mut self, factor: f64);
    /// Null out the designated reference field.
    fn null_reference(&mut self);
    /// Overwrite the status field with the invalid sentinel.
    fn invalidate_status(&mut self);
    /// Structural copy with a freshly generated identifier.
    fn duplicate_with_new_id(&self) -> Self;
    fn metadata_mut(&mut self) -> &mut RecordMetadata;
}

impl AnomalyTarget for Transaction {
    fn scale_primary_metric(&mut self, factor: f64) {
        self.amount = round2(self.amount * factor);
    }

    fn null_reference(&mut self) {
        self.account_ref = None;
    }

    fn invalidate_status(&mut self) {
        self.status = INVALID_STATUS_SENTINEL.to_string();
    }

    fn duplicate_with_new_id(&self) -> Self {
        let mut copy = self.clone();
        copy.id = RecordId::generate();
        copy
    }

    fn metadata_mut(&mut self) -> &mut RecordMetadata {
        &mut self.metadata
    }
}

impl AnomalyTarget for OperationalEvent {
    fn scale_primary_metric(&mut self, factor: f64) {
        self.duration_secs = (self.duration_secs as f64 * factor).round() as i64;
    }

    fn null_reference(&mut self) {
        self.resource_ref = None;
    }

    fn invalidate_status(&mut self) {
        self.status = INVALID_STATUS_SENTINEL.to_string();
    }

    fn duplicate_with_new_id(&self) -> Self {
        let mut copy = self.clone();
        copy.id = RecordId::generate();
        copy
    }

    fn metadata_mut(&mut self) -> &mut RecordMetadata {
        &mut self.metadata
    }
}

/// Apply `config.count` anomaly actions to the batch, in place.
///
/// Every applied action pushes exactly one marker onto the target's
/// metadata, so total marker occurrences across the batch is at least
/// `count`. A `Duplicate` copy inherits its original's markers and gains
/// its own. An empty batch or empty kind set is a no-op.
pub fn inject<T, R>(batch: &mut Vec<T>, config: &AnomalyConfig, rng: &mut R) -> AnomalySummary
where
    T: AnomalyTarget,
    R: Rng + ?Sized,
{
    let mut summary = AnomalySummary::default();
    if batch.is_empty() || config.kinds.is_empty() {
        return summary;
    }

    for _ in 0..config.count {
        let index = rng.gen_range(0..batch.len());
        let Some(kind) = config.kinds.choose(rng).copied() else {
            break;
        };

        match kind {
            AnomalyKind::Outlier => {
                let factor = rng.gen_range(10.0..100.0);
                batch[index].scale_primary_metric(factor);
                batch[index].metadata_mut().anomalies.push(kind);
            }
            AnomalyKind::Duplicate => {
                let mut copy = batch[index].duplicate_with_new_id();
                copy.metadata_mut().anomalies.push(kind);
                batch.push(copy);
                summary.duplicates_added += 1;
            }
            AnomalyKind::NullValue => {
                batch[index].null_reference();
                batch[index].metadata_mut().anomalies.push(kind);
            }
            AnomalyKind::InvalidStatus => {
                batch[index].invalidate_status();
                batch[index].metadata_mut().anomalies.push(kind);
            }
        }

        summary.applied += 1;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use doppel_types::BatchId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn transaction(batch_id: BatchId) -> Transaction {
        Transaction {
            id: RecordId::generate(),
            reference: "TXN-00000001".to_string(),
            amount: 100.0,
            currency: "USD".to_string(),
            status: "COMPLETED".to_string(),
            channel: "WEB".to_string(),
            account_ref: Some("ACCT-000001".to_string()),
            occurred_at: Utc::now(),
            metadata: RecordMetadata::simulator(batch_id, None),
        }
    }

    fn batch(n: usize) -> Vec<Transaction> {
        let batch_id = BatchId::generate();
        (0..n).map(|_| transaction(batch_id)).collect()
    }

    fn marker_count(batch: &[Transaction]) -> usize {
        batch.iter().map(|t| t.metadata.anomalies.len()).sum()
    }

    #[test]
    fn five_actions_over_a_hundred_rows_tag_at_least_five_markers() {
        let mut rng = StdRng::seed_from_u64(41);
        let mut records = batch(100);
        let config = AnomalyConfig {
            count: 5,
            kinds: vec![
                AnomalyKind::Outlier,
                AnomalyKind::Duplicate,
                AnomalyKind::NullValue,
                AnomalyKind::InvalidStatus,
            ],
        };

        let summary = inject(&mut records, &config, &mut rng);

        assert_eq!(summary.applied, 5);
        assert!(marker_count(&records) >= 5);
        assert_eq!(records.len(), 100 + summary.duplicates_added);
    }

    #[test]
    fn outliers_scale_the_amount_by_ten_to_a_hundred() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut records = batch(1);
        let config = AnomalyConfig {
            count: 1,
            kinds: vec![AnomalyKind::Outlier],
        };

        inject(&mut records, &config, &mut rng);

        assert!(records[0].amount >= 1_000.0 && records[0].amount < 10_000.0);
        assert_eq!(records[0].metadata.anomalies, vec![AnomalyKind::Outlier]);
    }

    #[test]
    fn duplicates_get_fresh_ids_and_inherit_markers() {
        let mut rng = StdRng::seed_from_u64(43);
        let mut records = batch(1);
        records[0].metadata.anomalies.push(AnomalyKind::NullValue);
        let config = AnomalyConfig {
            count: 1,
            kinds: vec![AnomalyKind::Duplicate],
        };

        inject(&mut records, &config, &mut rng);

        assert_eq!(records.len(), 2);
        assert_ne!(records[0].id, records[1].id);
        assert_eq!(
            records[1].metadata.anomalies,
            vec![AnomalyKind::NullValue, AnomalyKind::Duplicate]
        );
    }

    #[test]
    fn repeated_targeting_accumulates_markers_on_one_record() {
        let mut rng = StdRng::seed_from_u64(44);
        let mut records = batch(1);
        let config = AnomalyConfig {
            count: 4,
            kinds: vec![AnomalyKind::NullValue],
        };

        inject(&mut records, &config, &mut rng);

        assert_eq!(records[0].metadata.anomalies.len(), 4);
        assert!(records[0].account_ref.is_none());
    }

    #[test]
    fn invalid_status_writes_the_sentinel() {
        let mut rng = StdRng::seed_from_u64(45);
        let mut records = batch(1);
        let config = AnomalyConfig {
            count: 1,
            kinds: vec![AnomalyKind::InvalidStatus],
        };

        inject(&mut records, &config, &mut rng);
        assert_eq!(records[0].status, INVALID_STATUS_SENTINEL);
    }

    #[test]
    fn empty_kind_set_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(46);
        let mut records = batch(10);
        let config = AnomalyConfig {
            count: 5,
            kinds: vec![],
        };

        let summary = inject(&mut records, &config, &mut rng);
        assert_eq!(summary, AnomalySummary::default());
        assert_eq!(marker_count(&records), 0);
    }
}
