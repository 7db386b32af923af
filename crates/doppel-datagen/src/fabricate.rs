//! Record fabricators: assemble one synthetic row from sampled parts.

use crate::sampler::{sample_amount, sample_duration_secs};
use crate::seasonality::sample_timestamp;
use doppel_types::{
    BatchId, Distributions, GenerationWindow, OperationalEvent, RecordId, RecordMetadata,
    Transaction,
};
use rand::seq::SliceRandom;
use rand::Rng;

const CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "JPY", "CAD"];
const TRANSACTION_STATUSES: &[&str] = &["COMPLETED", "PENDING", "FAILED", "REVERSED"];
const CHANNELS: &[&str] = &["WEB", "MOBILE", "BRANCH", "API", "ATM"];

const EVENT_TYPES: &[&str] = &[
    "BATCH_JOB",
    "SYNC",
    "EXPORT",
    "RECONCILIATION",
    "HEALTH_CHECK",
];
const SEVERITIES: &[&str] = &["INFO", "WARNING", "ERROR", "CRITICAL"];
const EVENT_STATUSES: &[&str] = &["SUCCEEDED", "RUNNING", "FAILED", "TIMED_OUT"];

/// Inputs shared by every row of one batch.
#[derive(Debug, Clone, Copy)]
pub struct FabricationContext<'a> {
    pub batch_id: BatchId,
    pub window: &'a GenerationWindow,
    pub distributions: &'a Distributions,
    pub seasonality: bool,
    pub seed: Option<u64>,
}

pub fn fabricate_transaction<R: Rng + ?Sized>(
    ctx: &FabricationContext<'_>,
    rng: &mut R,
) -> Transaction {
    Transaction {
        id: RecordId::generate(),
        reference: format!("TXN-{:08}", rng.gen_range(0..100_000_000u32)),
        amount: sample_amount(ctx.distributions.amount.as_ref(), rng),
        currency: pick(CURRENCIES, rng),
        status: pick(TRANSACTION_STATUSES, rng),
        channel: pick(CHANNELS, rng),
        account_ref: Some(format!("ACCT-{:06}", rng.gen_range(0..1_000_000u32))),
        occurred_at: sample_timestamp(ctx.window, ctx.seasonality, rng),
        metadata: RecordMetadata::simulator(ctx.batch_id, ctx.seed),
    }
}

pub fn fabricate_event<R: Rng + ?Sized>(
    ctx: &FabricationContext<'_>,
    rng: &mut R,
) -> OperationalEvent {
    OperationalEvent {
        id: RecordId::generate(),
        event_type: pick(EVENT_TYPES, rng),
        severity: pick(SEVERITIES, rng),
        resource_ref: Some(format!("RES-{:06}", rng.gen_range(0..1_000_000u32))),
        status: pick(EVENT_STATUSES, rng),
        duration_secs: sample_duration_secs(ctx.distributions.duration_secs.as_ref(), rng),
        occurred_at: sample_timestamp(ctx.window, ctx.seasonality, rng),
        metadata: RecordMetadata::simulator(ctx.batch_id, ctx.seed),
    }
}

fn pick<R: Rng + ?Sized>(values: &[&str], rng: &mut R) -> String {
    values
        .choose(rng)
        .copied()
        .unwrap_or_default()
        .to_string()
}
