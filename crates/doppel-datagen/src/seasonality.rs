//! Timestamp sampling with an optional business-hours/weekday bias.
//!
//! This is a biasing heuristic, not a seasonal model: out-of-hours
//! timestamps are relocated into the 08:00–20:00 window, and weekend dates
//! are usually (p = 0.7) pushed forward to Monday. The resulting skew is
//! the point.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use doppel_types::GenerationWindow;
use rand::Rng;

const BUSINESS_HOUR_START: u32 = 8;
const BUSINESS_HOUR_END: u32 = 20;
const WEEKEND_SHIFT_PROBABILITY: f64 = 0.7;

/// Sample a timestamp uniformly within the window, then bias it when
/// seasonality is enabled.
pub fn sample_timestamp<R: Rng + ?Sized>(
    window: &GenerationWindow,
    seasonality: bool,
    rng: &mut R,
) -> DateTime<Utc> {
    let span = (window.end - window.start).num_seconds().max(0);
    let offset = if span == 0 { 0 } else { rng.gen_range(0..=span) };
    let ts = window.start + Duration::seconds(offset);

    if seasonality {
        bias_toward_business_activity(ts, rng)
    } else {
        ts
    }
}

fn bias_toward_business_activity<R: Rng + ?Sized>(
    ts: DateTime<Utc>,
    rng: &mut R,
) -> DateTime<Utc> {
    // Hour window first: relocate out-of-hours timestamps to a random
    // business hour on the same day, minutes and seconds preserved.
    let ts = if ts.hour() < BUSINESS_HOUR_START || ts.hour() >= BUSINESS_HOUR_END {
        let hour = rng.gen_range(BUSINESS_HOUR_START..BUSINESS_HOUR_END);
        ts.with_hour(hour).unwrap_or(ts)
    } else {
        ts
    };

    // Then the weekday push: Saturday +2, Sunday +1, landing on Monday.
    match ts.weekday() {
        Weekday::Sat if rng.gen_bool(WEEKEND_SHIFT_PROBABILITY) => ts + Duration::days(2),
        Weekday::Sun if rng.gen_bool(WEEKEND_SHIFT_PROBABILITY) => ts + Duration::days(1),
        _ => ts,
    }
}
