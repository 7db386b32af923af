//! Distribution samplers.
//!
//! Bad parameters never fail a draw; they fall back to documented defaults
//! so the generator always produces a value.

use doppel_types::DistributionSpec;
use rand::Rng;

/// Default recipe for monetary amounts when no spec is supplied.
pub fn default_amount_spec() -> DistributionSpec {
    DistributionSpec::Normal {
        mean: 250.0,
        std_dev: 150.0,
    }
}

/// Default recipe for durations (seconds) when no spec is supplied.
pub fn default_duration_spec() -> DistributionSpec {
    DistributionSpec::Normal {
        mean: 300.0,
        std_dev: 120.0,
    }
}

/// Draw one value from a distribution.
///
/// Uniform draws land in `[min, max)`; exponential draws are non-negative;
/// normal draws are unbounded.
pub fn sample<R: Rng + ?Sized>(spec: &DistributionSpec, rng: &mut R) -> f64 {
    match sanitize(spec) {
        DistributionSpec::Uniform { min, max } => {
            let u: f64 = rng.gen();
            min + u * (max - min)
        }
        DistributionSpec::Normal { mean, std_dev } => mean + box_muller(rng) * std_dev,
        DistributionSpec::Exponential { lambda } => {
            let u: f64 = rng.gen();
            -(1.0 - u).ln() / lambda
        }
    }
}

/// Sample a monetary amount: optional spec, floor at 0.01, round to 2dp.
pub fn sample_amount<R: Rng + ?Sized>(spec: Option<&DistributionSpec>, rng: &mut R) -> f64 {
    let spec = spec.copied().unwrap_or_else(default_amount_spec);
    round2(sample(&spec, rng).max(0.01))
}

/// Sample a duration in seconds: optional spec, floor at 30, round to
/// the nearest integer.
pub fn sample_duration_secs<R: Rng + ?Sized>(spec: Option<&DistributionSpec>, rng: &mut R) -> i64 {
    let spec = spec.copied().unwrap_or_else(default_duration_spec);
    sample(&spec, rng).max(30.0).round() as i64
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Map invalid parameters to usable ones instead of failing the draw:
/// inverted uniform bounds swap, non-finite uniform bounds become `[0,1)`,
/// a degenerate normal becomes standard normal, a non-positive exponential
/// rate becomes 1.
fn sanitize(spec: &DistributionSpec) -> DistributionSpec {
    match *spec {
        DistributionSpec::Uniform { min, max } => {
            if !min.is_finite() || !max.is_finite() {
                DistributionSpec::Uniform { min: 0.0, max: 1.0 }
            } else if min > max {
                DistributionSpec::Uniform { min: max, max: min }
            } else {
                DistributionSpec::Uniform { min, max }
            }
        }
        DistributionSpec::Normal { mean, std_dev } => {
            let mean = if mean.is_finite() { mean } else { 0.0 };
            let std_dev = if std_dev.is_finite() && std_dev >= 0.0 {
                std_dev
            } else {
                1.0
            };
            DistributionSpec::Normal { mean, std_dev }
        }
        DistributionSpec::Exponential { lambda } => {
            let lambda = if lambda.is_finite() && lambda > 0.0 {
                lambda
            } else {
                1.0
            };
            DistributionSpec::Exponential { lambda }
        }
    }
}

/// One standard-normal draw via the Box–Muller transform.
///
/// `u1` is shifted into `(0, 1]` to guard `ln(0)`.
fn box_muller<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
