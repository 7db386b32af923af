//! Harness configuration.

/// Tunables for the service facade.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Seed for the facade's random source; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// How many records a generation report previews.
    pub preview_rows: usize,
    /// Days of history generated when a request carries no window.
    pub default_window_days: i64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed: None,
            preview_rows: 10,
            default_window_days: 30,
        }
    }
}

impl HarnessConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}
