//! Environments scope simulated endpoints to one orchestrator target.

use crate::ids::EnvironmentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named target configuration that endpoints are scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
    pub base_url: String,
    pub description: Option<String>,
    /// Static headers (auth tokens, tenant markers) attached by the
    /// external REST layer when proxying toward the real orchestrator.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Environment {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: EnvironmentId::generate(),
            name: name.into(),
            base_url: base_url.into(),
            description: None,
            headers: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
