//! Inbound request snapshots and simulated responses.

use crate::endpoint::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Immutable snapshot of one inbound request, as captured by the external
/// REST layer before handing it to the simulation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Value,
}

impl RequestSnapshot {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            body: Value::Null,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Build the interpolation context: body as-is, query as a JSON object
    /// of string values.
    pub fn context(&self) -> RequestContext {
        let mut query = Map::new();
        for (key, value) in &self.query {
            query.insert(key.clone(), Value::String(value.clone()));
        }
        RequestContext {
            body: self.body.clone(),
            query: Value::Object(query),
        }
    }
}

/// The `{body, query}` pair placeholder tokens resolve against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub body: Value,
    pub query: Value,
}

/// The resolved output of one simulated invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedResponse {
    pub status: u16,
    pub body: Value,
}
