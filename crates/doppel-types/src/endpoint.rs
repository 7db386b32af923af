//! Simulated endpoint configuration.

use crate::ids::{EndpointId, EnvironmentId};
use crate::transform::TransformProgram;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// HTTP methods a simulated endpoint can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized method strings.
#[derive(Debug, Error)]
#[error("unrecognized HTTP method: {0}")]
pub struct MethodParseError(pub String);

impl FromStr for HttpMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(MethodParseError(other.to_string())),
        }
    }
}

/// One configured virtual endpoint.
///
/// Identity within an environment is `(method, path)`. The config is
/// created/edited via the store and read-only at invocation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedEndpoint {
    pub id: EndpointId,
    pub environment_id: EnvironmentId,
    pub method: HttpMethod,
    pub path: String,
    /// JSON tree that may contain `{{request.body.X}}` / `{{request.query.X}}`
    /// placeholders in string values.
    pub response_template: Value,
    pub status_code: u16,
    pub latency_ms: u64,
    /// Probability, in percent, that an invocation short-circuits to the
    /// fixed simulated-failure response.
    pub error_rate_percent: f64,
    /// Optional declarative response transform applied after interpolation.
    #[serde(default)]
    pub transform: Option<TransformProgram>,
    pub enabled: bool,
    pub description: Option<String>,
    /// Probe bookkeeping; last-write-wins under concurrent invocations.
    pub last_tested_at: Option<DateTime<Utc>>,
    pub last_test_status: Option<u16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SimulatedEndpoint {
    pub fn new(
        environment_id: EnvironmentId,
        method: HttpMethod,
        path: impl Into<String>,
        response_template: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EndpointId::generate(),
            environment_id,
            method,
            path: path.into(),
            response_template,
            status_code: 200,
            latency_ms: 0,
            error_rate_percent: 0.0,
            transform: None,
            enabled: true,
            description: None,
            last_tested_at: None,
            last_test_status: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn method_serializes_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Delete).unwrap();
        assert_eq!(json, "\"DELETE\"");
    }
}
