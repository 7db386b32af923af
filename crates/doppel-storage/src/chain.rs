//! Hash chaining for call-log rows.
//!
//! Every adapter links rows through this one definition, so the chain
//! cannot drift between backends. The hashed payload covers the full
//! appended call, the assigned sequence, and the previous link.

use crate::{StorageError, StorageResult};
use doppel_types::CallLogAppend;

pub(crate) fn compute_call_hash(
    call: &CallLogAppend,
    previous_hash: Option<&str>,
    sequence: u64,
) -> StorageResult<String> {
    let serializable = serde_json::json!({
        "previous_hash": previous_hash,
        "sequence": sequence,
        "correlation_id": call.correlation_id,
        "environment_id": call.environment_id,
        "endpoint_id": call.endpoint_id,
        "request": call.request,
        "response_status": call.response_status,
        "response_body": call.response_body,
        "latency_ms": call.latency_ms,
        "error_injected": call.error_injected,
        "transform_applied": call.transform_applied,
        "transform_failed": call.transform_failed,
        "created_at": call.created_at,
    });
    let serialized = serde_json::to_vec(&serializable)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&serialized).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use doppel_types::{CorrelationId, EnvironmentId, HttpMethod, RequestSnapshot};
    use serde_json::json;

    fn append() -> CallLogAppend {
        CallLogAppend {
            correlation_id: CorrelationId::generate(),
            environment_id: EnvironmentId::generate(),
            endpoint_id: None,
            request: RequestSnapshot::new(HttpMethod::Get, "/ping"),
            response_status: 200,
            response_body: json!({"ok": true}),
            latency_ms: 0,
            error_injected: false,
            transform_applied: false,
            transform_failed: false,
            created_at: Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn identical_inputs_hash_identically() {
        let call = append();
        let a = compute_call_hash(&call, Some("prev"), 3).unwrap();
        let b = compute_call_hash(&call, Some("prev"), 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn transform_flags_are_part_of_the_chain() {
        let call = append();
        let mut flipped = call.clone();
        flipped.transform_failed = true;
        let a = compute_call_hash(&call, None, 1).unwrap();
        let b = compute_call_hash(&flipped, None, 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn previous_hash_feeds_the_next_link() {
        let call = append();
        let first = compute_call_hash(&call, None, 1).unwrap();
        let second = compute_call_hash(&call, Some(&first), 2).unwrap();
        assert_ne!(first, second);
    }
}
