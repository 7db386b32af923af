//! Interpreter for declarative response-transform programs.
//!
//! A program runs over a working copy of `{status, body}`. Any failure
//! aborts the whole program and surfaces as a [`TransformError`]; the
//! endpoint executor treats that as a signal to fall back to the raw
//! template, never as an endpoint failure.

use doppel_types::{RequestContext, RequestSource, SimulatedResponse, TransformOp, TransformProgram};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a transform program was rejected.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("status {0} outside 100..=599")]
    StatusOutOfRange(u16),

    #[error("working body is not an object")]
    BodyNotObject,

    #[error("merge value is not an object")]
    MergeValueNotObject,

    #[error("path {0:?} traverses through a non-object")]
    PathThroughNonObject(String),

    #[error("empty field path")]
    EmptyPath,
}

/// Run a program against a seeded working copy of `{status, body}`.
pub fn apply(
    program: &TransformProgram,
    status: u16,
    body: Value,
    ctx: &RequestContext,
) -> Result<SimulatedResponse, TransformError> {
    let mut working = SimulatedResponse { status, body };

    for op in &program.ops {
        match op {
            TransformOp::SetStatus { status } => {
                if !(100..=599).contains(status) {
                    return Err(TransformError::StatusOutOfRange(*status));
                }
                working.status = *status;
            }
            TransformOp::SetField { path, value } => {
                set_path(&mut working.body, path, value.clone())?;
            }
            TransformOp::CopyRequestField { source, field, to } => {
                let source = match source {
                    RequestSource::Body => &ctx.body,
                    RequestSource::Query => &ctx.query,
                };
                let value = source.get(field).cloned().unwrap_or(Value::Null);
                set_path(&mut working.body, to, value)?;
            }
            TransformOp::RemoveField { path } => {
                remove_path(&mut working.body, path)?;
            }
            TransformOp::MergeBody { value } => {
                let Value::Object(incoming) = value else {
                    return Err(TransformError::MergeValueNotObject);
                };
                let target = as_object_mut(&mut working.body)?;
                for (key, value) in incoming {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
    }

    Ok(working)
}

fn as_object_mut(body: &mut Value) -> Result<&mut Map<String, Value>, TransformError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(TransformError::BodyNotObject),
    }
}

/// Set a dotted path, creating intermediate objects as needed.
fn set_path(body: &mut Value, path: &str, value: Value) -> Result<(), TransformError> {
    let segments = split_path(path)?;
    let mut cursor = as_object_mut(body)?;

    for segment in &segments[..segments.len() - 1] {
        let slot = cursor
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        cursor = match slot {
            Value::Object(map) => map,
            _ => return Err(TransformError::PathThroughNonObject(path.to_string())),
        };
    }

    cursor.insert(segments[segments.len() - 1].to_string(), value);
    Ok(())
}

/// Remove a dotted path. A missing leaf is a no-op; traversal through a
/// present non-object value is still an error.
fn remove_path(body: &mut Value, path: &str) -> Result<(), TransformError> {
    let segments = split_path(path)?;
    let mut cursor = as_object_mut(body)?;

    for segment in &segments[..segments.len() - 1] {
        match cursor.get_mut(*segment) {
            Some(Value::Object(map)) => cursor = map,
            Some(_) => return Err(TransformError::PathThroughNonObject(path.to_string())),
            None => return Ok(()),
        }
    }

    cursor.remove(segments[segments.len() - 1]);
    Ok(())
}

fn split_path(path: &str) -> Result<Vec<&str>, TransformError> {
    let segments: Vec<&str> = path.split('.').collect();
    if path.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(TransformError::EmptyPath);
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_types::{HttpMethod, RequestSnapshot};
    use serde_json::json;

    fn ctx() -> RequestContext {
        RequestSnapshot::new(HttpMethod::Post, "/orders")
            .with_body(json!({"order_id": "ord-3", "total": 19.5}))
            .with_query("tenant", "acme")
            .context()
    }

    fn program(ops: Vec<TransformOp>) -> TransformProgram {
        TransformProgram::new(ops)
    }

    #[test]
    fn ops_run_in_order_over_the_working_copy() {
        let p = program(vec![
            TransformOp::SetStatus { status: 201 },
            TransformOp::SetField {
                path: "receipt.state".to_string(),
                value: json!("created"),
            },
            TransformOp::CopyRequestField {
                source: RequestSource::Body,
                field: "order_id".to_string(),
                to: "receipt.order_id".to_string(),
            },
            TransformOp::MergeBody {
                value: json!({"tenant": "acme"}),
            },
            TransformOp::RemoveField {
                path: "draft".to_string(),
            },
        ]);

        let out = apply(&p, 200, json!({"draft": true}), &ctx()).unwrap();
        assert_eq!(out.status, 201);
        assert_eq!(
            out.body,
            json!({
                "receipt": {"state": "created", "order_id": "ord-3"},
                "tenant": "acme"
            })
        );
    }

    #[test]
    fn copy_of_missing_request_field_writes_null() {
        let p = program(vec![TransformOp::CopyRequestField {
            source: RequestSource::Query,
            field: "absent".to_string(),
            to: "echo".to_string(),
        }]);
        let out = apply(&p, 200, json!({}), &ctx()).unwrap();
        assert_eq!(out.body["echo"], Value::Null);
    }

    #[test]
    fn remove_of_missing_path_is_a_no_op() {
        let p = program(vec![TransformOp::RemoveField {
            path: "a.b.c".to_string(),
        }]);
        let out = apply(&p, 200, json!({"a": {}}), &ctx()).unwrap();
        assert_eq!(out.body, json!({"a": {}}));
    }

    #[test]
    fn status_outside_http_range_fails() {
        let p = program(vec![TransformOp::SetStatus { status: 42 }]);
        let err = apply(&p, 200, json!({}), &ctx()).unwrap_err();
        assert!(matches!(err, TransformError::StatusOutOfRange(42)));
    }

    #[test]
    fn non_object_body_fails_ops_that_need_one() {
        let p = program(vec![TransformOp::SetField {
            path: "x".to_string(),
            value: json!(1),
        }]);
        let err = apply(&p, 200, json!([1, 2]), &ctx()).unwrap_err();
        assert!(matches!(err, TransformError::BodyNotObject));
    }

    #[test]
    fn traversing_through_a_scalar_fails() {
        let p = program(vec![TransformOp::SetField {
            path: "a.b".to_string(),
            value: json!(1),
        }]);
        let err = apply(&p, 200, json!({"a": 5}), &ctx()).unwrap_err();
        assert!(matches!(err, TransformError::PathThroughNonObject(_)));
    }

    #[test]
    fn merge_with_non_object_value_fails() {
        let p = program(vec![TransformOp::MergeBody { value: json!(3) }]);
        let err = apply(&p, 200, json!({}), &ctx()).unwrap_err();
        assert!(matches!(err, TransformError::MergeValueNotObject));
    }
}
