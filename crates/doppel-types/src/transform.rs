//! Declarative response-transform programs.
//!
//! The platform Doppel stands in for let operators attach arbitrary script
//! text to an endpoint and evaluated it against live request/response
//! objects. Doppel replaces that with a small, serializable set of named
//! operators over the JSON tree; execution lives in `doppel-template`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which half of the request context a copy reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestSource {
    Body,
    Query,
}

/// One transform operator applied to the working `{status, body}` copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformOp {
    /// Replace the working status code.
    SetStatus { status: u16 },
    /// Set a dotted path in the working body to a literal JSON value,
    /// creating intermediate objects along the way.
    SetField { path: String, value: Value },
    /// Copy a request field into the working body.
    CopyRequestField {
        source: RequestSource,
        field: String,
        to: String,
    },
    /// Delete a dotted path from the working body; missing leaves are a no-op.
    RemoveField { path: String },
    /// Shallow-merge a JSON object into the working body.
    MergeBody { value: Value },
}

/// An ordered list of operators; ops run front to back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformProgram {
    pub ops: Vec<TransformOp>,
}

impl TransformProgram {
    pub fn new(ops: Vec<TransformOp>) -> Self {
        Self { ops }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ops_round_trip_through_tagged_serde() {
        let program = TransformProgram::new(vec![
            TransformOp::SetStatus { status: 201 },
            TransformOp::CopyRequestField {
                source: RequestSource::Body,
                field: "order_id".to_string(),
                to: "echo.order_id".to_string(),
            },
        ]);
        let json = serde_json::to_value(&program).unwrap();
        assert_eq!(json["ops"][0]["op"], json!("set_status"));
        let back: TransformProgram = serde_json::from_value(json).unwrap();
        assert_eq!(back, program);
    }
}
