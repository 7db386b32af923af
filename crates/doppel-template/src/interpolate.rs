//! Placeholder interpolation over JSON trees.
//!
//! Tokens have the shape `{{request.body.<field>}}` or
//! `{{request.query.<field>}}` where `<field>` is one `[A-Za-z0-9_]+`
//! segment. Anything else between braces is left verbatim.

use doppel_types::RequestContext;
use serde_json::{Map, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const BODY_PREFIX: &str = "request.body.";
const QUERY_PREFIX: &str = "request.query.";

/// Render a template against a request context.
///
/// String values get token substitution; objects are descended into;
/// arrays and non-string scalars pass through unchanged. The input is
/// never mutated, so one template can be rendered against any number of
/// contexts.
pub fn render(template: &Value, ctx: &RequestContext) -> Value {
    match template {
        Value::String(s) => Value::String(render_string(s, ctx)),
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, value) in fields {
                out.insert(key.clone(), render(value, ctx));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn render_string(input: &str, ctx: &RequestContext) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open_at) = rest.find(OPEN) {
        out.push_str(&rest[..open_at]);
        let after_open = &rest[open_at + OPEN.len()..];

        match after_open.find(CLOSE) {
            Some(close_at) => {
                let token = &after_open[..close_at];
                match resolve_token(token, ctx) {
                    Some(replacement) => out.push_str(&replacement),
                    // Malformed token: emit it back verbatim, braces included.
                    None => {
                        out.push_str(OPEN);
                        out.push_str(token);
                        out.push_str(CLOSE);
                    }
                }
                rest = &after_open[close_at + CLOSE.len()..];
            }
            None => {
                // Unterminated braces pass through.
                out.push_str(OPEN);
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Resolve one token body (the text between braces). Returns `None` when
/// the token is not a well-formed placeholder.
fn resolve_token(token: &str, ctx: &RequestContext) -> Option<String> {
    let (source, field) = if let Some(field) = token.strip_prefix(BODY_PREFIX) {
        (&ctx.body, field)
    } else if let Some(field) = token.strip_prefix(QUERY_PREFIX) {
        (&ctx.query, field)
    } else {
        return None;
    };

    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }

    match source.get(field) {
        Some(value) => Some(stringify(value)),
        // Missing field renders as the empty string.
        None => Some(String::new()),
    }
}

/// How an interpolated value reads inside the host string.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_types::{HttpMethod, RequestSnapshot};
    use serde_json::json;

    fn ctx(body: Value) -> RequestContext {
        RequestSnapshot::new(HttpMethod::Post, "/orders")
            .with_body(body)
            .with_query("page", "3")
            .context()
    }

    #[test]
    fn substitutes_body_and_query_fields() {
        let template = json!({
            "message": "order {{request.body.order_id}} on page {{request.query.page}}"
        });
        let rendered = render(&template, &ctx(json!({"order_id": "ord-9"})));
        assert_eq!(rendered["message"], "order ord-9 on page 3");
    }

    #[test]
    fn missing_field_renders_empty_string() {
        let template = json!({"echo": "[{{request.body.absent}}]"});
        let rendered = render(&template, &ctx(json!({})));
        assert_eq!(rendered["echo"], "[]");
    }

    #[test]
    fn explicit_null_renders_as_null_text() {
        let template = json!({"echo": "{{request.body.ref}}"});
        let rendered = render(&template, &ctx(json!({"ref": null})));
        assert_eq!(rendered["echo"], "null");
    }

    #[test]
    fn non_scalar_values_render_as_compact_json() {
        let template = json!({"echo": "{{request.body.items}}"});
        let rendered = render(&template, &ctx(json!({"items": [1, 2]})));
        assert_eq!(rendered["echo"], "[1,2]");
    }

    #[test]
    fn descends_into_nested_objects() {
        let template = json!({"outer": {"inner": "{{request.body.name}}"}});
        let rendered = render(&template, &ctx(json!({"name": "doppel"})));
        assert_eq!(rendered["outer"]["inner"], "doppel");
    }

    #[test]
    fn arrays_and_scalars_pass_through_unchanged() {
        let template = json!({
            "list": ["{{request.body.name}}", 2],
            "count": 7,
            "flag": true
        });
        let rendered = render(&template, &ctx(json!({"name": "doppel"})));
        // Strings inside arrays are not interpolated.
        assert_eq!(rendered["list"][0], "{{request.body.name}}");
        assert_eq!(rendered["count"], 7);
        assert_eq!(rendered["flag"], true);
    }

    #[test]
    fn malformed_tokens_stay_verbatim() {
        let template = json!({
            "a": "{{request.headers.x}}",
            "b": "{{request.body.a.b}}",
            "c": "open {{ but never closed"
        });
        let rendered = render(&template, &ctx(json!({"a": 1})));
        assert_eq!(rendered["a"], "{{request.headers.x}}");
        assert_eq!(rendered["b"], "{{request.body.a.b}}");
        assert_eq!(rendered["c"], "open {{ but never closed");
    }

    #[test]
    fn token_free_template_is_identity() {
        let template = json!({"static": "value", "n": 1, "nested": {"k": [true]}});
        assert_eq!(render(&template, &ctx(json!({}))), template);
    }

    #[test]
    fn input_template_is_not_mutated() {
        let template = json!({"echo": "{{request.body.x}}"});
        let before = template.clone();
        let first = render(&template, &ctx(json!({"x": 1})));
        let second = render(&template, &ctx(json!({"x": 2})));
        assert_eq!(template, before);
        assert_eq!(first["echo"], "1");
        assert_eq!(second["echo"], "2");
    }
}
