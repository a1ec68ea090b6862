//! # JSON-RPC wire coding
//!
//! Odoo's JSON endpoint wraps every call in a JSON-RPC 2.0 envelope with the
//! fixed method `"call"`; the target service, method and positional
//! arguments travel inside `params`. Responses carry either `result` or an
//! `error` object describing a server fault.
use crate::{
    error::Error,
    transport::Headers,
};
use serde::Deserialize;
use serde_json::{Value, json};

pub(crate) const PROTOCOL_NAME: &str = "jsonrpc";

pub(crate) fn build_body(id: u64, service: &str, method: &str, args: &[Value]) -> String {
    json!({
        "id": id,
        "jsonrpc": "2.0",
        "method": "call",
        "params": {
            "service": service,
            "method": method,
            "args": args,
        },
    })
    .to_string()
}

pub(crate) fn headers() -> Headers {
    vec![(
        "Content-Type".to_string(),
        "application/json; charset=utf-8".to_string(),
    )]
}

#[derive(Debug, Deserialize)]
struct Envelope {
    // A present-but-null `result` is a legal success, so absence must be
    // distinguished from null.
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    error: Option<Fault>,
}

#[derive(Debug, Deserialize)]
struct Fault {
    #[serde(default)]
    code: i64,
    message: String,
    data: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Decodes a raw response body, extracting `result` or surfacing the fault.
pub(crate) fn parse_body(raw: &str) -> Result<Value, Error> {
    let envelope: Envelope = serde_json::from_str(raw).map_err(|e| Error::Protocol {
        protocol: PROTOCOL_NAME,
        reason: e.to_string(),
    })?;

    if let Some(fault) = envelope.error {
        return Err(Error::Remote {
            code: fault.code,
            message: fault.message,
            data: fault.data,
        });
    }

    match envelope.result {
        Some(result) => Ok(result),
        None => Err(Error::Protocol {
            protocol: PROTOCOL_NAME,
            reason: "envelope carries neither 'result' nor 'error'".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_the_fixed_call_method() {
        let body = build_body(7, "object", "search", &[json!("db"), json!([1, 2])]);
        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            parsed,
            json!({
                "id": 7,
                "jsonrpc": "2.0",
                "method": "call",
                "params": {
                    "service": "object",
                    "method": "search",
                    "args": ["db", [1, 2]],
                },
            })
        );
    }

    #[test]
    fn result_is_extracted() {
        let raw = json!({"id": 1, "jsonrpc": "2.0", "result": [1, 2, 3]}).to_string();
        assert_eq!(parse_body(&raw).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn null_result_is_a_success() {
        let raw = json!({"id": 1, "jsonrpc": "2.0", "result": null}).to_string();
        assert_eq!(parse_body(&raw).unwrap(), Value::Null);
    }

    #[test]
    fn fault_envelope_becomes_remote_error() {
        let raw = json!({
            "id": 1,
            "jsonrpc": "2.0",
            "error": {"code": 200, "message": "Odoo Server Error", "data": {"name": "ValueError"}},
        })
        .to_string();
        match parse_body(&raw) {
            Err(Error::Remote { code, message, data }) => {
                assert_eq!(code, 200);
                assert_eq!(message, "Odoo Server Error");
                assert_eq!(data, Some(json!({"name": "ValueError"})));
            }
            other => panic!("expected a remote fault, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_body_is_a_protocol_error() {
        match parse_body("<html>gateway timeout</html>") {
            Err(Error::Protocol { protocol, .. }) => assert_eq!(protocol, "jsonrpc"),
            other => panic!("expected a protocol error, got {other:?}"),
        }
    }

    #[test]
    fn envelope_without_result_or_error_is_rejected() {
        match parse_body(r#"{"id": 1, "jsonrpc": "2.0"}"#) {
            Err(Error::Protocol { .. }) => {}
            other => panic!("expected a protocol error, got {other:?}"),
        }
    }
}
