//! # Mock Odoo
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an in-memory
//! fake of an Odoo server's JSON-RPC endpoint for integration testing the
//! `odoo-rpc` client. It is not intended for production use.
//!
//! [`MockServer`] implements the client's `Transport` capability and routes
//! decoded JSON-RPC envelopes the way a real server would: `common.version`,
//! `common.authenticate` (checking the configured credentials) and
//! `object.execute_kw` (checking the authentication prefix, answering
//! `context_get` and any stubbed model method). Every request is recorded
//! for assertions, and responses can be overridden with canned results,
//! faults, raw bodies or transport failures.
use async_trait::async_trait;
use odoo_rpc::{
    BoxError,
    transport::{Headers, Transport},
};
use serde_json::{Value, json};
use std::{collections::HashMap, sync::Mutex};

/// One request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub body: String,
    pub headers: Headers,
}

impl RecordedRequest {
    /// The body parsed as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }

    /// The `(service, method, args)` triple of a JSON-RPC request body.
    pub fn rpc_params(&self) -> (String, String, Vec<Value>) {
        let envelope = self.json();
        let params = &envelope["params"];
        (
            params["service"].as_str().unwrap_or_default().to_string(),
            params["method"].as_str().unwrap_or_default().to_string(),
            params["args"].as_array().cloned().unwrap_or_default(),
        )
    }

    /// The routing key this request resolves to: `execute_kw`'s inner model
    /// method, or the service method itself.
    pub fn routing_key(&self) -> String {
        let (service, method, args) = self.rpc_params();
        routing_key(&service, &method, &args)
    }
}

#[derive(Debug, Clone)]
enum Stub {
    Result(Value),
    Fault { code: i64, message: String },
}

#[derive(Debug, Clone)]
struct Config {
    db: String,
    username: String,
    password: String,
    uid: i64,
    context: Value,
}

/// An in-memory Odoo JSON-RPC endpoint.
pub struct MockServer {
    config: Mutex<Config>,
    stubs: Mutex<HashMap<String, Stub>>,
    raw_response: Mutex<Option<String>>,
    transport_error: Mutex<Option<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockServer {
    /// A server accepting exactly one set of credentials.
    pub fn new(db: &str, username: &str, password: &str, uid: i64) -> Self {
        Self {
            config: Mutex::new(Config {
                db: db.to_string(),
                username: username.to_string(),
                password: password.to_string(),
                uid,
                context: json!({"lang": "en_US", "tz": "Europe/Brussels"}),
            }),
            stubs: Mutex::new(HashMap::new()),
            raw_response: Mutex::new(None),
            transport_error: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Changes the accepted password (e.g. to let a previously failing
    /// login succeed).
    pub fn set_password(&self, password: &str) {
        self.config.lock().unwrap().password = password.to_string();
    }

    /// Replaces the context returned by `res.users.context_get`.
    pub fn set_context(&self, context: Value) {
        self.config.lock().unwrap().context = context;
    }

    /// Stubs the result for a method: a `common` service method name, or the
    /// inner model method of an `execute_kw` dispatch (`search_read`,
    /// `create`, ...).
    pub fn stub(&self, method: &str, result: Value) {
        self.stubs
            .lock()
            .unwrap()
            .insert(method.to_string(), Stub::Result(result));
    }

    /// Stubs a server fault for a method.
    pub fn stub_fault(&self, method: &str, code: i64, message: &str) {
        self.stubs.lock().unwrap().insert(
            method.to_string(),
            Stub::Fault {
                code,
                message: message.to_string(),
            },
        );
    }

    /// Answers every request with this raw body, bypassing routing. Lets
    /// tests feed undecodable payloads or non-JSON protocols through the
    /// transport.
    pub fn set_raw_response(&self, raw: impl Into<String>) {
        *self.raw_response.lock().unwrap() = Some(raw.into());
    }

    /// Fails every request at the transport layer with this message.
    pub fn set_transport_error(&self, message: &str) {
        *self.transport_error.lock().unwrap() = Some(message.to_string());
    }

    /// Everything received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .expect("no request recorded")
            .clone()
    }

    /// How many requests routed to `method` (by the same key as [`stub`]).
    ///
    /// [`stub`]: MockServer::stub
    pub fn calls_to(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.routing_key() == method)
            .count()
    }

    fn route(&self, service: &str, method: &str, args: &[Value]) -> Stub {
        let key = routing_key(service, method, args);
        if let Some(stub) = self.stubs.lock().unwrap().get(&key) {
            return stub.clone();
        }

        let config = self.config.lock().unwrap().clone();
        match (service, method) {
            ("common", "version") => Stub::Result(json!({
                "server_version": "19.0",
                "server_serie": "19.0",
                "protocol_version": 1,
                "server_version_info": [19, 0, 0, "final", 0, ""],
            })),
            ("common", "authenticate") => {
                let accepted = args.first() == Some(&json!(config.db))
                    && args.get(1) == Some(&json!(config.username))
                    && args.get(2) == Some(&json!(config.password));
                Stub::Result(if accepted {
                    json!(config.uid)
                } else {
                    json!(false)
                })
            }
            ("object", "execute_kw") => {
                let authorized = args.first() == Some(&json!(config.db))
                    && args.get(1) == Some(&json!(config.uid))
                    && args.get(2) == Some(&json!(config.password));
                if !authorized {
                    return Stub::Fault {
                        code: 3,
                        message: "Access Denied".to_string(),
                    };
                }
                match args.get(4).and_then(Value::as_str) {
                    Some("context_get") => Stub::Result(config.context),
                    _ => Stub::Result(Value::Null),
                }
            }
            _ => Stub::Fault {
                code: 1,
                message: format!("unknown method {service}.{method}"),
            },
        }
    }
}

/// `execute_kw` dispatches route by the model method inside the call;
/// everything else routes by the service method itself.
fn routing_key(service: &str, method: &str, args: &[Value]) -> String {
    if service == "object" && method == "execute_kw" {
        if let Some(inner) = args.get(4).and_then(Value::as_str) {
            return inner.to_string();
        }
    }
    method.to_string()
}

#[async_trait]
impl Transport for MockServer {
    async fn post(&self, url: &str, body: String, headers: &Headers) -> Result<String, BoxError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            body: body.clone(),
            headers: headers.clone(),
        });

        if let Some(message) = self.transport_error.lock().unwrap().clone() {
            return Err(std::io::Error::other(message).into());
        }
        if let Some(raw) = self.raw_response.lock().unwrap().clone() {
            return Ok(raw);
        }

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|_| std::io::Error::other("mock server only speaks json-rpc"))?;
        let id = envelope["id"].clone();
        let params = &envelope["params"];
        let service = params["service"].as_str().unwrap_or_default().to_string();
        let method = params["method"].as_str().unwrap_or_default().to_string();
        let args = params["args"].as_array().cloned().unwrap_or_default();

        let reply = match self.route(&service, &method, &args) {
            Stub::Result(result) => json!({"id": id, "jsonrpc": "2.0", "result": result}),
            Stub::Fault { code, message } => json!({
                "id": id,
                "jsonrpc": "2.0",
                "error": {"code": code, "message": message, "data": null},
            }),
        };
        Ok(reply.to_string())
    }
}
