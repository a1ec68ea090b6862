//! # Connection
//!
//! This module implements the single point of contact with an Odoo server.
//!
//! A [`Connection`] owns the endpoint location, the database name and the
//! user's credentials. It frames protocol-specific request bodies and
//! headers, hands them to the injected [`Transport`] capability, and decodes
//! the protocol-specific response envelopes.
//!
//! Connections are cheap handles over shared state: cloning one yields a
//! second handle to the same server session, so any number of [`Model`]
//! proxies can reference it.
//!
//! ## Lazy authentication
//!
//! Nothing authenticates at construction time. The first call that needs a
//! session ([`Connection::execute_kw`] or an explicit
//! [`Connection::authenticate`]) runs the two-step login handshake: the
//! `common` service resolves the user id, then one `execute_kw` call fetches
//! the user's locale/timezone context from `res.users`. The resulting
//! [`Session`] is committed only after both steps succeed and is cached for
//! the lifetime of the connection. Concurrent first calls share a single
//! in-flight handshake, so at most one authentication round trip ever
//! happens per connection.
//!
//! ## Protocol polymorphism
//!
//! The wire coding varies in exactly three places: request body, request
//! headers and response decoding. Those live behind the closed [`Protocol`]
//! strategy enum ([`JsonRpc`](Protocol::JsonRpc) or
//! [`XmlRpc`](Protocol::XmlRpc)), selected once at construction; everything
//! else (URL construction, the authenticate/call orchestration) is shared.
mod jsonrpc;
mod types;
mod xmlrpc;

pub use types::{ServerVersion, Session, UserContext};

use crate::{
    error::Error,
    model::Model,
    transport::{Headers, HttpTransport, Transport},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::OnceCell;

/// Wire protocols understood by the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// JSON-RPC 2.0 against the `/jsonrpc` endpoint.
    #[default]
    JsonRpc,
    /// XML-RPC against the per-service `/xmlrpc/2/<service>` endpoints.
    XmlRpc,
}

impl Protocol {
    /// Short protocol name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::JsonRpc => jsonrpc::PROTOCOL_NAME,
            Protocol::XmlRpc => xmlrpc::PROTOCOL_NAME,
        }
    }

    fn endpoint_path(&self, service: &str) -> String {
        match self {
            Protocol::JsonRpc => "jsonrpc".to_string(),
            Protocol::XmlRpc => format!("xmlrpc/2/{service}"),
        }
    }

    fn build_body(&self, id: u64, service: &str, method: &str, args: &[Value]) -> String {
        match self {
            Protocol::JsonRpc => jsonrpc::build_body(id, service, method, args),
            Protocol::XmlRpc => xmlrpc::build_body(method, args),
        }
    }

    fn headers(&self) -> Headers {
        match self {
            Protocol::JsonRpc => jsonrpc::headers(),
            Protocol::XmlRpc => xmlrpc::headers(),
        }
    }

    fn parse_body(&self, raw: &str) -> Result<Value, Error> {
        match self {
            Protocol::JsonRpc => jsonrpc::parse_body(raw),
            Protocol::XmlRpc => xmlrpc::parse_body(raw),
        }
    }
}

struct Inner {
    base_url: String,
    db: String,
    username: String,
    password: String,
    protocol: Protocol,
    transport: Arc<dyn Transport>,
    request_id: AtomicU64,
    session: OnceCell<Session>,
}

/// A connection to one Odoo server and database.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.inner.base_url)
            .field("db", &self.inner.db)
            .field("username", &self.inner.username)
            .field("protocol", &self.inner.protocol)
            .field("session", &self.inner.session.get())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a connection using the default `reqwest`-backed transport.
    pub fn new(
        base_url: impl Into<String>,
        db: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        protocol: Protocol,
    ) -> Self {
        Self::with_transport(
            base_url,
            db,
            username,
            password,
            protocol,
            Arc::new(HttpTransport::default()),
        )
    }

    /// Creates a connection with an injected transport capability.
    pub fn with_transport(
        base_url: impl Into<String>,
        db: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        protocol: Protocol,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                base_url: base_url.into(),
                db: db.into(),
                username: username.into(),
                password: password.into(),
                protocol,
                transport,
                request_id: AtomicU64::new(1),
                session: OnceCell::new(),
            }),
        }
    }

    /// Database this connection authenticates against.
    pub fn database(&self) -> &str {
        &self.inner.db
    }

    pub fn username(&self) -> &str {
        &self.inner.username
    }

    pub fn protocol(&self) -> Protocol {
        self.inner.protocol
    }

    /// Session state, if authentication has already completed.
    pub fn session(&self) -> Option<&Session> {
        self.inner.session.get()
    }

    /// Mints a [`Model`] proxy bound to this connection.
    pub fn model(&self, name: impl Into<String>) -> Model {
        Model::new(self.clone(), name)
    }

    /// Fetches server version information. Requires no authentication.
    pub async fn version(&self) -> Result<ServerVersion, Error> {
        self.call_typed("common", "version", vec![]).await
    }

    /// Authenticates eagerly, returning the session state.
    ///
    /// On an already authenticated connection this returns the cached
    /// [`Session`] without another round trip; session state is populated
    /// exactly once per connection.
    pub async fn authenticate(&self) -> Result<Session, Error> {
        let session = self.inner.session.get_or_try_init(|| self.login()).await?;
        Ok(session.clone())
    }

    /// Issues one unauthenticated RPC and returns the decoded inner result.
    ///
    /// This is the single primitive every remote interaction flows through;
    /// it performs no authentication.
    pub async fn call(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value, Error> {
        let id = self.inner.request_id.fetch_add(1, Ordering::Relaxed);
        let url = self.build_url(service);
        let body = self.inner.protocol.build_body(id, service, method, &args);
        let headers = self.inner.protocol.headers();

        tracing::debug!(%url, service, method, id, "posting rpc request");
        let raw = self
            .inner
            .transport
            .post(&url, body, &headers)
            .await
            .map_err(Error::Transport)?;

        self.inner.protocol.parse_body(&raw)
    }

    /// Like [`Connection::call`], deserializing the inner result into `T`.
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        service: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, Error> {
        let result = self.call(service, method, args).await?;
        serde_json::from_value(result).map_err(|e| Error::Protocol {
            protocol: self.inner.protocol.name(),
            reason: format!("unexpected result shape: {e}"),
        })
    }

    /// Authenticated dispatch through the server's generic `execute_kw`
    /// entry point.
    ///
    /// If no session exists yet, the login handshake runs first and the real
    /// call does not start until it has fully resolved. The argument list is
    /// prefixed with the database name, the authenticated user id and the
    /// password, as `execute_kw` requires.
    pub async fn execute_kw(&self, service: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.inner.session.get_or_try_init(|| self.login()).await?;

        // The cell was initialized right above (or the init failed and we
        // never get here); an empty cell means a broken handshake.
        let session = self.inner.session.get().ok_or_else(|| {
            Error::Authentication("session state missing after authentication".to_string())
        })?;

        let mut full_args = vec![
            json!(self.inner.db),
            json!(session.uid),
            json!(self.inner.password),
        ];
        full_args.extend(args);
        self.call(service, "execute_kw", full_args).await
    }

    /// Like [`Connection::execute_kw`], deserializing the inner result into
    /// `T`.
    pub async fn execute_kw_typed<T: DeserializeOwned>(
        &self,
        service: &str,
        args: Vec<Value>,
    ) -> Result<T, Error> {
        let result = self.execute_kw(service, args).await?;
        serde_json::from_value(result).map_err(|e| Error::Protocol {
            protocol: self.inner.protocol.name(),
            reason: format!("unexpected result shape: {e}"),
        })
    }

    /// The two-step login handshake. The session cell commits only when the
    /// whole future succeeds, so a failure in either step leaves no state
    /// behind and the next authenticated call retries from scratch.
    #[tracing::instrument(skip(self), fields(db = %self.inner.db, user = %self.inner.username))]
    async fn login(&self) -> Result<Session, Error> {
        let result = self
            .call(
                "common",
                "authenticate",
                vec![
                    json!(self.inner.db),
                    json!(self.inner.username),
                    json!(self.inner.password),
                    json!({}),
                ],
            )
            .await?;

        // A falsy result (`false`, 0, null) means the server rejected the
        // credentials.
        let uid = result.as_i64().filter(|uid| *uid > 0).ok_or_else(|| {
            Error::Authentication(format!(
                "server rejected credentials for user '{}' on database '{}'",
                self.inner.username, self.inner.db
            ))
        })?;

        // The session cell is still empty at this point, so the execute_kw
        // argument list is assembled by hand with the fresh uid.
        let context = self
            .call(
                "object",
                "execute_kw",
                vec![
                    json!(self.inner.db),
                    json!(uid),
                    json!(self.inner.password),
                    json!("res.users"),
                    json!("context_get"),
                    json!([]),
                ],
            )
            .await?;
        let context: UserContext = serde_json::from_value(context).map_err(|e| Error::Protocol {
            protocol: self.inner.protocol.name(),
            reason: format!("unexpected user context shape: {e}"),
        })?;

        tracing::debug!(uid, "authenticated");
        Ok(Session { uid, context })
    }

    fn build_url(&self, service: &str) -> String {
        let separator = if self.inner.base_url.ends_with('/') {
            ""
        } else {
            "/"
        };
        format!(
            "{}{}{}",
            self.inner.base_url,
            separator,
            self.inner.protocol.endpoint_path(service)
        )
    }
}
