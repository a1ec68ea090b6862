//! # Odoo RPC
//!
//! `odoo-rpc` is a typed client for the Odoo external API. It talks to the
//! server over JSON-RPC (or XML-RPC) and exposes Odoo's generic model
//! abstraction through three layers:
//!
//! * **[`Connection`]:** The single point of contact with a server. It owns
//!   the endpoint location and credentials, frames protocol-specific request
//!   bodies and headers, and authenticates lazily the first time an
//!   authenticated call is issued.
//! * **[`Model`]:** A thin proxy binding a connection to one remote model
//!   name (e.g. `res.partner`), translating named CRUD operations into the
//!   server's generic `execute_kw` dispatch method.
//! * **[`QueryBuilder`]:** A fluent accumulator of filter, projection,
//!   ordering and pagination state, compiled into model calls only when a
//!   terminal operation runs.
//!
//! Filters are expressed with the [`Domain`] algebra: ordered sequences of
//! `(field, operator, value)` conditions combined in prefix notation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use odoo_rpc::{Connection, Domain, DomainOperator, Protocol};
//!
//! # async fn run() -> Result<(), odoo_rpc::Error> {
//! let connection = Connection::new(
//!     "https://odoo.example.com",
//!     "production",
//!     "admin",
//!     "secret",
//!     Protocol::JsonRpc,
//! );
//!
//! let partners = connection
//!     .model("res.partner")
//!     .query()
//!     .select(["name", "email"])
//!     .filter(Domain::condition("is_company", DomainOperator::Eq, true))
//!     .order_by("name asc")
//!     .take(10)
//!     .all()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Transport
//!
//! The connection never performs network I/O itself; it hands fully built
//! requests to an injected [`Transport`] capability. The default
//! [`transport::HttpTransport`] is backed by `reqwest`, and tests inject
//! their own.
//!
//! ## Re-exports
//!
//! This crate re-exports `serde_json`, since record payloads and call
//! arguments travel as [`serde_json::Value`].
pub mod connection;
pub mod domain;
pub mod error;
pub mod model;
pub mod query;
pub mod transport;

pub use connection::{Connection, Protocol, ServerVersion, Session, UserContext};
pub use domain::{Domain, DomainError, DomainOperator, DomainTerm, DomainValue};
pub use error::Error;
pub use model::{FieldsInfo, Model, SearchOptions};
pub use query::QueryBuilder;
pub use transport::Transport;

// Re-exports
pub use serde_json;

/// Type alias for the standard boxed error used at the transport seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
