//! # Query builder
//!
//! A [`QueryBuilder`] accumulates query intent — projection, filter,
//! ordering, pagination — and defers execution until a terminal operation
//! runs. Fluent methods move the builder and hand it back, so calls chain in
//! any order; terminal operations borrow it, so one builder can serve
//! several terminal calls, each reflecting the latest accumulated state.
//!
//! ```rust,no_run
//! # use odoo_rpc::{Connection, Domain, DomainOperator, Protocol};
//! # async fn run(connection: Connection) -> Result<(), odoo_rpc::Error> {
//! let query = connection
//!     .model("sale.order")
//!     .query()
//!     .select(["name", "amount_total"])
//!     .filter(Domain::condition("state", DomainOperator::Eq, "sale"))
//!     .order_by("date_order desc");
//!
//! let total = query.count().await?;
//! let newest = query.first().await?;
//! # Ok(())
//! # }
//! ```
use crate::{
    connection::Connection,
    domain::Domain,
    error::Error,
    model::{Model, SearchOptions},
};
use serde_json::Value;

/// Fluent accumulator of query state over one bound [`Model`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    model: Model,
    fields: Vec<String>,
    domain: Domain,
    order: Option<String>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl QueryBuilder {
    /// Builds a query over `model`, inheriting the model's default field
    /// projection.
    pub fn from_model(model: Model) -> Self {
        let fields = model.default_fields().to_vec();
        Self::with_fields(model, fields)
    }

    /// Builds a query over the named model of `connection`.
    pub fn from_connection(connection: &Connection, name: impl Into<String>) -> Self {
        Self::from_model(connection.model(name))
    }

    pub(crate) fn with_fields(model: Model, fields: Vec<String>) -> Self {
        Self {
            model,
            fields,
            domain: Domain::new(),
            order: None,
            offset: None,
            limit: None,
        }
    }

    /// Replaces the field projection.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the domain filter.
    pub fn filter(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    /// Replaces the ordering clause (e.g. `"name asc"`).
    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Skips the first `offset` matching records.
    pub fn skip(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Caps the number of returned records.
    pub fn take(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Runs the query, returning every matching record.
    pub async fn all(&self) -> Result<Vec<Value>, Error> {
        let options = SearchOptions {
            order: self.order.clone(),
            offset: self.offset,
            limit: self.limit,
        };
        self.model
            .search_read(&self.domain, Some(&self.fields), &options)
            .await
    }

    /// Runs the query for the first matching record only.
    ///
    /// Forces `offset = 0, limit = 1`; an empty result set is `None`, never
    /// an error.
    pub async fn first(&self) -> Result<Option<Value>, Error> {
        let options = SearchOptions {
            order: self.order.clone(),
            offset: Some(0),
            limit: Some(1),
        };
        let mut records = self
            .model
            .search_read(&self.domain, Some(&self.fields), &options)
            .await?;
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.remove(0))
        })
    }

    /// Counts the matching records. Only the accumulated filter matters;
    /// projection, ordering and pagination are ignored.
    pub async fn count(&self) -> Result<u64, Error> {
        self.model.search_count(&self.domain).await
    }

    /// Reads the given records with the accumulated field projection,
    /// ignoring filter, ordering and pagination.
    pub async fn find_all(&self, ids: &[i64]) -> Result<Vec<Value>, Error> {
        self.model.read(ids, Some(&self.fields)).await
    }

    /// Reads one record by identifier, or `None` if the server returns
    /// nothing for it.
    pub async fn find(&self, id: i64) -> Result<Option<Value>, Error> {
        let mut records = self.find_all(&[id]).await?;
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.remove(0))
        })
    }
}
