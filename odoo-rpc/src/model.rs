//! # Model proxy
//!
//! A [`Model`] binds a [`Connection`] to one remote model name (e.g.
//! `res.partner`) and exposes named operations instead of raw method-name
//! strings. Every operation is a pass-through to the server's generic
//! `execute_kw` dispatch on the `object` service: the CRUD semantics are
//! selected by the method argument *inside* that call (`search`, `read`,
//! `search_read`, `search_count`, `fields_get`, `create`, `write`,
//! `unlink`), not by distinct endpoints.
//!
//! Proxies are cheap and stateless beyond their name and optional default
//! field projection; mint as many as needed from one shared connection.
use crate::{
    connection::Connection,
    domain::Domain,
    error::Error,
    query::QueryBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// The service every model operation dispatches through.
const SERVICE: &str = "object";

/// Field metadata as returned by `fields_get`: a mapping from field name to
/// its attribute map (type, label, ...).
pub type FieldsInfo = Map<String, Value>;

/// Ordering and pagination arguments shared by the search operations. Unset
/// members are omitted from the request entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub order: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl SearchOptions {
    pub(crate) fn to_kwargs(&self) -> Map<String, Value> {
        let mut kwargs = Map::new();
        if let Some(order) = &self.order {
            kwargs.insert("order".to_string(), json!(order));
        }
        if let Some(offset) = self.offset {
            kwargs.insert("offset".to_string(), json!(offset));
        }
        if let Some(limit) = self.limit {
            kwargs.insert("limit".to_string(), json!(limit));
        }
        kwargs
    }
}

/// Field projection precedence: the explicit call-site list wins, then the
/// proxy's default projection, then no projection at all.
pub(crate) fn resolve_fields(explicit: Option<&[String]>, default: &[String]) -> Vec<String> {
    match explicit {
        Some(fields) => fields.to_vec(),
        None => default.to_vec(),
    }
}

/// A typed façade over one remote model.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    fields: Vec<String>,
    connection: Connection,
}

impl Model {
    /// Binds `name` to `connection` with no default field projection.
    pub fn new(connection: Connection, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            connection,
        }
    }

    /// Sets the default field projection used when a caller omits an
    /// explicit field list.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Remote model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default field projection, possibly empty.
    pub fn default_fields(&self) -> &[String] {
        &self.fields
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Starts a [`QueryBuilder`] over this model, inheriting its default
    /// field projection.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::from_model(self.clone())
    }

    /// Starts a [`QueryBuilder`] with an explicit initial field projection.
    pub fn query_with<I, S>(&self, fields: I) -> QueryBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryBuilder::with_fields(self.clone(), fields.into_iter().map(Into::into).collect())
    }

    /// Returns the identifiers of the records matching `domain`.
    pub async fn search(
        &self,
        domain: &Domain,
        options: &SearchOptions,
    ) -> Result<Vec<i64>, Error> {
        domain.validate()?;
        self.call_typed(
            "search",
            vec![
                json!([domain.to_value()]),
                Value::Object(options.to_kwargs()),
            ],
        )
        .await
    }

    /// Reads the given records, projected to `fields` (or the proxy's
    /// default projection when `None`).
    pub async fn read(&self, ids: &[i64], fields: Option<&[String]>) -> Result<Vec<Value>, Error> {
        let fields = resolve_fields(fields, &self.fields);
        self.call_typed("read", vec![json!(ids), json!({ "fields": fields })])
            .await
    }

    /// Searches and reads in one server-side round trip.
    pub async fn search_read(
        &self,
        domain: &Domain,
        fields: Option<&[String]>,
        options: &SearchOptions,
    ) -> Result<Vec<Value>, Error> {
        domain.validate()?;
        let fields = resolve_fields(fields, &self.fields);
        let mut kwargs = Map::new();
        kwargs.insert("fields".to_string(), json!(fields));
        kwargs.extend(options.to_kwargs());
        self.call_typed(
            "search_read",
            vec![json!([domain.to_value()]), Value::Object(kwargs)],
        )
        .await
    }

    /// Counts the records matching `domain` without transferring them.
    pub async fn search_count(&self, domain: &Domain) -> Result<u64, Error> {
        domain.validate()?;
        self.call_typed("search_count", vec![json!([domain.to_value()])])
            .await
    }

    /// Fetches field metadata, optionally restricted to the given attribute
    /// keys.
    pub async fn get_fields(&self, attributes: Option<&[String]>) -> Result<FieldsInfo, Error> {
        let attributes = attributes.unwrap_or_default();
        self.call_typed(
            "fields_get",
            vec![json!([]), json!({ "attributes": attributes })],
        )
        .await
    }

    /// Creates a record, returning its new identifier.
    pub async fn create(&self, record: Value) -> Result<i64, Error> {
        self.call_typed("create", vec![json!([record])]).await
    }

    /// Updates a record. The acknowledgement payload is opaque to the
    /// client.
    pub async fn update(&self, id: i64, record: Value) -> Result<Value, Error> {
        self.call("write", vec![json!([[id], record])]).await
    }

    /// Deletes a record. The acknowledgement payload is opaque to the
    /// client.
    pub async fn delete(&self, id: i64) -> Result<Value, Error> {
        self.call("unlink", vec![json!([[id]])]).await
    }

    /// Escape hatch for any remote model method not covered above, under the
    /// same authenticated-call contract. `args` follows `execute_kw`'s
    /// convention: a positional-argument list, optionally followed by a
    /// keyword-argument map.
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, Error> {
        let mut full_args = vec![json!(self.name), json!(method)];
        full_args.extend(args);
        self.connection.execute_kw(SERVICE, full_args).await
    }

    /// Like [`Model::call`], deserializing the result into `T`.
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, Error> {
        let mut full_args = vec![json!(self.name), json!(method)];
        full_args.extend(args);
        self.connection.execute_kw_typed(SERVICE, full_args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn explicit_fields_win() {
        let explicit = fields(&["name"]);
        let default = fields(&["name", "email"]);
        assert_eq!(
            resolve_fields(Some(&explicit), &default),
            fields(&["name"])
        );
    }

    #[test]
    fn default_fields_back_an_omitted_list() {
        let default = fields(&["name", "email"]);
        assert_eq!(resolve_fields(None, &default), fields(&["name", "email"]));
    }

    #[test]
    fn no_projection_resolves_to_empty() {
        assert_eq!(resolve_fields(None, &[]), Vec::<String>::new());
    }

    #[test]
    fn explicit_empty_list_is_respected() {
        let default = fields(&["name"]);
        assert_eq!(resolve_fields(Some(&[]), &default), Vec::<String>::new());
    }

    #[test]
    fn unset_search_options_produce_no_kwargs() {
        assert!(SearchOptions::default().to_kwargs().is_empty());
    }

    #[test]
    fn set_search_options_are_all_present() {
        let options = SearchOptions {
            order: Some("name asc".to_string()),
            offset: Some(20),
            limit: Some(10),
        };
        let kwargs = options.to_kwargs();
        assert_eq!(kwargs.get("order"), Some(&json!("name asc")));
        assert_eq!(kwargs.get("offset"), Some(&json!(20)));
        assert_eq!(kwargs.get("limit"), Some(&json!(10)));
    }
}
