use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Server version information returned by the `common` service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerVersion {
    pub server_version: String,
    pub server_serie: String,
    pub protocol_version: i64,
    #[serde(default)]
    pub server_version_info: Vec<Value>,
}

/// Locale and timezone context of the authenticated user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserContext {
    /// User time zone, e.g. `Europe/Brussels`.
    #[serde(default, deserialize_with = "string_or_none")]
    pub tz: Option<String>,
    /// User language, e.g. `en_US`.
    #[serde(default, deserialize_with = "string_or_none")]
    pub lang: Option<String>,
    /// Any further context keys the server attaches.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Odoo renders unset fields as `false` rather than omitting them.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Session state cached on a connection after its first successful
/// authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Numeric user identifier.
    pub uid: i64,
    /// Locale/timezone context fetched right after login.
    pub context: UserContext,
}
