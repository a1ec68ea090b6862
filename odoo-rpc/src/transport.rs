//! # Transport capability
//!
//! The connection issues exactly one HTTP POST per logical operation and is
//! agnostic to the networking stack that carries it. [`Transport`] is the
//! injection seam; [`HttpTransport`] is the default `reqwest`-backed
//! implementation. Timeout and cancellation policy, if any, belongs to the
//! transport, not to the connection.
use crate::BoxError;
use async_trait::async_trait;

/// Header name/value pairs attached to a request.
pub type Headers = Vec<(String, String)>;

/// An HTTP POST capability.
///
/// Implementations receive the fully built URL, body and headers and return
/// the raw response body. Any error they produce is treated by the
/// connection as an opaque transport failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, body: String, headers: &Headers) -> Result<String, BoxError>;
}

/// Default [`Transport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Wraps an existing `reqwest` client, keeping whatever pooling, proxy
    /// and timeout configuration the caller set up.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: String, headers: &Headers) -> Result<String, BoxError> {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
