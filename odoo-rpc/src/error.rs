//! # Error taxonomy
//!
//! Every remote operation fails with exactly one [`Error`]. The variants
//! separate the layer that failed: the injected transport, the protocol
//! decoder, the authentication handshake, or the server itself. The client
//! performs no retries and no local recovery; failures propagate unchanged
//! to the caller.
use crate::{BoxError, domain::DomainError};

/// Errors surfaced by remote operations of the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP POST capability itself failed (network, DNS, timeout).
    #[error("transport failure: '{0}'")]
    Transport(#[source] BoxError),
    /// A response arrived but could not be decoded as the active protocol's
    /// envelope.
    #[error("failed to decode {protocol} response: '{reason}'")]
    Protocol {
        protocol: &'static str,
        reason: String,
    },
    /// Credentials were rejected, or session state was missing after an
    /// authentication attempt.
    #[error("authentication failed: '{0}'")]
    Authentication(String),
    /// The server answered with a well-formed envelope carrying an
    /// application-level fault.
    #[error("server fault {code}: '{message}'")]
    Remote {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },
    /// A domain filter failed well-formedness validation before any network
    /// call was made.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
