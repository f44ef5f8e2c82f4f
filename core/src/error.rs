//! Error types for the admin API client.
//!
//! # Design
//! A failed call is either a `Network` failure (the transport produced no
//! response at all) or a `Server` rejection carrying the decoded response
//! body. Callers must handle both; the server body is the rejection value
//! they inspect, typically for an `errors` object of field messages.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Validation messages keyed by field name, as sent in a rejection's
/// `errors` object.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// The transport could not complete the round-trip.
#[derive(Debug, Error)]
#[error("transport failed: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors returned by `ApiClient` and the resource services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, TLS, ...).
    #[error(transparent)]
    Network(#[from] TransportError),

    /// The server answered with a non-2xx status. `body` is the decoded
    /// response body: JSON when it parses, a JSON string otherwise, `null`
    /// when empty.
    #[error("server rejected request with HTTP {status}: {body}")]
    Server { status: u16, body: Value },

    /// A 2xx body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status of a server rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-provided rejection body.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Server { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The `errors` object of a server rejection, if it has one in the
    /// `{field: [message, ...]}` shape.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        let errors = self.body()?.get("errors")?;
        serde_json::from_value(errors.clone()).ok()
    }
}
