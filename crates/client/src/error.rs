//! Errors surfaced by the client services.

use thiserror::Error;

use wareops_auth::{AuthzError, Capability};
use wareops_core::DomainError;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// Rejected locally before any request was sent.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("forbidden: missing capability '{0}'")]
    Forbidden(Capability),

    /// Transport failure (connect, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response.
    #[error("server error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    #[error("could not decode response: {0}")]
    Decode(String),

    /// A newer request for the same query superseded this one.
    #[error("response superseded by a newer request")]
    Stale,

    /// The owning session was torn down while the request was in flight.
    #[error("request cancelled")]
    Cancelled,

    /// The same operation is already in flight.
    #[error("{0} is already in progress")]
    Busy(String),

    /// The server applied part of the change; local state must be reloaded.
    #[error("partially applied on the server, reload required: {0}")]
    ResyncRequired(String),
}

impl ClientError {
    /// Errors that are never shown to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Stale | Self::Cancelled)
    }

    /// Text for a notification: the server's message verbatim when it sent
    /// one, local validation text, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Domain(err) => err.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<AuthzError> for ClientError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(capability) => Self::Forbidden(capability),
        }
    }
}
