use thiserror::Error;

use tese_shared::{ChatError, NegotiationError, RfqError};

/// Errors produced by the data client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The requested entity does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered with a non-success status.
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Transport failure (connection refused, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The backend answered successfully but broke a documented invariant.
    #[error("Backend contract violated: {0}")]
    Contract(String),

    /// A previous optimistic update on the same view has not settled yet.
    #[error("Another update is still in progress")]
    InFlight,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Rfq(#[from] RfqError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// Business-rule failures the UI shows inline.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClientError::Rfq(_) | ClientError::Negotiation(_) | ClientError::Chat(ChatError::EmptyMessage)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
