//! Client error types.

use thiserror::Error;

use crate::error::ProviderError;

/// Errors returned by [`NewRelicClient`](super::NewRelicClient) calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response body not read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// NerdGraph answered with top-level GraphQL errors.
    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// NerdGraph reported the requested object as missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response did not have the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether the error means the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Http { status: 404, .. }
        )
    }
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(e) if e.is_timeout() => {
                ProviderError::DeadlineExceeded(e.to_string())
            },
            ClientError::Network(e) => ProviderError::Unavailable(e.to_string()),
            ClientError::Http { status, message } => {
                let msg = format!("HTTP {}: {}", status, message);
                match status {
                    401 | 403 => ProviderError::PermissionDenied(msg),
                    404 => ProviderError::NotFound(msg),
                    429 => ProviderError::ResourceExhausted(msg),
                    500..=599 => ProviderError::Unavailable(msg),
                    _ => ProviderError::Api(msg),
                }
            },
            ClientError::NotFound(msg) => ProviderError::NotFound(msg),
            err @ (ClientError::GraphQl(_) | ClientError::Decode(_)) => {
                ProviderError::Api(err.to_string())
            },
        }
    }
}
