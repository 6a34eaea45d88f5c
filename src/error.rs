//! Error types for the New Relic provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while serving a provider request.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested remote object was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The New Relic API rejected the request or answered with an error.
    #[error("New Relic API error: {0}")]
    Api(String),

    /// The API reported one or more errors in the mutation payload.
    #[error("{}", summarize(.0))]
    Diagnostics(Vec<Diagnostic>),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// An I/O error occurred while binding the server.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Permission denied (authentication/authorization failure).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Quota or rate limit exceeded.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Service temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Operation timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.summary.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ProviderError {
    /// Get the error message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::Api(msg)
            | Self::PermissionDenied(msg)
            | Self::ResourceExhausted(msg)
            | Self::Unavailable(msg)
            | Self::DeadlineExceeded(msg)
            | Self::Unimplemented(msg) => msg.clone(),
            Self::Diagnostics(diagnostics) => summarize(diagnostics),
            Self::Serialization(err) => err.to_string(),
            Self::Transport(err) => err.to_string(),
            Self::Io(err) => err.to_string(),
        }
    }

    /// Convert the error into the diagnostics reported to the host.
    ///
    /// Payload errors keep one diagnostic per API error; everything else
    /// becomes a single error diagnostic.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            Self::Diagnostics(diagnostics) => diagnostics,
            other => vec![Diagnostic::error(other.to_string())],
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Api(msg) => tonic::Status::internal(msg),
            ProviderError::Diagnostics(diagnostics) => {
                tonic::Status::failed_precondition(summarize(&diagnostics))
            },
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            },
            ProviderError::Io(err) => tonic::Status::internal(format!("I/O error: {}", err)),
            ProviderError::PermissionDenied(msg) => tonic::Status::permission_denied(msg),
            ProviderError::ResourceExhausted(msg) => tonic::Status::resource_exhausted(msg),
            ProviderError::Unavailable(msg) => tonic::Status::unavailable(msg),
            ProviderError::DeadlineExceeded(msg) => tonic::Status::deadline_exceeded(msg),
            ProviderError::Unimplemented(msg) => tonic::Status::unimplemented(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("rule-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: rule-123");

        let err = ProviderError::Validation("invalid input".to_string());
        assert_eq!(format!("{}", err), "Validation error: invalid input");

        let err = ProviderError::UnknownResource("newrelic_widget".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: newrelic_widget");

        let err = ProviderError::Api("HTTP 500".to_string());
        assert_eq!(format!("{}", err), "New Relic API error: HTTP 500");
    }

    #[test]
    fn test_diagnostics_variant_display_joins_summaries() {
        let err = ProviderError::Diagnostics(vec![
            Diagnostic::error("DUPLICATE_DATA_PARTITION_RULE_NAME: name taken"),
            Diagnostic::error("INVALID_NRQL: bad query"),
        ]);
        assert_eq!(
            err.to_string(),
            "DUPLICATE_DATA_PARTITION_RULE_NAME: name taken; INVALID_NRQL: bad query"
        );
    }

    #[test]
    fn test_into_diagnostics() {
        let payload = vec![Diagnostic::error("first"), Diagnostic::error("second")];
        let err = ProviderError::Diagnostics(payload.clone());
        assert_eq!(err.into_diagnostics(), payload);

        let err = ProviderError::Configuration("api_key is required".to_string());
        let diagnostics = err.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].summary,
            "Configuration error: api_key is required"
        );
        assert!(diagnostics[0].is_error());
    }

    #[test]
    fn test_error_to_status() {
        let status: tonic::Status = ProviderError::NotFound("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::NotFound);

        let status: tonic::Status = ProviderError::Validation("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);

        let status: tonic::Status = ProviderError::Configuration("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);

        let status: tonic::Status = ProviderError::Api("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Internal);

        let status: tonic::Status =
            ProviderError::Diagnostics(vec![Diagnostic::error("dup")]).into();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);
        assert_eq!(status.message(), "dup");
    }

    #[test]
    fn test_remote_failure_variants_to_status() {
        let status: tonic::Status = ProviderError::PermissionDenied("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::PermissionDenied);

        let status: tonic::Status = ProviderError::ResourceExhausted("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::ResourceExhausted);

        let status: tonic::Status = ProviderError::Unavailable("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Unavailable);

        let status: tonic::Status = ProviderError::DeadlineExceeded("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::DeadlineExceeded);

        let status: tonic::Status = ProviderError::Unimplemented("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Unimplemented);
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::NotFound("rule-123".to_string());
        assert_eq!(err.message(), "rule-123");

        let err = ProviderError::Configuration("invalid config".to_string());
        assert_eq!(err.message(), "invalid config");

        let err = ProviderError::Diagnostics(vec![Diagnostic::error("a"), Diagnostic::error("b")]);
        assert_eq!(err.message(), "a; b");
    }
}
