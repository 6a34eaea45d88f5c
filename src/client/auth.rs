//! Request authorization.
//!
//! New Relic endpoints disagree on which key they accept and in which
//! header, so each endpoint kind has its own authorizer.

use reqwest::RequestBuilder;

/// API keys available to the client. Any of them may be absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Personal (User) API key.
    pub personal_api_key: Option<String>,
    /// Admin API key.
    pub admin_api_key: Option<String>,
    /// Insert key for the event API.
    pub insights_insert_key: Option<String>,
}

impl Credentials {
    /// Credentials holding only a personal API key.
    pub fn personal(key: impl Into<String>) -> Self {
        Self {
            personal_api_key: Some(key.into()),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Credentials")
            .field("personal_api_key", &redact(&self.personal_api_key))
            .field("admin_api_key", &redact(&self.admin_api_key))
            .field("insights_insert_key", &redact(&self.insights_insert_key))
            .finish()
    }
}

/// Attaches credentials to an outgoing request.
pub trait RequestAuthorizer: Send + Sync {
    /// Add whatever headers the endpoint needs.
    fn authorize(&self, request: RequestBuilder, credentials: &Credentials) -> RequestBuilder;
}

/// The families of New Relic endpoints, each with its own auth scheme.
///
/// Every current resource talks to NerdGraph only; the REST and event
/// variants cover the remaining key types of the provider configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// NerdGraph GraphQL API.
    NerdGraph,
    /// REST v2 endpoints that accept user keys.
    RestV2,
    /// REST v2 endpoints that only accept admin keys.
    RestV2Classic,
    /// Event API.
    InsightsInsert,
}

impl EndpointKind {
    /// The authorizer for this endpoint kind.
    pub fn authorizer(&self) -> &'static dyn RequestAuthorizer {
        match self {
            Self::NerdGraph => &NerdGraphAuthorizer,
            Self::RestV2 => &PersonalApiKeyCapableAuthorizer,
            Self::RestV2Classic => &ClassicAuthorizer,
            Self::InsightsInsert => &InsightsInsertKeyAuthorizer,
        }
    }
}

fn non_empty(key: &Option<String>) -> Option<&str> {
    key.as_deref().filter(|k| !k.is_empty())
}

/// `Api-Key: <personal key>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NerdGraphAuthorizer;

impl RequestAuthorizer for NerdGraphAuthorizer {
    fn authorize(&self, request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
        match non_empty(&credentials.personal_api_key) {
            Some(key) => request.header("Api-Key", key),
            None => request,
        }
    }
}

/// Personal key with `Auth-Type: User-Api-Key` when present, admin key otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalApiKeyCapableAuthorizer;

impl RequestAuthorizer for PersonalApiKeyCapableAuthorizer {
    fn authorize(&self, request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
        if let Some(key) = non_empty(&credentials.personal_api_key) {
            return request
                .header("Api-Key", key)
                .header("Auth-Type", "User-Api-Key");
        }
        match non_empty(&credentials.admin_api_key) {
            Some(key) => request.header("X-Api-Key", key),
            None => request,
        }
    }
}

/// `X-Api-Key: <admin key>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicAuthorizer;

impl RequestAuthorizer for ClassicAuthorizer {
    fn authorize(&self, request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
        match non_empty(&credentials.admin_api_key) {
            Some(key) => request.header("X-Api-Key", key),
            None => request,
        }
    }
}

/// `X-Insert-Key: <insert key>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsightsInsertKeyAuthorizer;

impl RequestAuthorizer for InsightsInsertKeyAuthorizer {
    fn authorize(&self, request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
        match non_empty(&credentials.insights_insert_key) {
            Some(key) => request.header("X-Insert-Key", key),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(kind: EndpointKind, credentials: &Credentials) -> reqwest::header::HeaderMap {
        let request = reqwest::Client::new().get("https://api.newrelic.com/graphql");
        kind.authorizer()
            .authorize(request, credentials)
            .build()
            .unwrap()
            .headers()
            .clone()
    }

    fn all_keys() -> Credentials {
        Credentials {
            personal_api_key: Some("NRAK-user".to_string()),
            admin_api_key: Some("admin".to_string()),
            insights_insert_key: Some("insert".to_string()),
        }
    }

    #[test]
    fn test_nerdgraph_uses_personal_key() {
        let headers = headers(EndpointKind::NerdGraph, &all_keys());
        assert_eq!(headers["Api-Key"], "NRAK-user");
        assert!(headers.get("X-Api-Key").is_none());
    }

    #[test]
    fn test_rest_v2_prefers_personal_key() {
        let headers = headers(EndpointKind::RestV2, &all_keys());
        assert_eq!(headers["Api-Key"], "NRAK-user");
        assert_eq!(headers["Auth-Type"], "User-Api-Key");
        assert!(headers.get("X-Api-Key").is_none());
    }

    #[test]
    fn test_rest_v2_falls_back_to_admin_key() {
        let credentials = Credentials {
            personal_api_key: Some(String::new()),
            admin_api_key: Some("admin".to_string()),
            ..Default::default()
        };
        let headers = headers(EndpointKind::RestV2, &credentials);
        assert_eq!(headers["X-Api-Key"], "admin");
        assert!(headers.get("Auth-Type").is_none());
    }

    #[test]
    fn test_classic_and_insights() {
        let headers_classic = headers(EndpointKind::RestV2Classic, &all_keys());
        assert_eq!(headers_classic["X-Api-Key"], "admin");

        let headers_insert = headers(EndpointKind::InsightsInsert, &all_keys());
        assert_eq!(headers_insert["X-Insert-Key"], "insert");
        assert!(headers_insert.get("Api-Key").is_none());
    }

    #[test]
    fn test_missing_key_adds_no_header() {
        let headers = headers(EndpointKind::NerdGraph, &Credentials::default());
        assert!(headers.get("Api-Key").is_none());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let output = format!("{:?}", all_keys());
        assert!(!output.contains("NRAK-user"));
        assert!(output.contains("[REDACTED]"));
    }
}
