//! Minimal New Relic API client.
//!
//! Only the calls the provider's resources need are implemented: NerdGraph
//! queries and mutations for log data partition rules, synthetics private
//! locations and entity lookups. Every call is a single request; there is
//! no retry or pagination.

pub mod auth;
pub mod entities;
pub mod error;
pub mod logconfigurations;
pub mod synthetics;

use std::str::FromStr;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;

pub use auth::{Credentials, EndpointKind, RequestAuthorizer};
pub use error::ClientError;

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("newrelic-provider/", env!("CARGO_PKG_VERSION"));

/// Longest HTTP error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// The New Relic data center an account lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    /// United States (default).
    #[default]
    Us,
    /// European Union.
    Eu,
}

impl Region {
    /// NerdGraph (GraphQL) endpoint.
    pub fn nerdgraph_url(&self) -> &'static str {
        match self {
            Self::Us => "https://api.newrelic.com/graphql",
            Self::Eu => "https://api.eu.newrelic.com/graphql",
        }
    }

    /// REST v2 base URL. No current resource calls REST v2; the URL backs
    /// the REST authorizer strategies.
    pub fn rest_v2_url(&self) -> &'static str {
        match self {
            Self::Us => "https://api.newrelic.com/v2",
            Self::Eu => "https://api.eu.newrelic.com/v2",
        }
    }

    /// Event API base URL. No current resource sends events.
    pub fn insights_insert_url(&self) -> &'static str {
        match self {
            Self::Us => "https://insights-collector.newrelic.com/v1",
            Self::Eu => "https://insights-collector.eu01.nr-data.net/v1",
        }
    }
}

impl FromStr for Region {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Self::Us),
            "EU" => Ok(Self::Eu),
            other => Err(ProviderError::Configuration(format!(
                "unknown region '{}', expected US or EU",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Us => write!(f, "US"),
            Self::Eu => write!(f, "EU"),
        }
    }
}

/// HTTP client bound to one set of credentials and one region.
#[derive(Clone)]
pub struct NewRelicClient {
    http: reqwest::Client,
    credentials: Credentials,
    region: Region,
    nerdgraph_url: String,
}

impl NewRelicClient {
    /// Create a client for the region's default endpoints.
    pub fn new(credentials: Credentials, region: Region) -> Result<Self, ClientError> {
        Self::with_nerdgraph_url(credentials, region, region.nerdgraph_url().to_string())
    }

    /// Create a client that sends NerdGraph requests to `nerdgraph_url`.
    ///
    /// Used for mock servers and non-standard endpoints.
    pub fn with_nerdgraph_url(
        credentials: Credentials,
        region: Region,
        nerdgraph_url: String,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            credentials,
            region,
            nerdgraph_url,
        })
    }

    /// Build a client from resolved provider configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let region = config.region()?;
        let credentials = Credentials {
            personal_api_key: config.api_key.clone(),
            admin_api_key: config.admin_api_key.clone(),
            insights_insert_key: config.insights_insert_key.clone(),
        };
        let url = config
            .nerdgraph_api_url
            .clone()
            .unwrap_or_else(|| region.nerdgraph_url().to_string());

        Ok(Self::with_nerdgraph_url(credentials, region, url)?)
    }

    /// The NerdGraph endpoint requests are sent to.
    pub fn nerdgraph_url(&self) -> &str {
        &self.nerdgraph_url
    }

    /// The region this client targets.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Base URL for an endpoint kind.
    pub fn base_url(&self, kind: EndpointKind) -> &str {
        match kind {
            EndpointKind::NerdGraph => &self.nerdgraph_url,
            EndpointKind::RestV2 | EndpointKind::RestV2Classic => self.region.rest_v2_url(),
            EndpointKind::InsightsInsert => self.region.insights_insert_url(),
        }
    }

    /// Start a request authorized the way `kind` endpoints expect.
    pub fn request(&self, kind: EndpointKind, method: Method, url: &str) -> reqwest::RequestBuilder {
        kind.authorizer()
            .authorize(self.http.request(method, url), &self.credentials)
    }

    /// Run a NerdGraph query or mutation and decode its `data` member.
    pub async fn query<T>(&self, query: &str, variables: Value) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let operation = operation_name(query);
        debug!(operation, url = %self.nerdgraph_url, "Sending NerdGraph request");

        let response = self
            .request(EndpointKind::NerdGraph, Method::POST, &self.nerdgraph_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation, status = status.as_u16(), "NerdGraph request failed");
            return Err(ClientError::Http {
                status: status.as_u16(),
                message: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("failed to parse response: {}", e)))?;

        decode_graphql(operation, body)
    }
}

impl std::fmt::Debug for NewRelicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewRelicClient")
            .field("region", &self.region)
            .field("nerdgraph_url", &self.nerdgraph_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphQlError {
    fn is_not_found(&self) -> bool {
        let class = self
            .extensions
            .as_ref()
            .and_then(|e| e.get("errorClass"))
            .and_then(Value::as_str);
        // account-level failures also say "not found" in the message
        class == Some("NOT_FOUND")
    }
}

fn decode_graphql<T: DeserializeOwned>(operation: &str, mut body: Value) -> Result<T, ClientError> {
    let errors: Vec<GraphQlError> = match body.get_mut("errors").map(Value::take) {
        Some(Value::Null) | None => Vec::new(),
        Some(errors) => serde_json::from_value(errors)
            .map_err(|e| ClientError::Decode(format!("malformed errors member: {}", e)))?,
    };

    if let Some(not_found) = errors.iter().find(|e| e.is_not_found()) {
        return Err(ClientError::NotFound(not_found.message.clone()));
    }
    if !errors.is_empty() {
        warn!(operation, errors = errors.len(), "NerdGraph returned errors");
        return Err(ClientError::GraphQl(
            errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    match body.get_mut("data").map(Value::take) {
        Some(Value::Null) | None => Err(ClientError::Decode(format!(
            "{} response contained no data",
            operation
        ))),
        Some(data) => serde_json::from_value(data)
            .map_err(|e| ClientError::Decode(format!("unexpected {} response: {}", operation, e))),
    }
}

/// Name of the first field selected by a query, used for logging.
fn operation_name(query: &str) -> &str {
    let body = query.split_once('{').map(|(_, rest)| rest).unwrap_or(query);
    body.trim_start()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("query")
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Deserialize `null` as the type's default (NerdGraph sends `errors: null`).
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            personal_api_key: Some("NRAK-test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_region_parsing() {
        assert_eq!("US".parse::<Region>().unwrap(), Region::Us);
        assert_eq!(" eu ".parse::<Region>().unwrap(), Region::Eu);
        assert!("APAC".parse::<Region>().is_err());
        assert_eq!(Region::default(), Region::Us);
        assert_eq!(Region::Eu.to_string(), "EU");
    }

    #[test]
    fn test_region_endpoints() {
        assert_eq!(Region::Us.nerdgraph_url(), "https://api.newrelic.com/graphql");
        assert_eq!(Region::Eu.nerdgraph_url(), "https://api.eu.newrelic.com/graphql");
        assert_eq!(Region::Eu.rest_v2_url(), "https://api.eu.newrelic.com/v2");
        assert!(Region::Us.insights_insert_url().contains("insights-collector"));
    }

    #[test]
    fn test_client_uses_region_endpoint() {
        let client = NewRelicClient::new(credentials(), Region::Eu).unwrap();
        assert_eq!(client.nerdgraph_url(), "https://api.eu.newrelic.com/graphql");
        assert_eq!(client.base_url(EndpointKind::RestV2), "https://api.eu.newrelic.com/v2");
        assert_eq!(client.region(), Region::Eu);
    }

    #[test]
    fn test_client_from_config_honours_url_override() {
        let config = ProviderConfig {
            api_key: Some("NRAK-test".to_string()),
            nerdgraph_api_url: Some("http://localhost:8080/graphql".to_string()),
            ..Default::default()
        };
        let client = NewRelicClient::from_config(&config).unwrap();
        assert_eq!(client.nerdgraph_url(), "http://localhost:8080/graphql");
        assert_eq!(client.region(), Region::Us);
    }

    #[test]
    fn test_debug_does_not_expose_keys() {
        let client = NewRelicClient::new(credentials(), Region::Us).unwrap();
        let debug_output = format!("{:?}", client);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("NRAK-test"));
    }

    #[test]
    fn test_request_applies_nerdgraph_authorizer() {
        let client = NewRelicClient::new(credentials(), Region::Us).unwrap();
        let request = client
            .request(EndpointKind::NerdGraph, Method::POST, client.nerdgraph_url())
            .build()
            .unwrap();
        assert_eq!(request.headers()["Api-Key"], "NRAK-test");
    }

    #[test]
    fn test_decode_graphql_data() {
        let body = json!({"data": {"actor": {"user": {"id": 1}}}});
        let data: Value = decode_graphql("actor", body).unwrap();
        assert_eq!(data["actor"]["user"]["id"], 1);
    }

    #[test]
    fn test_decode_graphql_errors() {
        let body = json!({
            "data": null,
            "errors": [{"message": "Argument 'accountId' is invalid"}]
        });
        let err = decode_graphql::<Value>("actor", body).unwrap_err();
        assert!(matches!(err, ClientError::GraphQl(ref msgs) if msgs.len() == 1));
    }

    #[test]
    fn test_decode_graphql_not_found() {
        let body = json!({
            "data": {"actor": {"entity": null}},
            "errors": [{"message": "Entity missing", "extensions": {"errorClass": "NOT_FOUND"}}]
        });
        let err = decode_graphql::<Value>("actor", body).unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[test]
    fn test_decode_graphql_account_error_is_not_missing_object() {
        let body = json!({
            "data": null,
            "errors": [{"message": "Account 3806526 not found or access denied"}]
        });
        let err = decode_graphql::<Value>("actor", body).unwrap_err();
        assert!(matches!(err, ClientError::GraphQl(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_decode_graphql_missing_data() {
        let err = decode_graphql::<Value>("actor", json!({"errors": null})).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_operation_name() {
        assert_eq!(
            operation_name("mutation($guid: EntityGuid!) { syntheticsDeletePrivateLocation(guid: $guid) { errors { description } } }"),
            "syntheticsDeletePrivateLocation"
        );
        assert_eq!(operation_name("{ actor { user { id } } }"), "actor");
        assert_eq!(operation_name(""), "query");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
        assert_eq!(truncate("ééé", 3), "é...");
    }
}
