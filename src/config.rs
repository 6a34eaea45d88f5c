//! Provider configuration.
//!
//! The host sends the provider block as JSON in the Configure call. Any
//! attribute left unset falls back to the matching `NEW_RELIC_*`
//! environment variable.

use serde::Deserialize;
use serde_json::Value;

use crate::client::Region;
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::validation;

/// Environment variable names consulted for unset attributes.
pub mod env {
    /// Default account for resources that do not set `account_id`.
    pub const ACCOUNT_ID: &str = "NEW_RELIC_ACCOUNT_ID";
    /// Personal (User) API key used for NerdGraph.
    pub const API_KEY: &str = "NEW_RELIC_API_KEY";
    /// Admin key for REST v2 endpoints.
    pub const ADMIN_API_KEY: &str = "NEW_RELIC_ADMIN_API_KEY";
    /// Insert key for the event API.
    pub const INSIGHTS_INSERT_KEY: &str = "NEW_RELIC_INSIGHTS_INSERT_KEY";
    /// `US` or `EU`.
    pub const REGION: &str = "NEW_RELIC_REGION";
    /// Explicit NerdGraph endpoint, overriding the region.
    pub const NERDGRAPH_API_URL: &str = "NEW_RELIC_NERDGRAPH_API_URL";
}

/// Raw provider configuration as received from the host.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Default account id.
    pub account_id: Option<i64>,
    /// Personal API key.
    pub api_key: Option<String>,
    /// Admin API key.
    pub admin_api_key: Option<String>,
    /// Insights insert key.
    pub insights_insert_key: Option<String>,
    /// Region name.
    pub region: Option<String>,
    /// NerdGraph endpoint override.
    pub nerdgraph_api_url: Option<String>,
}

impl ProviderConfig {
    /// The provider configuration schema advertised to the host.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Configuration for the New Relic provider.")
            .with_attribute(
                "account_id",
                Attribute::optional_int64()
                    .with_description("The default New Relic account ID for resources."),
            )
            .with_attribute(
                "api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("A New Relic User API key."),
            )
            .with_attribute(
                "admin_api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("A New Relic Admin API key for REST v2 endpoints."),
            )
            .with_attribute(
                "insights_insert_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("A New Relic insert key for custom events."),
            )
            .with_attribute(
                "region",
                Attribute::optional_string()
                    .with_description("The data center region of the account (US or EU)."),
            )
            .with_attribute(
                "nerdgraph_api_url",
                Attribute::optional_string()
                    .with_description("Overrides the NerdGraph endpoint derived from the region."),
            )
    }

    /// Parse the configuration sent by the host. `null` yields an empty config.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(validation::normalize_integers(value))?)
    }

    /// Fill unset attributes from the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env(|name| std::env::var(name).ok())
    }

    /// Fill unset attributes using `lookup` to read environment variables.
    ///
    /// Empty strings count as unset.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.account_id.is_none() {
            self.account_id = get(env::ACCOUNT_ID).and_then(|v| v.trim().parse().ok());
        }
        if self.api_key.is_none() {
            self.api_key = get(env::API_KEY);
        }
        if self.admin_api_key.is_none() {
            self.admin_api_key = get(env::ADMIN_API_KEY);
        }
        if self.insights_insert_key.is_none() {
            self.insights_insert_key = get(env::INSIGHTS_INSERT_KEY);
        }
        if self.region.is_none() {
            self.region = get(env::REGION);
        }
        if self.nerdgraph_api_url.is_none() {
            self.nerdgraph_api_url = get(env::NERDGRAPH_API_URL);
        }
        self
    }

    /// Check the resolved configuration, returning diagnostics for every problem.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if self.api_key.as_deref().map_or(true, str::is_empty) {
            diagnostics.push(
                Diagnostic::error("Missing New Relic API key")
                    .with_detail(format!(
                        "Set `api_key` in the provider block or the {} environment variable",
                        env::API_KEY
                    ))
                    .with_attribute("api_key"),
            );
        }

        if let Some(region) = &self.region {
            if region.parse::<Region>().is_err() {
                diagnostics.push(
                    Diagnostic::error(format!("Unknown region '{}'", region))
                        .with_detail("Expected US or EU")
                        .with_attribute("region"),
                );
            }
        }

        if let Some(account_id) = self.account_id {
            if account_id <= 0 {
                diagnostics.push(
                    Diagnostic::error("Invalid account_id")
                        .with_detail(format!("Account IDs are positive, got {}", account_id))
                        .with_attribute("account_id"),
                );
            }
        }

        if self.account_id.is_none() {
            diagnostics.push(
                Diagnostic::warning("No default account_id configured")
                    .with_detail("Every resource will need to set account_id explicitly")
                    .with_attribute("account_id"),
            );
        }

        diagnostics
    }

    /// The configured region, defaulting to US.
    pub fn region(&self) -> Result<Region, ProviderError> {
        match &self.region {
            Some(region) => region.parse(),
            None => Ok(Region::default()),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ProviderConfig")
            .field("account_id", &self.account_id)
            .field("api_key", &redact(&self.api_key))
            .field("admin_api_key", &redact(&self.admin_api_key))
            .field("insights_insert_key", &redact(&self.insights_insert_key))
            .field("region", &self.region)
            .field("nerdgraph_api_url", &self.nerdgraph_api_url)
            .finish()
    }
}
