//! Resource implementations.
//!
//! Every resource follows the same template: a schema, then create, read,
//! update, delete and import against NerdGraph. State travels as JSON and
//! is decoded into a typed record at the start of each operation.

pub mod data_partition_rule;
pub mod synthetics_private_location;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::NewRelicClient;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};
use crate::validation;

pub use data_partition_rule::DataPartitionRuleResource;
pub use synthetics_private_location::SyntheticsPrivateLocationResource;

/// What a configured provider hands to every resource operation.
#[derive(Debug, Clone)]
pub struct ProviderMeta {
    /// Client for the configured account region.
    pub client: NewRelicClient,
    /// Account used when a resource does not set `account_id`.
    pub account_id: Option<i64>,
}

impl ProviderMeta {
    pub fn new(client: NewRelicClient, account_id: Option<i64>) -> Self {
        Self { client, account_id }
    }

    /// The resource's own account id, else the provider default.
    pub fn select_account_id(&self, resource_account_id: Option<i64>) -> Result<i64, ProviderError> {
        resource_account_id.or(self.account_id).ok_or_else(|| {
            ProviderError::Configuration(
                "account_id must be set on the resource or the provider".to_string(),
            )
        })
    }
}

/// A resource type the provider can manage.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// The type name the host uses, e.g. `newrelic_data_partition_rule`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema of the resource.
    fn schema(&self) -> Schema;

    /// Check a configuration before planning.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Create the remote object and return the new state.
    async fn create(&self, meta: &ProviderMeta, planned: Value) -> Result<Value, ProviderError>;

    /// Refresh state from the API. `None` means the object is gone.
    async fn read(&self, meta: &ProviderMeta, current: Value)
        -> Result<Option<Value>, ProviderError>;

    /// Apply in-place changes and return the new state.
    async fn update(
        &self,
        meta: &ProviderMeta,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object.
    async fn delete(&self, meta: &ProviderMeta, current: Value) -> Result<(), ProviderError>;

    /// Build state for an existing object. `None` when nothing matches `id`.
    async fn import(&self, meta: &ProviderMeta, id: &str) -> Result<Option<Value>, ProviderError>;
}

/// Decode JSON state into a resource's typed record.
pub(crate) fn decode_state<T: DeserializeOwned>(
    type_name: &str,
    state: Value,
) -> Result<T, ProviderError> {
    serde_json::from_value(validation::normalize_integers(state))
        .map_err(|e| ProviderError::Validation(format!("invalid {} state: {}", type_name, e)))
}

pub(crate) fn encode_state<T: Serialize>(state: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(state)?)
}

/// Unwrap an attribute the schema marks as required.
pub(crate) fn required<T>(value: Option<T>, name: &str) -> Result<T, ProviderError> {
    value.ok_or_else(|| ProviderError::Validation(format!("Missing required attribute '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Credentials, Region};
    use serde::Deserialize;
    use serde_json::json;

    fn meta(account_id: Option<i64>) -> ProviderMeta {
        let client = NewRelicClient::new(Credentials::personal("NRAK-test"), Region::Us).unwrap();
        ProviderMeta::new(client, account_id)
    }

    #[test]
    fn test_select_account_id_prefers_resource() {
        assert_eq!(meta(Some(1)).select_account_id(Some(2)).unwrap(), 2);
        assert_eq!(meta(Some(1)).select_account_id(None).unwrap(), 1);
    }

    #[test]
    fn test_select_account_id_without_any() {
        let err = meta(None).select_account_id(None).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
    }

    #[test]
    fn test_decode_state() {
        let sample: Sample = decode_state("sample", json!({"name": "x"})).unwrap();
        assert_eq!(sample.name, "x");

        let err = decode_state::<Sample>("sample", json!({})).unwrap_err();
        assert!(err.to_string().contains("invalid sample state"));
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some(3), "n").unwrap(), 3);
        let err = required::<i64>(None, "description").unwrap_err();
        assert_eq!(err.message(), "Missing required attribute 'description'");
    }
}
