//! `newrelic_data_partition_rule`: routes matching log records into a
//! dedicated data partition.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{decode_state, encode_state, ProviderMeta, Resource};
use crate::client::logconfigurations::{
    CreateDataPartitionRuleInput, DataPartitionRule, DataPartitionRuleMutationError,
    MatchingCriteria, UpdateDataPartitionRuleInput,
};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::validation;

pub const TYPE_NAME: &str = "newrelic_data_partition_rule";

/// Every target partition name carries this prefix.
pub const PARTITION_PREFIX: &str = "Log_";

pub const MATCHING_METHODS: [&str; 2] = ["EQUALS", "LIKE"];
pub const RETENTION_POLICIES: [&str; 2] = ["STANDARD", "SECONDARY"];

/// State of a data partition rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPartitionRuleState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub account_id: Option<i64>,
    pub target_data_partition: String,
    #[serde(default)]
    pub description: Option<String>,
    pub enabled: bool,
    pub attribute_name: String,
    pub matching_expression: String,
    pub matching_method: String,
    pub retention_policy: String,
    #[serde(default)]
    pub deleted: Option<bool>,
}

impl DataPartitionRuleState {
    /// State mirroring a rule returned by the API.
    pub fn from_rule(account_id: i64, rule: DataPartitionRule) -> Self {
        let criteria = rule.matching_criteria.unwrap_or(MatchingCriteria {
            attribute_name: String::new(),
            matching_expression: String::new(),
            matching_operator: String::new(),
        });
        Self {
            id: Some(rule.id),
            account_id: Some(account_id),
            target_data_partition: rule.target_data_partition,
            description: rule.description.filter(|d| !d.is_empty()),
            enabled: rule.enabled,
            attribute_name: criteria.attribute_name,
            matching_expression: criteria.matching_expression,
            matching_method: criteria.matching_operator,
            retention_policy: rule.retention_policy,
            deleted: Some(rule.deleted),
        }
    }

    fn matching_criteria(&self) -> MatchingCriteria {
        MatchingCriteria {
            attribute_name: self.attribute_name.clone(),
            matching_expression: self.matching_expression.clone(),
            matching_operator: self.matching_method.clone(),
        }
    }

    fn create_input(&self) -> CreateDataPartitionRuleInput {
        CreateDataPartitionRuleInput {
            target_data_partition: self.target_data_partition.clone(),
            description: self.description.clone(),
            enabled: self.enabled,
            matching_criteria: self.matching_criteria(),
            retention_policy: self.retention_policy.clone(),
        }
    }

    fn update_input(&self, id: String) -> UpdateDataPartitionRuleInput {
        UpdateDataPartitionRuleInput {
            id,
            description: self.description.clone(),
            enabled: self.enabled,
            matching_criteria: self.matching_criteria(),
            retention_policy: self.retention_policy.clone(),
        }
    }

    fn id(&self) -> Result<&str, ProviderError> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::Validation(format!("{} state has no id", TYPE_NAME)))
    }
}

/// Split an import id of the form `<rule id>` or `<account id>:<rule id>`.
pub fn parse_import_id(id: &str) -> Result<(Option<i64>, &str), ProviderError> {
    match id.split_once(':') {
        None if !id.is_empty() => Ok((None, id)),
        Some((account, rule)) if !rule.is_empty() => {
            let account_id = account.parse().map_err(|_| {
                ProviderError::Validation(format!(
                    "invalid import id '{}': expected <rule id> or <account id>:<rule id>",
                    id
                ))
            })?;
            Ok((Some(account_id), rule))
        },
        _ => Err(ProviderError::Validation(format!(
            "invalid import id '{}': expected <rule id> or <account id>:<rule id>",
            id
        ))),
    }
}

fn mutation_errors(errors: Vec<DataPartitionRuleMutationError>) -> Result<(), ProviderError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(ProviderError::Diagnostics(
        errors
            .into_iter()
            .map(|e| Diagnostic::error(format!("{}: {}", e.kind, e.message)))
            .collect(),
    ))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataPartitionRuleResource;

impl DataPartitionRuleResource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Resource for DataPartitionRuleResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Routes log records that match a condition into a data partition.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "account_id",
                Attribute::optional_computed_int64()
                    .with_force_new()
                    .with_description("The account the rule belongs to."),
            )
            .with_attribute(
                "target_data_partition",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Name of the partition. Must start with Log_."),
            )
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "enabled",
                Attribute::required_bool().with_description("Whether the rule is active."),
            )
            .with_attribute(
                "attribute_name",
                Attribute::required_string().with_description("Log attribute to match on."),
            )
            .with_attribute(
                "matching_expression",
                Attribute::required_string().with_description("Value to match."),
            )
            .with_attribute(
                "matching_method",
                Attribute::required_string().with_allowed_values(MATCHING_METHODS),
            )
            .with_attribute(
                "retention_policy",
                Attribute::required_string().with_allowed_values(RETENTION_POLICIES),
            )
            .with_attribute(
                "deleted",
                Attribute::computed_bool().with_description("Whether the rule was deleted."),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);

        if let Some(target) = config.get("target_data_partition").and_then(Value::as_str) {
            if !target.starts_with(PARTITION_PREFIX) {
                diagnostics.push(
                    Diagnostic::error("Invalid value for attribute 'target_data_partition'")
                        .with_detail(format!(
                            "Partition names must start with {}, got \"{}\"",
                            PARTITION_PREFIX, target
                        ))
                        .with_attribute("target_data_partition"),
                );
            }
        }
        diagnostics
    }

    async fn create(&self, meta: &ProviderMeta, planned: Value) -> Result<Value, ProviderError> {
        let state: DataPartitionRuleState = decode_state(TYPE_NAME, planned)?;
        let account_id = meta.select_account_id(state.account_id)?;

        info!(account_id, target = %state.target_data_partition, "Creating data partition rule");
        let payload = meta
            .client
            .create_data_partition_rule(account_id, &state.create_input())
            .await?;
        mutation_errors(payload.errors)?;

        let rule = payload.rule.ok_or_else(|| {
            ProviderError::Api("create returned neither a rule nor errors".to_string())
        })?;
        info!(account_id, id = %rule.id, "Created data partition rule");
        encode_state(&DataPartitionRuleState::from_rule(account_id, rule))
    }

    async fn read(
        &self,
        meta: &ProviderMeta,
        current: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let state: DataPartitionRuleState = decode_state(TYPE_NAME, current)?;
        let account_id = meta.select_account_id(state.account_id)?;
        let id = state.id()?;

        match meta.client.get_data_partition_rule(account_id, id).await {
            Ok(Some(rule)) => {
                encode_state(&DataPartitionRuleState::from_rule(account_id, rule)).map(Some)
            },
            Ok(None) => {
                warn!(account_id, id, "Data partition rule no longer exists");
                Ok(None)
            },
            Err(err) if err.is_not_found() => {
                warn!(account_id, id, "Data partition rule no longer exists");
                Ok(None)
            },
            Err(err) => Err(err.into()),
        }
    }

    async fn update(
        &self,
        meta: &ProviderMeta,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior: DataPartitionRuleState = decode_state(TYPE_NAME, prior)?;
        let planned: DataPartitionRuleState = decode_state(TYPE_NAME, planned)?;
        let account_id = meta.select_account_id(prior.account_id.or(planned.account_id))?;
        let id = prior.id()?.to_string();

        info!(account_id, id = %id, "Updating data partition rule");
        let payload = meta
            .client
            .update_data_partition_rule(account_id, &planned.update_input(id.clone()))
            .await?;
        mutation_errors(payload.errors)?;

        let state = match payload.rule {
            Some(rule) => DataPartitionRuleState::from_rule(account_id, rule),
            None => DataPartitionRuleState {
                id: Some(id),
                account_id: Some(account_id),
                deleted: prior.deleted,
                ..planned
            },
        };
        encode_state(&state)
    }

    async fn delete(&self, meta: &ProviderMeta, current: Value) -> Result<(), ProviderError> {
        let state: DataPartitionRuleState = decode_state(TYPE_NAME, current)?;
        let account_id = meta.select_account_id(state.account_id)?;
        let id = state.id()?;

        info!(account_id, id, "Deleting data partition rule");
        match meta.client.delete_data_partition_rule(account_id, id).await {
            Ok(errors) => mutation_errors(errors),
            Err(err) if err.is_not_found() => {
                warn!(account_id, id, "Data partition rule already deleted");
                Ok(())
            },
            Err(err) => Err(err.into()),
        }
    }

    async fn import(&self, meta: &ProviderMeta, id: &str) -> Result<Option<Value>, ProviderError> {
        let (account_id, rule_id) = parse_import_id(id)?;
        let account_id = meta.select_account_id(account_id)?;

        info!(account_id, id = rule_id, "Importing data partition rule");
        let rule = match meta.client.get_data_partition_rule(account_id, rule_id).await {
            Ok(rule) => rule,
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err.into()),
        };
        rule.map(|rule| encode_state(&DataPartitionRuleState::from_rule(account_id, rule)))
            .transpose()
    }
}
