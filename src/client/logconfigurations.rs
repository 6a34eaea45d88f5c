//! Log data partition rules.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{null_as_default, ClientError, NewRelicClient};

const CREATE_RULE: &str = r#"mutation($accountId: Int!, $rule: LogConfigurationsCreateDataPartitionRuleInput!) {
  logConfigurationsCreateDataPartitionRule(accountId: $accountId, rule: $rule) {
    rule { id targetDataPartition description enabled deleted retentionPolicy matchingCriteria { attributeName matchingExpression matchingOperator } }
    errors { message type }
  }
}"#;

const UPDATE_RULE: &str = r#"mutation($accountId: Int!, $rule: LogConfigurationsUpdateDataPartitionRuleInput!) {
  logConfigurationsUpdateDataPartitionRule(accountId: $accountId, rule: $rule) {
    rule { id targetDataPartition description enabled deleted retentionPolicy matchingCriteria { attributeName matchingExpression matchingOperator } }
    errors { message type }
  }
}"#;

const DELETE_RULE: &str = r#"mutation($accountId: Int!, $id: ID!) {
  logConfigurationsDeleteDataPartitionRule(accountId: $accountId, id: $id) {
    errors { message type }
  }
}"#;

const LIST_RULES: &str = r#"query($accountId: Int!) {
  actor { account(id: $accountId) { logConfigurations { dataPartitionRules {
    id targetDataPartition description enabled deleted retentionPolicy
    matchingCriteria { attributeName matchingExpression matchingOperator }
  } } } }
}"#;

/// How a rule selects log records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingCriteria {
    pub attribute_name: String,
    pub matching_expression: String,
    /// `EQUALS` or `LIKE`.
    pub matching_operator: String,
}

/// A data partition rule as NerdGraph returns it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPartitionRule {
    pub id: String,
    pub target_data_partition: String,
    #[serde(default)]
    pub description: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub deleted: bool,
    /// `STANDARD` or `SECONDARY`.
    pub retention_policy: String,
    #[serde(default)]
    pub matching_criteria: Option<MatchingCriteria>,
}

/// Input for creating a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDataPartitionRuleInput {
    pub target_data_partition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub matching_criteria: MatchingCriteria,
    pub retention_policy: String,
}

/// Input for updating a rule. The target partition cannot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDataPartitionRuleInput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub matching_criteria: MatchingCriteria,
    pub retention_policy: String,
}

/// An error reported inside a mutation payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataPartitionRuleMutationError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Payload of the create and update mutations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataPartitionRuleMutation {
    #[serde(default)]
    pub rule: Option<DataPartitionRule>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<DataPartitionRuleMutationError>,
}

#[derive(Deserialize)]
struct CreateData {
    #[serde(rename = "logConfigurationsCreateDataPartitionRule")]
    payload: DataPartitionRuleMutation,
}

#[derive(Deserialize)]
struct UpdateData {
    #[serde(rename = "logConfigurationsUpdateDataPartitionRule")]
    payload: DataPartitionRuleMutation,
}

#[derive(Deserialize)]
struct DeletePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    errors: Vec<DataPartitionRuleMutationError>,
}

#[derive(Deserialize)]
struct DeleteData {
    #[serde(rename = "logConfigurationsDeleteDataPartitionRule")]
    payload: Option<DeletePayload>,
}

#[derive(Deserialize)]
struct ListData {
    actor: ListActor,
}

#[derive(Deserialize)]
struct ListActor {
    account: Option<ListAccount>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAccount {
    log_configurations: Option<ListLogConfigurations>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListLogConfigurations {
    #[serde(default, deserialize_with = "null_as_default")]
    data_partition_rules: Vec<DataPartitionRule>,
}

impl NewRelicClient {
    /// Create a data partition rule in `account_id`.
    pub async fn create_data_partition_rule(
        &self,
        account_id: i64,
        rule: &CreateDataPartitionRuleInput,
    ) -> Result<DataPartitionRuleMutation, ClientError> {
        let data: CreateData = self
            .query(CREATE_RULE, json!({ "accountId": account_id, "rule": rule }))
            .await?;
        Ok(data.payload)
    }

    /// Update an existing rule.
    pub async fn update_data_partition_rule(
        &self,
        account_id: i64,
        rule: &UpdateDataPartitionRuleInput,
    ) -> Result<DataPartitionRuleMutation, ClientError> {
        let data: UpdateData = self
            .query(UPDATE_RULE, json!({ "accountId": account_id, "rule": rule }))
            .await?;
        Ok(data.payload)
    }

    /// Delete a rule, returning any errors reported in the payload.
    pub async fn delete_data_partition_rule(
        &self,
        account_id: i64,
        id: &str,
    ) -> Result<Vec<DataPartitionRuleMutationError>, ClientError> {
        let data: DeleteData = self
            .query(DELETE_RULE, json!({ "accountId": account_id, "id": id }))
            .await?;
        Ok(data.payload.map(|p| p.errors).unwrap_or_default())
    }

    /// All data partition rules of an account, deleted ones included.
    pub async fn list_data_partition_rules(
        &self,
        account_id: i64,
    ) -> Result<Vec<DataPartitionRule>, ClientError> {
        let data: ListData = self
            .query(LIST_RULES, json!({ "accountId": account_id }))
            .await?;
        Ok(data
            .actor
            .account
            .and_then(|a| a.log_configurations)
            .map(|l| l.data_partition_rules)
            .unwrap_or_default())
    }

    /// Look up a live rule by id. Deleted rules count as absent.
    pub async fn get_data_partition_rule(
        &self,
        account_id: i64,
        id: &str,
    ) -> Result<Option<DataPartitionRule>, ClientError> {
        let rules = self.list_data_partition_rules(account_id).await?;
        debug!(account_id, rules = rules.len(), "Fetched data partition rules");
        Ok(rules.into_iter().find(|r| r.id == id && !r.deleted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CreateDataPartitionRuleInput {
        CreateDataPartitionRuleInput {
            target_data_partition: "Log_Test".to_string(),
            description: None,
            enabled: true,
            matching_criteria: MatchingCriteria {
                attribute_name: "hostname".to_string(),
                matching_expression: "localhost".to_string(),
                matching_operator: "EQUALS".to_string(),
            },
            retention_policy: "SECONDARY".to_string(),
        }
    }

    #[test]
    fn test_create_input_serializes_camel_case() {
        let value = serde_json::to_value(input()).unwrap();
        assert_eq!(value["targetDataPartition"], "Log_Test");
        assert_eq!(value["matchingCriteria"]["matchingOperator"], "EQUALS");
        assert_eq!(value["retentionPolicy"], "SECONDARY");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_mutation_payload_with_null_errors() {
        let payload: DataPartitionRuleMutation = serde_json::from_value(json!({
            "rule": {
                "id": "42",
                "targetDataPartition": "Log_Test",
                "description": null,
                "enabled": true,
                "deleted": false,
                "retentionPolicy": "STANDARD",
                "matchingCriteria": {
                    "attributeName": "hostname",
                    "matchingExpression": "localhost",
                    "matchingOperator": "LIKE"
                }
            },
            "errors": null
        }))
        .unwrap();

        assert!(payload.errors.is_empty());
        let rule = payload.rule.unwrap();
        assert_eq!(rule.id, "42");
        assert_eq!(rule.matching_criteria.unwrap().matching_operator, "LIKE");
    }

    #[test]
    fn test_mutation_error_payload() {
        let payload: DataPartitionRuleMutation = serde_json::from_value(json!({
            "rule": null,
            "errors": [{"message": "name taken", "type": "DUPLICATE_DATA_PARTITION_RULE_NAME"}]
        }))
        .unwrap();

        assert!(payload.rule.is_none());
        assert_eq!(payload.errors[0].kind, "DUPLICATE_DATA_PARTITION_RULE_NAME");
    }

    #[test]
    fn test_list_with_inaccessible_account() {
        let data: ListData = serde_json::from_value(json!({"actor": {"account": null}})).unwrap();
        assert!(data.actor.account.is_none());
    }
}
