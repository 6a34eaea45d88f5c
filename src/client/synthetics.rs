//! Synthetics private locations.

use serde::Deserialize;
use serde_json::json;

use super::{null_as_default, ClientError, NewRelicClient};

const CREATE_LOCATION: &str = r#"mutation($accountId: Int!, $description: String!, $name: String!, $verifiedScriptExecution: Boolean!) {
  syntheticsCreatePrivateLocation(accountId: $accountId, description: $description, name: $name, verifiedScriptExecution: $verifiedScriptExecution) {
    domainId guid key locationId
    errors { description type }
  }
}"#;

const UPDATE_LOCATION: &str = r#"mutation($guid: EntityGuid!, $description: String!, $verifiedScriptExecution: Boolean!) {
  syntheticsUpdatePrivateLocation(guid: $guid, description: $description, verifiedScriptExecution: $verifiedScriptExecution) {
    description domainId guid key locationId name verifiedScriptExecution
    errors { description type }
  }
}"#;

const DELETE_LOCATION: &str = r#"mutation($guid: EntityGuid!) {
  syntheticsDeletePrivateLocation(guid: $guid) {
    errors { description type }
  }
}"#;

/// An error reported inside a private location mutation payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrivateLocationMutationError {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Payload of the create and update mutations.
///
/// Fields are absent when the mutation failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateLocationMutation {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub verified_script_execution: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<PrivateLocationMutationError>,
}

#[derive(Deserialize)]
struct CreateData {
    #[serde(rename = "syntheticsCreatePrivateLocation")]
    payload: PrivateLocationMutation,
}

#[derive(Deserialize)]
struct UpdateData {
    #[serde(rename = "syntheticsUpdatePrivateLocation")]
    payload: PrivateLocationMutation,
}

#[derive(Deserialize)]
struct DeletePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    errors: Vec<PrivateLocationMutationError>,
}

#[derive(Deserialize)]
struct DeleteData {
    #[serde(rename = "syntheticsDeletePrivateLocation")]
    payload: Option<DeletePayload>,
}

impl NewRelicClient {
    /// Create a private location in `account_id`.
    pub async fn create_private_location(
        &self,
        account_id: i64,
        description: &str,
        name: &str,
        verified_script_execution: bool,
    ) -> Result<PrivateLocationMutation, ClientError> {
        let variables = json!({
            "accountId": account_id,
            "description": description,
            "name": name,
            "verifiedScriptExecution": verified_script_execution,
        });
        let data: CreateData = self.query(CREATE_LOCATION, variables).await?;
        Ok(data.payload)
    }

    /// Update the mutable fields of a private location.
    pub async fn update_private_location(
        &self,
        guid: &str,
        description: &str,
        verified_script_execution: bool,
    ) -> Result<PrivateLocationMutation, ClientError> {
        let variables = json!({
            "guid": guid,
            "description": description,
            "verifiedScriptExecution": verified_script_execution,
        });
        let data: UpdateData = self.query(UPDATE_LOCATION, variables).await?;
        Ok(data.payload)
    }

    /// Delete a private location, returning any errors reported in the payload.
    pub async fn delete_private_location(
        &self,
        guid: &str,
    ) -> Result<Vec<PrivateLocationMutationError>, ClientError> {
        let data: DeleteData = self
            .query(DELETE_LOCATION, json!({ "guid": guid }))
            .await?;
        Ok(data.payload.map(|p| p.errors).unwrap_or_default())
    }
}
