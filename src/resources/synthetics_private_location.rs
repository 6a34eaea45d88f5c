//! `newrelic_synthetics_private_location`: a private minion location for
//! synthetic monitors. The resource id is the location's entity GUID.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{decode_state, encode_state, required, ProviderMeta, Resource};
use crate::client::entities::EntityOutline;
use crate::client::synthetics::PrivateLocationMutationError;
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

pub const TYPE_NAME: &str = "newrelic_synthetics_private_location";

/// State of a private location.
///
/// `description` and `verified_script_execution` are unknown after an
/// import, since the entity outline does not carry them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateLocationState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub verified_script_execution: Option<bool>,
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
}

impl PrivateLocationState {
    fn guid(&self) -> Result<&str, ProviderError> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::Validation(format!("{} state has no id", TYPE_NAME)))
    }

    fn apply_entity(&mut self, entity: EntityOutline) {
        self.id = Some(entity.guid.clone());
        self.guid = Some(entity.guid);
        self.name = Some(entity.name);
        if self.account_id.is_none() {
            self.account_id = entity.account_id;
        }
    }
}

fn mutation_errors(errors: Vec<PrivateLocationMutationError>) -> Result<(), ProviderError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(ProviderError::Diagnostics(
        errors
            .into_iter()
            .map(|e| Diagnostic::error(e.description).with_detail(e.kind))
            .collect(),
    ))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticsPrivateLocationResource;

impl SyntheticsPrivateLocationResource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Resource for SyntheticsPrivateLocationResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A private location for running synthetic monitors.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "account_id",
                Attribute::optional_computed_int64()
                    .with_description("The account in which the location is created."),
            )
            .with_attribute(
                "description",
                Attribute::required_string().with_description("The private location description."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The name of the private location."),
            )
            .with_attribute(
                "verified_script_execution",
                Attribute::required_bool()
                    .with_description("Require a password for scripted monitors in this location."),
            )
            .with_attribute("domain_id", Attribute::optional_computed_string())
            .with_attribute(
                "guid",
                Attribute::optional_computed_string().with_description("The entity GUID."),
            )
            .with_attribute(
                "key",
                Attribute::optional_computed_string()
                    .sensitive()
                    .with_description("Key used by minions to connect to the location."),
            )
            .with_attribute("location_id", Attribute::optional_computed_string())
    }

    async fn create(&self, meta: &ProviderMeta, planned: Value) -> Result<Value, ProviderError> {
        let mut state: PrivateLocationState = decode_state(TYPE_NAME, planned)?;
        let account_id = meta.select_account_id(state.account_id)?;
        let name = required(state.name.clone(), "name")?;
        let description = required(state.description.clone(), "description")?;
        let verified = required(state.verified_script_execution, "verified_script_execution")?;

        info!(account_id, name = %name, "Creating synthetics private location");
        let payload = meta
            .client
            .create_private_location(account_id, &description, &name, verified)
            .await?;
        mutation_errors(payload.errors)?;

        let guid = payload.guid.ok_or_else(|| {
            ProviderError::Api("create returned neither a GUID nor errors".to_string())
        })?;
        info!(account_id, guid = %guid, "Created synthetics private location");

        state.id = Some(guid.clone());
        state.guid = Some(guid);
        state.account_id = Some(account_id);
        state.domain_id = payload.domain_id;
        state.key = payload.key;
        state.location_id = payload.location_id;
        encode_state(&state)
    }

    async fn read(
        &self,
        meta: &ProviderMeta,
        current: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let mut state: PrivateLocationState = decode_state(TYPE_NAME, current)?;
        let guid = state.guid()?.to_string();

        match meta.client.get_entity(&guid).await? {
            Some(entity) => {
                state.apply_entity(entity);
                encode_state(&state).map(Some)
            },
            None => {
                warn!(guid = %guid, "Synthetics private location no longer exists");
                Ok(None)
            },
        }
    }

    async fn update(
        &self,
        meta: &ProviderMeta,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior: PrivateLocationState = decode_state(TYPE_NAME, prior)?;
        let planned: PrivateLocationState = decode_state(TYPE_NAME, planned)?;
        let guid = prior.guid()?.to_string();
        let description = required(planned.description.clone(), "description")?;
        let verified = required(planned.verified_script_execution, "verified_script_execution")?;

        info!(guid = %guid, "Updating synthetics private location");
        let payload = meta
            .client
            .update_private_location(&guid, &description, verified)
            .await?;
        mutation_errors(payload.errors)?;

        let state = PrivateLocationState {
            id: Some(guid.clone()),
            account_id: planned.account_id.or(prior.account_id),
            description: Some(description),
            name: payload.name.or(planned.name).or(prior.name),
            verified_script_execution: Some(verified),
            domain_id: payload.domain_id.or(planned.domain_id).or(prior.domain_id),
            guid: Some(guid),
            key: payload.key.or(planned.key).or(prior.key),
            location_id: payload
                .location_id
                .or(planned.location_id)
                .or(prior.location_id),
        };
        encode_state(&state)
    }

    async fn delete(&self, meta: &ProviderMeta, current: Value) -> Result<(), ProviderError> {
        let state: PrivateLocationState = decode_state(TYPE_NAME, current)?;
        let guid = state.guid()?;

        info!(guid, "Deleting synthetics private location");
        match meta.client.delete_private_location(guid).await {
            Ok(errors) => mutation_errors(errors),
            Err(err) if err.is_not_found() => {
                warn!(guid, "Synthetics private location already deleted");
                Ok(())
            },
            Err(err) => Err(err.into()),
        }
    }

    async fn import(&self, meta: &ProviderMeta, id: &str) -> Result<Option<Value>, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::Validation(
                "import id must be the private location GUID".to_string(),
            ));
        }
        info!(guid = id, "Importing synthetics private location");
        let state = PrivateLocationState {
            id: Some(id.to_string()),
            ..Default::default()
        };
        self.read(meta, encode_state(&state)?).await
    }
}
