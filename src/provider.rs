//! The New Relic provider: a registry of resources behind [`ProviderService`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::NewRelicClient;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::plan::plan_resource;
use crate::resources::{
    DataPartitionRuleResource, ProviderMeta, Resource, SyntheticsPrivateLocationResource,
};
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
use crate::validation;

type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Provider serving every New Relic resource this crate implements.
pub struct NewRelicProvider {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    meta: RwLock<Option<Arc<ProviderMeta>>>,
    env: Arc<EnvLookup>,
}

impl NewRelicProvider {
    /// A provider with all resources registered, reading the process environment.
    pub fn new() -> Self {
        Self::empty()
            .with_resource(DataPartitionRuleResource::new())
            .with_resource(SyntheticsPrivateLocationResource::new())
    }

    fn empty() -> Self {
        Self {
            resources: BTreeMap::new(),
            meta: RwLock::new(None),
            env: Arc::new(|name: &str| std::env::var(name).ok()),
        }
    }

    /// Register a resource type.
    pub fn with_resource<R: Resource + 'static>(mut self, resource: R) -> Self {
        self.resources.insert(resource.type_name(), Arc::new(resource));
        self
    }

    /// Replace the environment lookup used to fill unset configuration.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    fn resource(&self, resource_type: &str) -> Result<Arc<dyn Resource>, ProviderError> {
        self.resources
            .get(resource_type)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    async fn meta(&self) -> Result<Arc<ProviderMeta>, ProviderError> {
        self.meta.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }

    fn resolve_config(&self, config: Value) -> Result<(ProviderConfig, Vec<Diagnostic>), ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if has_errors(&diagnostics) {
            return Ok((ProviderConfig::default(), diagnostics));
        }

        let env = Arc::clone(&self.env);
        let resolved = ProviderConfig::from_value(config)?.with_env(|name| (*env)(name));
        diagnostics.extend(resolved.diagnostics());
        Ok((resolved, diagnostics))
    }
}

impl Default for NewRelicProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProviderService for NewRelicProvider {
    fn schema(&self) -> ProviderSchema {
        self.resources.iter().fold(
            ProviderSchema::new().with_provider_config(ProviderConfig::schema()),
            |schema, (name, resource)| schema.with_resource(*name, resource.schema()),
        )
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.resources.keys().map(|name| name.to_string()).collect(),
            capabilities: ServerCapabilities { plan_destroy: true },
        }
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let (_, diagnostics) = self.resolve_config(config)?;
        Ok(diagnostics)
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let (config, diagnostics) = self.resolve_config(config)?;
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }

        let client = NewRelicClient::from_config(&config)?;
        info!(
            region = %client.region(),
            account_id = ?config.account_id,
            "Provider configured"
        );
        *self.meta.write().await = Some(Arc::new(ProviderMeta::new(client, config.account_id)));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        debug!("Releasing provider client");
        self.meta.write().await.take();
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type)?.validate(&config))
    }

    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let current = self.resource(resource_type)?.schema().version;
        if version < 0 || version as u64 > current {
            return Err(ProviderError::Validation(format!(
                "cannot upgrade {} state from schema version {} (current is {})",
                resource_type, version, current
            )));
        }
        Ok(state)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        let prior_state = prior_state.filter(|s| !s.is_null());
        Ok(plan_resource(
            &resource.schema(),
            prior_state.as_ref(),
            proposed_state,
        ))
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let meta = self.meta().await?;
        resource.create(&meta, planned_state).await
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        if current_state.is_null() {
            return Ok(Value::Null);
        }
        let meta = self.meta().await?;
        Ok(resource.read(&meta, current_state).await?.unwrap_or(Value::Null))
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let meta = self.meta().await?;
        resource.update(&meta, prior_state, planned_state).await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let meta = self.meta().await?;
        resource.delete(&meta, current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let meta = self.meta().await?;
        match resource.import(&meta, id).await? {
            Some(state) => Ok(vec![ImportedResource::new(resource_type, state)]),
            None => Err(ProviderError::NotFound(format!(
                "{} with id '{}'",
                resource_type, id
            ))),
        }
    }
}
