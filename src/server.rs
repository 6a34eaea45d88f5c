//! gRPC server for the provider.
//!
//! This module defines the `ProviderService` trait the provider implements
//! and the `serve` functions that start a gRPC server with the handshake
//! protocol.
//!
//! # Signal Handling
//!
//! The server handles SIGTERM and SIGINT for graceful shutdown. When a
//! signal is received, the server:
//! 1. Stops accepting new connections
//! 2. Waits for in-flight requests to complete (bounded by `shutdown_timeout`)
//! 3. Calls the provider's `stop()` method (bounded by `shutdown_timeout`)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::generated;
use crate::schema::{has_errors, Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::types::{
    ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};

/// Operations a provider serves, in terms of `serde_json` values rather
/// than protobuf messages.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata. By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.schema().resources.keys().cloned().collect(),
            capabilities: Default::default(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Upgrade resource state from an older schema version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        Ok(state)
    }

    /// Plan changes for a resource. A `null` proposal plans its destruction.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Read the current state of a resource. `null` means it no longer exists.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let _ = id;
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }
}

/// Wrapper that implements the generated gRPC trait.
struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<generated::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| generated::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Error => generated::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => generated::diagnostic::Severity::Warning as i32,
            },
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        })
        .collect()
}

fn error_to_diagnostics(err: ProviderError) -> Vec<generated::Diagnostic> {
    diagnostics_to_proto(err.into_diagnostics())
}

fn schema_to_proto(schema: &crate::schema::Schema) -> generated::Schema {
    let block = &schema.block;
    generated::Schema {
        version: schema.version as i64,
        block: Some(generated::Block {
            attributes: block
                .attributes
                .iter()
                .map(|(name, attr)| generated::Attribute {
                    name: name.clone(),
                    r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
                    required: attr.flags.required,
                    optional: attr.flags.optional,
                    computed: attr.flags.computed,
                    sensitive: attr.flags.sensitive,
                    description: attr.description.clone().unwrap_or_default(),
                    force_new: attr.force_new,
                    default_value: attr
                        .default
                        .as_ref()
                        .map(|v| serde_json::to_vec(v).unwrap_or_default())
                        .unwrap_or_default(),
                })
                .collect(),
            description: block.description.clone().unwrap_or_default(),
        }),
    }
}

/// Decode a JSON payload. An empty payload is `null`.
fn decode_json(bytes: &[u8]) -> Result<Value, ProviderError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn encode_json(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

fn log_diagnostics(operation: &str, diagnostics: &[Diagnostic]) {
    if has_errors(diagnostics) {
        warn!(operation, diagnostics = diagnostics.len(), "Completed with errors");
    } else {
        info!(operation, "Completed successfully");
    }
}

#[tonic::async_trait]
impl<P: ProviderService> generated::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<generated::GetMetadataRequest>,
    ) -> Result<tonic::Response<generated::GetMetadataResponse>, tonic::Status> {
        let metadata = self.provider.metadata();
        debug!(resources = metadata.resources.len(), "GetMetadata completed");
        Ok(tonic::Response::new(generated::GetMetadataResponse {
            server_capabilities: Some(generated::ServerCapabilities {
                plan_destroy: metadata.capabilities.plan_destroy,
            }),
            resources: metadata.resources,
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<generated::GetSchemaRequest>,
    ) -> Result<tonic::Response<generated::GetSchemaResponse>, tonic::Status> {
        let schema = self.provider.schema();
        debug!(resources = schema.resources.len(), "GetSchema completed");
        Ok(tonic::Response::new(generated::GetSchemaResponse {
            provider: Some(schema_to_proto(&schema.provider)),
            resources: schema
                .resources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<generated::ValidateProviderConfigRequest>,
    ) -> Result<tonic::Response<generated::ValidateProviderConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider.validate_provider_config(config).await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("validate_provider_config", &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "ValidateProviderConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(generated::ValidateProviderConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<generated::ConfigureRequest>,
    ) -> Result<tonic::Response<generated::ConfigureResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider.configure(config).await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("configure", &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Configure failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(generated::ConfigureResponse { diagnostics }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: tonic::Request<generated::StopRequest>,
    ) -> Result<tonic::Response<generated::StopResponse>, tonic::Status> {
        info!("Stop called");
        let error = match self.provider.stop().await {
            Ok(()) => String::new(),
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            },
        };
        Ok(tonic::Response::new(generated::StopResponse { error }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<generated::ValidateResourceConfigRequest>,
    ) -> Result<tonic::Response<generated::ValidateResourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider
                .validate_resource_config(&req.resource_type, config)
                .await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("validate_resource_config", &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "ValidateResourceConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(generated::ValidateResourceConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        request: tonic::Request<generated::UpgradeResourceStateRequest>,
    ) -> Result<tonic::Response<generated::UpgradeResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let state = decode_json(&req.raw_state)?;
            self.provider
                .upgrade_resource_state(&req.resource_type, req.version, state)
                .await
        }
        .await;

        match result {
            Ok(upgraded) => {
                debug!(from_version = req.version, "UpgradeResourceState completed");
                Ok(tonic::Response::new(generated::UpgradeResourceStateResponse {
                    upgraded_state: encode_json(&upgraded),
                    diagnostics: vec![],
                }))
            },
            Err(e) => {
                error!(version = req.version, error = %e, "UpgradeResourceState failed");
                Ok(tonic::Response::new(generated::UpgradeResourceStateResponse {
                    upgraded_state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }))
            },
        }
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.plan")]
    async fn plan(
        &self,
        request: tonic::Request<generated::PlanRequest>,
    ) -> Result<tonic::Response<generated::PlanResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let prior_state = match decode_json(&req.prior_state)? {
                Value::Null => None,
                prior => Some(prior),
            };
            let proposed_state = decode_json(&req.proposed_state)?;
            let config = decode_json(&req.config)?;
            self.provider
                .plan(&req.resource_type, prior_state, proposed_state, config)
                .await
        }
        .await;

        match result {
            Ok(result) => {
                info!(
                    changes = result.changes.len(),
                    requires_replace = result.requires_replace,
                    "Plan completed"
                );
                Ok(tonic::Response::new(generated::PlanResponse {
                    planned_state: encode_json(&result.planned_state),
                    changes: result.changes.into_iter().map(Into::into).collect(),
                    requires_replace: result.requires_replace,
                    diagnostics: vec![],
                }))
            },
            Err(e) => {
                error!(error = %e, "Plan failed");
                Ok(tonic::Response::new(generated::PlanResponse {
                    planned_state: vec![],
                    changes: vec![],
                    requires_replace: false,
                    diagnostics: error_to_diagnostics(e),
                }))
            },
        }
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.create")]
    async fn create(
        &self,
        request: tonic::Request<generated::CreateRequest>,
    ) -> Result<tonic::Response<generated::CreateResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let planned_state = decode_json(&req.planned_state)?;
            self.provider.create(&req.resource_type, planned_state).await
        }
        .await;

        match result {
            Ok(state) => {
                info!("Create completed successfully");
                Ok(tonic::Response::new(generated::CreateResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }))
            },
            Err(e) => {
                error!(error = %e, "Create failed");
                Ok(tonic::Response::new(generated::CreateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }))
            },
        }
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.read")]
    async fn read(
        &self,
        request: tonic::Request<generated::ReadRequest>,
    ) -> Result<tonic::Response<generated::ReadResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let current_state = decode_json(&req.current_state)?;
            self.provider.read(&req.resource_type, current_state).await
        }
        .await;

        match result {
            Ok(state) => {
                debug!(gone = state.is_null(), "Read completed successfully");
                Ok(tonic::Response::new(generated::ReadResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }))
            },
            Err(e) => {
                error!(error = %e, "Read failed");
                Ok(tonic::Response::new(generated::ReadResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }))
            },
        }
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.update")]
    async fn update(
        &self,
        request: tonic::Request<generated::UpdateRequest>,
    ) -> Result<tonic::Response<generated::UpdateResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let prior_state = decode_json(&req.prior_state)?;
            let planned_state = decode_json(&req.planned_state)?;
            self.provider
                .update(&req.resource_type, prior_state, planned_state)
                .await
        }
        .await;

        match result {
            Ok(state) => {
                info!("Update completed successfully");
                Ok(tonic::Response::new(generated::UpdateResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }))
            },
            Err(e) => {
                error!(error = %e, "Update failed");
                Ok(tonic::Response::new(generated::UpdateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }))
            },
        }
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.delete")]
    async fn delete(
        &self,
        request: tonic::Request<generated::DeleteRequest>,
    ) -> Result<tonic::Response<generated::DeleteResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let current_state = decode_json(&req.current_state)?;
            self.provider.delete(&req.resource_type, current_state).await
        }
        .await;

        let diagnostics = match result {
            Ok(()) => {
                info!("Delete completed successfully");
                vec![]
            },
            Err(e) => {
                error!(error = %e, "Delete failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(generated::DeleteResponse { diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type, id = %request.get_ref().id), name = "grpc.import_resource_state")]
    async fn import_resource_state(
        &self,
        request: tonic::Request<generated::ImportResourceStateRequest>,
    ) -> Result<tonic::Response<generated::ImportResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();

        match self
            .provider
            .import_resource(&req.resource_type, &req.id)
            .await
        {
            Ok(imported) => {
                info!(imported_count = imported.len(), "ImportResourceState completed");
                Ok(tonic::Response::new(generated::ImportResourceStateResponse {
                    imported: imported
                        .into_iter()
                        .map(|r| generated::ImportedResource {
                            resource_type: r.resource_type,
                            state: encode_json(&r.state),
                        })
                        .collect(),
                    diagnostics: vec![],
                }))
            },
            Err(e) => {
                error!(error = %e, "ImportResourceState failed");
                Ok(tonic::Response::new(generated::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: error_to_diagnostics(e),
                }))
            },
        }
    }
}

/// Options for configuring the provider server.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// How long to wait for in-flight requests after a shutdown signal,
    /// and again for the provider's `stop()`. Default: 30 seconds.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServeOptions {
    /// Create new serve options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT on Unix, CTRL+C elsewhere).
///
/// If the handlers cannot be installed the error is logged and this never
/// returns; the host then stops the process by killing it.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(e), _) | (_, Err(e)) => {
                    error!(error = %e, "Failed to install signal handlers");
                    return std::future::pending().await;
                },
            };

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install CTRL+C handler");
            return std::future::pending().await;
        }
        info!("Received CTRL+C, shutting down");
    }
}

/// Serve a provider implementation as a gRPC server.
///
/// Binds an ephemeral port on localhost, prints the handshake line
/// `NEWRELIC_PROVIDER|<version>|<address>` to stdout and serves until a
/// shutdown signal arrives.
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), ProviderError> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// Serve a provider with custom options.
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), ProviderError> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    serve_on_listener(provider, listener, addr, options).await
}

/// Serve a provider on a specific address.
pub async fn serve_on<P: ProviderService>(provider: P, addr: SocketAddr) -> Result<(), ProviderError> {
    serve_on_with_options(provider, addr, ServeOptions::default()).await
}

/// Serve a provider on a specific address with custom options.
pub async fn serve_on_with_options<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
    options: ServeOptions,
) -> Result<(), ProviderError> {
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    serve_on_listener(provider, listener, actual_addr, options).await
}

/// The line the host reads from stdout to find the gRPC address.
pub fn handshake_line(addr: SocketAddr) -> String {
    format!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr)
}

/// Run `stop()` with a time limit. Returns false if it did not finish in time.
async fn stop_within<P: ProviderService + ?Sized>(provider: &P, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, provider.stop()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "Provider stop() returned error");
            true
        },
        Err(_) => {
            warn!(timeout = ?timeout, "Provider stop() timed out");
            false
        },
    }
}

async fn serve_on_listener<P: ProviderService>(
    provider: P,
    listener: TcpListener,
    addr: SocketAddr,
    options: ServeOptions,
) -> Result<(), ProviderError> {
    println!("{}", handshake_line(addr));
    info!(address = %addr, "Provider server starting");

    let provider = Arc::new(provider);
    let grpc_service = ProviderGrpcService {
        provider: Arc::clone(&provider),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = Server::builder()
        .add_service(generated::provider_server::ProviderServer::new(grpc_service))
        .serve_with_incoming_shutdown(
            tokio_stream::wrappers::TcpListenerStream::new(listener),
            async {
                let _ = shutdown_rx.await;
            },
        );
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            // the server only stops on its own when the transport fails
            result?;
        }
        _ = wait_for_shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(options.shutdown_timeout, &mut server).await {
                Ok(Ok(())) => info!("Server shutdown complete"),
                Ok(Err(e)) => {
                    error!(error = %e, "Server error during shutdown");
                    return Err(e.into());
                },
                Err(_) => warn!(
                    timeout = ?options.shutdown_timeout,
                    "Shutdown timeout exceeded, forcing shutdown"
                ),
            }
        }
    }

    stop_within(provider.as_ref(), options.shutdown_timeout).await;
    info!("Provider shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generated::provider_server::Provider;
    use crate::provider::NewRelicProvider;
    use serde_json::json;

    fn service() -> ProviderGrpcService<NewRelicProvider> {
        ProviderGrpcService {
            provider: Arc::new(NewRelicProvider::new().with_env(|_| None)),
        }
    }

    fn bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[tokio::test]
    async fn test_get_metadata() {
        let response = service()
            .get_metadata(tonic::Request::new(generated::GetMetadataRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.resources.len(), 2);
        assert!(response.server_capabilities.unwrap().plan_destroy);
    }

    #[tokio::test]
    async fn test_get_schema_flattens_attributes() {
        let response = service()
            .get_schema(tonic::Request::new(generated::GetSchemaRequest {}))
            .await
            .unwrap()
            .into_inner();

        let rule = &response.resources["newrelic_data_partition_rule"];
        let block = rule.block.as_ref().unwrap();
        let target = block
            .attributes
            .iter()
            .find(|a| a.name == "target_data_partition")
            .unwrap();
        assert!(target.required);
        assert!(target.force_new);
        assert_eq!(target.r#type, b"\"string\"".to_vec());

        let provider = response.provider.unwrap();
        let api_key = provider
            .block
            .unwrap()
            .attributes
            .into_iter()
            .find(|a| a.name == "api_key")
            .unwrap();
        assert!(api_key.sensitive);
    }

    #[tokio::test]
    async fn test_configure_reports_diagnostics() {
        let response = service()
            .configure(tonic::Request::new(generated::ConfigureRequest {
                config: bytes(json!({"account_id": 1})),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].severity,
            generated::diagnostic::Severity::Error as i32
        );
        assert_eq!(response.diagnostics[0].attribute, "api_key");
    }

    #[tokio::test]
    async fn test_invalid_json_becomes_diagnostic() {
        let response = service()
            .create(tonic::Request::new(generated::CreateRequest {
                resource_type: "newrelic_data_partition_rule".to_string(),
                planned_state: b"{not json".to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.state.is_empty());
        assert!(response.diagnostics[0].summary.starts_with("Serialization error"));
    }

    #[tokio::test]
    async fn test_plan_create_over_grpc() {
        let response = service()
            .plan(tonic::Request::new(generated::PlanRequest {
                resource_type: "newrelic_synthetics_private_location".to_string(),
                prior_state: vec![],
                proposed_state: bytes(json!({
                    "name": "berlin",
                    "description": "first",
                    "verified_script_execution": false
                })),
                config: vec![],
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.diagnostics.is_empty());
        assert!(!response.requires_replace);
        assert_eq!(response.changes.len(), 3);
        let planned: Value = serde_json::from_slice(&response.planned_state).unwrap();
        assert_eq!(planned["name"], "berlin");
    }

    #[tokio::test]
    async fn test_unknown_resource_becomes_diagnostic() {
        let response = service()
            .import_resource_state(tonic::Request::new(generated::ImportResourceStateRequest {
                resource_type: "newrelic_widget".to_string(),
                id: "1".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.imported.is_empty());
        assert_eq!(
            response.diagnostics[0].summary,
            "Unknown resource type: newrelic_widget"
        );
    }

    #[test]
    fn test_payload_errors_expand_into_diagnostics() {
        let diagnostics = error_to_diagnostics(ProviderError::Diagnostics(vec![
            Diagnostic::error("first"),
            Diagnostic::error("second").with_detail("BAD_REQUEST"),
        ]));
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[1].detail, "BAD_REQUEST");
    }

    #[test]
    fn test_decode_json() {
        assert_eq!(decode_json(&[]).unwrap(), Value::Null);
        assert_eq!(decode_json(b"{\"a\":1}").unwrap(), json!({"a": 1}));
        assert!(decode_json(b"nope").is_err());
    }

    #[test]
    fn test_handshake_line() {
        let addr: SocketAddr = "127.0.0.1:50051".parse().unwrap();
        assert_eq!(handshake_line(addr), "NEWRELIC_PROVIDER|1|127.0.0.1:50051");
    }

    struct HangingStop;

    #[async_trait::async_trait]
    impl ProviderService for HangingStop {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
        }

        async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(vec![])
        }

        async fn stop(&self) -> Result<(), ProviderError> {
            std::future::pending().await
        }

        async fn plan(
            &self,
            _resource_type: &str,
            _prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            Ok(PlanResult::no_change(proposed_state))
        }

        async fn create(&self, _: &str, planned_state: Value) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn read(&self, _: &str, current_state: Value) -> Result<Value, ProviderError> {
            Ok(current_state)
        }

        async fn update(&self, _: &str, _: Value, planned_state: Value) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn delete(&self, _: &str, _: Value) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stop_is_bounded_by_shutdown_timeout() {
        assert!(!stop_within(&HangingStop, Duration::from_millis(20)).await);

        let provider = NewRelicProvider::new().with_env(|_| None);
        assert!(stop_within(&provider, Duration::from_millis(20)).await);
    }

    #[test]
    fn test_serve_options() {
        let options = ServeOptions::new().with_shutdown_timeout(Duration::from_secs(5));
        assert_eq!(options.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(ServeOptions::default().shutdown_timeout, Duration::from_secs(30));
    }
}
