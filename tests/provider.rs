mod common;

use common::{configured_tester, provider_config, ACCOUNT_ID, GRAPHQL_PATH};
use httpmock::prelude::*;
use newrelic_provider::testing::{assert_fails_with, ProviderTester, TestError};
use newrelic_provider::{NewRelicProvider, ProviderError};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

const RULE: &str = "newrelic_data_partition_rule";
const LOCATION: &str = "newrelic_synthetics_private_location";

fn tester() -> ProviderTester<NewRelicProvider> {
    ProviderTester::new(NewRelicProvider::new().with_env(|_| None))
}

fn rule_state() -> Value {
    json!({
        "id": "91",
        "account_id": ACCOUNT_ID,
        "target_data_partition": "Log_Test",
        "enabled": true,
        "attribute_name": "hostname",
        "matching_expression": "localhost",
        "matching_method": "EQUALS",
        "retention_policy": "STANDARD",
        "deleted": false
    })
}

#[tokio::test]
async fn test_schema_lists_both_resources() {
    let tester = tester();
    assert_eq!(tester.resource_types(), vec![RULE, LOCATION]);

    let schema = tester.schema();
    assert!(schema.resources.contains_key(RULE));
    assert!(schema.resources.contains_key(LOCATION));
}

#[tokio::test]
async fn test_configure_without_api_key_fails() {
    let result = tester().configure(json!({"account_id": ACCOUNT_ID})).await;
    match result {
        Err(TestError::Diagnostics(diagnostics)) => {
            assert_eq!(diagnostics[0].attribute.as_deref(), Some("api_key"));
        },
        other => panic!("expected diagnostics, got {:?}", other),
    }
}

#[tokio::test]
async fn test_configure_rejects_unknown_region() {
    let result = tester()
        .validate_provider_config(json!({"api_key": "NRAK-test", "region": "APAC"}))
        .await;
    let err = assert_err!(result);
    assert!(err.to_string().contains("APAC"));
}

#[tokio::test]
async fn test_configure_falls_back_to_environment() {
    let server = MockServer::start();
    let url = server.url(GRAPHQL_PATH);
    let tester = ProviderTester::new(NewRelicProvider::new().with_env(move |name| match name {
        "NEW_RELIC_API_KEY" => Some("NRAK-from-env".to_string()),
        "NEW_RELIC_ACCOUNT_ID" => Some(ACCOUNT_ID.to_string()),
        "NEW_RELIC_NERDGRAPH_API_URL" => Some(url.clone()),
        _ => None,
    }));
    assert_ok!(tester.configure(Value::Null).await);

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(GRAPHQL_PATH)
            .header("api-key", "NRAK-from-env");
        then.status(200).json_body(json!({
            "data": {"actor": {"account": {"logConfigurations": {"dataPartitionRules": []}}}}
        }));
    });

    let state = assert_ok!(tester.read(RULE, rule_state()).await);
    assert!(state.is_null());
    mock.assert();
}

#[tokio::test]
async fn test_operations_require_configure() {
    let tester = tester();
    let result = tester.read(RULE, rule_state()).await;
    assert!(matches!(result, Err(ProviderError::Configuration(_))));

    // planning and validation work offline
    assert_ok!(tester.plan_create(RULE, rule_state()).await);
    assert_ok!(tester.validate_resource_config(RULE, rule_state()).await);
}

#[tokio::test]
async fn test_unauthorized_requests_are_permission_denied() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GRAPHQL_PATH);
        then.status(401).body("Invalid API key");
    });

    let tester = configured_tester(&server).await;
    let result = tester.read(RULE, rule_state()).await;
    let err = assert_err!(result);
    assert!(matches!(err, ProviderError::PermissionDenied(_)));
    assert!(err.message().contains("Invalid API key"));
}

#[tokio::test]
async fn test_server_errors_are_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GRAPHQL_PATH);
        then.status(503).body("upstream unavailable");
    });

    let tester = configured_tester(&server).await;
    let result = tester.delete(LOCATION, json!({"id": "guid-1"})).await;
    assert!(matches!(result, Err(ProviderError::Unavailable(_))));
}

#[tokio::test]
async fn test_graphql_errors_become_diagnostics() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GRAPHQL_PATH);
        then.status(200).json_body(json!({
            "data": null,
            "errors": [{"message": "Argument 'accountId' has an invalid value"}]
        }));
    });

    let tester = configured_tester(&server).await;
    let result = tester.read(RULE, rule_state()).await;
    assert_fails_with(result, "invalid value");
}

#[tokio::test]
async fn test_stop_then_reconfigure() {
    let server = MockServer::start();
    let tester = configured_tester(&server).await;

    assert_ok!(tester.stop().await);
    let result = tester.read(LOCATION, json!({"id": "guid-1"})).await;
    assert!(matches!(result, Err(ProviderError::Configuration(_))));

    assert_ok!(tester.configure(provider_config(&server)).await);
}

#[tokio::test]
async fn test_state_upgrade_accepts_current_version() {
    let tester = tester();
    let upgraded = assert_ok!(tester.upgrade_resource_state(RULE, 0, rule_state()).await);
    assert_eq!(upgraded, rule_state());

    assert_err!(tester.upgrade_resource_state(RULE, 1, rule_state()).await);
}

#[tokio::test]
async fn test_configure_accepts_integral_float_account() {
    let server = MockServer::start();
    let tester = tester();
    let mut config = provider_config(&server);
    config["account_id"] = json!(3806526.0);

    assert_ok!(tester.validate_provider_config(config.clone()).await);
    assert_ok!(tester.configure(config).await);
}
