use httpmock::MockServer;
use newrelic_provider::testing::ProviderTester;
use newrelic_provider::NewRelicProvider;
use serde_json::{json, Value};

pub const ACCOUNT_ID: i64 = 3806526;
pub const API_KEY: &str = "NRAK-test";
pub const GRAPHQL_PATH: &str = "/graphql";

pub fn provider_config(server: &MockServer) -> Value {
    json!({
        "api_key": API_KEY,
        "account_id": ACCOUNT_ID,
        "nerdgraph_api_url": server.url(GRAPHQL_PATH),
    })
}

/// A provider pointed at the mock server, isolated from the process environment.
pub async fn configured_tester(server: &MockServer) -> ProviderTester<NewRelicProvider> {
    let tester = ProviderTester::new(NewRelicProvider::new().with_env(|_| None));
    tester
        .configure(provider_config(server))
        .await
        .expect("configure should succeed");
    tester
}
