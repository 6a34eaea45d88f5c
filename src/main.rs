use newrelic_provider::{init_logging, serve, NewRelicProvider, ProviderError};

#[tokio::main]
async fn main() -> Result<(), ProviderError> {
    init_logging();
    serve(NewRelicProvider::new()).await
}
