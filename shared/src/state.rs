use crate::config::AppConfig;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::time::Duration;

/// Shared clients and configuration, built once in `main` and passed by
/// reference into every handler.
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub http_client: reqwest::Client,
    pub config: AppConfig,
}

impl AppState {
    pub async fn from_env() -> AppState {
        let aws_config = aws_config::load_from_env().await;
        let config = AppConfig::from_env();

        // One client for every outbound provider call; the timeout here is
        // the hard bound that turns a hung model call into GenerationTimeout.
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        AppState {
            dynamo_client: DynamoClient::new(&aws_config),
            http_client,
            config,
        }
    }
}
