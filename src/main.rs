use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use aircheck::config::AirCheckConfig;
use aircheck::openweather::OpenWeatherClient;
use aircheck::service::AirQualityService;
use aircheck::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aircheck=info")),
        )
        .init();

    let config = AirCheckConfig::from_env();
    if !config.has_credential() {
        tracing::warn!(
            "OPENWEATHER_API_KEY is not set; submissions will be rejected until it is configured"
        );
    }

    let client = Arc::new(OpenWeatherClient::new(&config.provider)?);
    let service = AirQualityService::new(&config, client.clone(), client);
    let state = AppState {
        service: Arc::new(service),
    };

    web::run(state, config.server.port).await
}
