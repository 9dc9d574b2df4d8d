use cep_relay::{
    config::Config,
    server::{self, AppState},
    setup,
    weather::WeatherClient,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let telemetry = setup::setup(&config)?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        weather_service_url = %config.weather_service_url,
        weather_timeout = ?config.weather_timeout,
        "Configuration loaded"
    );

    let weather = WeatherClient::new(
        config.weather_service_url.clone(),
        config.weather_timeout,
        telemetry.propagator(),
    )?;
    let router = server::router(
        AppState::new(weather),
        telemetry.propagator(),
        config.max_body_bytes,
    );

    let listener = TcpListener::bind(config.listen_addr).await?;
    let result = server::serve(listener, router).await;

    telemetry.shutdown();
    result?;
    Ok(())
}
