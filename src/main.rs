use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trip_planner::{
    app, AppState, FlightPlanner, GeminiClient, PlannerConfig, SerpApiClient, VoiceRelay,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trip_planner=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PlannerConfig::from_env().context("Failed to load config")?;

    // Clients are built once and shared by every handler
    let search = SerpApiClient::new(config.serpapi.clone()).context("Flight search client")?;
    let model = GeminiClient::new(config.gemini.clone()).context("Chat model client")?;

    let state = AppState {
        planner: FlightPlanner::new(Arc::new(search)),
        relay: Arc::new(VoiceRelay::new(Arc::new(model))),
        ws_url: config.ws_url(),
        currency: config.currency.clone(),
        locale: config.locale.clone(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);
    tracing::info!("WebSocket URL for Twilio: {}", config.ws_url());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
