use dialbridge::config::Config;
use dialbridge::domain::chat::ScriptedChat;
use dialbridge::domain::correlation::Correlator;
use dialbridge::domain::session::store::SessionStore;
use dialbridge::infrastructure::provider::ElevenLabsClient;
use dialbridge::interface::api::{build_router, AppState, EventBroadcaster};
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting DialBridge server");

    // Load configuration
    let config = Config::from_env();
    if !config.provider.is_configured() {
        info!("Provider credentials missing; call triggers will be rejected until configured");
    }

    // Wire process-lifetime registries into the handlers
    let store = Arc::new(SessionStore::new());
    let correlator = Arc::new(Correlator::new());
    let broadcaster = Arc::new(EventBroadcaster::default());
    let provider = Arc::new(ElevenLabsClient::new(config.provider.clone()));
    let chat = Arc::new(ScriptedChat);

    let webhook_secret = if config.webhook.secret.is_empty() {
        info!("Webhook signature verification disabled (no secret configured)");
        None
    } else {
        Some(config.webhook.secret.clone())
    };

    let state = AppState {
        store,
        correlator,
        broadcaster,
        provider,
        chat,
        webhook_secret,
    };

    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("API server failed");
    });

    // Keep the server running
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    server_handle.abort();

    Ok(())
}
