use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use voicebridge::application::{CallDeps, Dispatcher};
use voicebridge::config::Config;
use voicebridge::domain::call::store::SessionStore;
use voicebridge::infrastructure::ai::HttpReplyGenerator;
use voicebridge::infrastructure::bridge::{AuthCredentials, ConnectionManager};
use voicebridge::infrastructure::persistence::HttpCallRecordRepository;
use voicebridge::interface::api::{build_router, AppState, WebhookResponder};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting VoiceBridge");

    // Load configuration
    let config = Config::load()?;
    info!(
        business = %config.business.business_name,
        gateway = %config.bridge.websocket_url,
        "Configuration loaded"
    );

    // Shared collaborators
    let generator = Arc::new(HttpReplyGenerator::new(
        &config.api.base_url,
        config.request_timeout(),
    )?);
    let repository = Arc::new(HttpCallRecordRepository::new(
        &config.api.base_url,
        config.request_timeout(),
    )?);

    // Control channel to the telephony gateway
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let credentials = AuthCredentials {
        account_sid: config.bridge.account_sid.clone(),
        business_id: config.business.business_id.clone(),
    };
    let (connection, bridge_handle) = ConnectionManager::new(
        config.bridge.websocket_url.clone(),
        credentials,
        config.bridge.voice.clone(),
        config.reconnect_delay(),
        events_tx,
    );

    // Call lifecycle dispatcher
    let store = SessionStore::new();
    let deps = Arc::new(CallDeps {
        sink: Arc::new(bridge_handle),
        generator: generator.clone(),
        repository,
        ctx: config.business.clone(),
        generation_timeout: config.generation_timeout(),
        transfer_delay: config.transfer_delay(),
        retention: config.retention(),
    });
    let dispatcher = Dispatcher::new(store, deps);
    let dispatcher_handle = tokio::spawn(dispatcher.run(events_rx));

    // An authentication rejection is fatal; anything else keeps the
    // reconnect loop alive for the life of the process.
    let connection_handle = tokio::spawn(connection.run());

    // Webhook server for the request/response integration path
    let state = AppState {
        responder: WebhookResponder::new(
            config.bridge.voice.clone(),
            config.business.business_name.clone(),
            config.telephony.forward_number.clone(),
        ),
        ctx: config.business.clone(),
        generator,
        generation_timeout: config.generation_timeout(),
        forward_number: config.telephony.forward_number.clone(),
    };
    let app = build_router(state);
    let bind = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(bind = %bind, "Webhook server listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        result = connection_handle => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }

    dispatcher_handle.abort();
    Ok(())
}
