//! dispatch-server: HTTP front for delivery dispatch actions.
//!
//! Reads configuration from `dispatch.yaml`, `--config <path>` or
//! `DISPATCH_CONFIG`, and `DISPATCH__*` environment overrides.

use std::sync::Arc;

use axum::http::HeaderName;
use tracing::{error, info};

use delivery_dispatch::config::Config;
use delivery_dispatch::dispatch::{DispatchService, LoggingEventSink, RandomCodeGenerator};
use delivery_dispatch::handlers::dispatch::{serve, AppState};
use delivery_dispatch::interfaces::DispatchEventSink;
use delivery_dispatch::storage::init_storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    delivery_dispatch::utils::bootstrap::init_tracing();

    let config_path = delivery_dispatch::utils::bootstrap::parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e.to_string()
    })?;

    info!("Starting dispatch-server");

    let store = init_storage(&config.storage)
        .await
        .map_err(|e| e.to_string())?;
    info!("Storage initialized");

    let user_header = HeaderName::try_from(config.server.user_header.as_str())?;

    let events: Arc<dyn DispatchEventSink> = Arc::new(LoggingEventSink);

    let service = DispatchService::over_store(
        store,
        config.dispatch.staff_policy(),
        Arc::new(RandomCodeGenerator),
        events,
    );

    let state = AppState::new(Arc::new(service), user_header);
    serve(state, &config.server.bind_address()).await
}
