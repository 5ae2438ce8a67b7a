use axum::{routing::get, Router};
use parley_core::config::ParleyConfig;
use parley_hub::Hub;
use std::sync::Arc;
use tokio::sync::watch;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_SHA: &str = env!("PARLEY_GIT_SHA");

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: ParleyConfig,
    /// Live connections and broadcast fan-out.
    pub hub: Hub,
    /// Flipped to true once on shutdown; every WS task watches it.
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: ParleyConfig) -> Self {
        let hub = Hub::new(&config.hub);
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            hub,
            shutdown,
        }
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Ask every open WS connection to close.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(crate::http::ui::ui_handler))
        .route("/health", get(crate::http::health::health_handler))
        .route("/ws", get(crate::ws::connection::ws_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
