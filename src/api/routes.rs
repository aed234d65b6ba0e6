use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{automate, disconnect, health, root};
use super::state::AppState;
use super::websocket::ws_automate;

pub fn create_router(state: Arc<AppState>) -> Router {
    // 手机 App 从局域网内任意地址访问
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/automate", post(automate))
        .route("/ws/automate", get(ws_automate))
        .route("/disconnect", post(disconnect))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
