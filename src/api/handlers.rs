use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{AutomationRequest, LogSink};

use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub driver_connected: bool,
    pub busy: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AutomationStatus {
    pub status: String,
    pub message: String,
    pub progress: f64,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub status: String,
    pub message: String,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Basket automation server is running".to_string(),
    })
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions();
    Json(HealthResponse {
        status: "healthy".to_string(),
        driver_connected: sessions.is_connected().await,
        busy: sessions.is_busy(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// 同步执行一个批次，结束后一次性返回结果
///
/// 批次在独立任务中运行，客户端断开不会中断它。
pub async fn automate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AutomationRequest>,
) -> AppResult<Json<AutomationStatus>> {
    let items = request.validate()?;
    let platform = request.platform_or(state.config.default_platform);
    info!("📨 HTTP 自动化请求: {} 个商品 ({})", items.len(), platform);

    let task_state = state.clone();
    let report = tokio::spawn(async move {
        task_state.automation.run(items, platform, &LogSink).await
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    Ok(Json(AutomationStatus {
        status: report.status,
        message: report.message,
        progress: 100.0,
    }))
}

pub async fn disconnect(State(state): State<Arc<AppState>>) -> AppResult<Json<DisconnectResponse>> {
    let response = if state.sessions().disconnect().await? {
        DisconnectResponse {
            status: "disconnected".to_string(),
            message: "Driver disconnected successfully".to_string(),
        }
    } else {
        DisconnectResponse {
            status: "already_disconnected".to_string(),
            message: "No active driver session".to_string(),
        }
    };
    Ok(Json(response))
}
