use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::{AutomationRequest, ChannelSink};

use super::state::AppState;

#[derive(Debug, Serialize)]
struct WsError {
    status: &'static str,
    message: String,
}

impl WsError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

pub async fn ws_automate(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// 第一帧是请求，之后推送进度事件，最后推送完整报告
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("🔌 WebSocket 已连接");
    let (mut sender, mut receiver) = socket.split();

    let request = loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                match serde_json::from_str::<AutomationRequest>(&text) {
                    Ok(request) => break request,
                    Err(e) => {
                        let _ = send_json(&mut sender, &WsError::new(format!("WebSocket error: {}", e)))
                            .await;
                        return;
                    }
                }
            }
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                info!("WebSocket 在发送请求前断开");
                return;
            }
            Some(Ok(_)) => continue,
        }
    };

    let items = match request.validate() {
        Ok(items) => items,
        Err(e) => {
            let _ = send_json(&mut sender, &WsError::new(e.to_string())).await;
            return;
        }
    };
    let platform = request.platform_or(state.config.default_platform);
    info!("📨 WebSocket 自动化请求: {} 个商品 ({})", items.len(), platform);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let task_state = state.clone();
    let task = tokio::spawn(async move {
        let sink = ChannelSink(tx);
        task_state.automation.run(items, platform, &sink).await
    });

    // 运行结束时 sink 被丢弃，通道随之关闭
    while let Some(event) = rx.recv().await {
        if send_json(&mut sender, &event).await.is_err() {
            info!("WebSocket 已断开，自动化继续在后台运行");
            return;
        }
    }

    let sent = match task.await {
        Ok(Ok(report)) => send_json(&mut sender, &report).await,
        Ok(Err(e)) => send_json(&mut sender, &WsError::new(e.to_string())).await,
        Err(e) => {
            warn!("自动化任务异常退出: {}", e);
            send_json(&mut sender, &WsError::new("Automation task aborted")).await
        }
    };
    if sent.is_ok() {
        let _ = sender.close().await;
    }
    info!("🔌 WebSocket 会话结束");
}

async fn send_json<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    value: &T,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!("序列化 WebSocket 消息失败: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}
