//! 进度事件
//!
//! 事件只发送不存储。接收端慢或已断开时直接丢弃，不做背压。

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// 进度状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Connecting,
    Connected,
    Navigating,
    Ready,
    AddingProduct,
    Searching,
    SelectingProduct,
    AddingToBasket,
    ItemFinished,
    Completed,
    Error,
}

/// 进度事件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub message: String,
    /// 0 ~ 100
    pub progress: f64,
    #[serde(rename = "current_product", skip_serializing_if = "Option::is_none")]
    pub current_item: Option<String>,
}

impl ProgressEvent {
    pub fn new(status: ProgressStatus, message: impl Into<String>, progress: f64) -> Self {
        Self {
            status,
            message: message.into(),
            progress: progress.clamp(0.0, 100.0),
            current_item: None,
        }
    }

    pub fn with_item(mut self, name: impl Into<String>) -> Self {
        self.current_item = Some(name.into());
        self
    }
}

/// 进度接收端
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// 转发到通道（WebSocket 连接使用）
#[derive(Debug, Clone)]
pub struct ChannelSink(pub UnboundedSender<ProgressEvent>);

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        // 接收端已关闭时忽略
        let _ = self.0.send(event);
    }
}

/// 只写日志的接收端（HTTP 请求和命令行模式使用）
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: ProgressEvent) {
        info!(
            "📣 [{:>5.1}%] {:?}: {}",
            event.progress, event.status, event.message
        );
    }
}

/// 批处理阶段的进度区间：起点 + 跨度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSpan {
    pub base: f64,
    pub span: f64,
}

impl ProgressSpan {
    pub const BATCH: ProgressSpan = ProgressSpan {
        base: 25.0,
        span: 70.0,
    };

    /// 第 `index` 个（从 0 开始）商品对应的进度
    pub fn at(&self, index: usize, total: usize) -> f64 {
        if total == 0 {
            return self.base + self.span;
        }
        self.base + (index as f64 / total as f64) * self.span
    }
}
