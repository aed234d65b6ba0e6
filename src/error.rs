//! 错误类型
//!
//! 分三层：
//! - `DriverError`：与 Appium 驱动交互时的单次调用错误
//! - `ElementNotFound` / `ActionFailed`：能力层（services）的结果，只影响单个商品
//! - `AppError`：批次级别 / 传输层错误，映射为 HTTP 响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 驱动调用错误
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// 元素不存在
    #[error("元素不存在: {0}")]
    NoSuchElement(String),

    /// 元素引用已失效（页面已刷新或跳转）
    #[error("元素引用已失效: {0}")]
    StaleElement(String),

    /// 会话已失效（Appium 会话被关闭或超时）
    #[error("驱动会话已失效: {0}")]
    SessionLost(String),

    /// 网络 / 超时错误
    #[error("驱动通信失败: {0}")]
    Transport(String),

    /// W3C 协议返回的其他命令错误
    #[error("驱动命令失败 ({error}): {message}")]
    Command { error: String, message: String },

    /// 响应格式无法解析
    #[error("驱动响应无法解析: {0}")]
    Protocol(String),
}

impl DriverError {
    /// 是否为通信层面的失败（而不是"元素不在页面上"）
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DriverError::Transport(_) | DriverError::SessionLost(_) | DriverError::Protocol(_)
        )
    }

    /// 根据 W3C 错误码构造
    pub fn from_w3c(error: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match error {
            "no such element" => DriverError::NoSuchElement(message),
            "stale element reference" => DriverError::StaleElement(message),
            "invalid session id" => DriverError::SessionLost(message),
            "timeout" => DriverError::Transport(message),
            other => DriverError::Command {
                error: other.to_string(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for DriverError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DriverError::Protocol(err.to_string())
        } else {
            DriverError::Transport(err.to_string())
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// 一个选择器列表中所有候选都未命中
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("未找到 {target} (尝试 {attempted} 个选择器, 其中 {transport_errors} 个通信失败)")]
pub struct ElementNotFound {
    pub target: &'static str,
    pub attempted: usize,
    pub transport_errors: usize,
}

impl ElementNotFound {
    /// 是否所有尝试都是通信失败，提示驱动本身可能已断开
    pub fn looks_like_dead_session(&self) -> bool {
        self.attempted > 0 && self.transport_errors == self.attempted
    }
}

/// 某个动作的所有层级都失败
#[derive(Debug, Clone, Error)]
#[error("{action} 失败: {reason}")]
pub struct ActionFailed {
    pub action: &'static str,
    pub reason: DriverError,
}

/// 应用程序错误
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求参数不合法
    #[error("请求不合法: {0}")]
    Validation(String),

    /// 已有批次占用驱动
    #[error("已有自动化任务正在运行")]
    Busy,

    /// 无法建立设备会话，整个批次无法开始
    #[error("无法连接到 Appium ({url}): {source}")]
    DriverConnect {
        url: String,
        #[source]
        source: DriverError,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Busy => StatusCode::CONFLICT,
            AppError::DriverConnect { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            detail: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
