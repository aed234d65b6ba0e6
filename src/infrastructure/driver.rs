//! 驱动能力 - 基础设施层
//!
//! 对外部 UI 自动化驱动（Appium）的最小抽象。上层只依赖这个 trait，
//! 不关心 HTTP 细节，也方便在测试中替换成内存实现。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::DriverResult;
use crate::models::Strategy;

/// 驱动返回的元素句柄
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        ElementId(value.to_string())
    }
}

/// 元素的位置和尺寸
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// W3C WebDriver 按键码
pub mod keys {
    pub const BACKSPACE: &str = "\u{E003}";
    pub const RETURN: &str = "\u{E006}";
    pub const ENTER: &str = "\u{E007}";
    pub const DELETE: &str = "\u{E017}";
}

/// W3C 元素引用的键名
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Android 系统返回键
pub const ANDROID_KEYCODE_BACK: i64 = 4;

/// 驱动能力
///
/// 所有调用都可能因为通信 / 超时失败，由调用方决定是否当作"本次尝试失败"。
#[async_trait]
pub trait Driver: Send + Sync {
    async fn find_element(&self, strategy: Strategy, query: &str) -> DriverResult<ElementId>;

    async fn find_elements(&self, strategy: Strategy, query: &str) -> DriverResult<Vec<ElementId>>;

    async fn is_displayed(&self, element: &ElementId) -> DriverResult<bool>;

    async fn click(&self, element: &ElementId) -> DriverResult<()>;

    async fn send_keys(&self, element: &ElementId, text: &str) -> DriverResult<()>;

    async fn clear(&self, element: &ElementId) -> DriverResult<()>;

    async fn rect(&self, element: &ElementId) -> DriverResult<Rect>;

    /// 属性不存在时返回 `None`
    async fn attribute(&self, element: &ElementId, name: &str) -> DriverResult<Option<String>>;

    async fn text(&self, element: &ElementId) -> DriverResult<String>;

    /// 执行 `mobile: xxx` 扩展命令
    async fn execute(&self, script: &str, args: JsonValue) -> DriverResult<JsonValue>;

    /// W3C actions（触摸手势）
    async fn perform_actions(&self, actions: JsonValue) -> DriverResult<()>;

    async fn back(&self) -> DriverResult<()>;

    async fn press_keycode(&self, keycode: i64) -> DriverResult<()>;

    /// 结束会话
    async fn quit(&self) -> DriverResult<()>;
}
