//! Appium 客户端 - 基础设施层
//!
//! 通过 W3C WebDriver HTTP 协议与 Appium 服务通信，实现 `Driver` 能力。

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Map, Value as JsonValue};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{DriverError, DriverResult};
use crate::infrastructure::driver::{Driver, ElementId, Rect, ELEMENT_KEY};
use crate::models::{Platform, Strategy};

/// 旧版 JSONWP 元素引用的键名
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Appium 会话
pub struct AppiumDriver {
    http: Client,
    base_url: String,
    session_id: String,
    platform: Platform,
}

impl AppiumDriver {
    /// 创建新的设备会话
    pub async fn connect(config: &Config, platform: Platform) -> DriverResult<Self> {
        let base_url = config.appium_server_url.trim_end_matches('/').to_string();
        info!("正在连接 Appium: {} ({})", base_url, platform);

        let http = Client::builder()
            .timeout(Duration::from_secs(config.driver_request_timeout_secs))
            .build()?;

        let body = json!({
            "capabilities": {
                "alwaysMatch": capabilities(config, platform),
                "firstMatch": [{}]
            }
        });

        let response = http
            .post(format!("{}/session", base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("连接 Appium 失败: {}", e);
                DriverError::from(e)
            })?;
        let status = response.status();
        let payload: JsonValue = response.json().await?;
        let session_id = parse_session_id(status, &payload)?;

        info!("✓ 设备会话已建立: {}", session_id);

        Ok(Self {
            http,
            base_url,
            session_id,
            platform,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// 发送会话内命令，返回响应中的 `value`
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
    ) -> DriverResult<JsonValue> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: JsonValue = response.json().await?;
        unwrap_response(status, payload)
    }

    async fn element_command(
        &self,
        method: Method,
        element: &ElementId,
        path: &str,
        body: Option<JsonValue>,
    ) -> DriverResult<JsonValue> {
        self.command(method, &format!("/element/{}{}", element, path), body)
            .await
    }
}

#[async_trait]
impl Driver for AppiumDriver {
    async fn find_element(&self, strategy: Strategy, query: &str) -> DriverResult<ElementId> {
        let value = self
            .command(
                Method::POST,
                "/element",
                Some(json!({ "using": strategy.as_w3c(), "value": query })),
            )
            .await?;
        parse_element(&value)
    }

    async fn find_elements(&self, strategy: Strategy, query: &str) -> DriverResult<Vec<ElementId>> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": strategy.as_w3c(), "value": query })),
            )
            .await?;
        value
            .as_array()
            .ok_or_else(|| DriverError::Protocol(format!("elements 应为数组: {}", value)))?
            .iter()
            .map(parse_element)
            .collect()
    }

    async fn is_displayed(&self, element: &ElementId) -> DriverResult<bool> {
        let value = self
            .element_command(Method::GET, element, "/displayed", None)
            .await?;
        value
            .as_bool()
            .ok_or_else(|| DriverError::Protocol(format!("displayed 应为布尔值: {}", value)))
    }

    async fn click(&self, element: &ElementId) -> DriverResult<()> {
        self.element_command(Method::POST, element, "/click", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> DriverResult<()> {
        self.element_command(Method::POST, element, "/value", Some(json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> DriverResult<()> {
        self.element_command(Method::POST, element, "/clear", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn rect(&self, element: &ElementId) -> DriverResult<Rect> {
        let value = self
            .element_command(Method::GET, element, "/rect", None)
            .await?;
        serde_json::from_value(value).map_err(|e| DriverError::Protocol(e.to_string()))
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> DriverResult<Option<String>> {
        let value = self
            .element_command(Method::GET, element, &format!("/attribute/{}", name), None)
            .await?;
        Ok(match value {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn text(&self, element: &ElementId) -> DriverResult<String> {
        let value = self
            .element_command(Method::GET, element, "/text", None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn execute(&self, script: &str, args: JsonValue) -> DriverResult<JsonValue> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": [args] })),
        )
        .await
    }

    async fn perform_actions(&self, actions: JsonValue) -> DriverResult<()> {
        self.command(Method::POST, "/actions", Some(json!({ "actions": actions })))
            .await?;
        Ok(())
    }

    async fn back(&self) -> DriverResult<()> {
        self.command(Method::POST, "/back", Some(json!({}))).await?;
        Ok(())
    }

    async fn press_keycode(&self, keycode: i64) -> DriverResult<()> {
        self.command(
            Method::POST,
            "/appium/device/press_keycode",
            Some(json!({ "keycode": keycode })),
        )
        .await?;
        Ok(())
    }

    async fn quit(&self) -> DriverResult<()> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        let response = self.http.delete(&url).send().await?;
        let status = response.status();
        let payload: JsonValue = response.json().await.unwrap_or(JsonValue::Null);
        unwrap_response(status, payload)?;
        info!("设备会话已关闭: {}", self.session_id);
        Ok(())
    }
}

/// 各平台的 Appium capabilities
pub fn capabilities(config: &Config, platform: Platform) -> JsonValue {
    let mut caps = Map::new();
    match platform {
        Platform::Ios => {
            caps.insert("platformName".into(), json!("iOS"));
            caps.insert("appium:automationName".into(), json!("XCUITest"));
            caps.insert("appium:deviceName".into(), json!(config.ios_device_name));
            caps.insert("appium:platformVersion".into(), json!(config.ios_version));
            caps.insert("appium:bundleId".into(), json!(config.bundle_id));
            if !config.ios_udid.is_empty() {
                caps.insert("appium:udid".into(), json!(config.ios_udid));
            }
        }
        Platform::Android => {
            caps.insert("platformName".into(), json!("Android"));
            caps.insert("appium:automationName".into(), json!("UiAutomator2"));
            caps.insert("appium:deviceName".into(), json!(config.android_device_name));
            caps.insert("appium:appPackage".into(), json!(config.app_package));
            caps.insert("appium:appActivity".into(), json!(config.app_activity));
        }
    }
    // 保留已登录状态
    caps.insert("appium:noReset".into(), json!(true));
    caps.insert("appium:fullReset".into(), json!(false));
    JsonValue::Object(caps)
}

/// 拆出 `value`，W3C 错误转为 `DriverError`
fn unwrap_response(status: StatusCode, payload: JsonValue) -> DriverResult<JsonValue> {
    let mut payload = payload;
    let value = payload
        .get_mut("value")
        .map(JsonValue::take)
        .unwrap_or(JsonValue::Null);

    if let Some(code) = value.get("error").and_then(|v| v.as_str()) {
        let message = value
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        return Err(DriverError::from_w3c(code, message));
    }

    if !status.is_success() {
        return Err(DriverError::Command {
            error: status.to_string(),
            message: value.to_string(),
        });
    }

    Ok(value)
}

fn parse_session_id(status: StatusCode, payload: &JsonValue) -> DriverResult<String> {
    let value = unwrap_response(status, payload.clone())?;
    value
        .get("sessionId")
        .or_else(|| payload.get("sessionId"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| DriverError::Protocol(format!("响应中没有 sessionId: {}", payload)))
}

fn parse_element(value: &JsonValue) -> DriverResult<ElementId> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(|v| v.as_str())
        .map(ElementId::from)
        .ok_or_else(|| DriverError::Protocol(format!("无法解析元素引用: {}", value)))
}

/// 检查 Appium 服务是否在线
///
/// 依次尝试 Appium 2.x (`/status`) 和 1.x (`/wd/hub/status`)，返回可用的地址和 `ready` 状态
pub async fn probe_status(base_url: &str) -> DriverResult<(String, bool)> {
    let http = Client::builder().timeout(Duration::from_secs(5)).build()?;
    let base_url = base_url.trim_end_matches('/');
    let mut last_error = DriverError::Transport(format!("{} 无响应", base_url));

    for path in ["/status", "/wd/hub/status"] {
        let url = format!("{}{}", base_url, path);
        match http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let payload: JsonValue = response.json().await.unwrap_or(JsonValue::Null);
                let ready = payload
                    .pointer("/value/ready")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                return Ok((url, ready));
            }
            Ok(response) => {
                debug!("{} 返回 {}", url, response.status());
                last_error = DriverError::Command {
                    error: response.status().to_string(),
                    message: url,
                };
            }
            Err(e) => {
                debug!("{} 请求失败: {}", url, e);
                last_error = DriverError::from(e);
            }
        }
    }

    Err(last_error)
}
