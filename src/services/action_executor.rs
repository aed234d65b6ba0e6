//! 动作执行服务 - 业务能力层
//!
//! 对已定位的元素执行点击 / 输入 / 滚动。每个动作都有多层降级：
//! 某一层失败就换下一层，全部失败才报告给流程层。

use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Timings;
use crate::error::{ActionFailed, DriverError, DriverResult};
use crate::infrastructure::{keys, Driver, ElementId, ELEMENT_KEY};
use crate::models::Platform;
use crate::services::element_resolver::ResolvedElement;

/// 清空输入框时一次性发送的删除键数量
const CLEAR_BURST_LEN: usize = 50;
/// 最后一层逐个退格的次数
const CLEAR_BACKSPACE_COUNT: usize = 20;

/// 动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    Tap,
    Type(&'a str),
    ScrollIntoView,
}

/// 点击最终生效的层级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapTier {
    /// 驱动原生点击
    Native,
    /// 在元素中心做坐标点击
    Coordinate,
    /// W3C 触摸手势
    Gesture,
}

/// 动作执行服务
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    keystroke_delay: Duration,
    clear_key_delay: Duration,
}

impl ActionExecutor {
    pub fn new(timings: &Timings) -> Self {
        Self {
            keystroke_delay: timings.keystroke_delay,
            clear_key_delay: timings.clear_key_delay,
        }
    }

    /// 通用入口
    pub async fn act(
        &self,
        driver: &dyn Driver,
        platform: Platform,
        element: &ResolvedElement,
        action: Action<'_>,
    ) -> Result<(), ActionFailed> {
        match action {
            Action::Tap => self.tap(driver, platform, &element.id).await.map(|_| ()),
            Action::Type(text) => self.type_text(driver, platform, &element.id, text).await,
            Action::ScrollIntoView => {
                self.scroll_into_view(driver, platform, &element.id).await;
                Ok(())
            }
        }
    }

    /// 点击：原生点击 → 坐标点击 → 触摸手势
    ///
    /// # 返回
    /// 返回最终生效的层级；三层都失败时返回最后一层的错误
    pub async fn tap(
        &self,
        driver: &dyn Driver,
        platform: Platform,
        element: &ElementId,
    ) -> Result<TapTier, ActionFailed> {
        match driver.click(element).await {
            Ok(()) => return Ok(TapTier::Native),
            Err(e) => debug!("原生点击失败，尝试坐标点击: {}", e),
        }

        let coordinate = match driver.rect(element).await {
            Ok(rect) => {
                let (x, y) = rect.center();
                self.tap_at(driver, platform, x, y).await
            }
            Err(e) => Err(e),
        };
        match coordinate {
            Ok(()) => return Ok(TapTier::Coordinate),
            Err(e) => debug!("坐标点击失败，尝试触摸手势: {}", e),
        }

        driver
            .perform_actions(touch_tap_actions(element))
            .await
            .map(|()| TapTier::Gesture)
            .map_err(|e| {
                warn!("点击的所有方式都失败: {}", e);
                action_failed("tap")(e)
            })
    }

    /// 在屏幕坐标处点击
    pub async fn tap_at(
        &self,
        driver: &dyn Driver,
        platform: Platform,
        x: f64,
        y: f64,
    ) -> DriverResult<()> {
        let script = match platform {
            Platform::Ios => "mobile: tap",
            Platform::Android => "mobile: clickGesture",
        };
        driver
            .execute(script, json!({ "x": x.round(), "y": y.round() }))
            .await?;
        Ok(())
    }

    /// 清空后逐字输入
    pub async fn type_text(
        &self,
        driver: &dyn Driver,
        platform: Platform,
        element: &ElementId,
        text: &str,
    ) -> Result<(), ActionFailed> {
        self.clear_field(driver, platform, element).await;

        for ch in text.chars() {
            let mut buf = [0u8; 4];
            driver
                .send_keys(element, ch.encode_utf8(&mut buf))
                .await
                .map_err(action_failed("type"))?;
            sleep(self.keystroke_delay).await;
        }

        debug!("已输入: {}", text);
        Ok(())
    }

    /// 分层清空输入框，每层的错误都忽略
    pub async fn clear_field(&self, driver: &dyn Driver, platform: Platform, element: &ElementId) {
        let delete_key = delete_key(platform);

        if let Err(e) = driver
            .send_keys(element, &delete_key.repeat(CLEAR_BURST_LEN))
            .await
        {
            debug!("批量删除失败: {}", e);
        }

        if let Err(e) = driver.clear(element).await {
            debug!("原生清空失败: {}", e);
        }

        for _ in 0..CLEAR_BACKSPACE_COUNT {
            if let Err(e) = driver.send_keys(element, delete_key).await {
                debug!("逐个退格失败: {}", e);
                break;
            }
            sleep(self.clear_key_delay).await;
        }
    }

    /// 按回车提交
    pub async fn submit(
        &self,
        driver: &dyn Driver,
        platform: Platform,
        element: &ElementId,
    ) -> DriverResult<()> {
        let key = match platform {
            Platform::Ios => keys::ENTER,
            Platform::Android => keys::RETURN,
        };
        driver.send_keys(element, key).await
    }

    /// 尽力把元素滚动到可见区域，失败不报错
    pub async fn scroll_into_view(&self, driver: &dyn Driver, platform: Platform, element: &ElementId) {
        let direct = driver
            .execute(
                "mobile: scroll",
                json!({
                    "direction": "down",
                    "elementId": element.as_str(),
                    "toVisible": true,
                }),
            )
            .await;
        if direct.is_ok() {
            return;
        }

        if let Err(e) = self.scroll_towards(driver, platform, element).await {
            debug!("滚动失败，直接继续: {}", e);
        }
    }

    /// 根据元素位置决定方向，做一次手势滚动
    async fn scroll_towards(
        &self,
        driver: &dyn Driver,
        platform: Platform,
        element: &ElementId,
    ) -> DriverResult<()> {
        let rect = driver.rect(element).await?;
        let direction = if rect.y < 0.0 { "up" } else { "down" };

        match platform {
            Platform::Android => {
                driver
                    .execute(
                        "mobile: scrollGesture",
                        json!({
                            "left": rect.x,
                            "top": rect.y,
                            "width": rect.width,
                            "height": rect.height,
                            "direction": direction,
                            "percent": 0.5,
                        }),
                    )
                    .await?;
            }
            Platform::Ios => {
                let (x, y) = rect.center();
                driver
                    .execute(
                        "mobile: scroll",
                        json!({ "direction": direction, "x": x, "y": y }),
                    )
                    .await?;
            }
        }

        info!("   已滚动 ({})", direction);
        Ok(())
    }
}

fn delete_key(platform: Platform) -> &'static str {
    match platform {
        Platform::Ios => keys::BACKSPACE,
        Platform::Android => keys::DELETE,
    }
}

/// 以元素为原点的单指点击
fn touch_tap_actions(element: &ElementId) -> JsonValue {
    json!([{
        "type": "pointer",
        "id": "finger1",
        "parameters": { "pointerType": "touch" },
        "actions": [
            { "type": "pointerMove", "duration": 0, "origin": { ELEMENT_KEY: element.as_str() }, "x": 0, "y": 0 },
            { "type": "pointerDown", "button": 0 },
            { "type": "pause", "duration": 100 },
            { "type": "pointerUp", "button": 0 }
        ]
    }])
}

/// 把驱动错误包装成动作失败
pub fn action_failed(action: &'static str) -> impl FnOnce(DriverError) -> ActionFailed {
    move |reason| ActionFailed { action, reason }
}
