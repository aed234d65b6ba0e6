//! 添加按钮扫描 - 业务能力层
//!
//! 选择器列表全部未命中时的兜底：遍历页面上所有按钮，按文字判断哪个是"加入购物篮"。

use phf::phf_set;
use tracing::{debug, info};

use crate::infrastructure::{Driver, ElementId};
use crate::models::selector::button_class;
use crate::models::Platform;
use crate::services::element_resolver::ResolvedElement;

/// 命中即排除，优先级高于加入关键词
static EXCLUDE_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "favoriet",
    "favorite",
    "bewaar",
    "save",
    "hart",
    "heart",
};

static ADD_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "voeg toe",
    "toevoegen aan",
    "in mandje",
    "bestellen",
    "add",
};

/// 按钮文字的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelVerdict {
    AddToBasket,
    /// 收藏 / 保存类按钮
    Excluded,
    Unrelated,
}

/// 判断按钮文字（大小写不敏感，子串匹配）
pub fn classify_label(label: &str) -> LabelVerdict {
    let label = label.to_lowercase();

    if EXCLUDE_KEYWORDS.iter().any(|k| label.contains(k)) {
        LabelVerdict::Excluded
    } else if ADD_KEYWORDS.iter().any(|k| label.contains(k)) {
        LabelVerdict::AddToBasket
    } else {
        LabelVerdict::Unrelated
    }
}

/// 添加按钮扫描器
#[derive(Debug, Clone, Default)]
pub struct ButtonScanner;

impl ButtonScanner {
    pub fn new() -> Self {
        Self
    }

    /// 按页面顺序扫描，返回第一个符合条件的按钮
    pub async fn find_add_button(
        &self,
        driver: &dyn Driver,
        platform: Platform,
    ) -> Option<ResolvedElement> {
        let class = button_class(platform);
        let buttons = match driver.find_elements(class.strategy, class.query).await {
            Ok(buttons) => buttons,
            Err(e) => {
                debug!("获取按钮列表失败: {}", e);
                return None;
            }
        };

        info!("   扫描 {} 个按钮寻找添加按钮...", buttons.len());

        for (index, button) in buttons.into_iter().enumerate() {
            let label = match read_label(driver, platform, &button).await {
                Some(label) => label,
                None => continue,
            };

            match classify_label(&label) {
                LabelVerdict::AddToBasket => {
                    info!("   ✓ 第 {} 个按钮 '{}' 是添加按钮", index + 1, label.trim());
                    return Some(ResolvedElement::new(button, class));
                }
                LabelVerdict::Excluded => {
                    debug!("   跳过收藏类按钮 '{}'", label.trim());
                }
                LabelVerdict::Unrelated => {}
            }
        }

        None
    }
}

/// 读取按钮的可见文字，读取失败的按钮直接跳过
async fn read_label(driver: &dyn Driver, platform: Platform, button: &ElementId) -> Option<String> {
    let (first, second) = match platform {
        Platform::Ios => (
            driver.attribute(button, "name").await,
            driver.attribute(button, "label").await,
        ),
        Platform::Android => (
            driver.text(button).await.map(Some),
            driver.attribute(button, "content-desc").await,
        ),
    };

    match (first, second) {
        (Ok(a), Ok(b)) => Some(format!(
            "{} {}",
            a.unwrap_or_default(),
            b.unwrap_or_default()
        )),
        (Err(e), _) | (_, Err(e)) => {
            debug!("读取按钮文字失败: {}", e);
            None
        }
    }
}
