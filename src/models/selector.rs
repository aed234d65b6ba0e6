//! 选择器模型与静态选择器表
//!
//! 每个界面目标（搜索框、商品卡片、添加按钮……）对应一个 `SelectorList`，
//! 列表顺序即优先级：越具体的越靠前。平台不匹配的候选在求值时跳过。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 设备平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            other => Err(format!("未知平台 '{}'，只支持 ios / android", other)),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 候选适用的平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformTag {
    Ios,
    Android,
    Any,
}

impl PlatformTag {
    pub fn matches(self, platform: Platform) -> bool {
        match self {
            PlatformTag::Any => true,
            PlatformTag::Ios => platform == Platform::Ios,
            PlatformTag::Android => platform == Platform::Android,
        }
    }
}

/// 定位策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    AccessibilityId,
    Xpath,
    ResourceId,
    ClassName,
}

impl Strategy {
    /// W3C / Appium 协议中的 `using` 值
    pub fn as_w3c(self) -> &'static str {
        match self {
            Strategy::AccessibilityId => "accessibility id",
            Strategy::Xpath => "xpath",
            Strategy::ResourceId => "id",
            Strategy::ClassName => "class name",
        }
    }
}

/// 单个选择器候选
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorCandidate {
    pub strategy: Strategy,
    pub query: &'static str,
    pub platform: PlatformTag,
}

impl SelectorCandidate {
    pub const fn ios(strategy: Strategy, query: &'static str) -> Self {
        Self {
            strategy,
            query,
            platform: PlatformTag::Ios,
        }
    }

    pub const fn android(strategy: Strategy, query: &'static str) -> Self {
        Self {
            strategy,
            query,
            platform: PlatformTag::Android,
        }
    }

    pub const fn any(strategy: Strategy, query: &'static str) -> Self {
        Self {
            strategy,
            query,
            platform: PlatformTag::Any,
        }
    }
}

impl fmt::Display for SelectorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_w3c(), self.query)
    }
}

/// 一个界面目标的有序候选列表
#[derive(Debug, Clone, Copy)]
pub struct SelectorList {
    pub target: &'static str,
    candidates: &'static [SelectorCandidate],
}

impl SelectorList {
    pub const fn new(target: &'static str, candidates: &'static [SelectorCandidate]) -> Self {
        Self { target, candidates }
    }

    pub fn candidates(&self) -> &'static [SelectorCandidate] {
        self.candidates
    }

    /// 按顺序返回适用于该平台的候选
    pub fn eligible(&self, platform: Platform) -> impl Iterator<Item = &'static SelectorCandidate> {
        self.candidates
            .iter()
            .filter(move |c| c.platform.matches(platform))
    }
}

use PlatformTag as P;
use Strategy::*;

const fn c(platform: PlatformTag, strategy: Strategy, query: &'static str) -> SelectorCandidate {
    SelectorCandidate {
        strategy,
        query,
        platform,
    }
}

/// 启动页 / 登录页上的"跳过"按钮
pub const SKIP_BUTTON: SelectorList = SelectorList::new(
    "skip button",
    &[
        c(P::Any, AccessibilityId, "Skip"),
        c(P::Any, AccessibilityId, "Overslaan"),
        c(P::Ios, Xpath, "//XCUIElementTypeButton[@name='Skip' or @name='Overslaan']"),
        c(P::Android, Xpath, "//android.widget.Button[@text='Skip' or @text='Overslaan']"),
    ],
);

/// 打开搜索页的入口（可选）
pub const SEARCH_BUTTON: SelectorList = SelectorList::new(
    "search button",
    &[
        c(P::Ios, AccessibilityId, "Zoek"),
        c(P::Ios, AccessibilityId, "Search"),
        c(P::Ios, Xpath, "//XCUIElementTypeButton[@name='Zoek' or @name='Search']"),
        c(P::Ios, Xpath, "//XCUIElementTypeButton[contains(@label, 'Zoek')]"),
        c(P::Android, ResourceId, "nl.ah.app:id/search"),
        c(P::Android, Xpath, "//android.widget.Button[@content-desc='Zoek' or @content-desc='Search']"),
        c(P::Android, Xpath, "//android.widget.ImageButton[@content-desc='Zoek']"),
    ],
);

/// 搜索输入框
pub const SEARCH_BOX: SelectorList = SelectorList::new(
    "search box",
    &[
        c(P::Ios, AccessibilityId, "search_field"),
        c(P::Ios, AccessibilityId, "Zoek"),
        c(P::Ios, Xpath, "//XCUIElementTypeSearchField"),
        c(P::Ios, Xpath, "//XCUIElementTypeTextField[@placeholder='Zoek' or @placeholder='Search']"),
        c(P::Ios, Xpath, "//XCUIElementTypeTextField[contains(@name, 'Zoek')]"),
        c(P::Android, ResourceId, "nl.ah.app:id/search_input"),
        c(P::Android, ResourceId, "nl.ah.app:id/search_box"),
        c(P::Android, Xpath, "//android.widget.EditText[@hint='Zoek' or @hint='Search']"),
        c(P::Android, Xpath, "//android.widget.EditText[contains(@content-desc, 'Zoek')]"),
        c(P::Android, ClassName, "android.widget.EditText"),
    ],
);

/// 回车提交失败时使用的搜索按钮
pub const SEARCH_SUBMIT_BUTTON: SelectorList = SelectorList::new(
    "search submit button",
    &[
        c(P::Any, AccessibilityId, "Zoeken"),
        c(P::Any, AccessibilityId, "Search"),
        c(P::Ios, Xpath, "//XCUIElementTypeButton[@name='Zoeken' or @name='Search']"),
        c(P::Android, ResourceId, "nl.ah.app:id/search_button"),
    ],
);

/// 搜索结果中的第一个商品
pub const FIRST_PRODUCT: SelectorList = SelectorList::new(
    "first product",
    &[
        c(P::Ios, Xpath, "(//XCUIElementTypeCell)[1]"),
        c(P::Ios, Xpath, "(//XCUIElementTypeCell[@visible='true'])[1]"),
        c(P::Ios, AccessibilityId, "product_card"),
        c(P::Ios, Xpath, "(//XCUIElementTypeStaticText[contains(@name, 'product')]/ancestor::XCUIElementTypeCell)[1]"),
        c(P::Android, ResourceId, "nl.ah.app:id/product_card"),
        c(P::Android, Xpath, "(//android.widget.RecyclerView/android.view.ViewGroup)[1]"),
        c(P::Android, Xpath, "(//android.view.ViewGroup[contains(@content-desc, 'product')])[1]"),
        c(P::Android, ClassName, "android.widget.FrameLayout"),
    ],
);

/// 详情页上的"Voeg toe"按钮
pub const ADD_BUTTON: SelectorList = SelectorList::new(
    "add button",
    &[
        c(P::Ios, AccessibilityId, "Voeg toe"),
        c(P::Ios, AccessibilityId, "Voeg toe:"),
        c(P::Ios, Xpath, "//XCUIElementTypeButton[contains(@name, 'Voeg toe')]"),
        c(P::Ios, Xpath, "//XCUIElementTypeButton[contains(@label, 'Voeg toe')]"),
        c(P::Ios, Xpath, "//XCUIElementTypeButton[contains(@name, 'toevoegen')]"),
        c(P::Android, ResourceId, "nl.ah.app:id/add_to_basket"),
        c(P::Android, ResourceId, "nl.ah.app:id/add_button"),
        c(P::Android, Xpath, "//android.widget.Button[contains(@text, 'Voeg toe')]"),
        c(P::Android, Xpath, "//android.widget.Button[contains(@content-desc, 'Voeg toe')]"),
    ],
);

/// 添加后出现的"+"按钮
pub const INCREMENT_BUTTON: SelectorList = SelectorList::new(
    "increment button",
    &[
        c(P::Any, AccessibilityId, "+"),
        c(P::Ios, Xpath, "//XCUIElementTypeButton[@name='+' or @label='+']"),
        c(P::Android, Xpath, "//android.widget.Button[@content-desc='+' or @text='+']"),
        c(P::Android, ResourceId, "nl.ah.app:id/increment"),
    ],
);

/// iOS 没有系统返回键，返回失败时找导航栏按钮
pub const BACK_BUTTON: SelectorList = SelectorList::new(
    "back button",
    &[
        c(P::Ios, AccessibilityId, "Back"),
        c(P::Ios, Xpath, "//XCUIElementTypeButton[@name='Back']"),
        c(P::Ios, Xpath, "(//XCUIElementTypeNavigationBar//XCUIElementTypeButton)[1]"),
    ],
);

/// 按钮类元素的类名，用于添加按钮的线性扫描
pub fn button_class(platform: Platform) -> SelectorCandidate {
    match platform {
        Platform::Ios => SelectorCandidate::ios(ClassName, "XCUIElementTypeButton"),
        Platform::Android => SelectorCandidate::android(ClassName, "android.widget.Button"),
    }
}
