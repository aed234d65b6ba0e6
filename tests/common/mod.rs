//! 测试用的内存驱动
//!
//! 模拟一个极简的超市 App：输入框记录键入的文字，回车后记下搜索词，
//! 只有目录里有这个商品时搜索结果中的商品卡片才"存在"。

#![allow(dead_code)]

use add_basket_items::error::{DriverError, DriverResult};
use add_basket_items::infrastructure::{keys, Driver, DriverFactory, ElementId, Rect};
use add_basket_items::models::selector::{ADD_BUTTON, FIRST_PRODUCT, SEARCH_BOX};
use add_basket_items::models::{
    Platform, ProgressEvent, ProgressSink, SelectorCandidate, SelectorList, Strategy,
};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SEARCH_BOX_ID: &str = "search-box";
pub const PRODUCT_ID: &str = "product";
pub const ADD_ID: &str = "add";
/// 点击后像回车一样提交搜索词
pub const SUBMIT_ID: &str = "search-submit";

const DEFAULT_RECT: Rect = Rect {
    x: 10.0,
    y: 20.0,
    width: 100.0,
    height: 40.0,
};

/// 驱动收到的调用
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Find(String),
    FindAll(String),
    Click(String),
    SendKeys(String, String),
    Clear(String),
    Execute(String),
    Actions,
    Back,
    Keycode(i64),
    Quit,
}

#[derive(Default)]
struct FakeState {
    locators: HashMap<(Strategy, String), String>,
    /// 只有搜索词在目录中时才存在的定位
    gated: HashSet<(Strategy, String)>,
    hidden: HashSet<String>,
    catalog: HashSet<String>,
    buffer: String,
    last_query: Option<String>,
    buttons: Vec<(String, HashMap<String, String>)>,
    button_class: Option<(Strategy, String)>,
    /// 元素 id → 允许成功点击的次数
    click_budget: HashMap<String, usize>,
    fail_execute: bool,
    fail_actions: bool,
    /// 单独发送回车键时失败
    fail_enter: bool,
    fail_back: bool,
    rects: HashMap<String, Rect>,
    /// 元素被 `mobile: scroll` 滚动后的新位置
    rect_after_scroll: HashMap<String, Rect>,
    executed: Vec<(String, JsonValue)>,
    transport_down: bool,
    /// 第 n 个商品（从 0 开始，按返回次数计）时搜索框不存在
    search_box_missing_for: HashSet<usize>,
    backs: usize,
    calls: Vec<Call>,
}

pub struct FakeDriver {
    platform: Platform,
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// 搜索框、商品卡片、添加按钮都在，目录中只有给定商品
    pub fn happy_path(platform: Platform, catalog: &[&str]) -> Self {
        let driver = Self::new(platform);
        driver.register(&SEARCH_BOX, SEARCH_BOX_ID);
        driver.register_gated(&FIRST_PRODUCT, PRODUCT_ID);
        driver.register(&ADD_BUTTON, ADD_ID);
        driver.set_catalog(catalog);
        driver
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn first_eligible(&self, list: &SelectorList) -> SelectorCandidate {
        *list
            .eligible(self.platform)
            .next()
            .expect("list has a candidate for this platform")
    }

    /// 把列表中第一个适用的候选指向 `id`
    pub fn register(&self, list: &SelectorList, id: &str) {
        let candidate = self.first_eligible(list);
        self.register_candidate(&candidate, id);
    }

    pub fn register_candidate(&self, candidate: &SelectorCandidate, id: &str) {
        self.state
            .lock()
            .unwrap()
            .locators
            .insert((candidate.strategy, candidate.query.to_string()), id.to_string());
    }

    pub fn register_gated(&self, list: &SelectorList, id: &str) {
        let candidate = self.first_eligible(list);
        let key = (candidate.strategy, candidate.query.to_string());
        let mut state = self.state.lock().unwrap();
        state.locators.insert(key.clone(), id.to_string());
        state.gated.insert(key);
    }

    pub fn set_catalog(&self, names: &[&str]) {
        self.state.lock().unwrap().catalog = names.iter().map(|n| n.to_lowercase()).collect();
    }

    pub fn hide(&self, id: &str) {
        self.state.lock().unwrap().hidden.insert(id.to_string());
    }

    /// 页面上的按钮（供按类名扫描）
    pub fn add_scannable_button(&self, id: &str, attrs: &[(&str, &str)]) {
        let class = add_basket_items::models::selector::button_class(self.platform);
        let mut state = self.state.lock().unwrap();
        state.button_class = Some((class.strategy, class.query.to_string()));
        state.buttons.push((
            id.to_string(),
            attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
    }

    /// 该元素只能成功点击 `n` 次，之后原生点击失败
    pub fn limit_clicks(&self, id: &str, n: usize) {
        self.state
            .lock()
            .unwrap()
            .click_budget
            .insert(id.to_string(), n);
    }

    pub fn fail_execute(&self, fail: bool) {
        self.state.lock().unwrap().fail_execute = fail;
    }

    pub fn fail_actions(&self, fail: bool) {
        self.state.lock().unwrap().fail_actions = fail;
    }

    pub fn fail_enter(&self, fail: bool) {
        self.state.lock().unwrap().fail_enter = fail;
    }

    /// 元素滚动到可见区域后移动到 `rect`
    pub fn move_on_scroll(&self, id: &str, rect: Rect) {
        self.state
            .lock()
            .unwrap()
            .rect_after_scroll
            .insert(id.to_string(), rect);
    }

    /// 某个脚本每次执行时收到的参数
    pub fn execute_args(&self, script: &str) -> Vec<JsonValue> {
        self.state
            .lock()
            .unwrap()
            .executed
            .iter()
            .filter(|(s, _)| s == script)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn fail_back(&self, fail: bool) {
        self.state.lock().unwrap().fail_back = fail;
    }

    pub fn set_transport_down(&self, down: bool) {
        self.state.lock().unwrap().transport_down = down;
    }

    pub fn search_box_missing_for_item(&self, index: usize) {
        self.state
            .lock()
            .unwrap()
            .search_box_missing_for
            .insert(index);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clicks_on(&self, id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Click(target) if target == id))
            .count()
    }

    pub fn executes(&self, script: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Execute(s) if s == script))
            .count()
    }

    /// 按顺序排列、去重后的查询
    pub fn probed_queries(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for call in self.calls() {
            if let Call::Find(q) = call {
                if seen.last() != Some(&q) {
                    seen.push(q);
                }
            }
        }
        seen
    }

    /// 每次回车提交的搜索词
    pub fn submitted_queries(&self) -> Vec<String> {
        let mut queries = Vec::new();
        let mut buffer = String::new();
        for call in self.calls() {
            match call {
                Call::Clear(_) => buffer.clear(),
                Call::SendKeys(_, text) => {
                    for ch in text.chars() {
                        match ch.to_string().as_str() {
                            keys::ENTER | keys::RETURN => queries.push(buffer.clone()),
                            keys::BACKSPACE | keys::DELETE => {
                                buffer.pop();
                            }
                            _ => buffer.push(ch),
                        }
                    }
                }
                _ => {}
            }
        }
        queries
    }

    pub fn backs(&self) -> usize {
        self.state.lock().unwrap().backs
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn find_element(&self, strategy: Strategy, query: &str) -> DriverResult<ElementId> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Find(query.to_string()));

        if state.transport_down {
            return Err(DriverError::Transport("connection refused".to_string()));
        }

        let key = (strategy, query.to_string());
        let id = state
            .locators
            .get(&key)
            .cloned()
            .ok_or_else(|| DriverError::NoSuchElement(query.to_string()))?;

        if state.gated.contains(&key) {
            let found = state
                .last_query
                .as_ref()
                .map(|q| state.catalog.contains(&q.to_lowercase()))
                .unwrap_or(false);
            if !found {
                return Err(DriverError::NoSuchElement(query.to_string()));
            }
        }

        if id == SEARCH_BOX_ID && state.search_box_missing_for.contains(&state.backs) {
            return Err(DriverError::NoSuchElement(query.to_string()));
        }

        Ok(ElementId(id))
    }

    async fn find_elements(&self, strategy: Strategy, query: &str) -> DriverResult<Vec<ElementId>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FindAll(query.to_string()));
        if state.transport_down {
            return Err(DriverError::Transport("connection refused".to_string()));
        }
        if state.button_class.as_ref() != Some(&(strategy, query.to_string())) {
            return Ok(Vec::new());
        }
        Ok(state
            .buttons
            .iter()
            .map(|(id, _)| ElementId(id.clone()))
            .collect())
    }

    async fn is_displayed(&self, element: &ElementId) -> DriverResult<bool> {
        Ok(!self.state.lock().unwrap().hidden.contains(element.as_str()))
    }

    async fn click(&self, element: &ElementId) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(budget) = state.click_budget.get_mut(element.as_str()) {
            if *budget == 0 {
                return Err(DriverError::Command {
                    error: "element not interactable".to_string(),
                    message: element.to_string(),
                });
            }
            *budget -= 1;
        }
        state.calls.push(Call::Click(element.to_string()));
        if element.as_str() == SUBMIT_ID {
            state.last_query = Some(state.buffer.clone());
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_enter && (text == keys::ENTER || text == keys::RETURN) {
            return Err(DriverError::Command {
                error: "invalid argument".to_string(),
                message: "enter".to_string(),
            });
        }
        state
            .calls
            .push(Call::SendKeys(element.to_string(), text.to_string()));

        for ch in text.chars() {
            match ch.to_string().as_str() {
                keys::ENTER | keys::RETURN => {
                    state.last_query = Some(state.buffer.clone());
                }
                keys::BACKSPACE | keys::DELETE => {
                    state.buffer.pop();
                }
                _ => state.buffer.push(ch),
            }
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Clear(element.to_string()));
        state.buffer.clear();
        Ok(())
    }

    async fn rect(&self, element: &ElementId) -> DriverResult<Rect> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rects
            .get(element.as_str())
            .copied()
            .unwrap_or(DEFAULT_RECT))
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> DriverResult<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .buttons
            .iter()
            .find(|(id, _)| id == element.as_str())
            .and_then(|(_, attrs)| attrs.get(name).cloned()))
    }

    async fn text(&self, element: &ElementId) -> DriverResult<String> {
        Ok(self.attribute(element, "text").await?.unwrap_or_default())
    }

    async fn execute(&self, script: &str, args: JsonValue) -> DriverResult<JsonValue> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Execute(script.to_string()));
        state.executed.push((script.to_string(), args.clone()));
        if state.fail_execute {
            return Err(DriverError::Command {
                error: "unknown method".to_string(),
                message: script.to_string(),
            });
        }

        if script == "mobile: scroll" {
            if let Some(id) = args.get("elementId").and_then(JsonValue::as_str) {
                if let Some(rect) = state.rect_after_scroll.remove(id) {
                    state.rects.insert(id.to_string(), rect);
                }
            }
        }
        Ok(JsonValue::Null)
    }

    async fn perform_actions(&self, _actions: JsonValue) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Actions);
        if state.fail_actions {
            return Err(DriverError::Command {
                error: "unknown error".to_string(),
                message: "actions".to_string(),
            });
        }
        Ok(())
    }

    async fn back(&self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Back);
        state.backs += 1;
        if state.fail_back {
            return Err(DriverError::Command {
                error: "unsupported operation".to_string(),
                message: "back".to_string(),
            });
        }
        Ok(())
    }

    async fn press_keycode(&self, keycode: i64) -> DriverResult<()> {
        self.record(Call::Keycode(keycode));
        Ok(())
    }

    async fn quit(&self) -> DriverResult<()> {
        self.record(Call::Quit);
        Ok(())
    }
}

/// 每次连接都交出同一个预先配置好的驱动
pub struct FakeFactory {
    pub driver: Arc<FakeDriver>,
    pub connects: AtomicUsize,
    pub refuse: bool,
}

impl FakeFactory {
    pub fn new(driver: FakeDriver) -> Self {
        Self {
            driver: Arc::new(driver),
            connects: AtomicUsize::new(0),
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(FakeDriver::new(Platform::Android))
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverFactory for FakeFactory {
    async fn connect(&self, _platform: Platform) -> DriverResult<Arc<dyn Driver>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(DriverError::Transport("connection refused".to_string()));
        }
        Ok(self.driver.clone())
    }

    fn endpoint(&self) -> String {
        "fake://appium".to_string()
    }
}

/// 收集所有进度事件
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
