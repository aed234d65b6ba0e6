//! 商品处理流程 - 流程层
//!
//! 核心职责：定义"一个商品"从搜索到加入购物篮的完整流程
//!
//! 状态顺序：
//! Idle → Searching → Submitting → SelectingProduct → AddingToCart → Done
//!
//! 任何一步失败都进入 Failed。无论成功失败，结束后都会尝试返回上一页，
//! 让下一个商品从相近的界面开始。

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Timings};
use crate::error::ElementNotFound;
use crate::infrastructure::{Driver, Rect, ANDROID_KEYCODE_BACK};
use crate::models::selector::{
    ADD_BUTTON, BACK_BUTTON, FIRST_PRODUCT, INCREMENT_BUTTON, SEARCH_BOX, SEARCH_BUTTON,
    SEARCH_SUBMIT_BUTTON,
};
use crate::models::{Platform, ProgressEvent, ProgressSink, ProgressStatus};
use crate::services::{Action, ActionExecutor, ButtonScanner, ElementResolver, ResolvedElement};
use crate::workflow::item_ctx::ItemCtx;

/// 商品失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("search box not found")]
    SearchBoxNotFound,
    #[error("typing failed")]
    TypingFailed,
    #[error("product not found")]
    ProductNotFound,
    #[error("product tap failed")]
    ProductTapFailed,
    #[error("add button not found")]
    AddButtonNotFound,
    #[error("add button tap failed")]
    AddButtonTapFailed,
}

/// 流程阶段（用于记录和测试）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
    Submitting,
    SelectingProduct,
    AddingToCart,
    Done,
    Failed,
}

/// 流程状态
///
/// 搜索框在 Searching 阶段定位后直接移交给 Submitting，离开该阶段即丢弃。
enum ItemState {
    Idle,
    Searching,
    Submitting(ResolvedElement),
    SelectingProduct,
    AddingToCart,
    Done,
    Failed(FailureReason),
}

impl ItemState {
    fn phase(&self) -> Phase {
        match self {
            ItemState::Idle => Phase::Idle,
            ItemState::Searching => Phase::Searching,
            ItemState::Submitting(_) => Phase::Submitting,
            ItemState::SelectingProduct => Phase::SelectingProduct,
            ItemState::AddingToCart => Phase::AddingToCart,
            ItemState::Done => Phase::Done,
            ItemState::Failed(_) => Phase::Failed,
        }
    }
}

/// 单个商品的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Added,
    Failed(FailureReason),
}

/// 单个商品的处理报告
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub outcome: ItemOutcome,
    /// 经过的阶段，依次排列
    pub trace: Vec<Phase>,
    /// 在添加按钮上的点击次数（含重复）
    pub tap_attempts: u32,
    /// 是否有定位失败全部源于通信错误
    pub session_suspect: bool,
}

impl ItemReport {
    pub fn is_added(&self) -> bool {
        self.outcome == ItemOutcome::Added
    }
}

/// 重复点击最终生效的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepeatTier {
    Increment,
    Retap,
    Coordinate,
    Missed,
}

/// 一次运行期间的可变状态
struct ItemRun<'a> {
    driver: &'a dyn Driver,
    ctx: &'a ItemCtx,
    sink: &'a dyn ProgressSink,
    tap_attempts: u32,
    session_suspect: bool,
}

impl ItemRun<'_> {
    fn platform(&self) -> Platform {
        self.ctx.platform
    }

    fn emit(&self, status: ProgressStatus, message: String) {
        self.sink.emit(
            ProgressEvent::new(status, message, self.ctx.progress).with_item(self.ctx.name.clone()),
        );
    }

    fn note_miss(&mut self, not_found: &ElementNotFound) {
        if not_found.looks_like_dead_session() {
            self.session_suspect = true;
        }
    }
}

/// 商品处理流程
///
/// - 编排单个商品的处理步骤
/// - 不持有设备会话，由调用方传入驱动
/// - 只依赖业务能力（services）
pub struct ItemFlow {
    resolver: ElementResolver,
    executor: ActionExecutor,
    scanner: ButtonScanner,
    timings: Timings,
}

impl ItemFlow {
    pub fn new(config: &Config) -> Self {
        Self::with_timings(config.timings.clone())
    }

    pub fn with_timings(timings: Timings) -> Self {
        Self {
            resolver: ElementResolver::new(&timings),
            executor: ActionExecutor::new(&timings),
            scanner: ButtonScanner::new(),
            timings,
        }
    }

    pub async fn run(
        &self,
        driver: &dyn Driver,
        ctx: &ItemCtx,
        sink: &dyn ProgressSink,
    ) -> ItemReport {
        let mut run = ItemRun {
            driver,
            ctx,
            sink,
            tap_attempts: 0,
            session_suspect: false,
        };

        let mut state = ItemState::Idle;
        let mut trace = vec![state.phase()];

        let outcome = loop {
            state = match state {
                ItemState::Done => break ItemOutcome::Added,
                ItemState::Failed(reason) => break ItemOutcome::Failed(reason),
                ItemState::Idle => self.open_search(&run).await,
                ItemState::Searching => self.find_search_box(&mut run).await,
                ItemState::Submitting(search_box) => self.submit_query(&run, search_box).await,
                ItemState::SelectingProduct => self.open_first_product(&mut run).await,
                ItemState::AddingToCart => self.add_to_basket(&mut run).await,
            };
            trace.push(state.phase());
        };

        match outcome {
            ItemOutcome::Added => info!("{} ✅ 已加入购物篮", ctx),
            ItemOutcome::Failed(reason) => error!("{} ❌ 失败: {}", ctx, reason),
        }

        self.go_back(driver, ctx.platform).await;

        ItemReport {
            outcome,
            trace,
            tap_attempts: run.tap_attempts,
            session_suspect: run.session_suspect,
        }
    }

    /// 点击搜索入口（找不到就直接找搜索框）
    async fn open_search(&self, run: &ItemRun<'_>) -> ItemState {
        run.emit(
            ProgressStatus::Searching,
            format!("Searching for: {}", run.ctx.name),
        );
        info!("{} 🔍 打开搜索...", run.ctx);

        match self
            .resolver
            .resolve(
                run.driver,
                &SEARCH_BUTTON,
                run.platform(),
                self.timings.optional_lookup_timeout,
            )
            .await
        {
            Ok(button) => {
                self.executor
                    .scroll_into_view(run.driver, run.platform(), &button.id)
                    .await;
                sleep(self.timings.short_pause).await;
                if let Err(e) = self.executor.tap(run.driver, run.platform(), &button.id).await {
                    warn!("{} 搜索入口点击失败，继续找搜索框: {}", run.ctx, e);
                }
                sleep(self.timings.navigation_settle).await;
            }
            Err(_) => {
                info!("{} 未找到搜索入口，直接找搜索框", run.ctx);
            }
        }

        ItemState::Searching
    }

    async fn find_search_box(&self, run: &mut ItemRun<'_>) -> ItemState {
        match self
            .resolver
            .resolve(
                run.driver,
                &SEARCH_BOX,
                run.platform(),
                self.timings.lookup_timeout,
            )
            .await
        {
            Ok(search_box) => ItemState::Submitting(search_box),
            Err(not_found) => {
                run.note_miss(&not_found);
                ItemState::Failed(FailureReason::SearchBoxNotFound)
            }
        }
    }

    /// 输入商品名称并提交搜索
    async fn submit_query(&self, run: &ItemRun<'_>, search_box: ResolvedElement) -> ItemState {
        let (driver, platform) = (run.driver, run.platform());

        self.executor
            .scroll_into_view(driver, platform, &search_box.id)
            .await;
        sleep(self.timings.short_pause).await;

        if let Err(e) = self.executor.tap(driver, platform, &search_box.id).await {
            warn!("{} 搜索框点击失败，仍尝试输入: {}", run.ctx, e);
        }
        sleep(self.timings.short_pause).await;

        info!("{} ⌨️ 输入: {}", run.ctx, run.ctx.name);
        if let Err(e) = self
            .executor
            .act(driver, platform, &search_box, Action::Type(&run.ctx.name))
            .await
        {
            warn!("{} {}", run.ctx, e);
            return ItemState::Failed(FailureReason::TypingFailed);
        }
        sleep(self.timings.short_pause).await;

        if let Err(e) = self.executor.submit(driver, platform, &search_box.id).await {
            debug!("回车提交失败，尝试搜索按钮: {}", e);
            if let Ok(button) = self
                .resolver
                .resolve(
                    driver,
                    &SEARCH_SUBMIT_BUTTON,
                    platform,
                    self.timings.optional_lookup_timeout,
                )
                .await
            {
                if let Err(e) = self.executor.tap(driver, platform, &button.id).await {
                    warn!("{} 搜索按钮点击失败: {}", run.ctx, e);
                }
            }
        }

        sleep(self.timings.search_settle).await;
        ItemState::SelectingProduct
    }

    async fn open_first_product(&self, run: &mut ItemRun<'_>) -> ItemState {
        run.emit(
            ProgressStatus::SelectingProduct,
            format!("Selecting product for: {}", run.ctx.name),
        );
        let (driver, platform) = (run.driver, run.platform());

        let product = match self
            .resolver
            .resolve(driver, &FIRST_PRODUCT, platform, self.timings.lookup_timeout)
            .await
        {
            Ok(product) => product,
            Err(not_found) => {
                run.note_miss(&not_found);
                return ItemState::Failed(FailureReason::ProductNotFound);
            }
        };

        self.executor
            .scroll_into_view(driver, platform, &product.id)
            .await;
        sleep(self.timings.short_pause).await;

        if let Err(e) = self
            .executor
            .act(driver, platform, &product, Action::Tap)
            .await
        {
            warn!("{} {}", run.ctx, e);
            return ItemState::Failed(FailureReason::ProductTapFailed);
        }

        sleep(self.timings.product_settle).await;
        ItemState::AddingToCart
    }

    /// 找到添加按钮并点击 quantity 次
    async fn add_to_basket(&self, run: &mut ItemRun<'_>) -> ItemState {
        let (driver, platform) = (run.driver, run.platform());
        let quantity = run.ctx.quantity;

        sleep(self.timings.detail_page_settle).await;

        let add_button = match self
            .resolver
            .resolve(driver, &ADD_BUTTON, platform, self.timings.lookup_timeout)
            .await
        {
            Ok(button) => button,
            Err(not_found) => {
                run.note_miss(&not_found);
                match self.scanner.find_add_button(driver, platform).await {
                    Some(button) => button,
                    None => return ItemState::Failed(FailureReason::AddButtonNotFound),
                }
            }
        };

        run.emit(
            ProgressStatus::AddingToBasket,
            format!("Adding {} to basket (x{})", run.ctx.name, quantity),
        );

        self.executor
            .scroll_into_view(driver, platform, &add_button.id)
            .await;
        sleep(self.timings.short_pause).await;

        // 点击之后按钮可能变成数量控件，滚动完成后先记下位置
        let last_rect = driver.rect(&add_button.id).await.ok();

        run.tap_attempts += 1;
        if let Err(e) = self.executor.tap(driver, platform, &add_button.id).await {
            warn!("{} {}", run.ctx, e);
            return ItemState::Failed(FailureReason::AddButtonTapFailed);
        }
        info!("{} ✓ 第 1/{} 次点击", run.ctx, quantity);

        for n in 2..=quantity {
            sleep(self.timings.repeat_tap_delay).await;
            run.emit(
                ProgressStatus::AddingToBasket,
                format!("Adding quantity {}/{} for {}", n, quantity, run.ctx.name),
            );

            run.tap_attempts += 1;
            let tier = self.repeat_tap(run, &add_button, last_rect).await;
            match tier {
                RepeatTier::Missed => warn!("{} ⚠️ 第 {}/{} 次点击失败", run.ctx, n, quantity),
                _ => info!("{} ✓ 第 {}/{} 次点击 ({:?})", run.ctx, n, quantity, tier),
            }
        }

        sleep(self.timings.after_add_settle).await;
        ItemState::Done
    }

    /// 数量 > 1 时的后续点击："+" 按钮 → 原按钮 → 按钮当前位置的坐标
    async fn repeat_tap(
        &self,
        run: &ItemRun<'_>,
        add_button: &ResolvedElement,
        last_rect: Option<Rect>,
    ) -> RepeatTier {
        let (driver, platform) = (run.driver, run.platform());

        if let Ok(increment) = self
            .resolver
            .resolve(
                driver,
                &INCREMENT_BUTTON,
                platform,
                self.timings.optional_lookup_timeout,
            )
            .await
        {
            if self.executor.tap(driver, platform, &increment.id).await.is_ok() {
                return RepeatTier::Increment;
            }
        }

        if driver.click(&add_button.id).await.is_ok() {
            return RepeatTier::Retap;
        }

        let rect = match driver.rect(&add_button.id).await {
            Ok(rect) => Some(rect),
            Err(e) => {
                debug!("读取添加按钮位置失败，使用点击前的位置: {}", e);
                last_rect
            }
        };
        if let Some(rect) = rect {
            let (x, y) = rect.center();
            if self.executor.tap_at(driver, platform, x, y).await.is_ok() {
                return RepeatTier::Coordinate;
            }
        }

        RepeatTier::Missed
    }

    /// 返回上一页，所有错误都忽略
    async fn go_back(&self, driver: &dyn Driver, platform: Platform) {
        if let Err(e) = driver.back().await {
            debug!("系统返回失败: {}", e);
            match platform {
                Platform::Android => {
                    if let Err(e) = driver.press_keycode(ANDROID_KEYCODE_BACK).await {
                        debug!("返回键失败: {}", e);
                    }
                }
                Platform::Ios => {
                    if let Ok(button) = self
                        .resolver
                        .resolve(
                            driver,
                            &BACK_BUTTON,
                            platform,
                            self.timings.optional_lookup_timeout,
                        )
                        .await
                    {
                        if let Err(e) = driver.click(&button.id).await {
                            debug!("返回按钮点击失败: {}", e);
                        }
                    }
                }
            }
        }

        sleep(self.timings.back_settle).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reasons_read_naturally() {
        assert_eq!(FailureReason::SearchBoxNotFound.to_string(), "search box not found");
        assert_eq!(FailureReason::ProductNotFound.to_string(), "product not found");
        assert_eq!(FailureReason::AddButtonNotFound.to_string(), "add button not found");
    }
}
