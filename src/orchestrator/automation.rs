//! 自动化运行器 - 编排层
//!
//! 一次完整的运行：占用设备 → 连接 → 跳过启动页 → 批量添加 → 汇总报告。
//! HTTP、WebSocket 和命令行三种入口共用这里。

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{Driver, SessionManager};
use crate::models::selector::SKIP_BUTTON;
use crate::models::{
    AutomationReport, Platform, ProgressEvent, ProgressSink, ProgressStatus, RequestedItem,
};
use crate::orchestrator::batch_runner::BatchRunner;
use crate::services::{ActionExecutor, ElementResolver, FailedItemWriter};
use crate::utils::logging::print_final_stats;

/// 自动化运行器
pub struct Automation {
    config: Config,
    sessions: Arc<SessionManager>,
    runner: BatchRunner,
    resolver: ElementResolver,
    executor: ActionExecutor,
    failed_writer: FailedItemWriter,
}

impl Automation {
    pub fn new(config: Config, sessions: Arc<SessionManager>) -> Self {
        Self {
            runner: BatchRunner::new(&config),
            resolver: ElementResolver::new(&config.timings),
            executor: ActionExecutor::new(&config.timings),
            failed_writer: FailedItemWriter::new(config.failed_items_file.clone()),
            config,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// 运行一个批次
    ///
    /// 只有批次级错误（设备占用、连接失败）返回 `Err`，单个商品的失败记录在报告里。
    pub async fn run(
        &self,
        items: Vec<RequestedItem>,
        platform: Platform,
        sink: &dyn ProgressSink,
    ) -> AppResult<AutomationReport> {
        let total = items.len();
        info!("📦 收到 {} 个商品 ({})", total, platform);

        sink.emit(ProgressEvent::new(
            ProgressStatus::Connecting,
            "Connecting to device...",
            10.0,
        ));

        let lease = match self.sessions.begin_batch(platform).await {
            Ok(lease) => lease,
            Err(e) => {
                error!("❌ 无法开始批次: {}", e);
                sink.emit(ProgressEvent::new(
                    ProgressStatus::Error,
                    format!("Automation error: {}", e),
                    0.0,
                ));
                return Err(e);
            }
        };

        sink.emit(ProgressEvent::new(
            ProgressStatus::Connected,
            "Device connected successfully",
            20.0,
        ));

        sleep(self.config.timings.app_launch_settle).await;
        sink.emit(ProgressEvent::new(
            ProgressStatus::Navigating,
            "App opened, navigating...",
            20.0,
        ));

        self.dismiss_splash(lease.driver(), platform).await;

        sink.emit(ProgressEvent::new(
            ProgressStatus::Ready,
            "Ready to add products...",
            25.0,
        ));

        let result = self
            .runner
            .run(lease.driver(), &items, platform, sink)
            .await;

        if result.session_suspect {
            self.sessions.discard().await;
        }
        drop(lease);

        if let Err(e) = self
            .failed_writer
            .write(platform, &result.failed_items)
            .await
        {
            error!("写入失败商品记录失败: {}", e);
        }

        print_final_stats(&result, total, self.failed_writer.path());

        let report = AutomationReport::from_batch(result, total);
        sink.emit(ProgressEvent::new(
            ProgressStatus::Completed,
            format!(
                "Successfully added {}/{} products",
                report.products_added, report.total_products
            ),
            100.0,
        ));

        Ok(report)
    }

    /// 启动页 / 登录页上有"跳过"就点掉
    async fn dismiss_splash(&self, driver: &dyn Driver, platform: Platform) {
        match self
            .resolver
            .resolve(
                driver,
                &SKIP_BUTTON,
                platform,
                self.config.timings.optional_lookup_timeout,
            )
            .await
        {
            Ok(skip) => {
                info!("👋 点击跳过按钮");
                if let Err(e) = self.executor.tap(driver, platform, &skip.id).await {
                    warn!("跳过按钮点击失败，继续: {}", e);
                }
                sleep(self.config.timings.navigation_settle).await;
            }
            Err(_) => info!("未发现启动页，直接开始"),
        }
    }
}
