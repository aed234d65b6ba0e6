//! 批量商品处理器 - 编排层
//!
//! 按顺序处理商品列表，单个商品失败不影响后续商品。

use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::Config;
use crate::infrastructure::Driver;
use crate::models::{
    BatchResult, Platform, ProgressEvent, ProgressSink, ProgressSpan, ProgressStatus,
    RequestedItem,
};
use crate::utils::logging::{log_item_finished, log_item_start};
use crate::workflow::{ItemCtx, ItemFlow, ItemOutcome};

/// 批量商品处理器
pub struct BatchRunner {
    flow: ItemFlow,
    between_items: Duration,
    span: ProgressSpan,
}

impl BatchRunner {
    pub fn new(config: &Config) -> Self {
        Self {
            flow: ItemFlow::new(config),
            between_items: config.timings.between_items,
            span: ProgressSpan::BATCH,
        }
    }

    /// 依次处理所有商品
    ///
    /// 每个商品开始前发送 `adding_product` 事件，结束后发送 `item_finished` 事件。
    ///
    /// # 参数
    /// - `driver`: 设备驱动（由批次租约持有）
    /// - `items`: 按顺序处理的商品
    /// - `platform`: 当前平台
    /// - `sink`: 进度接收方
    ///
    /// # 返回
    /// 返回成功数量和失败商品名称
    pub async fn run(
        &self,
        driver: &dyn Driver,
        items: &[RequestedItem],
        platform: Platform,
        sink: &dyn ProgressSink,
    ) -> BatchResult {
        let total = items.len();
        let mut result = BatchResult::default();

        for (idx, item) in items.iter().enumerate() {
            let progress = self.span.at(idx, total);
            sink.emit(
                ProgressEvent::new(
                    ProgressStatus::AddingProduct,
                    format!(
                        "Adding {} (x{})... ({}/{})",
                        item.name,
                        item.quantity,
                        idx + 1,
                        total
                    ),
                    progress,
                )
                .with_item(item.name.clone()),
            );

            let ctx = ItemCtx::new(idx + 1, total, item, platform, progress);
            log_item_start(&ctx);

            let report = self.flow.run(driver, &ctx, sink).await;

            let message = match &report.outcome {
                ItemOutcome::Added => {
                    result.record_success();
                    format!("Added {} to basket", item.name)
                }
                ItemOutcome::Failed(reason) => {
                    result.record_failure(&item.name);
                    if report.session_suspect {
                        error!("{} 定位失败全部源于通信错误，设备会话可能已断开", ctx);
                        result.session_suspect = true;
                    }
                    format!("Failed to add {}: {}", item.name, reason)
                }
            };
            log_item_finished(&ctx, &report);

            sink.emit(
                ProgressEvent::new(
                    ProgressStatus::ItemFinished,
                    message,
                    self.span.at(idx + 1, total),
                )
                .with_item(item.name.clone()),
            );

            if idx + 1 < total {
                sleep(self.between_items).await;
            }
        }

        if !result.failed_items.is_empty() {
            warn!("⚠️ 以下商品未能添加: {}", result.failed_items.join(", "));
        }

        result
    }
}
