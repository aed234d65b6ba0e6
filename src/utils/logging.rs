//! 日志工具模块
//!
//! 日志初始化和批次日志的格式化输出

use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::models::BatchResult;
use crate::workflow::{ItemCtx, ItemReport};

/// 初始化 tracing
///
/// `RUST_LOG` 优先；未设置时按 verbose 选择 debug / info。
/// 给出日志文件时同时追加写入该文件（无颜色）。
pub fn init(verbose: bool, log_file_path: Option<&str>) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = log_file_path
        .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok())
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init();
}

/// 初始化日志文件（覆盖旧内容，写入表头）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n购物篮自动化日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 购物篮自动化服务启动");
    info!("📱 Appium: {}", config.appium_server_url);
    info!("📱 默认平台: {}", config.default_platform);
    info!("{}", "=".repeat(60));
}

pub fn log_item_start(ctx: &ItemCtx) {
    info!("\n{}", "─".repeat(60));
    info!("🛒 {} 开始处理 ({:.0}%)", ctx, ctx.progress);
    info!("{}", "─".repeat(60));
}

pub fn log_item_finished(ctx: &ItemCtx, report: &ItemReport) {
    tracing::debug!(
        "{} 阶段: {:?} | 点击 {} 次",
        ctx,
        report.trace,
        report.tap_attempts
    );
}

/// 打印批次最终统计
pub fn print_final_stats(result: &BatchResult, total: usize, failed_items_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批次完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", result.succeeded_count, total);
    info!("❌ 失败: {}", result.failed_items.len());
    info!("{}", "=".repeat(60));
    if !result.failed_items.is_empty() {
        info!("\n失败商品已记录至: {}", failed_items_file);
    }
}
