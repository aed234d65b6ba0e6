//! 应用入口
//!
//! 管理应用生命周期：初始化日志、创建会话管理器，按命令启动服务或直接运行清单。

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::infrastructure::{probe_status, AppiumConnector, DriverFactory, SessionManager};
use crate::models::{load_shopping_list, LogSink, Platform};
use crate::orchestrator::Automation;
use crate::utils::logging::{init_log_file, log_startup};
use crate::utils::net::local_ip;

/// 应用主结构
pub struct App {
    config: Config,
    sessions: Arc<SessionManager>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法写入日志文件: {}", config.output_log_file))?;
        log_startup(&config);

        let factory: Arc<dyn DriverFactory> = Arc::new(AppiumConnector::new(config.clone()));
        let sessions = Arc::new(SessionManager::new(factory));

        Ok(Self { config, sessions })
    }

    /// 启动 HTTP / WebSocket 服务
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server_host, self.config.server_port)
            .parse()
            .with_context(|| {
                format!(
                    "监听地址不合法: {}:{}",
                    self.config.server_host, self.config.server_port
                )
            })?;

        match probe_status(&self.config.appium_server_url).await {
            Ok((url, true)) => info!("✓ Appium 已就绪: {}", url),
            Ok((url, false)) => warn!("⚠️ Appium 有响应但未就绪: {}", url),
            Err(e) => warn!("⚠️ Appium 暂不可用，收到请求时再连接: {}", e),
        }

        let state = Arc::new(AppState::new(self.config.clone(), self.sessions.clone()));
        let router = create_router(state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("无法监听 {}", addr))?;

        info!("🌐 服务已启动: http://{}", addr);
        if let Some(ip) = local_ip() {
            info!("📱 App 客户端可访问: http://{}:{}", ip, self.config.server_port);
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // 退出前关闭设备会话
        if let Err(e) = self.sessions.disconnect().await {
            warn!("退出时关闭会话失败: {}", e);
        }
        info!("👋 服务已停止");
        Ok(())
    }

    /// 直接运行购物清单文件
    pub async fn run_list(self, path: &Path, platform: Option<Platform>) -> Result<()> {
        let list = load_shopping_list(path).await?;
        let platform = platform
            .or(list.platform)
            .unwrap_or(self.config.default_platform);

        let automation = Automation::new(self.config.clone(), self.sessions.clone());
        let report = automation.run(list.items, platform, &LogSink).await?;

        info!("{}", report.message);
        if !report.failed_items.is_empty() {
            warn!("未添加: {}", report.failed_items.join(", "));
        }

        self.sessions.disconnect().await?;
        Ok(())
    }

    /// 检查 Appium 是否可用，可选地尝试建立设备会话
    pub async fn check(self, device: Option<Platform>) -> Result<()> {
        let (url, ready) = probe_status(&self.config.appium_server_url)
            .await
            .with_context(|| format!("Appium 无响应: {}", self.config.appium_server_url))?;
        info!("✓ Appium 有响应: {} (ready = {})", url, ready);

        if let Some(platform) = device {
            let lease = self.sessions.begin_batch(platform).await?;
            info!("✓ {} 设备会话可用", lease.platform());
            drop(lease);
            self.sessions.disconnect().await?;
        }

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("无法监听 Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到退出信号");
}
