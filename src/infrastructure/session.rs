//! 会话管理 - 基础设施层
//!
//! 同一时刻只允许一个批次占用设备。驱动会话在批次之间复用，
//! 平台切换或会话失效时重新建立。

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, DriverResult};
use crate::infrastructure::appium::AppiumDriver;
use crate::infrastructure::driver::Driver;
use crate::models::Platform;

/// 驱动工厂
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn connect(&self, platform: Platform) -> DriverResult<Arc<dyn Driver>>;

    /// 连接目标（用于错误信息）
    fn endpoint(&self) -> String;
}

/// 连接真实 Appium 服务
pub struct AppiumConnector {
    config: Config,
}

impl AppiumConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DriverFactory for AppiumConnector {
    async fn connect(&self, platform: Platform) -> DriverResult<Arc<dyn Driver>> {
        let driver = AppiumDriver::connect(&self.config, platform).await?;
        Ok(Arc::new(driver))
    }

    fn endpoint(&self) -> String {
        self.config.appium_server_url.clone()
    }
}

struct ActiveSession {
    platform: Platform,
    driver: Arc<dyn Driver>,
}

/// 批次租约
///
/// 持有期间其他批次请求会得到 `AppError::Busy`。
pub struct BatchLease {
    _guard: OwnedMutexGuard<()>,
    driver: Arc<dyn Driver>,
    platform: Platform,
}

impl BatchLease {
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

/// 会话管理器
pub struct SessionManager {
    factory: Arc<dyn DriverFactory>,
    current: Mutex<Option<ActiveSession>>,
    batch_lock: Arc<Mutex<()>>,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            factory,
            current: Mutex::new(None),
            batch_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 开始一个批次：占用设备并拿到可用的驱动
    pub async fn begin_batch(&self, platform: Platform) -> AppResult<BatchLease> {
        let guard = self
            .batch_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| AppError::Busy)?;

        let driver = self.driver_for(platform).await?;

        Ok(BatchLease {
            _guard: guard,
            driver,
            platform,
        })
    }

    async fn driver_for(&self, platform: Platform) -> AppResult<Arc<dyn Driver>> {
        let mut current = self.current.lock().await;

        if let Some(active) = current.as_ref() {
            if active.platform == platform {
                info!("复用现有设备会话 ({})", platform);
                return Ok(active.driver.clone());
            }
        }

        if let Some(old) = current.take() {
            info!("平台切换 {} → {}，关闭旧会话", old.platform, platform);
            if let Err(e) = old.driver.quit().await {
                warn!("关闭旧会话失败（忽略）: {}", e);
            }
        }

        let driver = self
            .factory
            .connect(platform)
            .await
            .map_err(|source| AppError::DriverConnect {
                url: self.factory.endpoint(),
                source,
            })?;

        *current = Some(ActiveSession {
            platform,
            driver: driver.clone(),
        });
        Ok(driver)
    }

    pub async fn is_connected(&self) -> bool {
        self.current.lock().await.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.batch_lock.try_lock().is_err()
    }

    /// 丢弃当前会话，下个批次会重新连接
    pub async fn discard(&self) {
        if let Some(old) = self.current.lock().await.take() {
            warn!("设备会话疑似失效，已丢弃 ({})", old.platform);
            if let Err(e) = old.driver.quit().await {
                debug!("关闭失效会话失败（忽略）: {}", e);
            }
        }
    }

    /// 主动断开
    ///
    /// 返回是否真的关闭了一个会话。批次运行期间拒绝断开。
    pub async fn disconnect(&self) -> AppResult<bool> {
        let _guard = self.batch_lock.try_lock().map_err(|_| AppError::Busy)?;

        match self.current.lock().await.take() {
            Some(old) => {
                if let Err(e) = old.driver.quit().await {
                    warn!("关闭会话失败（忽略）: {}", e);
                }
                info!("设备会话已断开");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
