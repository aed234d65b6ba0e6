//! 元素定位服务 - 业务能力层
//!
//! 按优先级依次尝试选择器列表中的候选，第一个"存在且可见"的元素胜出。
//! 每个候选有独立的等待时间，单个候选的失败不会中断后续候选。

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Timings;
use crate::error::{DriverError, ElementNotFound};
use crate::infrastructure::{Driver, ElementId};
use crate::models::{Platform, SelectorCandidate, SelectorList};

/// 已定位的元素
///
/// 只在一个流程步骤内有效，页面跳转后句柄会失效，所以不实现 `Clone`。
#[derive(Debug)]
pub struct ResolvedElement {
    pub id: ElementId,
    pub candidate: SelectorCandidate,
}

impl ResolvedElement {
    pub(crate) fn new(id: ElementId, candidate: SelectorCandidate) -> Self {
        Self { id, candidate }
    }
}

/// 单个候选未命中的原因
enum Miss {
    /// 找到了但不可见
    Invisible,
    Driver(DriverError),
}

/// 元素定位服务
#[derive(Debug, Clone)]
pub struct ElementResolver {
    poll_interval: Duration,
}

impl ElementResolver {
    pub fn new(timings: &Timings) -> Self {
        Self {
            poll_interval: timings.poll_interval,
        }
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// 在选择器列表中定位元素
    ///
    /// # 参数
    /// - `driver`: 设备驱动
    /// - `list`: 按优先级排列的候选选择器
    /// - `platform`: 当前平台，用于过滤候选
    /// - `timeout`: 每个候选的等待上限，不是整个列表的
    ///
    /// # 返回
    /// 返回第一个可见的元素；全部失败时返回尝试次数和通信错误次数
    pub async fn resolve(
        &self,
        driver: &dyn Driver,
        list: &SelectorList,
        platform: Platform,
        timeout: Duration,
    ) -> Result<ResolvedElement, ElementNotFound> {
        let mut attempted = 0;
        let mut transport_errors = 0;

        for candidate in list.eligible(platform) {
            attempted += 1;

            match self.probe(driver, candidate, timeout).await {
                Ok(id) => {
                    info!("   ✓ 找到 {} ({})", list.target, candidate);
                    return Ok(ResolvedElement::new(id, *candidate));
                }
                Err(Miss::Driver(e)) if e.is_transport() => {
                    transport_errors += 1;
                    warn!("   {} 候选 {} 通信失败: {}", list.target, candidate, e);
                }
                Err(Miss::Driver(e)) => {
                    debug!("   {} 候选 {} 未命中: {}", list.target, candidate, e);
                }
                Err(Miss::Invisible) => {
                    debug!("   {} 候选 {} 存在但不可见", list.target, candidate);
                }
            }
        }

        let not_found = ElementNotFound {
            target: list.target,
            attempted,
            transport_errors,
        };
        if not_found.looks_like_dead_session() {
            warn!("⚠️ {}，设备会话可能已断开", not_found);
        } else {
            debug!("{}", not_found);
        }
        Err(not_found)
    }

    /// 轮询单个候选直到可见或超时
    async fn probe(
        &self,
        driver: &dyn Driver,
        candidate: &SelectorCandidate,
        timeout: Duration,
    ) -> Result<ElementId, Miss> {
        let deadline = Instant::now() + timeout;

        loop {
            let miss = match driver.find_element(candidate.strategy, candidate.query).await {
                Ok(id) => match driver.is_displayed(&id).await {
                    Ok(true) => return Ok(id),
                    Ok(false) => Miss::Invisible,
                    Err(e) => Miss::Driver(e),
                },
                Err(e) => Miss::Driver(e),
            };

            if Instant::now() + self.poll_interval > deadline {
                return Err(miss);
            }
            sleep(self.poll_interval).await;
        }
    }
}
