//! # Add Basket Items
//!
//! 通过 Appium 驱动超市 App，把购物清单中的商品逐个加入购物篮
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（设备会话），只暴露能力
//! - `Driver` - 驱动能力 trait，`AppiumDriver` 是 W3C WebDriver 实现
//! - `SessionManager` - 会话复用，保证同一时刻只有一个批次
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能对界面做什么"，只处理单个元素
//! - `ElementResolver` - 按选择器列表定位元素
//! - `ActionExecutor` - 多层降级的点击 / 输入 / 滚动
//! - `ButtonScanner` - 按文字扫描添加按钮
//! - `FailedItemWriter` - 记录失败商品
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个商品"的完整处理流程
//! - `ItemCtx` - 上下文封装（序号 + 商品 + 平台）
//! - `ItemFlow` - 状态机（搜索 → 输入 → 选商品 → 加入购物篮）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/automation` - 一次完整运行，发送整体进度
//! - `orchestrator/batch_runner` - 按顺序处理商品列表
//!
//! `api/` 在最外层，把 HTTP / WebSocket 请求交给编排层。

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{Driver, SessionManager};
pub use models::{AutomationReport, Platform, RequestedItem};
pub use orchestrator::{Automation, BatchRunner};
pub use workflow::{ItemCtx, ItemFlow};
