//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `automation` - 一次完整运行
//! - 占用设备（同一时刻只允许一个批次）
//! - 发送连接 / 就绪 / 完成等整体进度
//! - 汇总报告，记录失败商品
//!
//! ### `batch_runner` - 商品列表
//! - 按顺序处理 `Vec<RequestedItem>`
//! - 单个商品失败不影响后续商品
//! - 计算每个商品对应的进度
//!
//! ## 层次关系
//!
//! ```text
//! automation (一次运行)
//!     ↓
//! batch_runner (处理 Vec<RequestedItem>)
//!     ↓
//! workflow::ItemFlow (处理单个商品)
//!     ↓
//! services (能力层：定位 / 动作 / 扫描)
//!     ↓
//! infrastructure (基础设施：Driver)
//! ```

pub mod automation;
pub mod batch_runner;

pub use automation::Automation;
pub use batch_runner::BatchRunner;
