//! 业务能力层
//!
//! 描述"我能对界面做什么"，只处理单个元素 / 单个动作，不关心流程顺序。

pub mod action_executor;
pub mod button_scanner;
pub mod element_resolver;
pub mod failed_item_writer;

pub use action_executor::{Action, ActionExecutor, TapTier};
pub use button_scanner::{classify_label, ButtonScanner, LabelVerdict};
pub use element_resolver::{ElementResolver, ResolvedElement};
pub use failed_item_writer::FailedItemWriter;
