//! 商品处理上下文
//!
//! 封装"我正在处理批次中的第几个商品"这一信息

use std::fmt::Display;

use crate::models::{Platform, RequestedItem};

/// 商品处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 在批次中的序号（从1开始）
    pub index: usize,

    pub total: usize,

    pub name: String,

    pub quantity: u32,

    pub platform: Platform,

    /// 开始处理该商品时的整体进度
    pub progress: f64,
}

impl ItemCtx {
    pub fn new(
        index: usize,
        total: usize,
        item: &RequestedItem,
        platform: Platform,
        progress: f64,
    ) -> Self {
        Self {
            index,
            total,
            name: item.name.clone(),
            quantity: item.quantity,
            platform,
            progress,
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[商品 {}/{} {} x{}]",
            self.index, self.total, self.name, self.quantity
        )
    }
}
