use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Platform;

/// 待添加的商品（已校验）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedItem {
    pub name: String,
    pub quantity: u32,
}

impl RequestedItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> AppResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("商品名称不能为空".to_string()));
        }
        if quantity < 1 {
            return Err(AppError::Validation(format!(
                "商品 '{}' 的数量必须 ≥ 1",
                name
            )));
        }
        Ok(Self { name, quantity })
    }
}

fn default_quantity() -> i64 {
    1
}

/// 请求中的商品（未校验）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

/// HTTP / WebSocket 自动化请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRequest {
    pub products: Vec<Product>,
    #[serde(default)]
    pub device_type: Option<Platform>,
}

impl AutomationRequest {
    /// 校验并转换为商品列表，数量 < 1 的请求在进入批处理之前被拒绝
    pub fn validate(&self) -> AppResult<Vec<RequestedItem>> {
        if self.products.is_empty() {
            return Err(AppError::Validation("商品列表为空".to_string()));
        }
        self.products
            .iter()
            .map(|p| {
                let quantity = u32::try_from(p.quantity).map_err(|_| {
                    AppError::Validation(format!("商品 '{}' 的数量必须 ≥ 1", p.name.trim()))
                })?;
                RequestedItem::new(p.name.as_str(), quantity)
            })
            .collect()
    }

    pub fn platform_or(&self, default: Platform) -> Platform {
        self.device_type.unwrap_or(default)
    }
}

/// 批处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub succeeded_count: usize,
    pub failed_items: Vec<String>,
    /// 有商品因通信错误而失败，会话可能已失效
    #[serde(skip)]
    pub session_suspect: bool,
}

impl BatchResult {
    pub fn record_success(&mut self) {
        self.succeeded_count += 1;
    }

    pub fn record_failure(&mut self, name: &str) {
        self.failed_items.push(name.to_string());
    }

    pub fn total(&self) -> usize {
        self.succeeded_count + self.failed_items.len()
    }
}

/// 一次完整自动化的最终报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutomationReport {
    pub status: String,
    pub message: String,
    pub products_added: usize,
    pub total_products: usize,
    pub failed_items: Vec<String>,
}

impl AutomationReport {
    pub fn from_batch(result: BatchResult, total: usize) -> Self {
        Self {
            status: "success".to_string(),
            message: summary_message(result.succeeded_count, total),
            products_added: result.succeeded_count,
            total_products: total,
            failed_items: result.failed_items,
        }
    }
}

pub fn summary_message(added: usize, total: usize) -> String {
    format!("Added {}/{} products to basket", added, total)
}
