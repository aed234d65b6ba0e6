//! 失败商品记录 - 业务能力层
//!
//! 只负责把添加失败的商品追加到文件，不关心流程

use anyhow::{Context, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::Platform;

/// 失败商品写入服务
pub struct FailedItemWriter {
    path: String,
}

impl FailedItemWriter {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 追加一批失败的商品，每个商品一行
    pub async fn write(&self, platform: Platform, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        debug!("写入 {} 个失败商品到 {}", names.len(), self.path);

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let content: String = names
            .iter()
            .map(|name| format!("{} | {} | {}\n", timestamp, platform, name))
            .collect();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("无法打开 {}", self.path))?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
