use crate::models::item::RequestedItem;
use crate::models::Platform;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;
use tokio::fs;

/// 购物清单文件
///
/// ```toml
/// platform = "android"
/// items = ["2x melk", "kaas x3", "brood"]
///
/// [[extra]]
/// name = "appels"
/// quantity = 6
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShoppingList {
    pub platform: Option<Platform>,
    pub items: Vec<RequestedItem>,
}

#[derive(Debug, Deserialize)]
struct ShoppingListFile {
    #[serde(default)]
    platform: Option<Platform>,
    #[serde(default)]
    items: Vec<ListEntry>,
    #[serde(default)]
    extra: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEntry {
    Short(String),
    Full {
        name: String,
        #[serde(default)]
        quantity: Option<i64>,
    },
}

/// 从 TOML 文本解析购物清单
pub fn parse_shopping_list(content: &str) -> Result<ShoppingList> {
    let file: ShoppingListFile = toml::from_str(content).context("购物清单格式错误")?;

    let items = file
        .items
        .into_iter()
        .chain(file.extra)
        .map(|entry| match entry {
            ListEntry::Short(text) => parse_shorthand(&text),
            ListEntry::Full { name, quantity } => {
                let quantity = quantity.unwrap_or(1);
                let quantity = u32::try_from(quantity)
                    .with_context(|| format!("商品 '{}' 的数量不合法: {}", name, quantity))?;
                Ok(RequestedItem::new(name, quantity)?)
            }
        })
        .collect::<Result<Vec<_>>>()?;

    if items.is_empty() {
        anyhow::bail!("购物清单中没有商品");
    }

    Ok(ShoppingList {
        platform: file.platform,
        items,
    })
}

static PREFIX_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*[xX×]\s+(.+?)\s*$").expect("prefix quantity pattern")
});
static SUFFIX_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(.+?)\s+[xX×]\s*(\d+)\s*$").expect("suffix quantity pattern")
});

/// 解析 "2x melk" / "melk x2" / "melk" 形式的简写
///
/// # 参数
/// - `text`: 清单中的一行，如 `"2x melk"`
///
/// # 返回
/// 返回商品名称和数量，没有写数量时为 1
pub fn parse_shorthand(text: &str) -> Result<RequestedItem> {
    let (name, quantity) = if let Some(caps) = PREFIX_QUANTITY.captures(text) {
        (caps[2].to_string(), caps[1].to_string())
    } else if let Some(caps) = SUFFIX_QUANTITY.captures(text) {
        (caps[1].to_string(), caps[2].to_string())
    } else {
        (text.trim().to_string(), "1".to_string())
    };

    let quantity: u32 = quantity
        .parse()
        .with_context(|| format!("无法解析数量: {}", text))?;
    Ok(RequestedItem::new(name, quantity)?)
}

/// 从文件加载购物清单
///
/// # 参数
/// - `path`: TOML 清单文件路径
///
/// # 返回
/// 返回清单中的平台（可选）和按顺序排列的商品
pub async fn load_shopping_list(path: &Path) -> Result<ShoppingList> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取购物清单: {}", path.display()))?;

    let list = parse_shopping_list(&content)
        .with_context(|| format!("无法解析购物清单: {}", path.display()))?;

    tracing::info!(
        "成功加载 {} 个商品: {}",
        list.items.len(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(list)
}
