use std::str::FromStr;
use std::time::Duration;

use crate::models::Platform;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// Appium 服务地址
    pub appium_server_url: String,
    /// HTTP / WebSocket 监听地址
    pub server_host: String,
    pub server_port: u16,
    // --- iOS 设备 ---
    pub ios_device_name: String,
    pub ios_version: String,
    pub ios_udid: String,
    pub bundle_id: String,
    // --- Android 设备 ---
    pub android_device_name: String,
    pub app_package: String,
    pub app_activity: String,
    /// 未指定平台时使用
    pub default_platform: Platform,
    /// 单次驱动 HTTP 请求超时（秒）
    pub driver_request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,
    /// 失败商品记录文件
    pub failed_items_file: String,
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            appium_server_url: "http://localhost:4723".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            ios_device_name: "iPhone".to_string(),
            ios_version: "17.0".to_string(),
            ios_udid: String::new(),
            bundle_id: "nl.ah.ahapp".to_string(),
            android_device_name: "Android Device".to_string(),
            app_package: "nl.ah.app".to_string(),
            app_activity: "nl.ah.app.MainActivity".to_string(),
            default_platform: Platform::Ios,
            driver_request_timeout_secs: 30,
            verbose_logging: false,
            output_log_file: "automation_log.txt".to_string(),
            failed_items_file: "failed_items.txt".to_string(),
            timings: Timings::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取，便于测试
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        let mut timings = default.timings.clone();
        if let Some(ms) = parse_var(&get, "LOOKUP_TIMEOUT_MS") {
            timings.lookup_timeout = Duration::from_millis(ms);
        }

        Self {
            appium_server_url: get("APPIUM_SERVER_URL").unwrap_or(default.appium_server_url),
            server_host: get("SERVER_HOST").unwrap_or(default.server_host),
            server_port: parse_var(&get, "SERVER_PORT").unwrap_or(default.server_port),
            ios_device_name: get("IOS_DEVICE_NAME").unwrap_or(default.ios_device_name),
            ios_version: get("IOS_VERSION").unwrap_or(default.ios_version),
            ios_udid: get("IOS_UDID").unwrap_or(default.ios_udid),
            bundle_id: get("AH_BUNDLE_ID").unwrap_or(default.bundle_id),
            android_device_name: get("ANDROID_DEVICE_NAME").unwrap_or(default.android_device_name),
            app_package: get("AH_PACKAGE").unwrap_or(default.app_package),
            app_activity: get("AH_ACTIVITY").unwrap_or(default.app_activity),
            default_platform: parse_var(&get, "DEFAULT_PLATFORM").unwrap_or(default.default_platform),
            driver_request_timeout_secs: parse_var(&get, "DRIVER_REQUEST_TIMEOUT_SECS")
                .unwrap_or(default.driver_request_timeout_secs),
            verbose_logging: parse_var(&get, "VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            output_log_file: get("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            failed_items_file: get("FAILED_ITEMS_FILE").unwrap_or(default.failed_items_file),
            timings,
        }
    }
}

fn parse_var<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    get(key).and_then(|v| v.trim().parse().ok())
}

/// 所有固定等待时间
///
/// 默认值模拟人工操作节奏，过快容易触发 App 的反自动化检测。
#[derive(Clone, Debug)]
pub struct Timings {
    /// 必需元素的单个候选等待上限
    pub lookup_timeout: Duration,
    /// 可选元素（搜索入口、跳过按钮、"+" 按钮）的单个候选等待上限
    pub optional_lookup_timeout: Duration,
    /// 等待元素出现时的轮询间隔
    pub poll_interval: Duration,
    /// 逐字输入的字符间隔
    pub keystroke_delay: Duration,
    /// 退格清空时的按键间隔
    pub clear_key_delay: Duration,
    /// 滚动 / 点击输入框之后的短暂停顿
    pub short_pause: Duration,
    /// App 启动后等待
    pub app_launch_settle: Duration,
    /// 点击跳过 / 搜索入口后等待
    pub navigation_settle: Duration,
    /// 提交搜索后等待结果
    pub search_settle: Duration,
    /// 点击商品后等待详情页
    pub product_settle: Duration,
    /// 详情页加载后再找添加按钮
    pub detail_page_settle: Duration,
    /// 重复点击之间的间隔
    pub repeat_tap_delay: Duration,
    /// 添加完成后等待购物篮更新
    pub after_add_settle: Duration,
    /// 返回之后等待
    pub back_settle: Duration,
    /// 两个商品之间的间隔
    pub between_items: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(3),
            optional_lookup_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(250),
            keystroke_delay: Duration::from_millis(50),
            clear_key_delay: Duration::from_millis(10),
            short_pause: Duration::from_millis(500),
            app_launch_settle: Duration::from_secs(3),
            navigation_settle: Duration::from_secs(1),
            search_settle: Duration::from_secs(2),
            product_settle: Duration::from_secs(2),
            detail_page_settle: Duration::from_secs(2),
            repeat_tap_delay: Duration::from_secs(1),
            after_add_settle: Duration::from_millis(2500),
            back_settle: Duration::from_secs(1),
            between_items: Duration::from_secs(1),
        }
    }
}
