//! 基础设施层
//!
//! 持有稀缺资源（设备会话），只向上暴露 `Driver` 能力。

pub mod appium;
pub mod driver;
pub mod session;

pub use appium::{probe_status, AppiumDriver};
pub use driver::{keys, Driver, ElementId, Rect, ANDROID_KEYCODE_BACK, ELEMENT_KEY};
pub use session::{AppiumConnector, BatchLease, DriverFactory, SessionManager};
