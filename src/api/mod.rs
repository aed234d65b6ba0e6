//! HTTP / WebSocket 接口
//!
//! 手机 App 通过这里提交购物清单并接收进度

pub mod handlers;
pub mod routes;
pub mod state;
pub mod websocket;

pub use routes::create_router;
pub use state::AppState;
