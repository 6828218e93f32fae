//! 网络模块
//!
//! 提供重试、退避等网络功能

mod retry;

pub use retry::*;
