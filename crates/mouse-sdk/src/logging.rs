//! 日志初始化
//!
//! `RUST_LOG` 优先；未设置时使用给定的默认过滤（通常为 `info`）。

use tracing_subscriber::EnvFilter;

/// 默认过滤
pub const DEFAULT_FILTER: &str = "info";

/// 初始化全局 `tracing` 订阅器
///
/// 可重复调用：已经安装过订阅器时返回 `false`，不会 panic。
///
/// ```rust
/// mouse_sdk::init_logger();
/// mouse_sdk::init_logger();
/// ```
pub fn init_logger() -> bool {
    init_logger_with(DEFAULT_FILTER)
}

/// 指定默认过滤（如 `"mouse_control=debug,info"`）
pub fn init_logger_with(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init().is_ok()
}
