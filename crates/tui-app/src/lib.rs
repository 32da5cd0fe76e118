//! TUI 应用模块
//!
//! 提供基于 Ratatui 的终端用户界面，用于浏览已上传的 PDF 并向后端提问。

pub mod app;
pub mod components;
pub mod event;
pub mod ui;

pub use app::{AppConfig, TuiApp};
pub use event::{AppError, AppResult, Event, EventHandler};

/// 运行 TUI 应用的便捷函数
pub use app::run_tui;
