//! 日志配置模块
//!
//! 日志写入按天滚动的文件；一次性命令额外输出到 stderr，TUI 模式只写文件，
//! 以免破坏界面。

use std::path::PathBuf;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

/// 日志文件前缀
const LOG_FILE_PREFIX: &str = "pdfchat";

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志目录
    pub log_dir: PathBuf,
    /// 日志级别
    pub level: LogLevel,
    /// 是否同时输出到 stderr
    pub console_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            level: LogLevel::default(),
            console_output: false,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置日志目录
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// 设置日志级别
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// 设置是否输出到 stderr
    pub fn with_console_output(mut self, output: bool) -> Self {
        self.console_output = output;
        self
    }

    /// 初始化全局日志
    ///
    /// 只能调用一次。返回的 guard 必须保持存活到程序退出，否则缓冲中的日志会丢失。
    pub fn init(self) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.log_dir)?;

        let file_appender = rolling::daily(&self.log_dir, LOG_FILE_PREFIX);
        let (non_blocking_file, guard) = non_blocking(file_appender);
        let level = LevelFilter::from(self.level);

        let file_layer = fmt::layer()
            .with_writer(non_blocking_file)
            .with_ansi(false)
            .with_target(true)
            .with_filter(level);

        // stdout 留给命令输出
        let console_layer = self.console_output.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(level)
        });

        tracing_subscriber::registry()
            .with(file_layer)
            .with(console_layer)
            .try_init()?;

        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
        assert_eq!(LevelFilter::from(LogLevel::Info), LevelFilter::INFO);
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::ERROR);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_config_builder() {
        let config = LoggingConfig::new()
            .with_log_dir("/tmp/logs")
            .with_level(LogLevel::Debug)
            .with_console_output(true);

        assert_eq!(config.log_dir, PathBuf::from("/tmp/logs"));
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.console_output);
    }
}
