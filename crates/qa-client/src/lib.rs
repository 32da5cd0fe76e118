//! PDF 问答客户端模块
//!
//! 封装对远端 PDF 问答服务的 HTTP 调用，并维护客户端的文件/会话状态。
//! 后端负责 PDF 解析、向量化和问答，本模块只负责请求和本地状态同步。

use thiserror::Error;

pub mod chat;
pub mod client;
pub mod config;
pub mod document;
pub mod shell;
pub mod store;
pub mod traits;
pub mod types;

pub use chat::{ChatMessage, ChatPhase, MessageRole, SubmitOutcome, Transcript, TranscriptScope};
pub use client::ApiClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use document::{Document, DocumentKey, DocumentRef, FilePayload, PDF_CONTENT_TYPE};
pub use shell::{
    ask_document, load_payload, Notification, NotificationLevel, Shell, ShellError, ShellOutcome,
    ShellRequest,
};
pub use store::DocumentStore;
pub use traits::DocumentApi;
pub use types::{AskResponse, FileRecord, FilesResponse, HealthResponse, StatusResponse, UploadResponse};

/// API 调用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 网络层失败（连接失败、DNS、超时等），没有结构化字段
    #[error("网络错误: {0}")]
    Transport(String),

    /// 非 2xx 响应，保留原始响应文本
    #[error("HTTP 错误: {status} {status_text} - {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    /// 2xx 响应但无法解析
    #[error("响应解析失败: {0}")]
    Decode(String),

    /// 后端以 200 返回 `"status": "error"`
    #[error("后端处理失败: {message}")]
    Rejected { message: String },

    /// 客户端配置错误
    #[error("配置错误: {0}")]
    Configuration(String),
}

impl ApiError {
    /// HTTP 状态码（仅 `Http` 变体有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// API 调用结果类型
pub type Result<T> = std::result::Result<T, ApiError>;
