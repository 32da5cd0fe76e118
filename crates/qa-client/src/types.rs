//! 后端接口的请求/响应结构
//!
//! 字段名与后端 JSON 保持一致（snake_case）。后端在处理失败时会返回
//! `{"message": ..., "status": "error"}`，所以业务字段都带默认值，
//! 由调用方根据 `status` 判断。

use serde::{Deserialize, Serialize};

/// 后端表示失败的 `status` 值
pub const STATUS_ERROR: &str = "error";

/// `POST /upload` 响应
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub status: String,
}

/// `POST /ask` 响应
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub status: String,
    /// 仅在失败时出现
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 文件列表中的一条记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    /// 后端可能返回 null
    #[serde(default)]
    pub upload_timestamp: Option<String>,
    pub session_id: String,
}

/// `GET /files` 响应
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesResponse {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 删除类接口的通用响应
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// `GET /health` 响应
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub upload_dir: bool,
    #[serde(default)]
    pub vector_dir: bool,
}

/// 能报告后端处理状态的响应
pub trait BackendStatus {
    /// 后端返回的 `status` 字段
    fn status(&self) -> &str;

    /// 失败时的说明
    fn failure_message(&self) -> Option<&str>;

    /// 是否为 `"status": "error"`
    fn is_rejected(&self) -> bool {
        self.status() == STATUS_ERROR
    }
}

impl BackendStatus for UploadResponse {
    fn status(&self) -> &str {
        &self.status
    }

    fn failure_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

impl BackendStatus for AskResponse {
    fn status(&self) -> &str {
        &self.status
    }

    fn failure_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl BackendStatus for FilesResponse {
    fn status(&self) -> &str {
        &self.status
    }

    fn failure_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl BackendStatus for StatusResponse {
    fn status(&self) -> &str {
        &self.status
    }

    fn failure_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

impl BackendStatus for HealthResponse {
    fn status(&self) -> &str {
        &self.status
    }

    fn failure_message(&self) -> Option<&str> {
        None
    }
}
