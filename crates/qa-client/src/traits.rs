//! 后端接口 trait
//!
//! 状态管理和界面只依赖这个 trait，测试时可以替换为内存实现。

use crate::document::FilePayload;
use crate::types::{AskResponse, FileRecord, StatusResponse, UploadResponse};
use crate::Result;

/// PDF 问答后端的五个业务操作
///
/// 每个操作只发出一次请求，不重试。
#[async_trait::async_trait]
pub trait DocumentApi: Send + Sync {
    /// 上传 PDF
    async fn upload_document(&self, payload: &FilePayload) -> Result<UploadResponse>;

    /// 针对某个文件提问
    async fn ask_question(&self, filename: &str, question: &str) -> Result<AskResponse>;

    /// 列出后端已有的文件，保持服务端顺序
    async fn list_documents(&self) -> Result<Vec<FileRecord>>;

    /// 删除单个文件
    async fn delete_document(&self, filename: &str) -> Result<StatusResponse>;

    /// 删除整个会话
    async fn delete_session(&self, session_id: &str) -> Result<StatusResponse>;
}
