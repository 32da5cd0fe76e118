//! 应用外壳
//!
//! 持有文档状态，实现上传、选择、删除、删除会话和提问的处理逻辑。
//! 每个修改操作拆成三步：
//!
//! 1. 同步校验，生成 [`ShellRequest`]（例如非 PDF 文件直接拒绝，不发请求）
//! 2. [`ShellRequest::execute`] 调用后端，可以放到后台任务里执行
//! 3. [`Shell::apply`] 根据结果修改状态并生成提示
//!
//! 状态只在后端确认成功之后才修改。

use crate::document::{Document, DocumentKey, FilePayload};
use crate::store::DocumentStore;
use crate::traits::DocumentApi;
use crate::types::{FileRecord, StatusResponse, UploadResponse};
use crate::ApiError;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub const MSG_NOT_PDF: &str = "Please upload a PDF file only!";
pub const MSG_LOAD_FAILED: &str = "Failed to load existing files";
pub const MSG_UPLOAD_FAILED: &str = "Failed to upload PDF. Please try again.";
pub const MSG_DOCUMENT_DELETED: &str = "PDF deleted successfully";
pub const MSG_DELETE_FAILED: &str = "Failed to delete PDF";
pub const MSG_SESSION_DELETED: &str = "Session deleted successfully";
pub const MSG_SESSION_DELETE_FAILED: &str = "Failed to delete session";
pub const MSG_ANSWER_FAILED: &str = "Failed to get answer from the PDF. Please try again.";

/// 外壳层错误
#[derive(Error, Debug)]
pub enum ShellError {
    /// 客户端校验失败，没有发出请求
    #[error("校验失败: {0}")]
    Validation(String),

    /// 没有选中的文档
    #[error("No PDF selected")]
    NoSelection,

    /// 本地列表中没有该文件名
    #[error("No uploaded PDF named {0}")]
    UnknownDocument(String),

    /// 同名文件存在于多个会话中
    #[error("{name} exists in {count} sessions, choose one by session id")]
    AmbiguousDocument { name: String, count: usize },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// 面向用户的短暂提示
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
    pub created_at: Instant,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            text: text.into(),
            created_at: Instant::now(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            text: text.into(),
            created_at: Instant::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// 需要调用后端的操作
#[derive(Debug, Clone)]
pub enum ShellRequest {
    Hydrate,
    Upload(FilePayload),
    DeleteDocument { key: DocumentKey },
    DeleteSession { session_id: String },
}

/// 后端调用的结果，交给 [`Shell::apply`] 处理
#[derive(Debug, Clone)]
pub enum ShellOutcome {
    Hydrated(Result<Vec<FileRecord>, ApiError>),
    Uploaded {
        payload: FilePayload,
        result: Result<UploadResponse, ApiError>,
    },
    DocumentDeleted {
        key: DocumentKey,
        result: Result<StatusResponse, ApiError>,
    },
    SessionDeleted {
        session_id: String,
        result: Result<StatusResponse, ApiError>,
    },
}

impl ShellRequest {
    /// 执行后端调用（恰好一次请求）
    pub async fn execute(self, api: &dyn DocumentApi) -> ShellOutcome {
        match self {
            ShellRequest::Hydrate => ShellOutcome::Hydrated(api.list_documents().await),
            ShellRequest::Upload(payload) => {
                let result = api.upload_document(&payload).await;
                ShellOutcome::Uploaded { payload, result }
            }
            ShellRequest::DeleteDocument { key } => {
                let result = api.delete_document(&key.id).await;
                ShellOutcome::DocumentDeleted { key, result }
            }
            ShellRequest::DeleteSession { session_id } => {
                let result = api.delete_session(&session_id).await;
                ShellOutcome::SessionDeleted { session_id, result }
            }
        }
    }
}

/// 应用外壳：文档状态的唯一写入者
pub struct Shell {
    store: DocumentStore,
    api: Arc<dyn DocumentApi>,
}

impl Shell {
    /// 创建外壳，初始状态为空
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        Self {
            store: DocumentStore::new(),
            api,
        }
    }

    /// 后端接口（用于在后台任务中执行请求）
    pub fn api(&self) -> Arc<dyn DocumentApi> {
        self.api.clone()
    }

    /// 当前文档状态
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// 当前选中的文档
    pub fn selected(&self) -> Option<&Document> {
        self.store.selected()
    }

    /// 选中文档，不访问后端
    pub fn select(&mut self, key: &DocumentKey) -> bool {
        let found = self.store.select(key);
        if found {
            tracing::info!("选中文档: {}", key);
        } else {
            tracing::warn!("选中的文档不存在: {}", key);
        }
        found
    }

    /// 按文件名（可选会话）在本地列表中查找文档
    pub fn resolve(&self, name: &str, session_id: Option<&str>) -> Result<DocumentKey, ShellError> {
        let matches: Vec<&Document> = self
            .store
            .find_by_name(name)
            .filter(|d| session_id.map_or(true, |sid| d.session_id == sid))
            .collect();
        match matches.as_slice() {
            [] => Err(ShellError::UnknownDocument(name.to_string())),
            [doc] => Ok(doc.key()),
            _ => Err(ShellError::AmbiguousDocument {
                name: name.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// 上传前的本地校验
    pub fn upload_request(&self, payload: FilePayload) -> Result<ShellRequest, ShellError> {
        if !payload.is_pdf() {
            tracing::warn!(
                "拒绝上传非 PDF 文件: {} ({})",
                payload.file_name,
                payload.content_type
            );
            return Err(ShellError::Validation(MSG_NOT_PDF.to_string()));
        }
        Ok(ShellRequest::Upload(payload))
    }

    /// 删除文档的请求；本地不存在时返回 `None`，不发请求
    pub fn delete_document_request(&self, key: &DocumentKey) -> Option<ShellRequest> {
        match self.store.get(key) {
            Some(doc) => Some(ShellRequest::DeleteDocument { key: doc.key() }),
            None => {
                tracing::debug!("删除的文档不在本地列表中: {}", key);
                None
            }
        }
    }

    /// 删除会话的请求；不做本地存在性检查
    pub fn delete_session_request(&self, session_id: &str) -> ShellRequest {
        ShellRequest::DeleteSession {
            session_id: session_id.to_string(),
        }
    }

    /// 根据后端结果更新状态
    ///
    /// 加载成功时没有提示，其余情况各返回一条提示。失败时状态不变。
    pub fn apply(&mut self, outcome: ShellOutcome) -> Option<Notification> {
        match outcome {
            ShellOutcome::Hydrated(Ok(records)) => {
                tracing::info!("加载已有文件 {} 个", records.len());
                self.store.replace_all(records);
                None
            }
            ShellOutcome::Hydrated(Err(err)) => {
                tracing::error!("加载文件列表失败: {}", err);
                Some(Notification::error(MSG_LOAD_FAILED))
            }
            ShellOutcome::Uploaded {
                payload,
                result: Ok(response),
            } => {
                let document = Document::uploaded(response.filename, response.session_id, payload);
                let doc = self.store.insert_and_select(document);
                tracing::info!("已添加并选中文档: {} (会话 {})", doc.id, doc.session_id);
                Some(Notification::success(response.message))
            }
            ShellOutcome::Uploaded {
                payload,
                result: Err(err),
            } => {
                tracing::error!("上传 {} 失败: {}", payload.file_name, err);
                Some(Notification::error(MSG_UPLOAD_FAILED))
            }
            ShellOutcome::DocumentDeleted { key, result: Ok(_) } => {
                self.store.remove(&key);
                tracing::info!("已删除文档: {}", key);
                Some(Notification::success(MSG_DOCUMENT_DELETED))
            }
            ShellOutcome::DocumentDeleted { key, result: Err(err) } => {
                tracing::error!("删除文档 {} 失败: {}", key, err);
                Some(Notification::error(MSG_DELETE_FAILED))
            }
            ShellOutcome::SessionDeleted {
                session_id,
                result: Ok(_),
            } => {
                let removed = self.store.remove_session(&session_id);
                tracing::info!("已删除会话 {}，移除文档 {} 个", session_id, removed);
                Some(Notification::success(MSG_SESSION_DELETED))
            }
            ShellOutcome::SessionDeleted {
                session_id,
                result: Err(err),
            } => {
                tracing::error!("删除会话 {} 失败: {}", session_id, err);
                Some(Notification::error(MSG_SESSION_DELETE_FAILED))
            }
        }
    }

    /// 从后端加载已有文件
    pub async fn hydrate(&mut self) -> Option<Notification> {
        let outcome = ShellRequest::Hydrate.execute(self.api.as_ref()).await;
        self.apply(outcome)
    }

    /// 上传文件，成功后选中新文档
    pub async fn upload(&mut self, payload: FilePayload) -> Notification {
        let request = match self.upload_request(payload) {
            Ok(request) => request,
            Err(err) => return Notification::error(err.to_string_for_user()),
        };
        let outcome = request.execute(self.api.as_ref()).await;
        self.apply(outcome)
            .unwrap_or_else(|| Notification::error(MSG_UPLOAD_FAILED))
    }

    /// 删除单个文档；本地不存在时什么都不做
    pub async fn delete_document(&mut self, key: &DocumentKey) -> Option<Notification> {
        let request = self.delete_document_request(key)?;
        let outcome = request.execute(self.api.as_ref()).await;
        self.apply(outcome)
    }

    /// 删除会话
    pub async fn delete_session(&mut self, session_id: &str) -> Notification {
        let outcome = self
            .delete_session_request(session_id)
            .execute(self.api.as_ref())
            .await;
        self.apply(outcome)
            .unwrap_or_else(|| Notification::error(MSG_SESSION_DELETE_FAILED))
    }

    /// 提问目标文件名
    pub fn ask_target(&self) -> Result<String, ShellError> {
        self.store
            .selected()
            .map(|doc| doc.name.clone())
            .ok_or(ShellError::NoSelection)
    }

    /// 针对选中的文档提问
    pub async fn ask(&self, question: &str) -> Result<String, ShellError> {
        let filename = self.ask_target()?;
        ask_document(self.api.as_ref(), &filename, question).await
    }
}

/// 读取待上传的本地文件
pub async fn load_payload(path: &Path) -> Result<FilePayload, ShellError> {
    FilePayload::read(path).await.map_err(|err| {
        tracing::error!("读取文件 {} 失败: {}", path.display(), err);
        ShellError::Io(err)
    })
}

/// 针对指定文件提问，供后台任务使用
pub async fn ask_document(
    api: &dyn DocumentApi,
    filename: &str,
    question: &str,
) -> Result<String, ShellError> {
    match api.ask_question(filename, question).await {
        Ok(response) => Ok(response.answer),
        Err(err) => {
            tracing::error!("提问失败: {}", err);
            Err(ShellError::Api(err))
        }
    }
}

impl ShellError {
    /// 给用户看的文字
    pub fn to_string_for_user(&self) -> String {
        match self {
            ShellError::Validation(message) => message.clone(),
            ShellError::NoSelection
            | ShellError::UnknownDocument(_)
            | ShellError::AmbiguousDocument { .. } => self.to_string(),
            ShellError::Api(_) => MSG_ANSWER_FAILED.to_string(),
            ShellError::Io(err) => format!("Failed to read file: {err}"),
        }
    }
}
