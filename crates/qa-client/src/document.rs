//! 文档模型
//!
//! 客户端跟踪的已上传 PDF 记录。

use crate::types::FileRecord;
use std::path::Path;

/// PDF 的 MIME 类型
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// 无法识别时的 MIME 类型
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// 本地文件内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    /// 文件名（不含目录）
    pub file_name: String,
    /// 声明的 MIME 类型
    pub content_type: String,
    /// 文件字节
    pub bytes: Vec<u8>,
}

impl FilePayload {
    /// 创建新的文件内容，MIME 类型由扩展名推断
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// 显式指定 MIME 类型
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// 从本地路径读取
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("路径没有文件名: {}", path.display()),
                )
            })?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, bytes))
    }

    /// 声明类型是否为 PDF
    pub fn is_pdf(&self) -> bool {
        self.content_type == PDF_CONTENT_TYPE
    }

    /// 文件大小（字节）
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 根据文件名推断 MIME 类型
pub fn content_type_for(file_name: &str) -> &'static str {
    let is_pdf = Path::new(file_name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if is_pdf {
        PDF_CONTENT_TYPE
    } else {
        FALLBACK_CONTENT_TYPE
    }
}

/// 聊天面板需要的文档能力
pub trait DocumentRef {
    /// 文档 ID
    fn id(&self) -> &str;
    /// 显示名称，也是向后端提问时使用的文件名
    fn name(&self) -> &str;
}

/// 文档在集合中的唯一标识
///
/// 后端不要求文件名唯一：同一文件名可以出现在多个会话里，
/// 所以用（文件名，会话）区分文档。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub id: String,
    pub session_id: String,
}

impl DocumentKey {
    pub fn new(id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
        }
    }

    /// 是否指向该文档
    pub fn matches(&self, doc: &Document) -> bool {
        self.id == doc.id && self.session_id == doc.session_id
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (会话 {})", self.id, short_session_id(&self.session_id))
    }
}

/// 已上传的文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// 文档 ID（当前等于服务端文件名）
    pub id: String,
    /// 显示名称
    pub name: String,
    /// 后端分配的会话 ID
    pub session_id: String,
    /// 上传时间（ISO-8601）
    pub upload_timestamp: String,
    /// 本进程上传的文件内容；从列表加载的文档没有
    pub payload: Option<FilePayload>,
}

impl Document {
    /// 由上传结果创建，时间戳取当前时间
    pub fn uploaded(filename: String, session_id: String, payload: FilePayload) -> Self {
        Self {
            id: filename.clone(),
            name: filename,
            session_id,
            upload_timestamp: chrono::Utc::now().to_rfc3339(),
            payload: Some(payload),
        }
    }

    /// 由后端列表记录创建
    pub fn from_record(record: FileRecord) -> Self {
        Self {
            id: record.filename.clone(),
            name: record.filename,
            session_id: record.session_id,
            upload_timestamp: record.upload_timestamp.unwrap_or_default(),
            payload: None,
        }
    }

    /// 在集合中的标识
    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(self.id.clone(), self.session_id.clone())
    }

    /// 会话 ID 的短格式，用于界面显示
    pub fn short_session_id(&self) -> String {
        short_session_id(&self.session_id)
    }
}

impl DocumentRef for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 取会话 ID 前 8 个字符
pub fn short_session_id(session_id: &str) -> String {
    session_id.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for("report.pdf"), PDF_CONTENT_TYPE);
        assert_eq!(content_type_for("REPORT.PDF"), PDF_CONTENT_TYPE);
        assert_eq!(content_type_for("notes.txt"), "application/octet-stream");
        assert_eq!(content_type_for("pdf"), "application/octet-stream");
    }

    #[test]
    fn test_payload_declared_type() {
        let payload = FilePayload::new("a.pdf", b"%PDF-1.4".to_vec());
        assert!(payload.is_pdf());
        assert_eq!(payload.len(), 8);

        let payload = payload.with_content_type("text/plain");
        assert!(!payload.is_pdf());
    }

    #[test]
    fn test_from_record_has_no_payload() {
        let doc = Document::from_record(FileRecord {
            filename: "a.pdf".to_string(),
            upload_timestamp: Some("2024-05-01T10:00:00".to_string()),
            session_id: "0123456789abcdef".to_string(),
        });
        assert_eq!(doc.id, "a.pdf");
        assert_eq!(doc.name, "a.pdf");
        assert!(doc.payload.is_none());
        assert_eq!(doc.upload_timestamp, "2024-05-01T10:00:00");
        assert_eq!(doc.short_session_id(), "01234567");
    }

    #[test]
    fn test_uploaded_keeps_payload() {
        let payload = FilePayload::new("b.pdf", vec![1, 2, 3]);
        let doc = Document::uploaded("b.pdf".to_string(), "s1".to_string(), payload.clone());
        assert_eq!(doc.payload, Some(payload));
        assert!(!doc.upload_timestamp.is_empty());
    }

    #[test]
    fn test_key_distinguishes_sessions() {
        let first = Document::from_record(FileRecord {
            filename: "a.pdf".to_string(),
            upload_timestamp: None,
            session_id: "s1".to_string(),
        });
        let second = Document {
            session_id: "s2".to_string(),
            ..first.clone()
        };

        assert_ne!(first.key(), second.key());
        assert!(first.key().matches(&first));
        assert!(!first.key().matches(&second));
    }

    #[tokio::test]
    async fn test_read_payload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let payload = FilePayload::read(&path).await.unwrap();
        assert_eq!(payload.file_name, "paper.pdf");
        assert!(payload.is_pdf());
        assert_eq!(payload.bytes, b"%PDF-1.7");
    }
}
