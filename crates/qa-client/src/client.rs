//! HTTP 客户端
//!
//! 基于 reqwest 的后端调用实现。非 2xx 响应一律转换为
//! [`ApiError::Http`]，保留状态码和原始响应文本，不假设错误体是 JSON。

use crate::config::ClientConfig;
use crate::document::FilePayload;
use crate::traits::DocumentApi;
use crate::types::{
    AskResponse, BackendStatus, FileRecord, FilesResponse, HealthResponse, StatusResponse,
    UploadResponse,
};
use crate::{ApiError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// 路径段中需要转义的字符
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// 后端 HTTP 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// 按配置创建客户端
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    /// 后端基础地址
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 健康检查
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.send(self.client.get(self.url("/health"))).await?;
        decode(response).await
    }

    /// 跨域诊断接口，仅用于调试
    pub async fn test_cors(&self) -> Result<serde_json::Value> {
        tracing::debug!("请求 /test-cors");
        let response = self.send(self.client.get(self.url("/test-cors"))).await?;
        tracing::debug!("/test-cors 响应状态: {}", response.status());
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// 发送请求并检查状态码
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("后端返回错误状态 {}: {}", status, body);
        Err(ApiError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// 解析 2xx 响应体，并把 `"status": "error"` 转为错误
async fn decode<T>(response: Response) -> Result<T>
where
    T: DeserializeOwned + BackendStatus,
{
    let body = response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))?;

    if body.is_rejected() {
        let message = body.failure_message().unwrap_or_default().to_string();
        tracing::warn!("后端拒绝请求: {}", message);
        return Err(ApiError::Rejected { message });
    }
    Ok(body)
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

#[async_trait::async_trait]
impl DocumentApi for ApiClient {
    async fn upload_document(&self, payload: &FilePayload) -> Result<UploadResponse> {
        tracing::info!("上传文件: {} ({} 字节)", payload.file_name, payload.len());

        let part = Part::bytes(payload.bytes.clone())
            .file_name(payload.file_name.clone())
            .mime_str(&payload.content_type)
            .map_err(|e| ApiError::Configuration(format!("无效的 MIME 类型: {e}")))?;
        let form = Form::new().part("file", part);

        let response = self
            .send(self.client.post(self.url("/upload")).multipart(form))
            .await?;
        let result: UploadResponse = decode(response).await?;

        if result.session_id.is_empty() || result.filename.is_empty() {
            return Err(ApiError::Decode("上传响应缺少 filename 或 session_id".to_string()));
        }
        tracing::info!("上传成功: {} (会话 {})", result.filename, result.session_id);
        Ok(result)
    }

    async fn ask_question(&self, filename: &str, question: &str) -> Result<AskResponse> {
        tracing::info!("提问: {} - {}", filename, question);

        let form = Form::new()
            .text("filename", filename.to_string())
            .text("question", question.to_string());

        let response = self
            .send(self.client.post(self.url("/ask")).multipart(form))
            .await?;
        let result: AskResponse = decode(response).await?;
        tracing::debug!("收到回答 ({} 字符)", result.answer.len());
        Ok(result)
    }

    async fn list_documents(&self) -> Result<Vec<FileRecord>> {
        let response = self.send(self.client.get(self.url("/files"))).await?;
        let result: FilesResponse = decode(response).await?;
        tracing::debug!("后端共有 {} 个文件", result.files.len());
        Ok(result.files)
    }

    async fn delete_document(&self, filename: &str) -> Result<StatusResponse> {
        let url = self.url(&format!("/files/{}", encode_segment(filename)));
        tracing::info!("删除文件: {}", filename);
        let response = self.send(self.client.delete(url)).await?;
        decode(response).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<StatusResponse> {
        let url = self.url(&format!("/session/{}", encode_segment(session_id)));
        tracing::info!("删除会话: {}", session_id);
        let response = self.send(self.client.delete(url)).await?;
        decode(response).await
    }
}
