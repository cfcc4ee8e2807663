/// StudyAI 后端 HTTP 客户端
///
/// 封装 `/api/analyze` 与 `/api/chat` 两个接口的调用和错误映射
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{AnalysisResult, Document};
use crate::services::{AnalysisService, ChatRequest, ChatService, ANALYZE_ENDPOINT, CHAT_ENDPOINT};

/// 分析接口未给出错误信息时的兜底文案
pub const ANALYZE_FALLBACK_MESSAGE: &str = "Something went wrong";
/// 问答接口非 2xx 时的固定文案
pub const CHAT_FALLBACK_MESSAGE: &str = "Failed to get chat response";

/// 错误响应体 `{error: string}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// 问答响应体 `{answer: string}`
#[derive(Debug, Deserialize)]
struct ChatResponse {
    answer: String,
}

/// StudyAI 后端客户端
#[derive(Clone)]
pub struct StudyClient {
    http: reqwest::Client,
    base_url: String,
}

impl StudyClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::request_failed("client", e))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 指向其他后端地址（测试里指向 mock server）
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 上传文档并获取分析结果
    ///
    /// 非 2xx 时优先使用响应体中的 `error` 字段，否则使用兜底文案。
    pub async fn analyze_document(&self, document: &Document) -> Result<AnalysisResult, ApiError> {
        debug!(
            "上传文档: {} ({} 字节, {})",
            document.file_name,
            document.len(),
            document.mime_type
        );

        let part = Part::bytes(document.bytes.clone())
            .file_name(document.file_name.clone())
            .mime_str(&document.mime_type)
            .map_err(|e| ApiError::request_failed(ANALYZE_ENDPOINT, e))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.url(ANALYZE_ENDPOINT))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("分析请求发送失败: {}", e);
                ApiError::request_failed(ANALYZE_ENDPOINT, e)
            })?;

        let status = response.status();
        let body = read_body(ANALYZE_ENDPOINT, response).await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| ANALYZE_FALLBACK_MESSAGE.to_string());
            warn!("分析接口返回 {}: {}", status, message);
            return Err(ApiError::BadResponse {
                endpoint: ANALYZE_ENDPOINT.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| ApiError::json_parse_failed(ANALYZE_ENDPOINT, e))
    }

    /// 发送问题并获取回答
    pub async fn send_question(&self, request: &ChatRequest) -> Result<String, ApiError> {
        debug!("发送问题 (会话 {}): {}", request.session_id, request.question);

        let response = self
            .http
            .post(self.url(CHAT_ENDPOINT))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("问答请求发送失败: {}", e);
                ApiError::request_failed(CHAT_ENDPOINT, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("问答接口返回 {}", status);
            return Err(ApiError::BadResponse {
                endpoint: CHAT_ENDPOINT.to_string(),
                status: status.as_u16(),
                message: CHAT_FALLBACK_MESSAGE.to_string(),
            });
        }

        let body = read_body(CHAT_ENDPOINT, response).await?;
        let chat: ChatResponse = serde_json::from_slice(&body)
            .map_err(|e| ApiError::json_parse_failed(CHAT_ENDPOINT, e))?;
        Ok(chat.answer)
    }
}

async fn read_body(endpoint: &str, response: Response) -> Result<Vec<u8>, ApiError> {
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| ApiError::request_failed(endpoint, e))
}

#[async_trait]
impl AnalysisService for StudyClient {
    async fn analyze(&self, document: &Document) -> Result<AnalysisResult, ApiError> {
        self.analyze_document(document).await
    }
}

#[async_trait]
impl ChatService for StudyClient {
    async fn ask(&self, request: &ChatRequest) -> Result<String, ApiError> {
        self.send_question(request).await
    }
}
