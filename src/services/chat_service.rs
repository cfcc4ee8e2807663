use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// 问答请求体
///
/// 每次请求都带上会话 ID，后端不需要再靠隐式的"当前文档"定位上下文。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: String,
    pub session_id: Uuid,
}

/// 问答服务
#[async_trait]
pub trait ChatService: Send + Sync {
    /// 返回助手的回答文本
    async fn ask(&self, request: &ChatRequest) -> Result<String, ApiError>;
}
