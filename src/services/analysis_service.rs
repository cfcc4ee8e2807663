use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{AnalysisResult, Document};

/// 文档分析服务
///
/// 接收一份文档，返回摘要、闪卡、测验和推荐问题。
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, document: &Document) -> Result<AnalysisResult, ApiError>;
}
