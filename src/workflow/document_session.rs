//! 文档会话
//!
//! 持有当前唯一的文档及其分析结果：empty → analyzing → ready / errored → (reset) → empty

use tracing::info;
use uuid::Uuid;

use crate::error::SessionError;
use crate::models::{AnalysisResult, Document};

/// 文档会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// 没有分析结果
    Empty,
    /// 分析请求进行中
    Analyzing,
    /// 分析结果可用
    Ready,
    /// 上一次分析失败
    Errored,
}

/// 文档会话
#[derive(Debug)]
pub struct DocumentSession {
    status: SessionStatus,
    document: Option<Document>,
    result: Option<AnalysisResult>,
    error: Option<String>,
    session_id: Option<Uuid>,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Empty,
            document: None,
            result: None,
            error: None,
            session_id: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// 分析失败时展示给用户的错误
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 分析成功后分配的会话 ID
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// 记录待提交的文档，替换之前选中的文档
    pub fn select_document(&mut self, document: Document) {
        info!("📄 选中文档: {} ({} 字节)", document.file_name, document.len());
        self.document = Some(document);
    }

    /// 进入分析状态，返回要上传的文档
    ///
    /// 旧的分析结果在这里就被丢弃，分析失败时不会恢复。
    pub fn begin_analysis(&mut self) -> Result<Document, SessionError> {
        if self.status == SessionStatus::Analyzing {
            return Err(SessionError::AnalysisInProgress);
        }
        let document = self
            .document
            .clone()
            .ok_or(SessionError::NoDocumentSelected)?;

        self.status = SessionStatus::Analyzing;
        self.result = None;
        self.error = None;
        self.session_id = None;
        Ok(document)
    }

    /// 安装分析结果，返回新的会话 ID
    pub fn finish_success(&mut self, result: AnalysisResult) -> Uuid {
        let session_id = Uuid::new_v4();
        info!(
            "✓ 分析完成: {} 张闪卡, {} 道测验, {} 个推荐问题 (会话 {})",
            result.flashcards.len(),
            result.quiz.len(),
            result.suggested_questions.len(),
            session_id
        );
        self.status = SessionStatus::Ready;
        self.result = Some(result);
        self.error = None;
        self.session_id = Some(session_id);
        session_id
    }

    /// 记录分析失败
    ///
    /// 同时清掉已选文档：重新提交前必须重新选择文件。
    pub fn finish_failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("❌ 分析失败: {}", message);
        self.status = SessionStatus::Errored;
        self.result = None;
        self.session_id = None;
        self.document = None;
        self.error = Some(message);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}
