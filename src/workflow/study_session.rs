//! 学习会话状态机 - 流程层
//!
//! 把文档会话、闪卡翻面和对话记录组合成一个状态机。
//!
//! 每个网络请求拆成两步：
//! 1. `begin_*`：准入检查 + 同步生效的状态变化，返回一张票据
//! 2. `apply_*`：拿票据和请求结果回来落地
//!
//! 票据上带着发起时的 epoch。`submit` 和 `reset` 都会推进 epoch，
//! 落地时 epoch 对不上的结果直接丢弃（过期响应）。

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, SessionError};
use crate::models::{AnalysisResult, Document, Message};
use crate::workflow::chat_transcript::{ChatStatus, ChatTranscript};
use crate::workflow::document_session::{DocumentSession, SessionStatus};
use crate::workflow::flip_tracker::FlipTracker;

/// 分析请求票据
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    epoch: u64,
    pub document: Document,
}

/// 问答请求票据
#[derive(Debug, Clone)]
pub struct ChatTicket {
    epoch: u64,
    pub session_id: Uuid,
    pub question: String,
}

impl AnalysisTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl ChatTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// 请求结果落地的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// 已更新会话状态
    Applied,
    /// 会话在请求期间被重置或替换，结果被丢弃
    Stale,
}

/// 学习会话
#[derive(Debug, Default)]
pub struct StudySession {
    epoch: u64,
    document: DocumentSession,
    flips: FlipTracker,
    transcript: ChatTranscript,
}

impl StudySession {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== 只读访问 ==========

    pub fn status(&self) -> SessionStatus {
        self.document.status()
    }

    pub fn chat_status(&self) -> ChatStatus {
        self.transcript.status()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.document.result()
    }

    pub fn error(&self) -> Option<&str> {
        self.document.error()
    }

    pub fn selected_document(&self) -> Option<&Document> {
        self.document.document()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.document.session_id()
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn pending_input(&self) -> &str {
        self.transcript.pending_input()
    }

    pub fn flips(&self) -> &FlipTracker {
        &self.flips
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// 第 `index` 张闪卡当前朝上的文字
    pub fn visible_face(&self, index: usize) -> Option<&str> {
        let card = self.result()?.flashcards.get(index)?;
        if self.flips.is_revealed(index) {
            Some(card.back.as_str())
        } else {
            Some(card.front.as_str())
        }
    }

    // ========== 文档会话 ==========

    pub fn select_document(&mut self, document: Document) {
        self.document.select_document(document);
    }

    /// 发起分析
    ///
    /// 需要已选文档且当前不在分析中。接收后立刻丢弃旧结果、翻面状态和对话记录。
    pub fn begin_submit(&mut self) -> Result<AnalysisTicket, SessionError> {
        let document = self.document.begin_analysis()?;
        self.epoch += 1;
        self.flips.clear();
        self.transcript.clear();
        info!(
            "🔍 开始分析文档: {} (epoch {})",
            document.file_name, self.epoch
        );
        Ok(AnalysisTicket {
            epoch: self.epoch,
            document,
        })
    }

    /// 分析结果落地
    pub fn apply_analysis(
        &mut self,
        ticket: AnalysisTicket,
        outcome: Result<AnalysisResult, ApiError>,
    ) -> ApplyOutcome {
        if ticket.epoch != self.epoch || self.status() != SessionStatus::Analyzing {
            debug!(
                "丢弃过期的分析结果 (请求 epoch {}, 当前 epoch {})",
                ticket.epoch, self.epoch
            );
            return ApplyOutcome::Stale;
        }

        match outcome {
            Ok(result) => {
                self.document.finish_success(result);
                self.flips.clear();
                self.transcript.start_with_greeting();
            }
            Err(e) => {
                self.document.finish_failure(e.user_message());
            }
        }
        ApplyOutcome::Applied
    }

    /// 回到空状态；可重复调用
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.document.reset();
        self.flips.clear();
        self.transcript.clear();
        info!("🔄 会话已重置 (epoch {})", self.epoch);
    }

    // ========== 闪卡 ==========

    /// 翻转闪卡，返回翻转后是否显示背面
    pub fn toggle(&mut self, index: usize) -> Result<bool, SessionError> {
        let card_count = self.result().map(|r| r.flashcards.len()).unwrap_or(0);
        self.flips.toggle(index, card_count)
    }

    // ========== 问答 ==========

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.transcript.set_input(text);
    }

    /// 提问
    ///
    /// - 空白问题、或已有问题在等回答：返回 `Ok(None)`，不修改任何状态
    /// - 没有可用的分析结果：返回 `NoActiveSession`
    /// - 接收：立即追加用户消息，返回票据
    pub fn ask(&mut self, text: &str) -> Result<Option<ChatTicket>, SessionError> {
        if text.trim().is_empty() || self.chat_status() == ChatStatus::AwaitingAnswer {
            return Ok(None);
        }
        let session_id = match (self.status(), self.session_id()) {
            (SessionStatus::Ready, Some(id)) => id,
            _ => return Err(SessionError::NoActiveSession),
        };

        Ok(self
            .transcript
            .begin_question(text)
            .map(|question| ChatTicket {
                epoch: self.epoch,
                session_id,
                question,
            }))
    }

    /// 提交输入框中的内容
    pub fn ask_pending(&mut self) -> Result<Option<ChatTicket>, SessionError> {
        let text = self.transcript.pending_input().to_string();
        self.ask(&text)
    }

    /// 点击推荐问题，等同于直接提问；同一个问题可以反复点
    pub fn ask_suggested(&mut self, index: usize) -> Result<Option<ChatTicket>, SessionError> {
        let suggestions = self
            .result()
            .map(|r| r.suggested_questions.as_slice())
            .ok_or(SessionError::NoActiveSession)?;
        let question = suggestions
            .get(index)
            .cloned()
            .ok_or(SessionError::SuggestionOutOfRange {
                index,
                len: suggestions.len(),
            })?;
        self.ask(&question)
    }

    /// 回答落地：成功追加回答，失败追加错误消息
    pub fn apply_chat(
        &mut self,
        ticket: ChatTicket,
        outcome: Result<String, ApiError>,
    ) -> ApplyOutcome {
        if ticket.epoch != self.epoch || self.chat_status() != ChatStatus::AwaitingAnswer {
            debug!(
                "丢弃过期的回答 (请求 epoch {}, 当前 epoch {})",
                ticket.epoch, self.epoch
            );
            return ApplyOutcome::Stale;
        }

        match outcome {
            Ok(answer) => self.transcript.record_answer(answer),
            Err(e) => self.transcript.record_failure(&e.user_message()),
        }
        ApplyOutcome::Applied
    }
}
