//! 对话记录
//!
//! 只追加、不改写。每条用户消息之后恰好跟一条助手消息（回答或错误），
//! 然后才允许下一条用户消息。

use tracing::{debug, info};

use crate::models::{Message, Role};
use crate::utils::truncate_text;

/// 分析成功后的第一条助手消息
pub const GREETING: &str =
    "Hi! Ask me any question about your notes or pick a suggested question below.";

/// 问答状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStatus {
    Idle,
    AwaitingAnswer,
}

/// 对话记录
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    messages: Vec<Message>,
    status: ChatStatus,
    pending_input: String,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            status: ChatStatus::Idle,
            pending_input: String::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// 新会话开始：只保留一条问候消息
    pub fn start_with_greeting(&mut self) {
        self.messages.clear();
        self.messages.push(Message::assistant(GREETING));
        self.status = ChatStatus::Idle;
    }

    /// 尝试接收一个问题
    ///
    /// 空白问题或正在等待回答时返回 `None`，且不做任何修改；
    /// 接收后立即追加用户消息、清空输入框并进入等待状态。
    pub fn begin_question(&mut self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        if self.status == ChatStatus::AwaitingAnswer {
            debug!("已有问题在等待回答，忽略: {}", truncate_text(text, 40));
            return None;
        }

        info!("💬 提问: {}", truncate_text(text, 80));
        self.messages.push(Message::user(text));
        self.pending_input.clear();
        self.status = ChatStatus::AwaitingAnswer;
        Some(text.to_string())
    }

    /// 记录回答
    pub fn record_answer(&mut self, answer: impl Into<String>) {
        self.push_assistant(answer.into());
    }

    /// 记录失败：以助手消息的形式展示错误
    pub fn record_failure(&mut self, description: &str) {
        self.push_assistant(format!("Error: {}", description));
    }

    fn push_assistant(&mut self, text: String) {
        debug_assert_eq!(self.status, ChatStatus::AwaitingAnswer);
        debug_assert_eq!(self.messages.last().map(|m| m.role), Some(Role::User));
        self.messages.push(Message::assistant(text));
        self.status = ChatStatus::Idle;
    }

    /// 清空记录、输入框和等待状态
    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending_input.clear();
        self.status = ChatStatus::Idle;
    }
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeted() -> ChatTranscript {
        let mut transcript = ChatTranscript::new();
        transcript.start_with_greeting();
        transcript
    }

    #[test]
    fn test_blank_questions_are_ignored() {
        let mut transcript = greeted();
        assert_eq!(transcript.begin_question(""), None);
        assert_eq!(transcript.begin_question("   "), None);
        assert_eq!(transcript.messages().len(), 1);
        assert_eq!(transcript.status(), ChatStatus::Idle);
    }

    #[test]
    fn test_question_appended_before_answer() {
        let mut transcript = greeted();
        transcript.set_input("What is S?");

        assert_eq!(transcript.begin_question("What is S?"), Some("What is S?".to_string()));
        assert_eq!(transcript.messages().last(), Some(&Message::user("What is S?")));
        assert_eq!(transcript.status(), ChatStatus::AwaitingAnswer);
        assert_eq!(transcript.pending_input(), "");
    }

    #[test]
    fn test_second_question_rejected_while_waiting() {
        let mut transcript = greeted();
        transcript.begin_question("first").unwrap();

        assert_eq!(transcript.begin_question("second"), None);
        assert_eq!(transcript.messages().len(), 2);

        transcript.record_answer("answer");
        assert!(transcript.begin_question("second").is_some());
    }

    #[test]
    fn test_failure_keeps_user_message() {
        let mut transcript = greeted();
        transcript.begin_question("hi").unwrap();
        transcript.record_failure("Failed to get chat response");

        let messages = transcript.messages();
        assert_eq!(messages[1], Message::user("hi"));
        assert_eq!(
            messages[2],
            Message::assistant("Error: Failed to get chat response")
        );
        assert_eq!(transcript.status(), ChatStatus::Idle);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut transcript = greeted();
        transcript.begin_question("hi").unwrap();
        transcript.set_input("draft");

        transcript.clear();
        assert!(transcript.messages().is_empty());
        assert_eq!(transcript.pending_input(), "");
        assert_eq!(transcript.status(), ChatStatus::Idle);
    }
}
