//! 会话驱动器 - 编排层
//!
//! ## 职责
//!
//! 1. **唯一所有者**：持有 `StudySession`，所有状态变化都在这里发生
//! 2. **发起请求**：每个请求放进独立的 tokio 任务，带超时
//! 3. **结果回传**：任务完成后通过 mpsc 通道把结果送回，由驱动器落地
//!
//! 请求在途时用户操作（包括 `reset`）照常进行；
//! 过期结果由 `StudySession::apply_*` 按 epoch 丢弃。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, SessionError};
use crate::models::{AnalysisResult, Document};
use crate::services::{AnalysisService, ChatRequest, ChatService, ANALYZE_ENDPOINT, CHAT_ENDPOINT};
use crate::workflow::{AnalysisTicket, ApplyOutcome, ChatTicket, StudySession};

/// 请求种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Analysis,
    Chat,
}

/// 一次请求完成后的落地报告
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub kind: RequestKind,
    pub outcome: ApplyOutcome,
}

/// 任务回传的原始结果
enum Finished {
    Analysis(AnalysisTicket, Result<AnalysisResult, ApiError>),
    Chat(ChatTicket, Result<String, ApiError>),
}

/// 会话驱动器
pub struct SessionDriver<A, C> {
    session: StudySession,
    analysis: Arc<A>,
    chat: Arc<C>,
    analyze_timeout: Duration,
    chat_timeout: Duration,
    tx: mpsc::UnboundedSender<Finished>,
    rx: mpsc::UnboundedReceiver<Finished>,
    in_flight: usize,
}

impl<A, C> SessionDriver<A, C>
where
    A: AnalysisService + 'static,
    C: ChatService + 'static,
{
    /// 创建新的驱动器
    pub fn new(analysis: Arc<A>, chat: Arc<C>, config: &Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: StudySession::new(),
            analysis,
            chat,
            analyze_timeout: config.analyze_timeout(),
            chat_timeout: config.chat_timeout(),
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// 当前会话状态（只读）
    pub fn session(&self) -> &StudySession {
        &self.session
    }

    /// 尚未落地的请求数量
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn select_document(&mut self, document: Document) {
        self.session.select_document(document);
    }

    /// 提交已选文档进行分析
    pub fn submit(&mut self) -> Result<(), SessionError> {
        let ticket = self.session.begin_submit()?;
        let service = Arc::clone(&self.analysis);
        let document = ticket.document.clone();

        self.spawn_request(
            ANALYZE_ENDPOINT,
            self.analyze_timeout,
            async move { service.analyze(&document).await },
            move |result| Finished::Analysis(ticket, result),
        );
        Ok(())
    }

    /// 重置会话；在途请求不取消，其结果到达后会被丢弃
    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn toggle(&mut self, index: usize) -> Result<bool, SessionError> {
        self.session.toggle(index)
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.session.set_input(text);
    }

    /// 提问，返回问题是否被接收
    pub fn ask(&mut self, text: &str) -> Result<bool, SessionError> {
        let ticket = self.session.ask(text)?;
        Ok(self.dispatch_chat(ticket))
    }

    /// 提交输入框中的问题
    pub fn ask_pending(&mut self) -> Result<bool, SessionError> {
        let ticket = self.session.ask_pending()?;
        Ok(self.dispatch_chat(ticket))
    }

    /// 点击第 `index` 个推荐问题
    pub fn ask_suggested(&mut self, index: usize) -> Result<bool, SessionError> {
        let ticket = self.session.ask_suggested(index)?;
        Ok(self.dispatch_chat(ticket))
    }

    fn dispatch_chat(&mut self, ticket: Option<ChatTicket>) -> bool {
        let Some(ticket) = ticket else {
            return false;
        };
        let service = Arc::clone(&self.chat);
        let request = ChatRequest {
            question: ticket.question.clone(),
            session_id: ticket.session_id,
        };

        self.spawn_request(
            CHAT_ENDPOINT,
            self.chat_timeout,
            async move { service.ask(&request).await },
            move |result| Finished::Chat(ticket, result),
        );
        true
    }

    /// 在独立任务中执行请求，超时按失败处理，完成后把结果送回通道
    fn spawn_request<T, F, W>(
        &mut self,
        endpoint: &'static str,
        timeout: Duration,
        request: F,
        wrap: W,
    ) where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
        W: FnOnce(Result<T, ApiError>) -> Finished + Send + 'static,
    {
        let tx = self.tx.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, tokio::spawn(request)).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_error)) => {
                    warn!("请求任务异常退出 ({}): {}", endpoint, join_error);
                    Err(ApiError::request_failed(endpoint, join_error))
                }
                Err(_) => {
                    warn!("请求超时 ({}): {}秒", endpoint, timeout.as_secs());
                    Err(ApiError::Timeout {
                        endpoint: endpoint.to_string(),
                        secs: timeout.as_secs(),
                    })
                }
            };
            // 驱动器已被释放时接收端不存在，结果无人需要
            let _ = tx.send(wrap(result));
        });
    }

    /// 等待下一个请求完成并落地
    ///
    /// 没有在途请求时立即返回 `None`。
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }
        let finished = self.rx.recv().await?;
        self.in_flight -= 1;

        let completion = match finished {
            Finished::Analysis(ticket, result) => Completion {
                kind: RequestKind::Analysis,
                outcome: self.session.apply_analysis(ticket, result),
            },
            Finished::Chat(ticket, result) => Completion {
                kind: RequestKind::Chat,
                outcome: self.session.apply_chat(ticket, result),
            },
        };
        debug!("请求完成: {:?}", completion);
        Some(completion)
    }

    /// 等待所有在途请求落地
    pub async fn settle(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Some(completion) = self.next_completion().await {
            completions.push(completion);
        }
        completions
    }
}
