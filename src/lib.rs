//! # StudyAI Session
//!
//! 一个把笔记文档变成摘要、闪卡和测验，并围绕文档进行问答的客户端
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 持有 HTTP 连接，只负责请求和错误映射
//! - `StudyClient` - `/api/analyze` 与 `/api/chat` 的实现
//!
//! ### ② 端口层（Services）
//! - `services/` - 描述"核心需要什么能力"
//! - `AnalysisService` - 文档分析能力
//! - `ChatService` - 问答能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 纯同步状态机，不做任何 IO
//! - `DocumentSession` - 文档与分析结果（empty → analyzing → ready / errored）
//! - `FlipTracker` - 闪卡翻面状态
//! - `ChatTranscript` - 对话记录与问答状态
//! - `StudySession` - 组合以上三者，负责准入检查和过期响应丢弃
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - `SessionDriver` 发起请求、回收结果
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::StudyClient;
pub use config::Config;
pub use error::{ApiError, AppError, AppResult, SessionError};
pub use models::{AnalysisResult, Document, Flashcard, Message, QuizQuestion, Role};
pub use orchestrator::{Completion, RequestKind, SessionDriver};
pub use services::{AnalysisService, ChatRequest, ChatService};
pub use workflow::{ApplyOutcome, ChatStatus, SessionStatus, StudySession};
