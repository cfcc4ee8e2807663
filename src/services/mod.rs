//! 服务端口 - 业务能力层
//!
//! 定义会话核心依赖的两个外部协作者。核心只认识这里的 trait，
//! 具体的 HTTP 实现在 `clients/`，测试里可以换成内存实现。

pub mod analysis_service;
pub mod chat_service;

pub use analysis_service::AnalysisService;
pub use chat_service::{ChatRequest, ChatService};

/// 文档分析接口路径
pub const ANALYZE_ENDPOINT: &str = "/api/analyze";
/// 问答接口路径
pub const CHAT_ENDPOINT: &str = "/api/chat";
