//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责发起网络请求并把结果送回状态机，是会话的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! app (命令行交互)
//!     ↓
//! orchestrator::SessionDriver (发起请求 / 回收结果)
//!     ↓
//! workflow::StudySession (纯状态机：准入、落地、过期丢弃)
//!     ↓
//! services (端口：AnalysisService / ChatService)
//!     ↓
//! clients (HTTP 实现：StudyClient)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一所有者**：只有驱动器能修改会话状态
//! 2. **无锁**：请求任务只通过通道回传结果，不碰共享状态
//! 3. **不取消**：请求一旦发出就等它结束，结果是否生效由 epoch 决定

pub mod session_driver;

pub use session_driver::{Completion, RequestKind, SessionDriver};
