/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；否则按 `verbose` 选择 debug 或 info。
/// 重复调用不会 panic（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 StudyAI 会话客户端启动");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 后端地址: {}", config.api_base_url);
    info!(
        "⏱️ 超时: 分析 {}秒 / 问答 {}秒",
        config.analyze_timeout_secs, config.chat_timeout_secs
    );
    info!("{}", "=".repeat(60));
}

/// 记录会话结束统计
///
/// # 参数
/// - `analyses`: 成功落地的分析次数
/// - `questions`: 发出的问题数量
pub fn log_shutdown(analyses: usize, questions: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 会话结束");
    info!(
        "结束时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📄 分析文档: {} 次", analyses);
    info!("💬 提问: {} 次", questions);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
