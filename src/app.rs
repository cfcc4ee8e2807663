//! 命令行交互 - 展示层
//!
//! 逐行读取标准输入，把命令交给 `SessionDriver`，并在请求完成时输出结果。
//! 输入和请求完成事件在同一个循环里处理，分析进行中也可以 `/reset`。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::clients::StudyClient;
use crate::config::Config;
use crate::error::SessionError;
use crate::models::{Document, Role};
use crate::orchestrator::{Completion, RequestKind, SessionDriver};
use crate::utils::logging;
use crate::workflow::{ApplyOutcome, ChatStatus, SessionStatus, StudySession};

const HELP: &str = "\
命令:
  /open <路径>   选择要分析的文档 (.txt / .pdf)
  /analyze       上传并分析已选文档
  /summary       查看摘要
  /cards         查看闪卡
  /flip <n>      翻转第 n 张闪卡
  /quiz          查看测验
  /suggest       查看推荐问题
  /pick <n>      提问第 n 个推荐问题
  /chat          查看对话记录
  /status        查看会话状态
  /reset         重新开始 (分析另一份文档)
  /help          显示本帮助
  /quit          退出
其他任意文字会作为问题发送给 StudyBot。";

/// 用户命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(PathBuf),
    Analyze,
    Summary,
    Cards,
    /// 从 0 开始的闪卡索引
    Flip(usize),
    Quiz,
    Suggestions,
    /// 从 0 开始的推荐问题索引
    Pick(usize),
    Ask(String),
    Transcript,
    Status,
    Reset,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    /// 解析一行输入；空行返回 `None`
    ///
    /// 界面上的编号从 1 开始，这里统一换算成从 0 开始的索引。
    pub fn parse(line: &str) -> Option<Command> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Some(Command::Ask(line.trim_end_matches(['\r', '\n']).to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name {
            "open" if !arg.is_empty() => Command::Open(PathBuf::from(arg)),
            "analyze" => Command::Analyze,
            "summary" => Command::Summary,
            "cards" => Command::Cards,
            "flip" => match parse_position(arg) {
                Some(index) => Command::Flip(index),
                None => Command::Invalid(format!("无效的闪卡编号: '{}'", arg)),
            },
            "quiz" => Command::Quiz,
            "suggest" => Command::Suggestions,
            "pick" => match parse_position(arg) {
                Some(index) => Command::Pick(index),
                None => Command::Invalid(format!("无效的问题编号: '{}'", arg)),
            },
            "chat" => Command::Transcript,
            "status" => Command::Status,
            "reset" => Command::Reset,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Invalid(format!("未知命令: /{}", rest)),
        };
        Some(command)
    }
}

/// 把从 1 开始的编号换算成索引
fn parse_position(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok()?.checked_sub(1)
}

/// 应用主结构
pub struct App {
    driver: SessionDriver<StudyClient, StudyClient>,
    analyses: usize,
    questions: usize,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let client = Arc::new(StudyClient::new(&config)?);
        let driver = SessionDriver::new(Arc::clone(&client), client, &config);

        Ok(Self {
            driver,
            analyses: 0,
            questions: 0,
        })
    }

    /// 运行交互循环，直到 `/quit` 或输入结束
    pub async fn run(&mut self) -> Result<()> {
        println!("📚 StudyAI - 上传笔记，生成摘要、闪卡和测验");
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    let Some(command) = Command::parse(&line) else {
                        continue;
                    };
                    if command == Command::Quit {
                        break;
                    }
                    self.handle(command).await;
                }
                Some(completion) = self.driver.next_completion(), if self.driver.in_flight() > 0 => {
                    self.on_completion(completion);
                }
            }
        }

        logging::log_shutdown(self.analyses, self.questions);
        Ok(())
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Open(path) => match Document::load(&path).await {
                Ok(document) => {
                    println!("✓ 已选择: {} ({} 字节)", document.file_name, document.len());
                    self.driver.select_document(document);
                }
                Err(e) => println!("❌ {}", e),
            },
            Command::Analyze => match self.driver.submit() {
                Ok(()) => println!("⏳ Analyzing..."),
                Err(e) => println!("⚠️ {}", e),
            },
            Command::Summary => println!("{}", render_summary(self.driver.session())),
            Command::Cards => println!("{}", render_cards(self.driver.session())),
            Command::Flip(index) => match self.driver.toggle(index) {
                Ok(_) => println!("{}", render_cards(self.driver.session())),
                Err(e) => println!("⚠️ {}", e),
            },
            Command::Quiz => println!("{}", render_quiz(self.driver.session())),
            Command::Suggestions => println!("{}", render_suggestions(self.driver.session())),
            Command::Pick(index) => {
                let outcome = self.driver.ask_suggested(index);
                self.after_ask(outcome);
            }
            Command::Ask(text) => {
                self.driver.set_input(text);
                let outcome = self.driver.ask_pending();
                self.after_ask(outcome);
            }
            Command::Transcript => println!("{}", render_transcript(self.driver.session())),
            Command::Status => println!("{}", render_status(self.driver.session())),
            Command::Reset => {
                self.driver.reset();
                println!("🔄 已重置，可以用 /open 选择新的文档");
            }
            Command::Help => println!("{}", HELP),
            Command::Invalid(reason) => println!("⚠️ {}", reason),
            Command::Quit => {}
        }
    }

    fn after_ask(&mut self, outcome: Result<bool, SessionError>) {
        match outcome {
            Ok(true) => {
                self.questions += 1;
                if let Some(question) = self.driver.session().messages().last() {
                    println!("{}", question);
                }
                println!("StudyBot is typing...");
            }
            Ok(false) => {
                if self.driver.session().chat_status() == ChatStatus::AwaitingAnswer {
                    println!("⚠️ 请等待上一个问题的回答");
                }
            }
            Err(e) => println!("⚠️ {}", e),
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        if completion.outcome == ApplyOutcome::Stale {
            info!("忽略过期的{:?}响应", completion.kind);
            return;
        }

        let session = self.driver.session();
        match completion.kind {
            RequestKind::Analysis => match session.status() {
                SessionStatus::Ready => {
                    self.analyses += 1;
                    println!("{}", render_summary(session));
                    println!("{}", render_suggestions(session));
                    println!("{}", render_transcript(session));
                }
                _ => {
                    let error = session.error().unwrap_or_default();
                    warn!("分析失败: {}", error);
                    println!("❌ {}", error);
                }
            },
            RequestKind::Chat => {
                if let Some(message) = session.messages().last() {
                    println!("{}", message);
                }
            }
        }
    }
}

// ========== 渲染辅助函数 ==========

const NO_RESULT: &str = "还没有分析结果，请先 /open 并 /analyze。";

pub fn render_status(session: &StudySession) -> String {
    let document = session
        .selected_document()
        .map(|d| d.file_name.as_str())
        .unwrap_or("(未选择)");
    let mut out = format!(
        "文档: {}\n会话状态: {:?}\n问答状态: {:?}",
        document,
        session.status(),
        session.chat_status()
    );
    if let Some(error) = session.error() {
        out.push_str(&format!("\n错误: {}", error));
    }
    out
}

pub fn render_summary(session: &StudySession) -> String {
    match session.result() {
        Some(result) => format!("🧠 Summary\n{}", result.summary),
        None => NO_RESULT.to_string(),
    }
}

pub fn render_cards(session: &StudySession) -> String {
    let Some(result) = session.result() else {
        return NO_RESULT.to_string();
    };
    let mut out = String::from("🃏 Flashcards");
    for index in 0..result.flashcards.len() {
        let side = if session.flips().is_revealed(index) {
            "背面"
        } else {
            "正面"
        };
        let face = session.visible_face(index).unwrap_or_default();
        out.push_str(&format!("\n  {}. [{}] {}", index + 1, side, face));
    }
    out
}

pub fn render_quiz(session: &StudySession) -> String {
    let Some(result) = session.result() else {
        return NO_RESULT.to_string();
    };
    let mut out = String::from("❓ Quiz");
    for (index, question) in result.quiz.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", index + 1, question.question));
        for option in &question.options {
            out.push_str(&format!("\n     - {}", option));
        }
        out.push_str(&format!("\n     Answer: {}", question.answer));
    }
    out
}

pub fn render_suggestions(session: &StudySession) -> String {
    let Some(result) = session.result() else {
        return NO_RESULT.to_string();
    };
    if result.suggested_questions.is_empty() {
        return "没有推荐问题".to_string();
    }
    let mut out = String::from("💡 推荐问题 (/pick <n>)");
    for (index, question) in result.suggested_questions.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", index + 1, question));
    }
    out
}

pub fn render_transcript(session: &StudySession) -> String {
    let mut out = String::from("💬 Chat with StudyBot");
    for message in session.messages() {
        let marker = match message.role {
            Role::User => ">",
            Role::Assistant => "<",
        };
        out.push_str(&format!("\n{} {}", marker, message));
    }
    if session.chat_status() == ChatStatus::AwaitingAnswer {
        out.push_str("\nStudyBot is typing...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, Flashcard, QuizQuestion};

    fn ready_session() -> StudySession {
        let mut session = StudySession::new();
        session.select_document(Document::from_bytes("notes.txt", b"notes".to_vec()));
        let ticket = session.begin_submit().unwrap();
        session.apply_analysis(
            ticket,
            Ok(AnalysisResult {
                summary: "S".to_string(),
                flashcards: vec![Flashcard {
                    front: "Q1".to_string(),
                    back: "A1".to_string(),
                }],
                quiz: vec![QuizQuestion {
                    question: "2+2?".to_string(),
                    options: vec!["3".to_string(), "4".to_string()],
                    answer: "4".to_string(),
                }],
                suggested_questions: vec!["What is S?".to_string()],
            }),
        );
        session
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   "), None);
        assert_eq!(
            Command::parse("/open notes/bio.pdf"),
            Some(Command::Open(PathBuf::from("notes/bio.pdf")))
        );
        assert_eq!(Command::parse("/analyze"), Some(Command::Analyze));
        assert_eq!(Command::parse("/flip 1"), Some(Command::Flip(0)));
        assert_eq!(Command::parse("/pick 2"), Some(Command::Pick(1)));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_plain_text_is_question() {
        assert_eq!(
            Command::parse("What is S?"),
            Some(Command::Ask("What is S?".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_bad_positions() {
        assert!(matches!(Command::parse("/flip 0"), Some(Command::Invalid(_))));
        assert!(matches!(Command::parse("/pick x"), Some(Command::Invalid(_))));
        assert!(matches!(Command::parse("/open"), Some(Command::Invalid(_))));
        assert!(matches!(Command::parse("/dance"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_render_without_result() {
        let session = StudySession::new();
        assert_eq!(render_cards(&session), NO_RESULT);
        assert!(render_status(&session).contains("(未选择)"));
    }

    #[test]
    fn test_render_cards_follows_flip_state() {
        let mut session = ready_session();
        assert!(render_cards(&session).contains("1. [正面] Q1"));

        session.toggle(0).unwrap();
        assert!(render_cards(&session).contains("1. [背面] A1"));
    }

    #[test]
    fn test_render_quiz_and_suggestions() {
        let session = ready_session();
        let quiz = render_quiz(&session);
        assert!(quiz.contains("1. 2+2?"));
        assert!(quiz.contains("Answer: 4"));
        assert!(render_suggestions(&session).contains("1. What is S?"));
    }

    #[test]
    fn test_render_transcript_shows_typing_indicator() {
        let mut session = ready_session();
        session.ask("What is S?").unwrap();

        let transcript = render_transcript(&session);
        assert!(transcript.contains("> 你: What is S?"));
        assert!(transcript.ends_with("StudyBot is typing..."));
    }
}
