use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studyai_session::utils::logging;
use studyai_session::workflow::GREETING;
use studyai_session::{
    AnalysisResult, AnalysisService, ApiError, ApplyOutcome, ChatRequest, ChatService,
    ChatStatus, Config, Document, Flashcard, Message, RequestKind, SessionDriver, SessionError,
    SessionStatus, StudyClient,
};

fn sample_result(summary: &str) -> AnalysisResult {
    AnalysisResult {
        summary: summary.to_string(),
        flashcards: vec![Flashcard {
            front: "Q1".to_string(),
            back: "A1".to_string(),
        }],
        quiz: vec![],
        suggested_questions: vec!["Why?".to_string()],
    }
}

fn analyze_payload() -> serde_json::Value {
    json!({
        "summary": "光合作用把光能转化为化学能",
        "flashcards": [
            {"front": "Q1", "back": "A1"},
            {"front": "Q2", "back": "A2"}
        ],
        "quiz": [
            {"question": "叶绿体位于?", "options": ["细胞核", "细胞质"], "answer": "细胞质"}
        ],
        "suggestedQuestions": ["Explain photosynthesis"]
    })
}

fn notes() -> Document {
    Document::from_bytes("notes.txt", "光合作用笔记".as_bytes().to_vec())
}

async fn http_driver(server: &MockServer) -> SessionDriver<StudyClient, StudyClient> {
    let config = Config {
        api_base_url: server.uri(),
        ..Config::default()
    };
    let client = Arc::new(StudyClient::new(&config).expect("创建客户端失败"));
    SessionDriver::new(Arc::clone(&client), client, &config)
}

/// 等待放行信号后才返回的分析服务
struct GatedAnalysis {
    gate: Arc<Notify>,
}

#[async_trait]
impl AnalysisService for GatedAnalysis {
    async fn analyze(&self, document: &Document) -> Result<AnalysisResult, ApiError> {
        self.gate.notified().await;
        Ok(sample_result(&document.file_name))
    }
}

/// 按文件名决定延迟的分析服务：`slow` 开头的文档晚返回
struct DelayedAnalysis;

#[async_trait]
impl AnalysisService for DelayedAnalysis {
    async fn analyze(&self, document: &Document) -> Result<AnalysisResult, ApiError> {
        if document.file_name.starts_with("slow") {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Ok(sample_result(&document.file_name))
    }
}

struct EchoChat;

#[async_trait]
impl ChatService for EchoChat {
    async fn ask(&self, request: &ChatRequest) -> Result<String, ApiError> {
        Ok(format!("echo: {}", request.question))
    }
}

#[tokio::test]
async fn test_happy_path_against_backend() {
    logging::init(false);
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analyze_payload()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"question": "Explain photosynthesis"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"answer": "Plants make sugar."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut driver = http_driver(&server).await;

    driver.select_document(notes());
    assert_ok!(driver.submit());
    assert_eq!(driver.session().status(), SessionStatus::Analyzing);

    let completion = driver.next_completion().await.unwrap();
    assert_eq!(completion.kind, RequestKind::Analysis);
    assert_eq!(completion.outcome, ApplyOutcome::Applied);

    let session = driver.session();
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.result().unwrap().flashcards.len(), 2);
    assert_eq!(session.messages(), &[Message::assistant(GREETING)]);
    assert!(session.session_id().is_some());

    // 翻卡
    assert!(driver.toggle(1).unwrap());
    assert_eq!(driver.session().visible_face(1), Some("A2"));
    assert_eq!(driver.session().visible_face(0), Some("Q1"));

    // 点击推荐问题
    assert!(driver.ask_suggested(0).unwrap());
    assert_eq!(driver.session().chat_status(), ChatStatus::AwaitingAnswer);
    driver.settle().await;

    let messages = driver.session().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1], Message::user("Explain photosynthesis"));
    assert_eq!(messages[2], Message::assistant("Plants make sugar."));
    assert_eq!(driver.session().chat_status(), ChatStatus::Idle);
}

#[tokio::test]
async fn test_analysis_error_requires_reselect() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(413).set_body_json(json!({"error": "File too large"})))
        .mount(&server)
        .await;

    let mut driver = http_driver(&server).await;
    driver.select_document(notes());
    assert_ok!(driver.submit());
    driver.settle().await;

    let session = driver.session();
    assert_eq!(session.status(), SessionStatus::Errored);
    assert_eq!(session.error(), Some("File too large"));
    assert!(session.result().is_none());
    assert!(session.messages().is_empty());

    // 失败后需要重新选择文档
    assert_eq!(driver.submit(), Err(SessionError::NoDocumentSelected));
    assert_eq!(driver.in_flight(), 0);

    // 重新选择后可以再次提交
    driver.select_document(notes());
    assert_ok!(driver.submit());
    assert_eq!(driver.session().status(), SessionStatus::Analyzing);
    assert!(driver.session().error().is_none());
    driver.settle().await;
    assert_eq!(driver.session().status(), SessionStatus::Errored);
}

#[tokio::test]
async fn test_reset_while_analyzing_drops_late_result() {
    let gate = Arc::new(Notify::new());
    let analysis = Arc::new(GatedAnalysis {
        gate: Arc::clone(&gate),
    });
    let mut driver = SessionDriver::new(analysis, Arc::new(EchoChat), &Config::default());

    driver.select_document(notes());
    assert_ok!(driver.submit());
    driver.reset();
    assert_eq!(driver.session().status(), SessionStatus::Empty);

    gate.notify_one();
    let completion = driver.next_completion().await.unwrap();
    assert_eq!(completion.outcome, ApplyOutcome::Stale);

    let session = driver.session();
    assert_eq!(session.status(), SessionStatus::Empty);
    assert!(session.result().is_none());
    assert!(session.messages().is_empty());
    assert!(session.selected_document().is_none());
}

#[tokio::test]
async fn test_only_latest_submission_lands() {
    let mut driver = SessionDriver::new(
        Arc::new(DelayedAnalysis),
        Arc::new(EchoChat),
        &Config::default(),
    );

    driver.select_document(Document::from_bytes("slow.txt", b"old".to_vec()));
    assert_ok!(driver.submit());
    driver.reset();

    driver.select_document(Document::from_bytes("fast.txt", b"new".to_vec()));
    assert_ok!(driver.submit());

    let completions = driver.settle().await;
    let outcomes: Vec<_> = completions.iter().map(|c| c.outcome).collect();
    assert_eq!(outcomes, vec![ApplyOutcome::Applied, ApplyOutcome::Stale]);

    let session = driver.session();
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.result().unwrap().summary, "fast.txt");
}

#[tokio::test]
async fn test_chat_failure_appends_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analyze_payload()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let mut driver = http_driver(&server).await;
    driver.select_document(notes());
    assert_ok!(driver.submit());
    driver.settle().await;

    assert!(driver.ask("What is chlorophyll?").unwrap());
    driver.settle().await;

    let session = driver.session();
    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1], Message::user("What is chlorophyll?"));
    assert_eq!(
        messages[2],
        Message::assistant("Error: Failed to get chat response")
    );
    assert_eq!(session.chat_status(), ChatStatus::Idle);
    // 分析结果不受问答失败影响
    assert_eq!(session.status(), SessionStatus::Ready);
}

#[tokio::test]
async fn test_second_question_ignored_while_awaiting() {
    let mut driver = SessionDriver::new(
        Arc::new(DelayedAnalysis),
        Arc::new(EchoChat),
        &Config::default(),
    );
    driver.select_document(notes());
    assert_ok!(driver.submit());
    driver.settle().await;

    assert!(driver.ask("first").unwrap());
    assert!(!driver.ask("second").unwrap());
    assert!(!driver.ask("   ").unwrap());
    assert_eq!(driver.in_flight(), 1);

    driver.settle().await;
    let texts: Vec<_> = driver
        .session()
        .messages()
        .iter()
        .map(|m| m.text.as_str())
        .collect();
    assert_eq!(texts, vec![GREETING, "first", "echo: first"]);
}

#[tokio::test]
async fn test_ask_without_analysis_is_rejected() {
    let mut driver = SessionDriver::new(
        Arc::new(DelayedAnalysis),
        Arc::new(EchoChat),
        &Config::default(),
    );

    assert_eq!(driver.ask("hello"), Err(SessionError::NoActiveSession));
    assert_eq!(driver.ask_suggested(0), Err(SessionError::NoActiveSession));
    assert_eq!(driver.in_flight(), 0);
    assert!(driver.next_completion().await.is_none());
}
