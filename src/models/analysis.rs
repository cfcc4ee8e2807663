use serde::{Deserialize, Serialize};

/// 闪卡：正面是问题，背面是答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// 选择题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// 文档分析结果
///
/// 分析成功时整体创建，之后不再修改；新的分析结果整体替换旧的。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizQuestion>,
    #[serde(default)]
    pub suggested_questions: Vec<String>,
}
