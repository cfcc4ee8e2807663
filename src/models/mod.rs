pub mod analysis;
pub mod document;
pub mod message;

pub use analysis::{AnalysisResult, Flashcard, QuizQuestion};
pub use document::Document;
pub use message::{Message, Role};
