pub mod study_client;

pub use study_client::{StudyClient, ANALYZE_FALLBACK_MESSAGE, CHAT_FALLBACK_MESSAGE};
