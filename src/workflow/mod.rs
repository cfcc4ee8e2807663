pub mod chat_transcript;
pub mod document_session;
pub mod flip_tracker;
pub mod study_session;

pub use chat_transcript::{ChatStatus, ChatTranscript, GREETING};
pub use document_session::{DocumentSession, SessionStatus};
pub use flip_tracker::FlipTracker;
pub use study_session::{AnalysisTicket, ApplyOutcome, ChatTicket, StudySession};
