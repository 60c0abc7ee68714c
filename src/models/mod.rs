pub mod chat;
pub mod document;

pub use chat::{ChatMessage, ExplanationMode, RoadmapStage, Role, Session, StudentLevel};
pub use document::DocumentInfo;
