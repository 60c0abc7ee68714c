use chrono::{ DateTime, Utc };
use log::{ info, warn };

use crate::api::{ ApiError, AskRequest, BackendApi };
use crate::models::{
    ChatMessage,
    DocumentInfo,
    ExplanationMode,
    RoadmapStage,
    Session,
    StudentLevel,
};
use crate::quiz::{ classify_response, AiResponse };

/// Application state for one client run. Constructed explicitly and
/// passed to the view layer; all mutation goes through the setters
/// below. Single-threaded single-writer, so no locking is involved.
pub struct ChatStore {
    session: Option<Session>,
    messages: Vec<ChatMessage>,
    level: StudentLevel,
    mode: ExplanationMode,
    documents: Vec<DocumentInfo>,
    active_topic: Option<String>,
    roadmap: Vec<RoadmapStage>,
    started_at: DateTime<Utc>,
    busy: bool,
}

impl ChatStore {
    pub fn new(level: StudentLevel, mode: ExplanationMode) -> Self {
        Self {
            session: None,
            messages: Vec::new(),
            level,
            mode,
            documents: Vec::new(),
            active_topic: None,
            roadmap: Vec::new(),
            started_at: Utc::now(),
            busy: false,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Replace the active session. Sessions are never mutated in place;
    /// "new chat" installs a fresh descriptor.
    pub fn set_session(&mut self, session: Session) {
        info!("Session active: {} ({})", session.session_id, session.student_name);
        self.session = Some(session);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Drop the conversation, roadmap and topic. The session descriptor
    /// itself survives; callers replace it separately if needed.
    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.roadmap.clear();
        self.active_topic = None;
    }

    pub fn level(&self) -> StudentLevel {
        self.level
    }

    pub fn set_level(&mut self, level: StudentLevel) {
        self.level = level;
    }

    pub fn mode(&self) -> ExplanationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ExplanationMode) {
        self.mode = mode;
    }

    pub fn documents(&self) -> &[DocumentInfo] {
        &self.documents
    }

    pub fn set_documents(&mut self, documents: Vec<DocumentInfo>) {
        self.documents = documents;
    }

    pub fn add_document(&mut self, document: DocumentInfo) {
        self.documents.push(document);
    }

    pub fn remove_document(&mut self, doc_id: &str) {
        self.documents.retain(|d| d.doc_id != doc_id);
    }

    pub fn active_topic(&self) -> Option<&str> {
        self.active_topic.as_deref()
    }

    pub fn roadmap(&self) -> &[RoadmapStage] {
        &self.roadmap
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Minutes-granularity session timer for the insights view.
    pub fn elapsed_session_time(&self) -> String {
        let minutes = (Utc::now() - self.started_at).num_minutes().max(0);
        if minutes >= 60 {
            format!("{}h {}m", minutes / 60, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }

    /// Send one user query through the backend and append both sides of
    /// the exchange. Returns `None` when the send was refused (empty
    /// input, no session, or a request already outstanding). The busy
    /// flag is cleared on every exit path.
    pub async fn send_message(
        &mut self,
        backend: &dyn BackendApi,
        user_text: &str
    ) -> Result<Option<AiResponse>, ApiError> {
        let user_text = user_text.trim();
        if user_text.is_empty() || self.busy {
            return Ok(None);
        }
        let session = match &self.session {
            Some(s) => s.clone(),
            None => {
                warn!("Dropping query: no active session");
                return Ok(None);
            }
        };

        if let Some((topic, stages)) = roadmap_for_query(user_text) {
            info!("Roadmap requested for topic: {}", topic);
            self.active_topic = Some(topic);
            self.roadmap = stages;
        }

        self.messages.push(ChatMessage::user(user_text));
        self.busy = true;

        let request = AskRequest {
            question: build_question(user_text),
            session_id: session.session_id,
            student_level: self.level,
            // The shipped client pins quick here regardless of the mode
            // selector.
            explanation_mode: ExplanationMode::Quick,
        };
        let result = backend.ask_question(&request).await;
        self.busy = false;

        let response = result?;
        let ai_text = response.text().to_string();
        self.messages.push(ChatMessage::ai(ai_text.clone(), response.follow_up_suggestions));
        Ok(Some(classify_response(&ai_text)))
    }
}

const QUIZ_INSTRUCTION: &str =
    "You MUST return ONLY a raw JSON array. Format exactly like this: \
    [{\"question\": \"Question text?\", \"options\": [\"Option A\", \"Option B\", \
    \"Option C\", \"Option D\"], \"correctAnswer\": \"Option A\"}]";

/// Wrap the raw user text with the backend formatting instructions.
/// Queries mentioning "quiz" swap in the JSON-array instruction instead.
pub fn build_question(user_text: &str) -> String {
    if user_text.to_lowercase().contains("quiz") {
        format!("Generate a multiple-choice quiz based on: \"{}\". {}", user_text, QUIZ_INSTRUCTION)
    } else {
        format!(
            "Answer this: \"{}\". RULES: Format STRICTLY Pointwise. Use the SAME language as \
            the question. No Images. Convert table data into spaced bullet points.",
            user_text
        )
    }
}

/// Local roadmap stub: queries containing "learn" or "roadmap"
/// (case-insensitive) always yield the same fixed three stages. The
/// topic is the query with those keywords stripped. This is placeholder
/// content, not real planning logic.
pub fn roadmap_for_query(user_text: &str) -> Option<(String, Vec<RoadmapStage>)> {
    let lower = user_text.to_lowercase();
    if !lower.contains("learn") && !lower.contains("roadmap") {
        return None;
    }

    let topic = strip_keywords(user_text, &["learn", "roadmap for"]);
    let topic = if topic.is_empty() { "New Subject".to_string() } else { topic };

    let stages = vec![
        RoadmapStage {
            title: "Basics & Foundations".to_string(),
            duration: "3h".to_string(),
            description: format!("Initial concepts of {}.", topic),
        },
        RoadmapStage {
            title: "Technical Application".to_string(),
            duration: "5h".to_string(),
            description: "Hands-on implementation and structure.".to_string(),
        },
        RoadmapStage {
            title: "Final Synthesis".to_string(),
            duration: "4h".to_string(),
            description: "Advanced integration and testing.".to_string(),
        }
    ];
    Some((topic, stages))
}

/// Remove every case-insensitive occurrence of the given keywords,
/// first match wins at each position, then trim.
fn strip_keywords(text: &str, keywords: &[&str]) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    'outer: while i < bytes.len() {
        for keyword in keywords {
            let end = i + keyword.len();
            if end <= bytes.len() && bytes[i..end].eq_ignore_ascii_case(keyword.as_bytes()) {
                i = end;
                continue 'outer;
            }
        }
        // Keywords are ASCII, so `i` always lands on a char boundary.
        let ch = text[i..].chars().next().unwrap_or('\0');
        out.push(ch);
        i += ch.len_utf8();
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AskResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted backend double: returns canned answers (or an error) and
    /// records the questions it was asked.
    struct ScriptedBackend {
        answer: Option<String>,
        asked: Mutex<Vec<AskRequest>>,
    }

    impl ScriptedBackend {
        fn answering(answer: &str) -> Self {
            Self { answer: Some(answer.to_string()), asked: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { answer: None, asked: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl BackendApi for ScriptedBackend {
        async fn create_session(&self, name: &str, _subject: &str) -> Result<Session, ApiError> {
            Ok(Session { session_id: "sess-test".to_string(), student_name: name.to_string() })
        }

        async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, ApiError> {
            self.asked.lock().unwrap().push(AskRequest {
                question: request.question.clone(),
                session_id: request.session_id.clone(),
                student_level: request.student_level,
                explanation_mode: request.explanation_mode,
            });
            match &self.answer {
                Some(answer) =>
                    Ok(AskResponse {
                        answer: Some(answer.clone()),
                        message: None,
                        follow_up_suggestions: vec!["Summarize the key concepts".to_string()],
                    }),
                None => Err(ApiError::Backend { status: 500, message: "boom".to_string() }),
            }
        }

        async fn list_documents(&self) -> Result<Vec<DocumentInfo>, ApiError> {
            Ok(Vec::new())
        }

        async fn upload_document(
            &self,
            _filename: &str,
            _bytes: Vec<u8>,
            _subject: &str
        ) -> Result<DocumentInfo, ApiError> {
            unimplemented!("not exercised")
        }

        async fn delete_document(&self, _doc_id: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn store_with_session() -> ChatStore {
        let mut store = ChatStore::new(StudentLevel::Beginner, ExplanationMode::Quick);
        store.set_session(Session {
            session_id: "sess-test".to_string(),
            student_name: "Ada".to_string(),
        });
        store
    }

    #[test]
    fn plain_questions_get_the_formatting_wrapper() {
        let q = build_question("What is photosynthesis?");
        assert!(q.starts_with("Answer this: \"What is photosynthesis?\"."));
        assert!(q.contains("Format STRICTLY Pointwise"));
    }

    #[test]
    fn quiz_queries_swap_in_the_json_instruction() {
        let q = build_question("Give me a QUIZ on acids");
        assert!(q.starts_with("Generate a multiple-choice quiz based on: \"Give me a QUIZ on acids\"."));
        assert!(q.contains("raw JSON array"));
        assert!(q.contains("correctAnswer"));
    }

    #[test]
    fn roadmap_stub_always_yields_three_fixed_stages() {
        for query in ["I want to LEARN rust", "roadmap for databases", "Roadmap please"] {
            let (_, stages) = roadmap_for_query(query).expect(query);
            assert_eq!(stages.len(), 3);
            assert_eq!(stages[0].title, "Basics & Foundations");
            assert_eq!(stages[1].duration, "5h");
            assert_eq!(stages[2].title, "Final Synthesis");
        }
        assert!(roadmap_for_query("What is an acid?").is_none());
    }

    #[test]
    fn roadmap_topic_strips_keywords_and_falls_back() {
        let (topic, _) = roadmap_for_query("roadmap for organic chemistry").unwrap();
        assert_eq!(topic, "organic chemistry");

        let (topic, _) = roadmap_for_query("learn").unwrap();
        assert_eq!(topic, "New Subject");
    }

    #[tokio::test]
    async fn send_message_appends_both_sides_of_the_exchange() {
        let backend = ScriptedBackend::answering("Acids donate protons.");
        let mut store = store_with_session();

        let outcome = store.send_message(&backend, "What is an acid?").await.unwrap();
        assert!(matches!(outcome, Some(AiResponse::Prose(_))));
        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.messages()[0].content, "What is an acid?");
        assert_eq!(store.messages()[1].content, "Acids donate protons.");
        assert_eq!(store.messages()[1].suggestions, vec!["Summarize the key concepts"]);
        assert!(!store.is_busy());

        let asked = backend.asked.lock().unwrap();
        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0].session_id, "sess-test");
        assert!(asked[0].question.contains("What is an acid?"));
    }

    #[tokio::test]
    async fn quiz_answers_classify_as_quiz() {
        let backend = ScriptedBackend::answering(
            "[{\"question\":\"Q\",\"options\":[\"A\",\"B\"],\"correctAnswer\":\"A\"}]"
        );
        let mut store = store_with_session();
        let outcome = store.send_message(&backend, "quiz me on acids").await.unwrap();
        assert!(matches!(outcome, Some(AiResponse::Quiz(_))));
    }

    #[tokio::test]
    async fn backend_failure_clears_busy_and_keeps_the_user_message() {
        let backend = ScriptedBackend::failing();
        let mut store = store_with_session();

        let err = store.send_message(&backend, "What is an acid?").await.unwrap_err();
        assert!(matches!(err, ApiError::Backend { status: 500, .. }));
        assert!(!store.is_busy());
        // The user's side of the exchange stays; no AI reply is appended.
        assert_eq!(store.messages().len(), 1);
    }

    #[tokio::test]
    async fn sends_are_refused_without_a_session_or_with_empty_input() {
        let backend = ScriptedBackend::answering("ignored");
        let mut store = ChatStore::new(StudentLevel::Beginner, ExplanationMode::Quick);

        assert!(store.send_message(&backend, "hello").await.unwrap().is_none());
        store.set_session(Session {
            session_id: "sess-test".to_string(),
            student_name: "Ada".to_string(),
        });
        assert!(store.send_message(&backend, "   ").await.unwrap().is_none());
        assert!(backend.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn roadmap_queries_set_topic_and_stages_on_the_store() {
        let backend = ScriptedBackend::answering("Here is a plan.");
        let mut store = store_with_session();

        store.send_message(&backend, "roadmap for thermodynamics").await.unwrap();
        assert_eq!(store.active_topic(), Some("thermodynamics"));
        assert_eq!(store.roadmap().len(), 3);
    }

    #[test]
    fn clear_history_resets_conversation_state() {
        let mut store = store_with_session();
        store.add_message(ChatMessage::user("hi"));
        store.clear_history();
        assert!(store.messages().is_empty());
        assert!(store.roadmap().is_empty());
        assert!(store.active_topic().is_none());
        assert!(store.session().is_some());
    }
}
