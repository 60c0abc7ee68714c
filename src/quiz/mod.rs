use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

/// One multiple-choice question as the backend emits it inside a quiz
/// payload. Invariant (backend-enforced): `correct_answer` is one of
/// `options`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
}

/// Outcome of classifying a raw AI response.
#[derive(Clone, Debug)]
pub enum AiResponse {
    Quiz(Vec<QuizQuestion>),
    Prose(String),
}

/// Decide whether a raw response encodes a quiz payload.
///
/// Heuristic: take the substring between the first `[` and the last `]`
/// (inclusive) and try to parse it as a JSON array whose first element
/// carries both a `question` and an `options` field. Anything else is
/// prose; parse failures are swallowed on purpose. A response quoting
/// bracketed prose between a coincidental `[`/`]` pair can misclassify,
/// which matches the shipped behavior.
pub fn classify_response(raw: &str) -> AiResponse {
    match extract_quiz_payload(raw) {
        Some(questions) => AiResponse::Quiz(questions),
        None => AiResponse::Prose(raw.to_string()),
    }
}

fn extract_quiz_payload(raw: &str) -> Option<Vec<QuizQuestion>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }

    let candidate = &raw[start..=end];
    let parsed: JsonValue = serde_json::from_str(candidate).ok()?;
    let first = parsed.as_array()?.first()?;
    if first.get("question").is_none() || first.get("options").is_none() {
        return None;
    }

    serde_json::from_value(parsed).ok()
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Cannot submit: {answered} of {total} questions answered")]
    Incomplete {
        answered: usize,
        total: usize,
    },
}

/// How a single option should be presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionFeedback {
    /// Not selected; correctness not yet revealed.
    Neutral,
    /// Selected while still answering.
    Selected,
    /// The correct answer, revealed after submission.
    Correct,
    /// A wrong selection, revealed after submission.
    Wrong,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum AttemptState {
    Answering,
    Submitted {
        score: usize,
    },
}

/// Per-quiz selection state. Moves from `answering` to `submitted`
/// exactly once; the score is fixed at that point.
#[derive(Clone, Debug)]
pub struct QuizAttempt {
    questions: Vec<QuizQuestion>,
    selected: HashMap<usize, String>,
    state: AttemptState,
}

impl QuizAttempt {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            selected: HashMap::new(),
            state: AttemptState::Answering,
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn selected_answer(&self, index: usize) -> Option<&str> {
        self.selected.get(&index).map(|s| s.as_str())
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.state, AttemptState::Submitted { .. })
    }

    /// Fixed score, present only after submission.
    pub fn score(&self) -> Option<usize> {
        match self.state {
            AttemptState::Submitted { score } => Some(score),
            AttemptState::Answering => None,
        }
    }

    /// Record a selection. Overwrites any prior choice for the same
    /// question; a no-op once submitted or for an out-of-range index.
    pub fn select(&mut self, index: usize, option: impl Into<String>) {
        if self.is_submitted() || index >= self.questions.len() {
            return;
        }
        self.selected.insert(index, option.into());
    }

    /// Grade the attempt. Requires every question to have a selection;
    /// calling again after submission returns the fixed score.
    pub fn submit(&mut self) -> Result<usize, QuizError> {
        if let AttemptState::Submitted { score } = self.state {
            return Ok(score);
        }
        if self.selected.len() != self.questions.len() {
            return Err(QuizError::Incomplete {
                answered: self.selected.len(),
                total: self.questions.len(),
            });
        }

        let score = self.questions
            .iter()
            .enumerate()
            .filter(|(i, q)| {
                self.selected.get(i).map(|s| s == &q.correct_answer).unwrap_or(false)
            })
            .count();
        self.state = AttemptState::Submitted { score };
        Ok(score)
    }

    /// Presentation verdict for one option. Correctness is revealed only
    /// after submission.
    pub fn feedback(&self, index: usize, option: &str) -> OptionFeedback {
        let is_selected = self.selected_answer(index) == Some(option);
        if !self.is_submitted() {
            return if is_selected { OptionFeedback::Selected } else { OptionFeedback::Neutral };
        }

        let is_correct = self.questions
            .get(index)
            .map(|q| q.correct_answer == option)
            .unwrap_or(false);
        if is_correct {
            OptionFeedback::Correct
        } else if is_selected {
            OptionFeedback::Wrong
        } else {
            OptionFeedback::Neutral
        }
    }
}
