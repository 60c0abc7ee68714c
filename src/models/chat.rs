use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), suggestions: Vec::new() }
    }

    pub fn ai(content: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self { role: Role::Ai, content: content.into(), suggestions }
    }
}

/// Session handle minted by the backend. Replaced on "new chat", never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub student_name: String,
}

/// Explanation depth requested from the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentLevel {
    #[default]
    #[serde(rename = "beginner")]
    Beginner,
    #[serde(rename = "intermediate")]
    Intermediate,
    #[serde(rename = "advanced")]
    Advanced,
}

impl StudentLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentLevel::Beginner => "beginner",
            StudentLevel::Intermediate => "intermediate",
            StudentLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for StudentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(StudentLevel::Beginner),
            "intermediate" => Ok(StudentLevel::Intermediate),
            "advanced" => Ok(StudentLevel::Advanced),
            other => Err(format!("Unknown student level: {}", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplanationMode {
    #[default]
    #[serde(rename = "quick")]
    Quick,
    #[serde(rename = "step-by-step")]
    StepByStep,
    #[serde(rename = "example-based")]
    ExampleBased,
    #[serde(rename = "quiz")]
    Quiz,
}

impl ExplanationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationMode::Quick => "quick",
            ExplanationMode::StepByStep => "step-by-step",
            ExplanationMode::ExampleBased => "example-based",
            ExplanationMode::Quiz => "quiz",
        }
    }
}

impl fmt::Display for ExplanationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExplanationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(ExplanationMode::Quick),
            "step-by-step" | "steps" => Ok(ExplanationMode::StepByStep),
            "example-based" | "examples" => Ok(ExplanationMode::ExampleBased),
            "quiz" => Ok(ExplanationMode::Quiz),
            other => Err(format!("Unknown explanation mode: {}", other)),
        }
    }
}

/// One stage of the locally synthesized learning roadmap.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoadmapStage {
    pub title: String,
    pub duration: String,
    pub description: String,
}
