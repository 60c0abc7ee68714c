use clap::Parser;

use crate::models::{ ExplanationMode, StudentLevel };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the NeuralNotes backend API.
    #[arg(long, env = "BACKEND_URL", default_value = "http://127.0.0.1:8000")]
    pub backend_url: String,

    /// Student name used when creating the session. Prompted for
    /// interactively when omitted.
    #[arg(long, env = "STUDENT_NAME")]
    pub name: Option<String>,

    /// Subject tag attached to the session and to uploads.
    #[arg(long, env = "STUDY_SUBJECT", default_value = "General")]
    pub subject: String,

    /// Explanation depth (beginner, intermediate, advanced).
    #[arg(long, env = "STUDENT_LEVEL", default_value = "beginner")]
    pub level: StudentLevel,

    /// Explanation mode (quick, step-by-step, example-based, quiz).
    #[arg(long, env = "EXPLANATION_MODE", default_value = "quick")]
    pub mode: ExplanationMode,

    /// Directory where Q&A exports are written.
    #[arg(long, env = "EXPORT_DIR", default_value = ".")]
    pub export_dir: String,
}
