use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

/// One ingested document as the backend reports it. The registry is a
/// simple set keyed by `doc_id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub doc_id: String,
    pub filename: String,
    pub chunk_count: usize,
    pub uploaded_at: DateTime<Utc>,
}
