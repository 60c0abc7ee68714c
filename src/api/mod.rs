use async_trait::async_trait;
use log::debug;
use reqwest::header::{ HeaderMap, HeaderValue, ACCEPT };
use reqwest::multipart::{ Form, Part };
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use thiserror::Error;

use crate::models::{ DocumentInfo, ExplanationMode, Session, StudentLevel };

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Backend request failed: {0}")] Http(#[from] reqwest::Error),
    #[error("Backend returned {status}: {message}")] Backend {
        status: u16,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct AskRequest {
    pub question: String,
    pub session_id: String,
    pub student_level: StudentLevel,
    pub explanation_mode: ExplanationMode,
}

#[derive(Debug, Deserialize)]
pub struct AskResponse {
    pub answer: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub follow_up_suggestions: Vec<String>,
}

impl AskResponse {
    /// The displayable response body: `answer`, falling back to
    /// `message`, falling back to a fixed placeholder.
    pub fn text(&self) -> &str {
        self.answer
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("Data not available.")
    }
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    name: &'a str,
    subject: &'a str,
}

#[derive(Debug, Deserialize)]
struct DocumentListResponse {
    documents: Vec<DocumentInfo>,
}

/// The backend operations this client consumes. The RAG pipeline behind
/// them (chunking, embedding, vector search, synthesis) is entirely
/// server-side.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn create_session(&self, name: &str, subject: &str) -> Result<Session, ApiError>;

    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, ApiError>;

    async fn list_documents(&self) -> Result<Vec<DocumentInfo>, ApiError>;

    async fn upload_document(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        subject: &str
    ) -> Result<DocumentInfo, ApiError>;

    async fn delete_document(&self, doc_id: &str) -> Result<(), ApiError>;
}

/// reqwest-backed `BackendApi` implementation.
///
/// No request timeout is configured, matching the shipped client: a hung
/// backend call hangs the caller indefinitely.
pub struct HttpBackend {
    http: HttpClient,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map a non-success response to `ApiError::Backend`, carrying whatever
/// body text the backend attached.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(ApiError::Backend {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn create_session(&self, name: &str, subject: &str) -> Result<Session, ApiError> {
        let url = self.endpoint("/api/session");
        debug!("POST {} (name: {})", url, name);
        let resp = self.http
            .post(&url)
            .json(&(CreateSessionRequest { name, subject }))
            .send().await?;
        Ok(check_status(resp).await?.json::<Session>().await?)
    }

    async fn ask_question(&self, request: &AskRequest) -> Result<AskResponse, ApiError> {
        let url = self.endpoint("/api/ask");
        debug!("POST {} (session: {})", url, request.session_id);
        let resp = self.http.post(&url).json(request).send().await?;
        Ok(check_status(resp).await?.json::<AskResponse>().await?)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentInfo>, ApiError> {
        let url = self.endpoint("/api/documents");
        debug!("GET {}", url);
        let resp = self.http.get(&url).send().await?;
        let list = check_status(resp).await?.json::<DocumentListResponse>().await?;
        Ok(list.documents)
    }

    async fn upload_document(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        subject: &str
    ) -> Result<DocumentInfo, ApiError> {
        let url = self.endpoint("/api/documents");
        debug!("POST {} (file: {}, {} bytes)", url, filename, bytes.len());
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(filename.to_string()))
            .text("subject", subject.to_string());
        let resp = self.http.post(&url).multipart(form).send().await?;
        Ok(check_status(resp).await?.json::<DocumentInfo>().await?)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/documents/{}", doc_id));
        debug!("DELETE {}", url);
        let resp = self.http.delete(&url).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}
