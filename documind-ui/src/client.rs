//! HTTP client for the documind-api `/api/*` boundary

use async_trait::async_trait;
use documind_common::api::{
    paths, DocumentResponse, DocumentSummary, ErrorResponse, IntegrationStatus, OpenTask,
    ProcessTextRequest, SourceType, TranscribeResponse,
};
use documind_common::{DocType, StructuredDocument};
use reqwest::multipart;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::wizard::AudioClip;

/// Default documind-api location
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

pub const USER_AGENT: &str = concat!("documind/", env!("CARGO_PKG_VERSION"));

/// Upper bound of one call; the backend itself waits on vendors for up to a minute
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

pub const PROCESSING_FAILED: &str = "Processing failed";
pub const TRANSCRIPTION_FAILED: &str = "Transcription failed";
pub const DOWNLOAD_FAILED: &str = "Download failed";
pub const REQUEST_FAILED: &str = "Request failed";

/// Integration call errors
///
/// `Display` is the message shown to the user: the backend's `detail` verbatim, or
/// the operation's generic fallback.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-success status
    #[error("{detail}")]
    Api { status: u16, detail: String },

    /// No usable answer (connection refused, timeout, unreadable body)
    #[error("{fallback}")]
    Unavailable {
        fallback: &'static str,
        cause: String,
    },
}

impl ClientError {
    fn unavailable(fallback: &'static str, cause: impl std::fmt::Display) -> Self {
        ClientError::Unavailable {
            fallback,
            cause: cause.to_string(),
        }
    }

    /// Underlying cause, for logs
    pub fn cause(&self) -> &str {
        match self {
            ClientError::Api { detail, .. } => detail,
            ClientError::Unavailable { cause, .. } => cause,
        }
    }
}

/// The `/api/*` boundary as seen by the wizard and the views
#[async_trait]
pub trait DocumindApi: Send + Sync {
    /// Transcribe a voice memo, returning the recognized text
    async fn transcribe(&self, clip: AudioClip) -> Result<String, ClientError>;

    /// Classify and structure raw text into a document with a generated artifact
    async fn process_text(
        &self,
        text: &str,
        source: SourceType,
    ) -> Result<StructuredDocument, ClientError>;

    /// Raw bytes of a generated artifact
    async fn download(&self, filename: &str) -> Result<Vec<u8>, ClientError>;

    async fn list_documents(
        &self,
        doc_type: Option<DocType>,
    ) -> Result<Vec<DocumentSummary>, ClientError>;

    async fn open_tasks(&self) -> Result<Vec<OpenTask>, ClientError>;

    async fn integration_status(&self) -> Result<IntegrationStatus, ClientError>;
}

/// [`DocumindApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::unavailable(REQUEST_FAILED, e))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the successful response
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &'static str,
    ) -> Result<reqwest::Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::unavailable(fallback, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Non-success: surface the envelope's detail when there is one
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "documind-api error response");
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .map(|envelope| envelope.detail)
            .filter(|detail| !detail.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        Err(ClientError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &'static str,
    ) -> Result<T, ClientError> {
        self.send(request, fallback)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ClientError::unavailable(fallback, e))
    }
}

#[async_trait]
impl DocumindApi for HttpApiClient {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, ClientError> {
        debug!(
            bytes = clip.data.len(),
            content_type = %clip.content_type,
            "Uploading voice memo"
        );

        let extension = recording_extension(&clip.content_type);
        let part = multipart::Part::bytes(clip.data)
            .file_name(format!("recording.{}", extension))
            .mime_str(&clip.content_type)
            .map_err(|e| ClientError::unavailable(TRANSCRIPTION_FAILED, e))?;
        let form = multipart::Form::new().part(paths::AUDIO_FIELD, part);

        let request = self
            .http_client
            .post(self.url(paths::TRANSCRIBE_AUDIO))
            .multipart(form);
        let response: TranscribeResponse = self.get_json(request, TRANSCRIPTION_FAILED).await?;
        Ok(response.transcript)
    }

    async fn process_text(
        &self,
        text: &str,
        source: SourceType,
    ) -> Result<StructuredDocument, ClientError> {
        let body = ProcessTextRequest {
            text: text.to_string(),
            source_type: source,
        };
        let request = self
            .http_client
            .post(self.url(paths::PROCESS_TEXT))
            .json(&body);
        let response: DocumentResponse = self.get_json(request, PROCESSING_FAILED).await?;

        StructuredDocument::try_from(response)
            .map_err(|e| ClientError::unavailable(PROCESSING_FAILED, e))
    }

    async fn download(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        let mut url = reqwest::Url::parse(&self.url(paths::DOWNLOAD))
            .map_err(|e| ClientError::unavailable(DOWNLOAD_FAILED, e))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::unavailable(DOWNLOAD_FAILED, "base URL cannot carry a path"))?
            .push(filename);
        debug!(url = %url, "Downloading artifact");

        let response = self
            .send(self.http_client.get(url), DOWNLOAD_FAILED)
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::unavailable(DOWNLOAD_FAILED, e))?;
        Ok(bytes.to_vec())
    }

    async fn list_documents(
        &self,
        doc_type: Option<DocType>,
    ) -> Result<Vec<DocumentSummary>, ClientError> {
        let mut request = self.http_client.get(self.url(paths::DOCUMENTS));
        if let Some(doc_type) = doc_type {
            request = request.query(&[("doc_type", doc_type.as_str())]);
        }
        self.get_json(request, REQUEST_FAILED).await
    }

    async fn open_tasks(&self) -> Result<Vec<OpenTask>, ClientError> {
        let request = self.http_client.get(self.url(paths::OPEN_TASKS));
        self.get_json(request, REQUEST_FAILED).await
    }

    async fn integration_status(&self) -> Result<IntegrationStatus, ClientError> {
        let request = self.http_client.get(self.url(paths::INTEGRATION_STATUS));
        self.get_json(request, REQUEST_FAILED).await
    }
}

/// `audio/webm;codecs=opus` → `webm`
fn recording_extension(content_type: &str) -> &str {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.rsplit_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => subtype,
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let client = HttpApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.url(paths::PROCESS_TEXT),
            "http://localhost:8000/api/process-text"
        );
    }

    #[test]
    fn test_error_display_is_user_message() {
        let api = ClientError::Api {
            status: 400,
            detail: "Text input cannot be empty.".to_string(),
        };
        assert_eq!(api.to_string(), "Text input cannot be empty.");

        let unavailable = ClientError::unavailable(PROCESSING_FAILED, "connection refused");
        assert_eq!(unavailable.to_string(), "Processing failed");
        assert_eq!(unavailable.cause(), "connection refused");
    }

    #[test]
    fn test_recording_extension_ignores_mime_parameters() {
        assert_eq!(recording_extension("audio/webm;codecs=opus"), "webm");
        assert_eq!(recording_extension("audio/ogg; codecs=\"opus\""), "ogg");
        assert_eq!(recording_extension("audio/wav"), "wav");
        assert_eq!(recording_extension("audio/"), "bin");
        assert_eq!(recording_extension(""), "bin");
    }
}
