//! Gemini provider implementation.
//!
//! Talks to the Generative Language REST API:
//! - Files API for uploads (`multipart/related`) and lookups by id
//! - `generateContent` with the uploaded files attached as `file_data` parts
//! - Model lookup as a health check

use async_trait::async_trait;
use docpair_core::error::ServiceError;
use docpair_core::service::{DocumentService, RemoteHandle, RemoteState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

/// Gemini-backed [`DocumentService`].
pub struct GeminiProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given request timeout.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/{API_VERSION}/files", self.base_url)
    }

    fn file_url(&self, id: &str) -> String {
        format!("{}/{API_VERSION}/{}", self.base_url, id.trim_start_matches('/'))
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/{API_VERSION}/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn model_url(&self) -> String {
        format!("{}/{API_VERSION}/models/{}", self.base_url, self.model)
    }

    /// Build the JSON body for `generateContent`: instruction first, then files.
    fn generate_body(instruction: &str, documents: &[RemoteHandle]) -> serde_json::Value {
        let mut parts = vec![ApiPart::Text {
            text: instruction.to_string(),
        }];
        parts.extend(documents.iter().map(|d| ApiPart::FileData {
            file_data: ApiFileData {
                mime_type: d.mime_type.clone(),
                file_uri: d.uri.clone(),
            },
        }));

        serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
        })
    }

    /// Map a non-success HTTP status to a [`ServiceError`].
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status().as_u16();

        if status == 429 {
            return Err(ServiceError::RateLimited {
                retry_after_secs: retry_after_secs(response.headers()),
            });
        }

        if status == 401 || status == 403 {
            return Err(ServiceError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini returned error");
            return Err(ServiceError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

/// Seconds to wait from a `Retry-After` header, 5 when absent or not numeric.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(5)
}

/// Map a transport failure to a [`ServiceError`].
fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout(e.to_string())
    } else {
        ServiceError::Network(e.to_string())
    }
}

/// Assemble a two-part `multipart/related` body: JSON metadata, then the file.
fn multipart_related(boundary: &str, metadata: &str, mime_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait]
impl DocumentService for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        mime_type: &str,
    ) -> Result<RemoteHandle, ServiceError> {
        let boundary = format!("docpair-{}", uuid::Uuid::new_v4().simple());
        let metadata = serde_json::json!({ "file": { "display_name": display_name } }).to_string();
        let size = bytes.len();
        let body = multipart_related(&boundary, &metadata, mime_type, &bytes);

        debug!(provider = %self.name, display_name, size, "Uploading file");

        let response = self
            .client
            .post(self.upload_url())
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "multipart")
            .header(
                "Content-Type",
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let response = Self::check_status(response).await?;
        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Failed to parse upload response: {e}")))?;

        Ok(uploaded.file.into_handle(mime_type))
    }

    async fn get_by_id(&self, id: &str) -> Result<RemoteHandle, ServiceError> {
        debug!(provider = %self.name, id, "Fetching file");

        let response = self
            .client
            .get(self.file_url(id))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let response = Self::check_status(response).await?;
        let file: ApiFile = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Failed to parse file: {e}")))?;

        Ok(file.into_handle("application/octet-stream"))
    }

    async fn generate(
        &self,
        instruction: &str,
        documents: &[RemoteHandle],
    ) -> Result<String, ServiceError> {
        let body = Self::generate_body(instruction, documents);

        debug!(
            provider = %self.name,
            model = %self.model,
            documents = documents.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let response = Self::check_status(response).await?;
        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        generated.into_text()
    }

    async fn health_check(&self) -> Result<bool, ServiceError> {
        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiPart {
    Text { text: String },
    FileData { file_data: ApiFileData },
}

#[derive(Debug, Serialize)]
struct ApiFileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: ApiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    state: Option<String>,
}

impl ApiFile {
    fn into_handle(self, fallback_mime: &str) -> RemoteHandle {
        let state = match self.state.as_deref() {
            Some("ACTIVE") => RemoteState::Active,
            Some("PROCESSING") => RemoteState::Processing,
            Some("FAILED") => RemoteState::Failed,
            _ => RemoteState::Unspecified,
        };

        RemoteHandle {
            id: self.name,
            uri: self.uri,
            mime_type: self.mime_type.unwrap_or_else(|| fallback_mime.to_string()),
            display_name: self.display_name,
            state,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<ApiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(default)]
    parts: Vec<ApiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ApiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String, ServiceError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".into());
            return Err(ServiceError::InvalidResponse(format!(
                "Model returned no answer: {reason}"
            )));
        };

        let texts: Vec<String> = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if texts.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "empty candidate".into());
            return Err(ServiceError::InvalidResponse(format!(
                "Model returned no text: {reason}"
            )));
        }

        Ok(texts.concat())
    }
}
