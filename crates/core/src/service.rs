//! External collaborators: the hosted document service and the local file source.
//!
//! A `DocumentService` stores uploaded files remotely and answers
//! instructions with those files as context. A `FileSource` is the
//! read-only directory the documents come from.
//!
//! Implementations: Gemini (in `docpair-providers`), local disk (here),
//! and scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::ServiceError;

/// Processing state of a remote file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteState {
    Processing,
    Active,
    Failed,
    #[default]
    Unspecified,
}

/// A file held by the external service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHandle {
    /// Service-assigned id (e.g. `files/abc123`)
    pub id: String,

    /// URI used to reference the file in generation requests
    pub uri: String,

    pub mime_type: String,

    pub display_name: String,

    #[serde(default)]
    pub state: RemoteState,
}

impl RemoteHandle {
    /// Whether the file can be referenced in a request.
    pub fn is_usable(&self) -> bool {
        self.state != RemoteState::Failed
    }
}

/// The hosted document-understanding service.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// A human-readable name for this service (e.g., "gemini").
    fn name(&self) -> &str;

    /// Store a file remotely.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        mime_type: &str,
    ) -> std::result::Result<RemoteHandle, ServiceError>;

    /// Fetch a previously uploaded file by id.
    async fn get_by_id(&self, id: &str) -> std::result::Result<RemoteHandle, ServiceError>;

    /// Answer an instruction using the given files as context.
    async fn generate(
        &self,
        instruction: &str,
        documents: &[RemoteHandle],
    ) -> std::result::Result<String, ServiceError>;

    /// Health check: can we reach the service?
    async fn health_check(&self) -> std::result::Result<bool, ServiceError> {
        Ok(true)
    }
}

/// Read-only access to the document directory.
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// [`FileSource`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

#[async_trait]
impl FileSource for LocalFiles {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// MIME type sent with an upload, from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html" | "htm") => "text/html",
        _ => "application/octet-stream",
    }
}
