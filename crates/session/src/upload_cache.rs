//! Upload cache: maps local files to remote handles for the session.
//!
//! A file is uploaded at most once per session. Later requests fetch the
//! stored handle by id instead. Uploads retry with a fixed delay; records
//! are never evicted.

use docpair_core::document::DocumentRef;
use docpair_core::error::DocumentError;
use docpair_core::service::{mime_type_for, DocumentService, FileSource, RemoteHandle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry policy for uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Fixed delay between attempts
    pub retry_delay: Duration,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// A completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub local_path: PathBuf,
    pub remote_id: String,
    /// File name of the originating document
    pub display_name: String,
}

/// Session-scoped cache of uploads, keyed by local path.
#[derive(Debug, Default)]
pub struct UploadCache {
    records: HashMap<PathBuf, UploadRecord>,
    /// Keys in the order they were first uploaded
    order: Vec<PathBuf>,
    policy: UploadPolicy,
}

impl UploadCache {
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    pub fn get(&self, local_path: &Path) -> Option<&UploadRecord> {
        self.records.get(local_path)
    }

    pub fn contains(&self, local_path: &Path) -> bool {
        self.records.contains_key(local_path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in upload order.
    pub fn records(&self) -> Vec<&UploadRecord> {
        self.order
            .iter()
            .filter_map(|path| self.records.get(path))
            .collect()
    }

    /// Return a usable remote handle for `document`, uploading on a cache miss.
    ///
    /// Every failure is scoped to this document; callers skip it and carry on.
    pub async fn ensure(
        &mut self,
        document: &DocumentRef,
        files: &dyn FileSource,
        service: &dyn DocumentService,
    ) -> Result<RemoteHandle, DocumentError> {
        if let Some(record) = self.records.get(&document.local_path) {
            debug!(identifier = %document.identifier, remote_id = %record.remote_id, "Upload cache hit");
            return match service.get_by_id(&record.remote_id).await {
                Ok(handle) if handle.is_usable() => Ok(handle),
                Ok(handle) => Err(DocumentError::RemoteLookupFailed {
                    identifier: document.identifier.clone(),
                    reason: format!("remote file {} failed processing", handle.id),
                }),
                Err(e) => {
                    warn!(identifier = %document.identifier, error = %e, "Remote lookup failed");
                    Err(DocumentError::RemoteLookupFailed {
                        identifier: document.identifier.clone(),
                        reason: e.to_string(),
                    })
                }
            };
        }

        if !files.exists(&document.local_path).await {
            warn!(
                identifier = %document.identifier,
                path = %document.local_path.display(),
                "Document file not found, skipping"
            );
            return Err(DocumentError::MissingFile {
                identifier: document.identifier.clone(),
                path: document.local_path.clone(),
            });
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let display_name = document.file_name();
        let mime_type = mime_type_for(&document.local_path);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match upload_once(document, &display_name, mime_type, files, service).await {
                Ok(handle) => {
                    info!(
                        identifier = %document.identifier,
                        remote_id = %handle.id,
                        attempt,
                        "Document uploaded"
                    );
                    self.order.push(document.local_path.clone());
                    self.records.insert(
                        document.local_path.clone(),
                        UploadRecord {
                            local_path: document.local_path.clone(),
                            remote_id: handle.id.clone(),
                            display_name,
                        },
                    );
                    return Ok(handle);
                }
                Err(e) => {
                    warn!(
                        identifier = %document.identifier,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Upload attempt failed"
                    );
                    last_error = e;
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        Err(DocumentError::UploadExhausted {
            identifier: document.identifier.clone(),
            attempts: max_attempts,
            last_error,
        })
    }
}

/// One read-and-upload attempt.
async fn upload_once(
    document: &DocumentRef,
    display_name: &str,
    mime_type: &str,
    files: &dyn FileSource,
    service: &dyn DocumentService,
) -> Result<RemoteHandle, String> {
    let bytes = files.read(&document.local_path).await.map_err(|e| {
        DocumentError::ReadFailed {
            path: document.local_path.clone(),
            reason: e.to_string(),
        }
        .to_string()
    })?;

    service
        .upload(bytes, display_name, mime_type)
        .await
        .map_err(|e| e.to_string())
}
