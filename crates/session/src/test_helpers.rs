//! Shared test helpers for session tests.

use async_trait::async_trait;
use docpair_core::error::ServiceError;
use docpair_core::service::{DocumentService, FileSource, RemoteHandle, RemoteState};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A mock service that records calls and fails on request.
#[derive(Default)]
pub struct MockService {
    uploads: Mutex<Vec<String>>,
    lookups: Mutex<usize>,
    /// Number of upload calls that fail before one succeeds
    failing_uploads: Mutex<usize>,
    fail_lookups: Mutex<bool>,
    /// Lookups report the remote file as FAILED
    remote_failed: Mutex<bool>,
    fail_generate: Mutex<bool>,
    last_instruction: Mutex<Option<String>>,
    last_documents: Mutex<Vec<String>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads(self, count: usize) -> Self {
        *self.failing_uploads.lock().unwrap() = count;
        self
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        *self.fail_lookups.lock().unwrap() = fail;
    }

    pub fn set_remote_failed(&self, failed: bool) {
        *self.remote_failed.lock().unwrap() = failed;
    }

    pub fn set_fail_generate(&self, fail: bool) {
        *self.fail_generate.lock().unwrap() = fail;
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn lookup_calls(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    pub fn last_instruction(&self) -> Option<String> {
        self.last_instruction.lock().unwrap().clone()
    }

    /// Display names of the documents attached to the last request.
    pub fn last_documents(&self) -> Vec<String> {
        self.last_documents.lock().unwrap().clone()
    }
}

fn handle_for(display_name: &str) -> RemoteHandle {
    RemoteHandle {
        id: format!("files/{display_name}"),
        uri: format!("https://mock/files/{display_name}"),
        mime_type: "application/pdf".into(),
        display_name: display_name.into(),
        state: RemoteState::Active,
    }
}

#[async_trait]
impl DocumentService for MockService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(
        &self,
        _bytes: Vec<u8>,
        display_name: &str,
        _mime_type: &str,
    ) -> Result<RemoteHandle, ServiceError> {
        self.uploads.lock().unwrap().push(display_name.to_string());
        let mut failing = self.failing_uploads.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(ServiceError::Network("connection reset".into()));
        }
        Ok(handle_for(display_name))
    }

    async fn get_by_id(&self, id: &str) -> Result<RemoteHandle, ServiceError> {
        *self.lookups.lock().unwrap() += 1;
        if *self.fail_lookups.lock().unwrap() {
            return Err(ServiceError::Network("lookup failed".into()));
        }
        let mut handle = handle_for(id.trim_start_matches("files/"));
        if *self.remote_failed.lock().unwrap() {
            handle.state = RemoteState::Failed;
        }
        Ok(handle)
    }

    async fn generate(
        &self,
        instruction: &str,
        documents: &[RemoteHandle],
    ) -> Result<String, ServiceError> {
        *self.last_instruction.lock().unwrap() = Some(instruction.to_string());
        *self.last_documents.lock().unwrap() =
            documents.iter().map(|d| d.display_name.clone()).collect();
        if *self.fail_generate.lock().unwrap() {
            return Err(ServiceError::ApiError {
                status_code: 500,
                message: "Internal Server Error".into(),
            });
        }
        Ok(format!("answer using {} document(s)", documents.len()))
    }
}

/// A file source backed by a fixed set of paths.
pub struct MockFiles {
    present: HashSet<PathBuf>,
}

impl MockFiles {
    pub fn with(paths: &[&str]) -> Self {
        Self {
            present: paths.iter().map(PathBuf::from).collect(),
        }
    }
}

#[async_trait]
impl FileSource for MockFiles {
    async fn exists(&self, path: &Path) -> bool {
        self.present.contains(path)
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        if self.present.contains(path) {
            Ok(b"%PDF-1.7".to_vec())
        } else {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
        }
    }
}
