//! The session state machine.
//!
//! Owns everything scoped to one user: the selection, the upload cache and
//! the conversation. UI events arrive as [`SessionEvent`] values and are
//! processed one at a time to completion by [`Session::handle`].

use crate::dispatcher::RequestDispatcher;
use crate::upload_cache::{UploadCache, UploadPolicy};
use docpair_core::document::DocumentRegistry;
use docpair_core::error::{DocumentError, ServiceError};
use docpair_core::message::{Conversation, Turn};
use docpair_core::prompt::{self, CannedKind, RequestPayload};
use docpair_core::selection::{Checkbox, SelectionTracker};
use docpair_core::service::{DocumentService, FileSource, RemoteHandle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Unique identifier for a user session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A discrete UI event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A document checkbox changed
    Toggle { identifier: String, selected: bool },
    /// A canned-action button was pressed
    Canned { kind: CannedKind },
    /// Free-form question submitted
    Submit { question: String },
    /// Clear the conversation
    Reset,
}

/// Where the current interaction cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    UserInputReceived,
    AwaitingUpload,
    PromptComposed,
    Dispatched,
    RepliedAppended,
    ErrorSurfaced,
}

/// What handling an event produced, for the UI to render.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The selection changed (or was confirmed)
    SelectionChanged {
        selected: Vec<String>,
        evicted: Option<String>,
        warnings: Vec<DocumentError>,
    },
    /// The model replied; the reply was appended to the conversation
    Replied {
        reply: String,
        /// Identifiers of the documents sent with the request
        attached: Vec<String>,
        warnings: Vec<DocumentError>,
    },
    /// The request failed; the user turn stays without a reply
    Failed {
        error: ServiceError,
        warnings: Vec<DocumentError>,
    },
    /// Conversation cleared
    Reset,
    /// Nothing to do (empty input, unknown document)
    Ignored { warnings: Vec<DocumentError> },
}

impl Outcome {
    /// Per-document problems to surface as warnings.
    pub fn warnings(&self) -> &[DocumentError] {
        match self {
            Outcome::SelectionChanged { warnings, .. }
            | Outcome::Replied { warnings, .. }
            | Outcome::Failed { warnings, .. }
            | Outcome::Ignored { warnings } => warnings.as_slice(),
            Outcome::Reset => &[],
        }
    }
}

/// One user's documents and conversation.
pub struct Session {
    id: SessionId,
    registry: Arc<DocumentRegistry>,
    selection: SelectionTracker,
    uploads: UploadCache,
    conversation: Conversation,
    service: Arc<dyn DocumentService>,
    files: Arc<dyn FileSource>,
    dispatcher: RequestDispatcher,
    phase: CyclePhase,
}

impl Session {
    /// Start a session with the default upload policy.
    pub fn new(
        registry: Arc<DocumentRegistry>,
        service: Arc<dyn DocumentService>,
        files: Arc<dyn FileSource>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            registry,
            selection: SelectionTracker::new(),
            uploads: UploadCache::default(),
            conversation: Conversation::new(),
            dispatcher: RequestDispatcher::new(Arc::clone(&service)),
            service,
            files,
            phase: CyclePhase::Idle,
        }
    }

    /// Replace the upload retry policy.
    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.uploads = UploadCache::new(policy);
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn uploads(&self) -> &UploadCache {
        &self.uploads
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Checkbox rows derived from the current selection.
    pub fn checkboxes(&self) -> Vec<Checkbox> {
        self.selection.checkboxes(&self.registry)
    }

    /// Process one event to completion.
    pub async fn handle(&mut self, event: SessionEvent) -> Outcome {
        match event {
            SessionEvent::Toggle {
                identifier,
                selected,
            } => self.toggle(&identifier, selected).await,
            SessionEvent::Canned { kind } => {
                let text = prompt::build_canned_prompt(kind, self.selection.current());
                debug!(session = %self.id, kind = kind.as_str(), "Canned prompt queued");
                self.conversation.set_pending(text);
                self.run_cycle(None).await
            }
            SessionEvent::Submit { question } => self.run_cycle(Some(question)).await,
            SessionEvent::Reset => {
                self.reset();
                Outcome::Reset
            }
        }
    }

    /// Clear the conversation and any pending prompt.
    ///
    /// Selection and uploads survive a reset.
    pub fn reset(&mut self) {
        self.conversation.reset();
        self.phase = CyclePhase::Idle;
        info!(session = %self.id, "Conversation reset");
    }

    async fn toggle(&mut self, identifier: &str, selected: bool) -> Outcome {
        let registry = Arc::clone(&self.registry);
        let Some(document) = registry.lookup(identifier) else {
            warn!(session = %self.id, identifier, "Toggle for unknown document ignored");
            return Outcome::Ignored {
                warnings: vec![DocumentError::NotFound(identifier.to_string())],
            };
        };

        let newly_selected = selected && !self.selection.contains(identifier);
        let evicted = self.selection.toggle(identifier, selected);
        if let Some(old) = &evicted {
            info!(session = %self.id, evicted = %old, "Selection full, evicted oldest document");
        }

        let mut warnings = Vec::new();
        if newly_selected {
            if let Err(e) = self
                .uploads
                .ensure(document, self.files.as_ref(), self.service.as_ref())
                .await
            {
                warnings.push(e);
            }
        }

        Outcome::SelectionChanged {
            selected: self.selection.current().to_vec(),
            evicted,
            warnings,
        }
    }

    /// Run one interaction cycle.
    ///
    /// A pending canned prompt takes priority over `question`.
    async fn run_cycle(&mut self, question: Option<String>) -> Outcome {
        let input = self
            .conversation
            .take_pending()
            .or(question)
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        let Some(input) = input else {
            return Outcome::Ignored { warnings: vec![] };
        };

        self.phase = CyclePhase::UserInputReceived;
        self.conversation.push(Turn::user(&input));

        self.phase = CyclePhase::AwaitingUpload;
        let (documents, attached, warnings) = self.attach_selected().await;

        self.phase = CyclePhase::PromptComposed;
        let payload = RequestPayload {
            instruction: prompt::compose(&input, self.conversation.turns()),
            documents,
        };

        self.phase = CyclePhase::Dispatched;
        let outcome = match self.dispatcher.send(&payload).await {
            Ok(reply) => {
                self.conversation.push(Turn::assistant(&reply));
                self.phase = CyclePhase::RepliedAppended;
                Outcome::Replied {
                    reply,
                    attached,
                    warnings,
                }
            }
            Err(error) => {
                self.phase = CyclePhase::ErrorSurfaced;
                Outcome::Failed { error, warnings }
            }
        };

        debug!(session = %self.id, phase = ?self.phase, "Cycle finished");
        self.phase = CyclePhase::Idle;
        outcome
    }

    /// Resolve remote handles for the selection, in selection order.
    async fn attach_selected(&mut self) -> (Vec<RemoteHandle>, Vec<String>, Vec<DocumentError>) {
        let registry = Arc::clone(&self.registry);
        let mut handles = Vec::new();
        let mut attached = Vec::new();
        let mut warnings = Vec::new();

        for identifier in self.selection.current().to_vec() {
            let Some(document) = registry.lookup(&identifier) else {
                warnings.push(DocumentError::NotFound(identifier));
                continue;
            };

            match self
                .uploads
                .ensure(document, self.files.as_ref(), self.service.as_ref())
                .await
            {
                Ok(handle) => {
                    handles.push(handle);
                    attached.push(identifier);
                }
                Err(e) => warnings.push(e),
            }
        }

        (handles, attached, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockFiles, MockService};
    use docpair_core::document::DocumentRef;
    use docpair_core::message::Role;

    fn registry() -> Arc<DocumentRegistry> {
        Arc::new(DocumentRegistry::new([
            DocumentRef::new("A", "Doc A", "data/A.pdf"),
            DocumentRef::new("B", "Doc B", "data/B.pdf"),
            DocumentRef::new("C", "Doc C", "data/C.pdf"),
        ]))
    }

    fn session_with(service: Arc<MockService>, present: &[&str]) -> Session {
        Session::new(registry(), service, Arc::new(MockFiles::with(present)))
    }

    fn toggle(identifier: &str, selected: bool) -> SessionEvent {
        SessionEvent::Toggle {
            identifier: identifier.into(),
            selected,
        }
    }

    fn submit(question: &str) -> SessionEvent {
        SessionEvent::Submit {
            question: question.into(),
        }
    }

    #[tokio::test]
    async fn toggle_uploads_new_selection() {
        let service = Arc::new(MockService::new());
        let mut session = session_with(service.clone(), &["data/A.pdf"]);

        let outcome = session.handle(toggle("A", true)).await;
        assert!(outcome.warnings().is_empty());
        assert_eq!(service.upload_calls(), 1);
        assert!(session.uploads().contains(std::path::Path::new("data/A.pdf")));
    }

    #[tokio::test]
    async fn third_toggle_evicts_and_unchecks() {
        let service = Arc::new(MockService::new());
        let mut session = session_with(service, &["data/A.pdf", "data/B.pdf", "data/C.pdf"]);

        session.handle(toggle("A", true)).await;
        session.handle(toggle("B", true)).await;
        match session.handle(toggle("C", true)).await {
            Outcome::SelectionChanged {
                selected, evicted, ..
            } => {
                assert_eq!(selected, ["B", "C"]);
                assert_eq!(evicted.as_deref(), Some("A"));
            }
            other => panic!("Expected SelectionChanged, got: {other:?}"),
        }

        let checked: Vec<_> = session
            .checkboxes()
            .into_iter()
            .filter(|c| c.checked)
            .map(|c| c.identifier)
            .collect();
        assert_eq!(checked, ["B", "C"]);
    }

    #[tokio::test]
    async fn unknown_identifier_is_ignored() {
        let service = Arc::new(MockService::new());
        let mut session = session_with(service, &[]);

        let outcome = session.handle(toggle("ZZZ", true)).await;
        assert!(matches!(outcome, Outcome::Ignored { .. }));
        assert!(matches!(outcome.warnings()[0], DocumentError::NotFound(_)));
        assert!(session.selection().is_empty());
    }

    #[tokio::test]
    async fn submit_appends_user_and_assistant_turns() {
        let service = Arc::new(MockService::new());
        let mut session = session_with(service.clone(), &["data/A.pdf", "data/B.pdf"]);
        session.handle(toggle("A", true)).await;
        session.handle(toggle("B", true)).await;

        match session.handle(submit("What is the maturity?")).await {
            Outcome::Replied { reply, attached, .. } => {
                assert_eq!(reply, "answer using 2 document(s)");
                assert_eq!(attached, ["A", "B"]);
            }
            other => panic!("Expected Replied, got: {other:?}"),
        }

        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(service.last_documents(), ["A.pdf", "B.pdf"]);
        assert_eq!(session.phase(), CyclePhase::Idle);
    }

    #[tokio::test]
    async fn blank_submit_is_ignored() {
        let service = Arc::new(MockService::new());
        let mut session = session_with(service.clone(), &[]);

        let outcome = session.handle(submit("   ")).await;
        assert!(matches!(outcome, Outcome::Ignored { .. }));
        assert!(session.conversation().is_empty());
        assert!(service.last_instruction().is_none());
    }

    #[tokio::test]
    async fn canned_prompt_names_selected_pair() {
        let service = Arc::new(MockService::new());
        let mut session = session_with(service.clone(), &["data/A.pdf", "data/B.pdf"]);
        session.handle(toggle("A", true)).await;
        session.handle(toggle("B", true)).await;

        let outcome = session
            .handle(SessionEvent::Canned {
                kind: CannedKind::Compare,
            })
            .await;
        assert!(matches!(outcome, Outcome::Replied { .. }));

        let instruction = service.last_instruction().unwrap();
        assert!(instruction.contains("A and B"));
        assert!(session.conversation().pending().is_none());
        assert!(session.conversation().turns()[0].text.contains("compare"));
    }

    #[tokio::test]
    async fn dispatch_failure_leaves_dangling_user_turn() {
        let service = Arc::new(MockService::new());
        service.set_fail_generate(true);
        let mut session = session_with(service, &[]);

        let outcome = session.handle(submit("Any call provisions?")).await;
        assert!(matches!(outcome, Outcome::Failed { .. }));

        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].text, "Any call provisions?");
        assert_eq!(session.phase(), CyclePhase::Idle);
    }

    #[tokio::test]
    async fn reset_keeps_selection_and_uploads() {
        let service = Arc::new(MockService::new());
        let mut session = session_with(service, &["data/A.pdf"]);
        session.handle(toggle("A", true)).await;
        session.handle(submit("hello")).await;

        assert!(matches!(session.handle(SessionEvent::Reset).await, Outcome::Reset));
        assert!(session.conversation().is_empty());
        assert!(session.conversation().pending().is_none());
        assert_eq!(session.selection().current(), ["A"]);
        assert_eq!(session.uploads().len(), 1);
    }
}
