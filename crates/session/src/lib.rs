//! The docpair session: one user's documents and conversation.
//!
//! A session runs discrete UI events through a synchronous cycle:
//!
//! 1. **Toggle** a document: update the selection, upload it if new
//! 2. **Receive** a question (typed or canned)
//! 3. **Attach** the selected documents, uploading on cache miss
//! 4. **Compose** the instruction from history + question
//! 5. **Dispatch** to the hosted model and append the reply
//!
//! A reset clears the conversation but keeps selection and uploads.

pub mod dispatcher;
pub mod session;
pub mod upload_cache;

pub use dispatcher::RequestDispatcher;
pub use session::{CyclePhase, Outcome, Session, SessionEvent, SessionId};
pub use upload_cache::{UploadCache, UploadPolicy, UploadRecord};

#[cfg(test)]
pub(crate) mod test_helpers;
