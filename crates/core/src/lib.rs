//! # docpair Core
//!
//! Domain types, traits, and error definitions for the docpair document
//! analyzer. A user attaches up to two bond documents to a conversation and
//! asks questions about them; everything that talks to the outside world is
//! a trait here, implemented in other crates.
//!
//! ## Design Philosophy
//!
//! The session crate drives these types; the providers crate implements the
//! external service. Tests swap in mock collaborators through the same
//! traits.

pub mod error;
pub mod document;
pub mod selection;
pub mod message;
pub mod prompt;
pub mod service;

// Re-export key types at crate root for ergonomics
pub use error::{DocumentError, ServiceError};
pub use document::{DocumentRef, DocumentRegistry};
pub use selection::{Checkbox, SelectionTracker, MAX_SELECTED};
pub use message::{Conversation, Role, Turn};
pub use prompt::{CannedKind, RequestPayload};
pub use service::{DocumentService, FileSource, LocalFiles, RemoteHandle, RemoteState};
