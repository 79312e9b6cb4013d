//! Conversation session management.
//!
//! This module owns the client's notion of "which conversation am I in" and
//! keeps the timeline and the history sidebar consistent with the backend.
//!
//! # Architecture
//!
//! - [`Session`]: identity state (active conversation, operation in flight,
//!   language)
//! - [`SessionController`]: the only writer of the session and the timeline
//! - [`HistoryIndex`]: sidebar list of past conversations and the pending
//!   deletion
//!
//! # Example
//!
//! ```rust
//! use medassist_client::session::{PendingOperation, Session};
//!
//! let session = Session::new("en");
//! assert!(!session.has_active_conversation());
//! assert_eq!(session.pending_operation(), PendingOperation::None);
//! ```

mod controller;
mod history;
mod state;

pub use controller::{DeleteOutcome, LoadOutcome, NewsOutcome, SendOutcome, SessionController};
pub use history::{HistoryIndex, HistoryToggle, PendingDeletion};
pub use state::{PendingOperation, Session, preview};
