//! Session identity state.

use serde::Serialize;

use crate::gateway::ConversationId;

/// Operation currently holding the session's turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingOperation {
    /// Idle.
    #[default]
    None,
    /// Loading a thread or resetting to a fresh one.
    Load,
    /// Sending text.
    Send,
    /// Uploading a report.
    Upload,
    /// Deleting a thread.
    Delete,
    /// Showing the news view.
    News,
    /// Switching the interface language.
    Language,
}

/// The client's view of which conversation it is in.
///
/// Identity is only changed by the controller's load and delete paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    active_conversation_id: Option<ConversationId>,
    pending_operation: PendingOperation,
    current_language: String,
}

impl Session {
    /// Fresh session with no active conversation.
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            active_conversation_id: None,
            pending_operation: PendingOperation::None,
            current_language: language.into(),
        }
    }

    /// Thread the session is appending to.
    #[must_use]
    pub fn active_conversation_id(&self) -> Option<&ConversationId> {
        self.active_conversation_id.as_ref()
    }

    /// Whether a thread is active.
    #[must_use]
    pub fn has_active_conversation(&self) -> bool {
        self.active_conversation_id.is_some()
    }

    /// Whether `id` is the active thread.
    #[must_use]
    pub fn is_active(&self, id: &ConversationId) -> bool {
        self.active_conversation_id.as_ref() == Some(id)
    }

    /// Operation in flight.
    #[must_use]
    pub fn pending_operation(&self) -> PendingOperation {
        self.pending_operation
    }

    /// Language sent along with messages.
    #[must_use]
    pub fn current_language(&self) -> &str {
        &self.current_language
    }

    pub(crate) fn activate(&mut self, id: ConversationId) {
        self.active_conversation_id = Some(id);
    }

    pub(crate) fn deactivate(&mut self) {
        self.active_conversation_id = None;
    }

    pub(crate) fn begin(&mut self, operation: PendingOperation) {
        self.pending_operation = operation;
    }

    pub(crate) fn finish(&mut self) {
        self.pending_operation = PendingOperation::None;
    }

    pub(crate) fn set_language(&mut self, language: impl Into<String>) {
        self.current_language = language.into();
    }
}

/// Leading `max_chars` characters of `text`, with `...` when cut.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
