//! Wire types for the backend endpoints.
//!
//! These mirror the JSON bodies the backend produces; fields the client never
//! reads are left out.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Identity
// =============================================================================

/// Opaque identifier of a server-persisted conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// =============================================================================
// Conversations
// =============================================================================

/// Author of a timeline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The person using the client.
    User,
    /// The assistant.
    Bot,
}

/// A message as stored in a server-side thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Who wrote the message.
    pub role: MessageRole,
    /// Message text. Missing bodies are treated as empty.
    #[serde(default)]
    pub message: String,
}

/// Response of `GET /conversation/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationThread {
    /// Identifier the backend considers authoritative for this thread.
    pub conversation_id: ConversationId,
    /// Messages in their original order.
    pub messages: Vec<StoredMessage>,
}

/// One row of the history index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Thread identifier.
    pub id: ConversationId,
    /// Truncated preview of the thread.
    pub title: String,
}

/// Response of `GET /conversations`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationList {
    /// Past threads, newest first as the backend orders them.
    #[serde(default)]
    pub conversations: Vec<ConversationSummary>,
}

/// Response of `POST /conversation/delete/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// `"success"` when the thread was removed.
    #[serde(default)]
    pub status: String,
}

/// Outcome of a delete the backend answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// The thread is gone.
    Deleted,
    /// The backend refused; the thread still exists.
    Rejected,
}

impl From<DeleteResponse> for DeleteStatus {
    fn from(response: DeleteResponse) -> Self {
        if response.status == "success" {
            Self::Deleted
        } else {
            Self::Rejected
        }
    }
}

// =============================================================================
// Uploads
// =============================================================================

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name shown to the user and sent to the backend.
    pub file_name: String,
    /// MIME type of the content.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Build an upload, guessing the MIME type from the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }
}

// =============================================================================
// Account
// =============================================================================

/// Outcome of `POST /logout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Session ended; the front end should go to the login page.
    LoggedOut,
    /// Backend refused, optionally explaining why.
    Rejected {
        /// Server-supplied message, if the body carried one.
        message: Option<String>,
    },
}

/// Error body of a rejected logout.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LogoutRejection {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// News
// =============================================================================

/// One medical news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline.
    #[serde(default)]
    pub title: String,
    /// Short description.
    #[serde(default)]
    pub summary: Option<String>,
    /// Link to the full article.
    #[serde(default)]
    pub link: Option<String>,
    /// Image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Publication date (`YYYY-MM-DD`).
    #[serde(default)]
    pub published: Option<String>,
}

/// Response of `GET /news`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsFeed {
    /// Articles, possibly empty.
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

// =============================================================================
// Translations
// =============================================================================

/// Dictionaries keyed by language code, then by message key.
pub type TranslationSet = HashMap<String, HashMap<String, String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_parses_backend_shape() {
        let json = r#"{
            "conversation_id": "abc123",
            "messages": [
                {"role": "user", "message": "cough"},
                {"role": "bot", "message": "Drink warm fluids."},
                {"role": "bot"}
            ]
        }"#;
        let thread: ConversationThread = serde_json::from_str(json).unwrap();
        assert_eq!(thread.conversation_id.as_str(), "abc123");
        assert_eq!(thread.messages.len(), 3);
        assert_eq!(thread.messages[0].role, MessageRole::User);
        assert_eq!(thread.messages[2].message, "");
    }

    #[test]
    fn thread_without_messages_is_malformed() {
        let result = serde_json::from_str::<ConversationThread>(r#"{"conversation_id":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn delete_status_only_accepts_success() {
        let ok: DeleteResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        let nope: DeleteResponse = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        let empty: DeleteResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(DeleteStatus::from(ok), DeleteStatus::Deleted);
        assert_eq!(DeleteStatus::from(nope), DeleteStatus::Rejected);
        assert_eq!(DeleteStatus::from(empty), DeleteStatus::Rejected);
    }

    #[test]
    fn upload_guesses_content_type() {
        let upload = Upload::new("report.pdf", vec![1, 2, 3]);
        assert_eq!(upload.content_type, "application/pdf");

        let unknown = Upload::new("blob", Vec::new());
        assert_eq!(unknown.content_type, "application/octet-stream");
    }
}
