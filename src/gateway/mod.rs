//! Backend gateway: thin wrappers around the assistant's HTTP endpoints.
//!
//! The [`Backend`] trait is the seam the session controller depends on.
//! [`HttpGateway`] talks to a live server; tests substitute in-process stubs.
//!
//! No retry, caching, or timeout logic lives here. A call either resolves or
//! surfaces the transport failure as a [`GatewayError`](crate::error::GatewayError).

mod http;
mod types;

pub use http::HttpGateway;
pub use types::{
    ConversationId, ConversationList, ConversationSummary, ConversationThread, DeleteResponse,
    DeleteStatus, LogoutOutcome, MessageRole, NewsFeed, NewsItem, StoredMessage, TranslationSet,
    Upload,
};

use async_trait::async_trait;

use crate::error::Result;

/// Remote operations the client consumes.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Tell the backend the current thread is finished.
    async fn end_chat(&self) -> Result<()>;

    /// Fetch a stored thread. Non-2xx and malformed bodies are errors.
    async fn fetch_conversation(&self, id: &ConversationId) -> Result<ConversationThread>;

    /// Send user text and return the assistant's raw reply.
    ///
    /// HTTP error statuses are not distinguished; whatever body came back is
    /// the reply.
    async fn send_message(&self, message: &str, language: &str) -> Result<String>;

    /// Submit a report for interpretation and return the raw reply.
    async fn upload_report(&self, upload: &Upload) -> Result<String>;

    /// List past threads.
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;

    /// Delete a thread.
    async fn delete_conversation(&self, id: &ConversationId) -> Result<DeleteStatus>;

    /// End the authenticated session.
    async fn logout(&self) -> Result<LogoutOutcome>;

    /// Fetch medical news in the given language.
    async fn fetch_news(&self, language: &str) -> Result<Vec<NewsItem>>;

    /// Fetch the interface dictionaries.
    async fn fetch_translations(&self) -> Result<TranslationSet>;
}
