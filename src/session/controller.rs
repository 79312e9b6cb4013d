//! Conversation session controller.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use super::history::{HistoryIndex, PendingDeletion};
use super::state::{PendingOperation, Session, preview};
use crate::gateway::{
    Backend, ConversationId, DeleteStatus, LogoutOutcome, MessageRole, NewsItem, Upload,
};
use crate::i18n::{self, InitialLanguage, LanguagePolicy, Translator};
use crate::render::{
    EntryStyle, NewsCard, NewsView, RenderCommand, RenderSink, RowHandle, TypingIndicator,
};

/// Characters of the first message shown after loading a thread.
const LOAD_PREVIEW_CHARS: usize = 40;

/// Characters of a news summary shown on a card.
const NEWS_SUMMARY_CHARS: usize = 200;

/// Articles shown at most.
const MAX_NEWS_ITEMS: usize = 10;

/// Image used when an article has none.
const DEFAULT_NEWS_IMAGE: &str = "/static/default-news.png";

/// Where a successful logout sends the user.
const LOGIN_PATH: &str = "/login";

/// Result of [`SessionController::load_conversation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The requested thread was already active; nothing reloaded.
    Reassured,
    /// Session reset to no active conversation.
    Reset,
    /// Thread loaded; carries the identifier the backend returned.
    Loaded(ConversationId),
    /// Thread could not be fetched; session reset.
    Failed,
}

/// Result of [`SessionController::send_text`] and
/// [`SessionController::upload_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send.
    Skipped,
    /// Reply rendered.
    Answered,
    /// Request failed; error bubble rendered.
    Failed,
}

/// Result of [`SessionController::confirm_delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No row was selected.
    NothingPending,
    /// Thread deleted.
    Deleted {
        /// The deleted thread was the active one and the session was reset.
        was_active: bool,
    },
    /// Backend answered but refused.
    Rejected,
    /// Request never got an answer.
    Failed,
}

/// Result of [`SessionController::show_news`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsOutcome {
    /// Cards rendered.
    Shown(usize),
    /// Feed was empty.
    Empty,
    /// Feed could not be fetched.
    Failed,
}

/// Holds the session's turn for one operation.
///
/// Dropping it marks the session idle and lets the next queued operation in.
struct OperationTurn<'a> {
    _turn: tokio::sync::MutexGuard<'a, ()>,
    session: &'a RwLock<Session>,
}

impl Drop for OperationTurn<'_> {
    fn drop(&mut self) {
        self.session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .finish();
    }
}

/// Owns session identity and sequences every operation against it.
///
/// Operations that touch the timeline or the active conversation take the
/// session's turn first. The turn is a fair mutex, so overlapping calls run
/// one after another in arrival order.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use medassist_client::gateway::HttpGateway;
/// use medassist_client::i18n::{LanguagePolicy, MemoryPreferences, Translator};
/// use medassist_client::render::{RenderSink, Timeline};
/// use medassist_client::session::SessionController;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = Arc::new(HttpGateway::new("http://localhost:8080")?);
/// let timeline = Arc::new(Timeline::new());
/// let translator = Arc::new(Translator::new(Arc::new(MemoryPreferences::new()), "en"));
/// let controller =
///     SessionController::new(backend, Arc::clone(&timeline) as Arc<dyn RenderSink>, translator, LanguagePolicy::Restore);
///
/// controller.start().await;
/// controller.send_text("headache and fever").await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionController {
    backend: Arc<dyn Backend>,
    sink: Arc<dyn RenderSink>,
    translator: Arc<Translator>,
    history: Arc<HistoryIndex>,
    policy: LanguagePolicy,
    session: RwLock<Session>,
    turn: tokio::sync::Mutex<()>,
}

impl SessionController {
    /// Create a controller with no active conversation.
    pub fn new(
        backend: Arc<dyn Backend>,
        sink: Arc<dyn RenderSink>,
        translator: Arc<Translator>,
        policy: LanguagePolicy,
    ) -> Self {
        let history = Arc::new(HistoryIndex::new(
            Arc::clone(&backend),
            Arc::clone(&sink),
            Arc::clone(&translator),
        ));
        let session = Session::new(translator.language());
        Self {
            backend,
            sink,
            translator,
            history,
            policy,
            session: RwLock::new(session),
            turn: tokio::sync::Mutex::new(()),
        }
    }

    /// The sidebar index this controller keeps in sync.
    pub fn history(&self) -> &Arc<HistoryIndex> {
        &self.history
    }

    /// The translation provider.
    pub fn translator(&self) -> &Arc<Translator> {
        &self.translator
    }

    /// Copy of the current session state.
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn begin(&self, operation: PendingOperation) -> OperationTurn<'_> {
        let turn = self.turn.lock().await;
        self.write().begin(operation);
        OperationTurn {
            _turn: turn,
            session: &self.session,
        }
    }

    fn t(&self, key: &str, fallback: &str) -> String {
        self.translator.translate(key, fallback)
    }

    fn system(&self, key: &str, fallback: &str) {
        self.sink.render(RenderCommand::system(self.t(key, fallback)));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Startup
    // ─────────────────────────────────────────────────────────────────────────

    /// Load translations, settle the interface language, and start a fresh
    /// session.
    ///
    /// Under [`LanguagePolicy::Prompt`] with nothing persisted, a
    /// [`RenderCommand::PromptLanguage`] is emitted and the front end is
    /// expected to answer with [`SessionController::set_language`].
    pub async fn start(&self) -> InitialLanguage {
        self.translator.load(self.backend.as_ref()).await;

        let initial = self.translator.initial_language(self.policy);
        match &initial {
            InitialLanguage::Ready(code) => {
                self.write().set_language(code.clone());
                self.translator.apply(self.sink.as_ref());
            }
            InitialLanguage::NeedsPrompt => {
                self.translator.apply(self.sink.as_ref());
                self.sink
                    .render(RenderCommand::PromptLanguage(i18n::language_options()));
            }
        }

        self.load_conversation(None).await;
        initial
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// Open a stored thread, or start fresh with `None`.
    pub async fn load_conversation(&self, id: Option<ConversationId>) -> LoadOutcome {
        let _turn = self.begin(PendingOperation::Load).await;
        self.load_in_turn(id.as_ref()).await
    }

    /// Open the thread behind a history row.
    pub async fn open_history_row(&self, handle: RowHandle) -> Option<LoadOutcome> {
        let id = self.history.row_id(handle)?;
        Some(self.load_conversation(Some(id)).await)
    }

    async fn load_in_turn(&self, id: Option<&ConversationId>) -> LoadOutcome {
        let Some(id) = id else {
            return self.reset_in_turn().await;
        };

        if self.read().is_active(id) {
            self.system(
                "msg_welcome_back",
                "Welcome back! Ask me any medical question or upload a report.",
            );
            return LoadOutcome::Reassured;
        }

        // Cleared before the fetch so a slow response never mixes threads.
        self.sink.render(RenderCommand::ClearTimeline);

        let thread = match self.backend.fetch_conversation(id).await {
            Ok(thread) => thread,
            Err(e) => {
                warn!(
                    name: "session.load.failed",
                    conversation_id = %id,
                    error = %e,
                    "Could not load conversation"
                );
                self.write().deactivate();
                self.system(
                    "msg_could_not_load_history",
                    "Could not load chat history. Starting a new session.",
                );
                return LoadOutcome::Failed;
            }
        };

        for message in &thread.messages {
            self.sink.render(RenderCommand::Append {
                role: message.role,
                style: EntryStyle::Plain,
                text: message.message.clone(),
                scroll: false,
            });
        }
        self.sink.render(RenderCommand::ScrollToBottom);

        let loaded = thread.conversation_id;
        self.write().activate(loaded.clone());
        info!(
            name: "session.loaded",
            conversation_id = %loaded,
            messages = thread.messages.len(),
            "Conversation loaded"
        );

        let first = thread
            .messages
            .first()
            .map(|m| m.message.as_str())
            .unwrap_or_default();
        self.sink.render(RenderCommand::system(format!(
            "{}: {}",
            self.t("msg_loaded_conversation", "Loaded conversation"),
            preview(first, LOAD_PREVIEW_CHARS)
        )));

        LoadOutcome::Loaded(loaded)
    }

    async fn reset_in_turn(&self) -> LoadOutcome {
        self.sink.render(RenderCommand::ClearTimeline);

        // Local reset does not wait on the backend agreeing.
        if let Err(e) = self.backend.end_chat().await {
            warn!(name: "session.end_chat.failed", error = %e, "End chat request failed");
        }

        self.write().deactivate();
        info!(name: "session.reset", "Started a new conversation");
        self.system(
            "msg_new_conversation_started",
            "New conversation started. Upload a report or ask a question.",
        );
        LoadOutcome::Reset
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────

    /// Send user text and render the reply.
    pub async fn send_text(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Skipped;
        }

        let _turn = self.begin(PendingOperation::Send).await;
        let (had_conversation, language) = {
            let session = self.read();
            (
                session.has_active_conversation(),
                session.current_language().to_string(),
            )
        };

        self.sink.render(RenderCommand::message(MessageRole::User, text));
        self.sink.render(RenderCommand::ClearInput);

        let result = {
            let _typing = TypingIndicator::show(self.sink.as_ref());
            self.backend.send_message(text, &language).await
        };

        match result {
            Ok(reply) => {
                let reply = if reply.trim().is_empty() {
                    self.t("msg_no_response", "No response")
                } else {
                    reply
                };
                self.sink.render(RenderCommand::message(MessageRole::Bot, reply));

                // The backend may have just created a thread for this message.
                if !had_conversation && self.history.is_open() {
                    self.history.force_refresh().await;
                }
                SendOutcome::Answered
            }
            Err(e) => {
                warn!(name: "session.send.failed", error = %e, "Send failed");
                self.sink.render(RenderCommand::error(
                    self.t("msg_server_unreachable", "Error: could not reach server."),
                ));
                SendOutcome::Failed
            }
        }
    }

    /// Upload a report and render its interpretation.
    pub async fn upload_file(&self, file: Option<Upload>) -> SendOutcome {
        let Some(upload) = file else {
            return SendOutcome::Skipped;
        };

        let _turn = self.begin(PendingOperation::Upload).await;
        self.sink.render(RenderCommand::message(
            MessageRole::User,
            format!("{}: {}", self.t("msg_uploaded", "Uploaded"), upload.file_name),
        ));

        let result = {
            let _typing = TypingIndicator::show(self.sink.as_ref());
            self.backend.upload_report(&upload).await
        };

        let outcome = match result {
            Ok(interpretation) => {
                let interpretation = if interpretation.trim().is_empty() {
                    self.t("msg_no_interpretation", "No interpretation returned.")
                } else {
                    interpretation
                };
                self.sink
                    .render(RenderCommand::message(MessageRole::Bot, interpretation));
                SendOutcome::Answered
            }
            Err(e) => {
                warn!(
                    name: "session.upload.failed",
                    file = %upload.file_name,
                    error = %e,
                    "Upload failed"
                );
                self.sink
                    .render(RenderCommand::error(self.t("msg_upload_failed", "Upload failed.")));
                SendOutcome::Failed
            }
        };

        self.sink.render(RenderCommand::ClearFileInput);
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Deletion
    // ─────────────────────────────────────────────────────────────────────────

    /// Delete the selected thread.
    pub async fn confirm_delete(&self) -> DeleteOutcome {
        let _turn = self.begin(PendingOperation::Delete).await;
        let Some(pending) = self.history.pending_deletion() else {
            return DeleteOutcome::NothingPending;
        };

        let outcome = self.delete_in_turn(&pending).await;
        self.history.dismiss_deletion();
        outcome
    }

    async fn delete_in_turn(&self, pending: &PendingDeletion) -> DeleteOutcome {
        match self.backend.delete_conversation(&pending.id).await {
            Ok(DeleteStatus::Deleted) => {
                self.history.remove_row(pending);
                let was_active = self.read().is_active(&pending.id);
                info!(
                    name: "session.deleted",
                    conversation_id = %pending.id,
                    was_active,
                    "Conversation deleted"
                );
                if was_active {
                    self.reset_in_turn().await;
                }
                self.system("msg_chat_deleted", "Conversation deleted.");
                DeleteOutcome::Deleted { was_active }
            }
            Ok(DeleteStatus::Rejected) => {
                warn!(name: "session.delete.rejected", conversation_id = %pending.id);
                self.sink.render(RenderCommand::Notice {
                    text: self.t("msg_delete_failed", "Failed to delete chat."),
                });
                DeleteOutcome::Rejected
            }
            Err(e) => {
                warn!(
                    name: "session.delete.failed",
                    conversation_id = %pending.id,
                    error = %e,
                    "Delete request failed"
                );
                self.sink.render(RenderCommand::Notice {
                    text: self.t("msg_server_error", "Server error."),
                });
                DeleteOutcome::Failed
            }
        }
    }

    /// Drop the selection and hide the confirmation surface.
    pub fn cancel_delete(&self) {
        self.history.dismiss_deletion();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Language, news, account
    // ─────────────────────────────────────────────────────────────────────────

    /// Switch the interface language. Unknown codes are ignored.
    pub async fn set_language(&self, code: &str) -> bool {
        if !i18n::is_supported(code) {
            return false;
        }
        let _turn = self.begin(PendingOperation::Language).await;
        let switched = self.translator.set_language(code, self.sink.as_ref());
        if switched {
            self.write().set_language(code);
        }
        switched
    }

    /// Replace the timeline with the latest medical news.
    pub async fn show_news(&self) -> NewsOutcome {
        let _turn = self.begin(PendingOperation::News).await;
        let language = self.read().current_language().to_string();

        self.sink.render(RenderCommand::ClearTimeline);
        self.sink.render(RenderCommand::News(NewsView::Loading {
            heading: self.t("news_heading", "Latest Medical News"),
            text: self.t("msg_loading_news", "Loading news..."),
        }));

        match self.backend.fetch_news(&language).await {
            Ok(items) if items.is_empty() => {
                self.sink.render(RenderCommand::News(NewsView::Empty {
                    text: self.t("msg_no_news", "No news available."),
                }));
                NewsOutcome::Empty
            }
            Ok(items) => {
                let cards: Vec<NewsCard> = items
                    .into_iter()
                    .take(MAX_NEWS_ITEMS)
                    .map(news_card)
                    .collect();
                let shown = cards.len();
                self.sink.render(RenderCommand::News(NewsView::Cards(cards)));
                NewsOutcome::Shown(shown)
            }
            Err(e) => {
                warn!(name: "news.fetch.failed", language = %language, error = %e, "News fetch failed");
                self.sink.render(RenderCommand::News(NewsView::Failed {
                    text: self.t("msg_error_loading_news", "Error loading news."),
                }));
                NewsOutcome::Failed
            }
        }
    }

    /// End the authenticated session. Returns whether the backend agreed.
    pub async fn logout(&self) -> bool {
        let generic = || self.t("msg_logout_failed", "Logout failed");
        match self.backend.logout().await {
            Ok(LogoutOutcome::LoggedOut) => {
                info!(name: "session.logout", "Logged out");
                self.sink.render(RenderCommand::Redirect {
                    path: LOGIN_PATH.to_string(),
                });
                true
            }
            Ok(LogoutOutcome::Rejected { message }) => {
                self.sink.render(RenderCommand::Notice {
                    text: message.unwrap_or_else(generic),
                });
                false
            }
            Err(e) => {
                warn!(name: "session.logout.failed", error = %e, "Logout request failed");
                self.sink.render(RenderCommand::Notice { text: generic() });
                false
            }
        }
    }
}

fn news_card(item: NewsItem) -> NewsCard {
    NewsCard {
        title: item.title,
        summary: preview(item.summary.as_deref().unwrap_or_default(), NEWS_SUMMARY_CHARS),
        link: item.link.unwrap_or_else(|| "#".to_string()),
        image: item
            .image
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_NEWS_IMAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_card_defaults_missing_fields() {
        let card = news_card(NewsItem {
            title: "Heatwave advisory".into(),
            summary: Some("x".repeat(250)),
            link: None,
            image: Some(String::new()),
            published: None,
        });
        assert_eq!(card.link, "#");
        assert_eq!(card.image, DEFAULT_NEWS_IMAGE);
        assert_eq!(card.summary.chars().count(), NEWS_SUMMARY_CHARS + 3);
    }
}
