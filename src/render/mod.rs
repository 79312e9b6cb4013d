//! Render commands and the sinks that consume them.
//!
//! The session controller never touches a concrete view. It pushes
//! [`RenderCommand`]s into a [`RenderSink`], which owns whatever surface the
//! commands land on.
//!
//! # Sinks
//!
//! - [`Timeline`]: in-memory view state with a command log, for inspection
//! - [`TerminalSink`]: prints the transcript to stdout in colour

mod terminal;
mod timeline;

pub use terminal::TerminalSink;
pub use timeline::{HistoryPanel, Timeline, TimelineEntry};

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gateway::{ConversationId, MessageRole};
use crate::i18n::Theme;

/// Presentation of a timeline bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStyle {
    /// Ordinary user or bot text.
    Plain,
    /// Muted client-generated status line.
    System,
    /// Inline failure bubble.
    Error,
}

/// Handle of a rendered history row.
///
/// Handles are never reused, so a handle taken before a re-fetch no longer
/// matches any row after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowHandle(pub u64);

/// A history row as rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    /// Row handle.
    pub handle: RowHandle,
    /// Thread the row opens.
    pub id: ConversationId,
    /// Preview title.
    pub title: String,
}

/// A rendered news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsCard {
    /// Headline.
    pub title: String,
    /// Summary, already truncated for display.
    pub summary: String,
    /// Article link.
    pub link: String,
    /// Image URL, defaulted when the feed had none.
    pub image: String,
}

/// Contents of the news view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum NewsView {
    /// Heading shown while the feed loads.
    Loading {
        /// Section heading.
        heading: String,
        /// Loading text.
        text: String,
    },
    /// Articles.
    Cards(Vec<NewsCard>),
    /// Feed was empty.
    Empty {
        /// Empty-state text.
        text: String,
    },
    /// Feed could not be fetched.
    Failed {
        /// Error text.
        text: String,
    },
}

/// A language offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageOption {
    /// Language code (`en`, `hi`, ...).
    pub code: String,
    /// Label in the language itself.
    pub label: String,
}

/// Commands the controller pushes into a render sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RenderCommand {
    // ─────────────────────────────────────────────────────────────────────
    // Timeline
    // ─────────────────────────────────────────────────────────────────────
    /// Append a bubble to the timeline.
    #[serde(rename = "timeline.append")]
    Append {
        /// Side of the timeline.
        role: MessageRole,
        /// Presentation.
        style: EntryStyle,
        /// Bubble text.
        text: String,
        /// Scroll to the bottom after appending.
        scroll: bool,
    },

    /// Scroll the timeline to its last entry.
    #[serde(rename = "timeline.scroll")]
    ScrollToBottom,

    /// Remove every timeline entry.
    #[serde(rename = "timeline.clear")]
    ClearTimeline,

    /// Show the typing indicator, retiring any existing one.
    #[serde(rename = "typing.show")]
    ShowTyping,

    /// Remove the typing indicator if present.
    #[serde(rename = "typing.hide")]
    HideTyping,

    // ─────────────────────────────────────────────────────────────────────
    // Inputs
    // ─────────────────────────────────────────────────────────────────────
    /// Empty the text input buffer.
    #[serde(rename = "input.clear")]
    ClearInput,

    /// Reset the file input so the same file can be chosen again.
    #[serde(rename = "file_input.clear")]
    ClearFileInput,

    // ─────────────────────────────────────────────────────────────────────
    // History panel
    // ─────────────────────────────────────────────────────────────────────
    /// Mark the history link active and insert an empty panel.
    #[serde(rename = "history.open")]
    HistoryOpened,

    /// Remove the panel and the active marker.
    #[serde(rename = "history.close")]
    HistoryClosed,

    /// Fill the panel with rows.
    #[serde(rename = "history.rows")]
    HistoryRows(Vec<HistoryRow>),

    /// Panel empty-state text.
    #[serde(rename = "history.empty")]
    HistoryEmpty {
        /// Text to show.
        text: String,
    },

    /// Inline panel error.
    #[serde(rename = "history.error")]
    HistoryError {
        /// Text to show.
        text: String,
    },

    /// Remove one row.
    #[serde(rename = "history.row_removed")]
    HistoryRowRemoved(RowHandle),

    // ─────────────────────────────────────────────────────────────────────
    // Dialogs
    // ─────────────────────────────────────────────────────────────────────
    /// Show the delete confirmation surface.
    #[serde(rename = "delete_confirm.show")]
    ShowDeleteConfirmation,

    /// Hide the delete confirmation surface.
    #[serde(rename = "delete_confirm.hide")]
    HideDeleteConfirmation,

    /// Blocking notice (alert).
    #[serde(rename = "notice")]
    Notice {
        /// Text to show.
        text: String,
    },

    /// Ask the user to pick an interface language.
    #[serde(rename = "language.prompt")]
    PromptLanguage(Vec<LanguageOption>),

    // ─────────────────────────────────────────────────────────────────────
    // Page-level
    // ─────────────────────────────────────────────────────────────────────
    /// Re-translate every tagged label and placeholder.
    #[serde(rename = "translations.apply")]
    ApplyTranslations {
        /// Active language code.
        language: String,
        /// Effective dictionary for that language.
        dictionary: HashMap<String, String>,
    },

    /// Apply a colour theme.
    #[serde(rename = "theme.apply")]
    ApplyTheme(Theme),

    /// Replace the timeline area with the news view.
    #[serde(rename = "news")]
    News(NewsView),

    /// Navigate away.
    #[serde(rename = "redirect")]
    Redirect {
        /// Target path.
        path: String,
    },
}

impl RenderCommand {
    /// Plain bubble that scrolls into view.
    #[must_use]
    pub fn message(role: MessageRole, text: impl Into<String>) -> Self {
        Self::Append {
            role,
            style: EntryStyle::Plain,
            text: text.into(),
            scroll: true,
        }
    }

    /// Muted status line on the bot side.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::Append {
            role: MessageRole::Bot,
            style: EntryStyle::System,
            text: text.into(),
            scroll: true,
        }
    }

    /// Inline failure bubble on the bot side.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::Append {
            role: MessageRole::Bot,
            style: EntryStyle::Error,
            text: text.into(),
            scroll: true,
        }
    }
}

/// Destination of render commands.
///
/// Implementations own their surface and use interior mutability; the
/// controller only ever holds a shared reference.
pub trait RenderSink: Send + Sync + fmt::Debug {
    /// Apply one command.
    fn render(&self, command: RenderCommand);
}

/// Typing indicator tied to a scope.
///
/// Showing happens on construction and hiding on drop, so the indicator is
/// retired exactly once whichever way the owning operation finishes.
pub struct TypingIndicator<'a> {
    sink: &'a dyn RenderSink,
}

impl<'a> TypingIndicator<'a> {
    /// Show the indicator.
    #[must_use = "the indicator is hidden as soon as the guard is dropped"]
    pub fn show(sink: &'a dyn RenderSink) -> Self {
        sink.render(RenderCommand::ShowTyping);
        Self { sink }
    }
}

impl Drop for TypingIndicator<'_> {
    fn drop(&mut self) {
        self.sink.render(RenderCommand::HideTyping);
    }
}

impl fmt::Debug for TypingIndicator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypingIndicator").finish_non_exhaustive()
    }
}
