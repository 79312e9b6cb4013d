//! In-memory render sink.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::{EntryStyle, HistoryRow, LanguageOption, NewsView, RenderCommand, RenderSink};
use crate::gateway::MessageRole;
use crate::i18n::Theme;

/// One rendered timeline bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Logical render position, increasing across clears.
    pub position: u64,
    /// Side of the timeline.
    pub role: MessageRole,
    /// Presentation.
    pub style: EntryStyle,
    /// Bubble text.
    pub text: String,
}

/// View state built by applying render commands.
///
/// Every command is also kept in an append-only log so callers can check
/// ordering, not just the end state.
#[derive(Debug, Default)]
pub struct Timeline {
    state: Mutex<TimelineState>,
}

#[derive(Debug, Default)]
struct TimelineState {
    entries: Vec<TimelineEntry>,
    next_position: u64,
    typing: Option<u64>,
    scrolls: usize,
    input_clears: usize,
    file_input_clears: usize,
    history: Option<HistoryPanel>,
    confirmation_visible: bool,
    notices: Vec<String>,
    language_prompt: Option<Vec<LanguageOption>>,
    language: Option<String>,
    dictionary: HashMap<String, String>,
    theme: Option<Theme>,
    news: Option<NewsView>,
    redirect: Option<String>,
    log: Vec<RenderCommand>,
}

/// Rendered state of the history panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPanel {
    /// Rows currently shown.
    pub rows: Vec<HistoryRow>,
    /// Empty-state or error text, if any.
    pub message: Option<String>,
}

impl Timeline {
    /// Create an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TimelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rendered bubbles, excluding the typing indicator.
    pub fn messages(&self) -> Vec<TimelineEntry> {
        self.lock().entries.clone()
    }

    /// Bubbles of one style.
    pub fn messages_with_style(&self, style: EntryStyle) -> Vec<TimelineEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.style == style)
            .cloned()
            .collect()
    }

    /// Number of typing indicators on screen (0 or 1).
    pub fn typing_markers(&self) -> usize {
        usize::from(self.lock().typing.is_some())
    }

    /// How many times the view scrolled to the bottom.
    pub fn scroll_count(&self) -> usize {
        self.lock().scrolls
    }

    /// How many times the text input was cleared.
    pub fn input_clears(&self) -> usize {
        self.lock().input_clears
    }

    /// How many times the file input was reset.
    pub fn file_input_clears(&self) -> usize {
        self.lock().file_input_clears
    }

    /// History panel, or `None` when closed.
    pub fn history(&self) -> Option<HistoryPanel> {
        self.lock().history.clone()
    }

    /// Whether the delete confirmation is showing.
    pub fn confirmation_visible(&self) -> bool {
        self.lock().confirmation_visible
    }

    /// Notices shown so far.
    pub fn notices(&self) -> Vec<String> {
        self.lock().notices.clone()
    }

    /// Pending language prompt, if one is showing.
    pub fn language_prompt(&self) -> Option<Vec<LanguageOption>> {
        self.lock().language_prompt.clone()
    }

    /// Language of the last applied translation pass.
    pub fn language(&self) -> Option<String> {
        self.lock().language.clone()
    }

    /// Look up a label in the last applied dictionary.
    pub fn label(&self, key: &str) -> Option<String> {
        self.lock().dictionary.get(key).cloned()
    }

    /// Applied theme.
    pub fn theme(&self) -> Option<Theme> {
        self.lock().theme
    }

    /// Current news view, if showing.
    pub fn news(&self) -> Option<NewsView> {
        self.lock().news.clone()
    }

    /// Redirect target, once requested.
    pub fn redirect(&self) -> Option<String> {
        self.lock().redirect.clone()
    }

    /// Every command received, in order.
    pub fn commands(&self) -> Vec<RenderCommand> {
        self.lock().log.clone()
    }
}

impl TimelineState {
    fn next_position(&mut self) -> u64 {
        let position = self.next_position;
        self.next_position += 1;
        position
    }

    fn apply(&mut self, command: &RenderCommand) {
        match command {
            RenderCommand::Append {
                role,
                style,
                text,
                scroll,
            } => {
                let position = self.next_position();
                self.entries.push(TimelineEntry {
                    position,
                    role: *role,
                    style: *style,
                    text: text.clone(),
                });
                if *scroll {
                    self.scrolls += 1;
                }
            }
            RenderCommand::ScrollToBottom => self.scrolls += 1,
            RenderCommand::ClearTimeline => {
                self.entries.clear();
                self.typing = None;
                self.news = None;
            }
            RenderCommand::ShowTyping => {
                // A new indicator retires the previous one.
                let position = self.next_position();
                self.typing = Some(position);
                self.scrolls += 1;
            }
            RenderCommand::HideTyping => self.typing = None,
            RenderCommand::ClearInput => self.input_clears += 1,
            RenderCommand::ClearFileInput => self.file_input_clears += 1,
            RenderCommand::HistoryOpened => self.history = Some(HistoryPanel::default()),
            RenderCommand::HistoryClosed => self.history = None,
            RenderCommand::HistoryRows(rows) => {
                if let Some(panel) = self.history.as_mut() {
                    panel.rows.clone_from(rows);
                    panel.message = None;
                }
            }
            RenderCommand::HistoryEmpty { text } | RenderCommand::HistoryError { text } => {
                if let Some(panel) = self.history.as_mut() {
                    panel.rows.clear();
                    panel.message = Some(text.clone());
                }
            }
            RenderCommand::HistoryRowRemoved(handle) => {
                if let Some(panel) = self.history.as_mut() {
                    panel.rows.retain(|row| row.handle != *handle);
                }
            }
            RenderCommand::ShowDeleteConfirmation => self.confirmation_visible = true,
            RenderCommand::HideDeleteConfirmation => self.confirmation_visible = false,
            RenderCommand::Notice { text } => self.notices.push(text.clone()),
            RenderCommand::PromptLanguage(options) => {
                self.language_prompt = Some(options.clone());
            }
            RenderCommand::ApplyTranslations {
                language,
                dictionary,
            } => {
                self.language = Some(language.clone());
                self.dictionary.clone_from(dictionary);
                self.language_prompt = None;
            }
            RenderCommand::ApplyTheme(theme) => self.theme = Some(*theme),
            RenderCommand::News(view) => self.news = Some(view.clone()),
            RenderCommand::Redirect { path } => self.redirect = Some(path.clone()),
        }
    }
}

impl RenderSink for Timeline {
    fn render(&self, command: RenderCommand) {
        let mut state = self.lock();
        state.apply(&command);
        state.log.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_keep_increasing_across_clears() {
        let timeline = Timeline::new();
        timeline.render(RenderCommand::message(MessageRole::User, "one"));
        timeline.render(RenderCommand::ClearTimeline);
        timeline.render(RenderCommand::message(MessageRole::Bot, "two"));

        let messages = timeline.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "two");
        assert!(messages[0].position > 0);
    }

    #[test]
    fn second_typing_indicator_replaces_first() {
        let timeline = Timeline::new();
        timeline.render(RenderCommand::ShowTyping);
        timeline.render(RenderCommand::ShowTyping);
        assert_eq!(timeline.typing_markers(), 1);

        timeline.render(RenderCommand::HideTyping);
        assert_eq!(timeline.typing_markers(), 0);
        assert!(timeline.messages().is_empty());
    }

    #[test]
    fn rows_only_land_in_an_open_panel() {
        let timeline = Timeline::new();
        timeline.render(RenderCommand::HistoryEmpty {
            text: "No past chats.".into(),
        });
        assert!(timeline.history().is_none());

        timeline.render(RenderCommand::HistoryOpened);
        timeline.render(RenderCommand::HistoryEmpty {
            text: "No past chats.".into(),
        });
        assert_eq!(
            timeline.history().unwrap().message.as_deref(),
            Some("No past chats.")
        );
    }
}
