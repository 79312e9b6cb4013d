//! Render sink that prints to the terminal.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use colored::Colorize;

use super::{EntryStyle, HistoryRow, NewsView, RenderCommand, RenderSink};
use crate::gateway::MessageRole;

/// Prints the transcript and panels to stdout, coloured by speaker.
///
/// Keeps the last applied dictionary so its own labels follow the interface
/// language.
#[derive(Debug, Default)]
pub struct TerminalSink {
    dictionary: Mutex<HashMap<String, String>>,
}

impl TerminalSink {
    /// Create a sink with untranslated labels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn label(&self, key: &str, fallback: &str) -> String {
        self.dictionary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Print the command reference.
    pub fn print_help(&self) {
        let lines = [
            ("/new", self.label("btn_new_chat", "New chat")),
            ("/history", self.label("btn_history", "History")),
            ("/open <n>", self.label("btn_open_chat", "Open a past chat")),
            ("/delete <n>", self.label("btn_delete", "Delete")),
            ("/yes | /no", self.label("btn_confirm_cancel", "Confirm or cancel delete")),
            ("/upload <path>", self.label("btn_upload", "Upload a report")),
            ("/lang <code>", self.label("btn_language", "Language")),
            ("/news", self.label("btn_news", "Medical news")),
            ("/theme", self.label("btn_theme", "Theme")),
            ("/logout", self.label("btn_logout", "Logout")),
            ("/quit", self.label("btn_quit", "Quit")),
        ];
        let mut out = std::io::stdout().lock();
        for (command, label) in lines {
            let _ = writeln!(out, "  {} {}", format!("{command:<16}").bright_cyan(), label);
        }
        let _ = writeln!(
            out,
            "  {}",
            self.label("placeholder_message", "Type your medical question...")
                .bright_black()
        );
    }

    fn print_rows(out: &mut impl Write, rows: &[HistoryRow]) {
        for (n, row) in rows.iter().enumerate() {
            let _ = writeln!(out, "  {} {}...", format!("[{}]", n + 1).bright_cyan(), row.title);
        }
    }
}

impl RenderSink for TerminalSink {
    fn render(&self, command: RenderCommand) {
        let mut out = std::io::stdout().lock();
        match command {
            RenderCommand::Append {
                role, style, text, ..
            } => {
                match (role, style) {
                    (_, EntryStyle::System) => {
                        let _ = writeln!(out, "{}", text.bright_black());
                    }
                    (_, EntryStyle::Error) => {
                        let _ = writeln!(out, "{}", text.red());
                    }
                    (MessageRole::User, EntryStyle::Plain) => {
                        let _ = writeln!(out, "{}", format!("> {text}").green());
                    }
                    (MessageRole::Bot, EntryStyle::Plain) => {
                        for line in text.lines() {
                            let _ = writeln!(out, "{}", line.bright_blue());
                        }
                    }
                }
            }
            RenderCommand::ClearTimeline => {
                let _ = writeln!(out, "{}", "─".repeat(60).bright_black());
            }
            RenderCommand::ShowTyping => {
                let _ = writeln!(out, "{}", "...".bright_black());
            }
            RenderCommand::HistoryRows(rows) => Self::print_rows(&mut out, &rows),
            RenderCommand::HistoryEmpty { text } => {
                let _ = writeln!(out, "  {}", text.bright_black());
            }
            RenderCommand::HistoryError { text } => {
                let _ = writeln!(out, "  {}", text.red());
            }
            RenderCommand::HistoryClosed => {
                let _ = writeln!(
                    out,
                    "  {}",
                    self.label("msg_history_closed", "history closed").bright_black()
                );
            }
            RenderCommand::ShowDeleteConfirmation => {
                let _ = writeln!(
                    out,
                    "{} {}",
                    self.label("msg_confirm_delete", "Delete this conversation?")
                        .bright_yellow(),
                    "(/yes, /no)".bright_cyan()
                );
            }
            RenderCommand::Notice { text } => {
                let _ = writeln!(out, "{}", text.bright_yellow());
            }
            RenderCommand::PromptLanguage(options) => {
                let _ = writeln!(out, "{}", "Choose a language / भाषा चुनें:".bright_yellow());
                for option in options {
                    let _ = writeln!(
                        out,
                        "  {}  {}",
                        format!("/lang {}", option.code).bright_cyan(),
                        option.label
                    );
                }
            }
            RenderCommand::ApplyTranslations { dictionary, .. } => {
                *self.dictionary.lock().unwrap_or_else(PoisonError::into_inner) = dictionary;
            }
            RenderCommand::ApplyTheme(theme) => {
                let _ = writeln!(out, "{}", format!("theme: {}", theme.as_str()).bright_black());
            }
            RenderCommand::News(view) => match view {
                NewsView::Loading { heading, text } => {
                    let _ = writeln!(out, "{}\n  {}", heading.bold(), text.bright_black());
                }
                NewsView::Cards(cards) => {
                    for card in cards {
                        let _ = writeln!(
                            out,
                            "{}\n  {}\n  {}",
                            card.title.bold(),
                            card.summary,
                            card.link.bright_cyan()
                        );
                    }
                }
                NewsView::Empty { text } => {
                    let _ = writeln!(out, "  {}", text.bright_black());
                }
                NewsView::Failed { text } => {
                    let _ = writeln!(out, "  {}", text.red());
                }
            },
            RenderCommand::Redirect { path } => {
                let _ = writeln!(out, "{}", format!("-> {path}").bright_green());
            }
            RenderCommand::ScrollToBottom
            | RenderCommand::HideTyping
            | RenderCommand::ClearInput
            | RenderCommand::ClearFileInput
            | RenderCommand::HistoryOpened
            | RenderCommand::HistoryRowRemoved(_)
            | RenderCommand::HideDeleteConfirmation => {}
        }
    }
}
