//! Line input for the terminal front end.
//!
//! `rustyline` blocks, so the editor lives on its own thread and hands lines
//! to the async side over a channel. The editor only prompts once the caller
//! asks for the next line, which keeps the prompt from landing in the middle
//! of a reply.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::mpsc as std_mpsc;

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc;
use tracing::warn;

/// Slash commands the front end understands.
pub const COMMANDS: &[&str] = &[
    "/new", "/history", "/open", "/delete", "/yes", "/no", "/upload", "/lang", "/news",
    "/theme", "/logout", "/help", "/quit", "/exit",
];

/// Split an input line into a command and its trimmed argument.
///
/// Lines that are not slash commands come back whole as the command.
#[must_use]
pub fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    if !line.starts_with('/') {
        return (line, "");
    }
    line.split_once(char::is_whitespace)
        .map_or((line, ""), |(command, argument)| (command, argument.trim()))
}

/// Completion, hints and highlighting for slash commands.
#[derive(Debug, Clone, Default)]
pub struct CommandHelper;

impl CommandHelper {
    /// Commands starting with `prefix`.
    #[must_use]
    pub fn candidates(prefix: &str) -> Vec<&'static str> {
        if !prefix.starts_with('/') {
            return Vec::new();
        }
        COMMANDS
            .iter()
            .copied()
            .filter(|command| command.starts_with(prefix))
            .collect()
    }

    /// Remaining characters of the first command `prefix` could complete to.
    #[must_use]
    pub fn hint_for(prefix: &str) -> Option<String> {
        if prefix.contains(' ') {
            return None;
        }
        Self::candidates(prefix)
            .into_iter()
            .find(|command| command.len() > prefix.len())
            .map(|command| command[prefix.len()..].to_string())
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let pairs = Self::candidates(&line[..pos])
            .into_iter()
            .map(|command| Pair {
                display: command.to_string(),
                replacement: command.to_string(),
            })
            .collect();
        Ok((0, pairs))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        Self::hint_for(&line[..pos])
    }
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Validator for CommandHelper {}

/// Reads lines on a dedicated thread.
///
/// Dropping the reader ends the thread at its next prompt.
#[derive(Debug)]
pub struct LineReader {
    lines: mpsc::Receiver<String>,
    ready: std_mpsc::Sender<()>,
}

impl LineReader {
    /// Start the editor thread with the given prompt.
    pub fn spawn(prompt: impl Into<String>) -> std::io::Result<Self> {
        let prompt = prompt.into();
        let (line_tx, lines) = mpsc::channel(1);
        let (ready, ready_rx) = std_mpsc::channel::<()>();

        std::thread::Builder::new()
            .name("medassist-readline".into())
            .spawn(move || {
                let mut editor: Editor<CommandHelper, DefaultHistory> = match Editor::new() {
                    Ok(editor) => editor,
                    Err(e) => {
                        warn!(name: "cli.editor.failed", error = %e, "Line editor unavailable");
                        return;
                    }
                };
                editor.set_helper(Some(CommandHelper));

                // One prompt per request from the async side.
                while ready_rx.recv().is_ok() {
                    match editor.readline(&prompt) {
                        Ok(line) => {
                            if !line.trim().is_empty() {
                                let _ = editor.add_history_entry(line.as_str());
                            }
                            if line_tx.blocking_send(line).is_err() {
                                break;
                            }
                        }
                        Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                        Err(e) => {
                            warn!(name: "cli.readline.failed", error = %e, "Reading input failed");
                            break;
                        }
                    }
                }
            })?;

        Ok(Self { lines, ready })
    }

    /// Prompt for the next line. `None` once input is closed (Ctrl-C, Ctrl-D).
    pub async fn next_line(&mut self) -> Option<String> {
        self.ready.send(()).ok()?;
        self.lines.recv().await
    }
}
