//! Sidebar index of past conversations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::gateway::{Backend, ConversationId};
use crate::i18n::Translator;
use crate::render::{HistoryRow, RenderCommand, RenderSink, RowHandle};

/// Row selected for deletion, awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    /// Thread to delete.
    pub id: ConversationId,
    /// Row that offered the delete action.
    pub row: RowHandle,
}

/// Result of [`HistoryIndex::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryToggle {
    /// Panel was open and is now removed.
    Closed,
    /// Panel was inserted and a fetch attempted.
    Opened,
}

#[derive(Debug, Default)]
struct Panel {
    open: bool,
    rows: Vec<HistoryRow>,
}

/// Fetches and renders the list of past threads.
///
/// Owns the panel's open state, its rows, and the pending deletion. It never
/// changes session identity: selecting a row is routed through the
/// controller.
#[derive(Debug)]
pub struct HistoryIndex {
    backend: Arc<dyn Backend>,
    sink: Arc<dyn RenderSink>,
    translator: Arc<Translator>,
    turn: tokio::sync::Mutex<()>,
    panel: Mutex<Panel>,
    pending: Mutex<Option<PendingDeletion>>,
    next_handle: AtomicU64,
}

impl HistoryIndex {
    /// Create a closed index.
    pub fn new(
        backend: Arc<dyn Backend>,
        sink: Arc<dyn RenderSink>,
        translator: Arc<Translator>,
    ) -> Self {
        Self {
            backend,
            sink,
            translator,
            turn: tokio::sync::Mutex::new(()),
            panel: Mutex::new(Panel::default()),
            pending: Mutex::new(None),
            next_handle: AtomicU64::new(0),
        }
    }

    fn panel(&self) -> MutexGuard<'_, Panel> {
        self.panel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> MutexGuard<'_, Option<PendingDeletion>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the panel is rendered.
    pub fn is_open(&self) -> bool {
        self.panel().open
    }

    /// Rows currently rendered.
    pub fn rows(&self) -> Vec<HistoryRow> {
        self.panel().rows.clone()
    }

    /// Thread behind a rendered row.
    pub fn row_id(&self, handle: RowHandle) -> Option<ConversationId> {
        self.panel()
            .rows
            .iter()
            .find(|row| row.handle == handle)
            .map(|row| row.id.clone())
    }

    /// Close the panel if open, otherwise open it and fetch the list.
    pub async fn toggle(&self) -> HistoryToggle {
        let _turn = self.turn.lock().await;
        if self.is_open() {
            self.close();
            return HistoryToggle::Closed;
        }
        self.open().await;
        HistoryToggle::Opened
    }

    /// Re-fetch from scratch by closing and reopening.
    pub async fn force_refresh(&self) {
        let _turn = self.turn.lock().await;
        if self.is_open() {
            self.close();
        }
        self.open().await;
    }

    fn close(&self) {
        {
            let mut panel = self.panel();
            panel.open = false;
            panel.rows.clear();
        }
        self.sink.render(RenderCommand::HistoryClosed);
    }

    async fn open(&self) {
        {
            let mut panel = self.panel();
            panel.open = true;
            panel.rows.clear();
        }
        self.sink.render(RenderCommand::HistoryOpened);

        match self.backend.list_conversations().await {
            Ok(summaries) if summaries.is_empty() => {
                self.sink.render(RenderCommand::HistoryEmpty {
                    text: self.translator.translate("msg_no_past_chats", "No past chats."),
                });
            }
            Ok(summaries) => {
                let rows: Vec<HistoryRow> = summaries
                    .into_iter()
                    .map(|summary| HistoryRow {
                        handle: RowHandle(self.next_handle.fetch_add(1, Ordering::Relaxed)),
                        id: summary.id,
                        title: summary.title,
                    })
                    .collect();
                debug!(name: "history.loaded", rows = rows.len());
                self.panel().rows.clone_from(&rows);
                self.sink.render(RenderCommand::HistoryRows(rows));
            }
            Err(e) => {
                warn!(name: "history.fetch.failed", error = %e, "History fetch failed");
                self.sink.render(RenderCommand::HistoryError {
                    text: self
                        .translator
                        .translate("msg_error_loading_history", "Error loading history."),
                });
            }
        }
    }

    /// Select a row for deletion and show the confirmation surface.
    ///
    /// Replaces any earlier selection. Returns `false` for unknown rows.
    pub fn request_delete(&self, handle: RowHandle) -> bool {
        let Some(id) = self.row_id(handle) else {
            return false;
        };
        *self.pending() = Some(PendingDeletion { id, row: handle });
        self.sink.render(RenderCommand::ShowDeleteConfirmation);
        true
    }

    /// Current selection, if any.
    pub fn pending_deletion(&self) -> Option<PendingDeletion> {
        self.pending().clone()
    }

    /// Clear the selection and hide the confirmation surface.
    pub(crate) fn dismiss_deletion(&self) {
        self.pending().take();
        self.sink.render(RenderCommand::HideDeleteConfirmation);
    }

    /// Remove the deleted thread's rows.
    ///
    /// Matches the selected row and any re-fetched row for the same thread.
    pub(crate) fn remove_row(&self, deletion: &PendingDeletion) {
        let removed: Vec<RowHandle> = {
            let mut panel = self.panel();
            let (gone, kept): (Vec<_>, Vec<_>) = panel
                .rows
                .drain(..)
                .partition(|row| row.handle == deletion.row || row.id == deletion.id);
            panel.rows = kept;
            gone.into_iter().map(|row| row.handle).collect()
        };
        for handle in removed {
            self.sink.render(RenderCommand::HistoryRowRemoved(handle));
        }
    }
}
