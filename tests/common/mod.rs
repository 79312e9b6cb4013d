#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use medassist_client::error::{GatewayError, Result};
use medassist_client::gateway::{
    Backend, ConversationId, ConversationSummary, ConversationThread, DeleteStatus,
    LogoutOutcome, MessageRole, NewsItem, StoredMessage, TranslationSet, Upload,
};
use medassist_client::i18n::{LanguagePolicy, MemoryPreferences, PreferenceStore, Translator};
use medassist_client::render::{RenderSink, Timeline};
use medassist_client::session::SessionController;

fn unreachable() -> GatewayError {
    GatewayError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}

fn status(code: u16) -> GatewayError {
    GatewayError::Status {
        status: code,
        message: "stub".into(),
    }
}

/// In-process backend with scripted answers. `None` means the call fails.
#[derive(Debug)]
pub struct StubBackend {
    reply: Mutex<Option<String>>,
    upload_reply: Mutex<Option<String>>,
    threads: Mutex<HashMap<String, ConversationThread>>,
    conversations: Mutex<Option<Vec<ConversationSummary>>>,
    delete_status: Mutex<Option<DeleteStatus>>,
    news: Mutex<Option<Vec<NewsItem>>>,
    translations: Mutex<Option<TranslationSet>>,
    logout: Mutex<Option<LogoutOutcome>>,
    end_chat_fails: AtomicBool,
    calls: Mutex<Vec<String>>,
    send_gate: Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
}

impl Default for StubBackend {
    fn default() -> Self {
        Self {
            reply: Mutex::new(Some("ok".into())),
            upload_reply: Mutex::new(Some("Report looks normal.".into())),
            threads: Mutex::new(HashMap::new()),
            conversations: Mutex::new(Some(Vec::new())),
            delete_status: Mutex::new(Some(DeleteStatus::Deleted)),
            news: Mutex::new(Some(Vec::new())),
            translations: Mutex::new(None),
            logout: Mutex::new(Some(LogoutOutcome::LoggedOut)),
            end_chat_fails: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            send_gate: Mutex::new(None),
        }
    }
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: Option<&str>) -> Self {
        *self.reply.lock().unwrap() = reply.map(str::to_string);
        self
    }

    pub fn with_upload_reply(self, reply: Option<&str>) -> Self {
        *self.upload_reply.lock().unwrap() = reply.map(str::to_string);
        self
    }

    /// Serve `thread` when `requested` is fetched.
    pub fn with_thread(self, requested: &str, thread: ConversationThread) -> Self {
        self.threads
            .lock()
            .unwrap()
            .insert(requested.to_string(), thread);
        self
    }

    pub fn with_conversations(self, list: Option<Vec<ConversationSummary>>) -> Self {
        self.set_conversations(list);
        self
    }

    pub fn set_conversations(&self, list: Option<Vec<ConversationSummary>>) {
        *self.conversations.lock().unwrap() = list;
    }

    pub fn with_delete_status(self, status: Option<DeleteStatus>) -> Self {
        *self.delete_status.lock().unwrap() = status;
        self
    }

    pub fn with_news(self, news: Option<Vec<NewsItem>>) -> Self {
        *self.news.lock().unwrap() = news;
        self
    }

    pub fn with_translations(self, set: TranslationSet) -> Self {
        *self.translations.lock().unwrap() = Some(set);
        self
    }

    pub fn with_logout(self, outcome: Option<LogoutOutcome>) -> Self {
        *self.logout.lock().unwrap() = outcome;
        self
    }

    pub fn with_failing_end_chat(self) -> Self {
        self.end_chat_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Hold the next `send_message` until released.
    ///
    /// Returns a receiver that fires once the send is in flight and a sender
    /// that lets it finish.
    pub fn gate_next_send(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.send_gate.lock().unwrap() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn end_chat(&self) -> Result<()> {
        self.record("end_chat");
        if self.end_chat_fails.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        Ok(())
    }

    async fn fetch_conversation(&self, id: &ConversationId) -> Result<ConversationThread> {
        self.record(format!("fetch:{id}"));
        self.threads
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| status(404))
    }

    async fn send_message(&self, message: &str, language: &str) -> Result<String> {
        self.record(format!("send:{language}:{message}"));
        let gate = self.send_gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.await;
        }
        self.reply.lock().unwrap().clone().ok_or_else(unreachable)
    }

    async fn upload_report(&self, upload: &Upload) -> Result<String> {
        self.record(format!("upload:{}", upload.file_name));
        self.upload_reply.lock().unwrap().clone().ok_or_else(unreachable)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        self.record("list");
        self.conversations
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| status(500))
    }

    async fn delete_conversation(&self, id: &ConversationId) -> Result<DeleteStatus> {
        self.record(format!("delete:{id}"));
        (*self.delete_status.lock().unwrap()).ok_or_else(unreachable)
    }

    async fn logout(&self) -> Result<LogoutOutcome> {
        self.record("logout");
        self.logout.lock().unwrap().clone().ok_or_else(unreachable)
    }

    async fn fetch_news(&self, language: &str) -> Result<Vec<NewsItem>> {
        self.record(format!("news:{language}"));
        self.news.lock().unwrap().clone().ok_or_else(|| status(502))
    }

    async fn fetch_translations(&self) -> Result<TranslationSet> {
        self.record("translations");
        self.translations
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| status(404))
    }
}

pub fn thread(id: &str, messages: &[(MessageRole, &str)]) -> ConversationThread {
    ConversationThread {
        conversation_id: ConversationId::new(id),
        messages: messages
            .iter()
            .map(|(role, text)| StoredMessage {
                role: *role,
                message: (*text).to_string(),
            })
            .collect(),
    }
}

pub fn summary(id: &str, title: &str) -> ConversationSummary {
    ConversationSummary {
        id: ConversationId::new(id),
        title: title.to_string(),
    }
}

/// Controller wired to a stub backend and an in-memory timeline.
pub struct Harness {
    pub backend: Arc<StubBackend>,
    pub timeline: Arc<Timeline>,
    pub prefs: Arc<MemoryPreferences>,
    pub controller: Arc<SessionController>,
}

impl Harness {
    pub fn new(backend: StubBackend) -> Self {
        Self::with_policy(backend, LanguagePolicy::Restore)
    }

    pub fn with_policy(backend: StubBackend, policy: LanguagePolicy) -> Self {
        let backend = Arc::new(backend);
        let timeline = Arc::new(Timeline::new());
        let prefs = Arc::new(MemoryPreferences::new());
        let translator = Arc::new(Translator::new(
            Arc::clone(&prefs) as Arc<dyn PreferenceStore>,
            "en",
        ));
        let controller = Arc::new(SessionController::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            Arc::clone(&timeline) as Arc<dyn RenderSink>,
            translator,
            policy,
        ));
        Self {
            backend,
            timeline,
            prefs,
            controller,
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.timeline
            .messages()
            .into_iter()
            .map(|entry| entry.text)
            .collect()
    }
}
