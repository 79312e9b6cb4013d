//! HTTP implementation of [`Backend`] on top of reqwest.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

use super::types::{
    ConversationId, ConversationList, ConversationSummary, ConversationThread, DeleteResponse,
    DeleteStatus, LogoutOutcome, LogoutRejection, NewsFeed, NewsItem, TranslationSet, Upload,
};
use super::Backend;
use crate::error::{GatewayError, Result};

/// Gateway speaking to the assistant backend over HTTP.
///
/// Authentication is cookie based, so the underlying client keeps a cookie
/// store when built through [`HttpGateway::new`].
///
/// # Example
///
/// ```rust,no_run
/// use medassist_client::gateway::{Backend, HttpGateway};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = HttpGateway::new("http://localhost:8080")?;
/// let reply = gateway.send_message("headache and fever", "en").await?;
/// println!("{reply}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpGateway {
    /// Create a gateway for the given server.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Self::with_client(base_url, http)
    }

    /// Create a gateway with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self { base_url, http })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn id_url(&self, prefix: &str, id: &ConversationId) -> Result<Url> {
        let mut url = self.url(prefix)?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }

    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".into());
        Err(GatewayError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Backend for HttpGateway {
    async fn end_chat(&self) -> Result<()> {
        let response = self.http.post(self.url("/end_chat")?).send().await?;
        Self::error_for_status(response).await?;
        Ok(())
    }

    async fn fetch_conversation(&self, id: &ConversationId) -> Result<ConversationThread> {
        let response = self
            .http
            .get(self.id_url("/conversation/", id)?)
            .send()
            .await?;
        let response = Self::error_for_status(response).await?;
        Self::json(response).await
    }

    async fn send_message(&self, message: &str, language: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/get")?)
            .form(&[("msg", message), ("lang", language)])
            .send()
            .await?;
        debug!(name: "gateway.send.status", status = response.status().as_u16());
        Ok(response.text().await?)
    }

    async fn upload_report(&self, upload: &Upload) -> Result<String> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = Form::new().part("file", part);
        let response = self
            .http
            .post(self.url("/upload_report")?)
            .multipart(form)
            .send()
            .await?;
        debug!(name: "gateway.upload.status", status = response.status().as_u16());
        Ok(response.text().await?)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let response = self.http.get(self.url("/conversations")?).send().await?;
        let response = Self::error_for_status(response).await?;
        let list: ConversationList = Self::json(response).await?;
        Ok(list.conversations)
    }

    async fn delete_conversation(&self, id: &ConversationId) -> Result<DeleteStatus> {
        let response = self
            .http
            .post(self.id_url("/conversation/delete/", id)?)
            .send()
            .await?;
        // The status flag in the body is authoritative, whatever the HTTP status.
        let body: DeleteResponse = Self::json(response).await?;
        Ok(body.into())
    }

    async fn logout(&self) -> Result<LogoutOutcome> {
        let response = self.http.post(self.url("/logout")?).send().await?;
        if response.status().is_success() {
            return Ok(LogoutOutcome::LoggedOut);
        }
        let rejection: LogoutRejection = Self::json(response).await.unwrap_or_default();
        Ok(LogoutOutcome::Rejected {
            message: rejection.message,
        })
    }

    async fn fetch_news(&self, language: &str) -> Result<Vec<NewsItem>> {
        let mut url = self.url("/news")?;
        url.query_pairs_mut().append_pair("lang", language);
        let response = self.http.get(url).send().await?;
        let response = Self::error_for_status(response).await?;
        let feed: NewsFeed = Self::json(response).await?;
        Ok(feed.news)
    }

    async fn fetch_translations(&self) -> Result<TranslationSet> {
        let response = self
            .http
            .get(self.url("/static/translations.json")?)
            .send()
            .await?;
        let response = Self::error_for_status(response).await?;
        Self::json(response).await
    }
}
