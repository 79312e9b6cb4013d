use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, Multipart, Path, Query};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use medassist_client::error::GatewayError;
use medassist_client::gateway::{
    Backend, ConversationId, DeleteStatus, HttpGateway, LogoutOutcome, MessageRole, Upload,
};
use medassist_client::i18n::{LanguagePolicy, MemoryPreferences, Translator};
use medassist_client::render::{RenderSink, Timeline};
use medassist_client::session::{LoadOutcome, SessionController};

async fn conversation(Path(id): Path<String>) -> impl IntoResponse {
    if id == "missing" {
        return (StatusCode::NOT_FOUND, "Conversation not found").into_response();
    }
    Json(json!({
        "conversation_id": id,
        "messages": [
            { "role": "user", "message": "cough" },
            { "role": "bot", "message": "Drink fluids." }
        ]
    }))
    .into_response()
}

async fn reply(Form(fields): Form<HashMap<String, String>>) -> String {
    format!(
        "{}|{}",
        fields.get("msg").cloned().unwrap_or_default(),
        fields.get("lang").cloned().unwrap_or_default()
    )
}

async fn upload(mut multipart: Multipart) -> String {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        parts.push(format!("{name}:{file_name}:{content_type}:{}", bytes.len()));
    }
    parts.join(",")
}

async fn delete(Path(id): Path<String>) -> impl IntoResponse {
    if id == "locked" {
        (StatusCode::FORBIDDEN, Json(json!({ "status": "error" })))
    } else {
        (StatusCode::OK, Json(json!({ "status": "success", "deleted": id })))
    }
}

async fn end_chat() -> impl IntoResponse {
    ([(header::SET_COOKIE, "session=ok; Path=/")], StatusCode::OK)
}

async fn logout(headers: HeaderMap) -> impl IntoResponse {
    let authenticated = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookie| cookie.contains("session=ok"));
    if authenticated {
        (StatusCode::OK, Json(json!({ "message": "bye" })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Session expired" })),
        )
    }
}

async fn news(Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let lang = query.get("lang").cloned().unwrap_or_default();
    Json(json!({
        "news": [
            { "title": format!("{lang} story"), "summary": "Stay hydrated.", "link": null }
        ]
    }))
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/end_chat", post(end_chat))
        .route("/conversation/{id}", get(conversation))
        .route("/get", post(reply))
        .route("/upload_report", post(upload))
        .route(
            "/conversations",
            get(|| async {
                Json(json!({ "conversations": [{ "id": "a1", "title": "migraine" }] }))
            }),
        )
        .route("/conversation/delete/{id}", post(delete))
        .route("/logout", post(logout))
        .route("/news", get(news))
        .route(
            "/static/translations.json",
            get(|| async { Json(json!({ "en": { "btn_history": "History" }, "hi": {} })) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn send_posts_form_fields() {
    let gateway = HttpGateway::new(spawn_backend().await).unwrap();

    let reply = gateway.send_message("pain & swelling", "ta").await.unwrap();

    assert_eq!(reply, "pain & swelling|ta");
}

#[tokio::test]
async fn upload_sends_a_file_part() {
    let gateway = HttpGateway::new(spawn_backend().await).unwrap();

    let reply = gateway
        .upload_report(&Upload::new("cbc.pdf", vec![7; 16]))
        .await
        .unwrap();

    assert_eq!(reply, "file:cbc.pdf:application/pdf:16");
}

#[tokio::test]
async fn conversation_fetch_and_missing_thread() {
    let gateway = HttpGateway::new(spawn_backend().await).unwrap();

    let thread = gateway
        .fetch_conversation(&ConversationId::new("a b/c"))
        .await
        .unwrap();
    assert_eq!(thread.conversation_id, ConversationId::new("a b/c"));
    assert_eq!(thread.messages.len(), 2);
    assert_eq!(thread.messages[1].role, MessageRole::Bot);

    let err = gateway
        .fetch_conversation(&ConversationId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 404, .. }));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn delete_reads_status_flag_regardless_of_http_status() {
    let gateway = HttpGateway::new(spawn_backend().await).unwrap();

    let deleted = gateway
        .delete_conversation(&ConversationId::new("a1"))
        .await
        .unwrap();
    let refused = gateway
        .delete_conversation(&ConversationId::new("locked"))
        .await
        .unwrap();

    assert_eq!(deleted, DeleteStatus::Deleted);
    assert_eq!(refused, DeleteStatus::Rejected);
}

#[tokio::test]
async fn list_news_and_translations() {
    let gateway = HttpGateway::new(spawn_backend().await).unwrap();

    let list = gateway.list_conversations().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title, "migraine");

    let news = gateway.fetch_news("hi").await.unwrap();
    assert_eq!(news[0].title, "hi story");
    assert!(news[0].link.is_none());

    let translations = gateway.fetch_translations().await.unwrap();
    assert_eq!(translations["en"]["btn_history"], "History");
}

#[tokio::test]
async fn logout_relies_on_session_cookie() {
    let gateway = HttpGateway::new(spawn_backend().await).unwrap();

    assert_eq!(
        gateway.logout().await.unwrap(),
        LogoutOutcome::Rejected {
            message: Some("Session expired".into())
        }
    );

    gateway.end_chat().await.unwrap();
    assert_eq!(gateway.logout().await.unwrap(), LogoutOutcome::LoggedOut);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let gateway = HttpGateway::new(format!("http://{addr}")).unwrap();

    let err = gateway.send_message("hello", "en").await.unwrap_err();

    assert!(err.is_transport());
}

#[tokio::test]
async fn controller_over_http_loads_and_sends() {
    let gateway = Arc::new(HttpGateway::new(spawn_backend().await).unwrap());
    let timeline = Arc::new(Timeline::new());
    let translator = Arc::new(Translator::new(Arc::new(MemoryPreferences::new()), "en"));
    let controller = SessionController::new(
        gateway,
        Arc::clone(&timeline) as Arc<dyn RenderSink>,
        translator,
        LanguagePolicy::Restore,
    );

    controller.start().await;
    assert_eq!(timeline.label("btn_history").as_deref(), Some("History"));

    let outcome = controller
        .load_conversation(Some(ConversationId::new("a1")))
        .await;
    assert_eq!(outcome, LoadOutcome::Loaded(ConversationId::new("a1")));

    controller.send_text("follow up").await;
    let texts: Vec<_> = timeline.messages().into_iter().map(|m| m.text).collect();
    assert_eq!(
        texts,
        [
            "cough",
            "Drink fluids.",
            "Loaded conversation: cough",
            "follow up",
            "follow up|en"
        ]
    );
}
