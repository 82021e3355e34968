//! End-to-end tests against a mock `/api/generate` endpoint.

use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use mychatgpt::AppContext;
use mychatgpt::clipboard::MemoryClipboard;
use mychatgpt::completion::{
    CompletionError, CompletionService, GenerateRequest, HttpCompletionService,
};
use mychatgpt::conversation::{ConversationId, History, Role};
use mychatgpt::registry::ConversationRegistry;
use mychatgpt::session::{ConversationSession, Effect, Intent, NoticeLevel, ScrollTarget};
use mychatgpt::store::{ConversationStore, FileStore, MemoryStore};
use serde_json::{Value, json};

/// What the mock endpoint answers with.
#[derive(Clone)]
enum Reply {
    Ok(&'static str),
    Fail(StatusCode, Value),
    Raw(StatusCode, &'static str),
}

#[derive(Clone)]
struct Mock {
    reply: Reply,
    seen: Arc<Mutex<Vec<Value>>>,
}

async fn generate(State(mock): State<Mock>, Json(body): Json<Value>) -> (StatusCode, String) {
    mock.seen.lock().unwrap().push(body);
    match mock.reply {
        Reply::Ok(result) => (StatusCode::OK, json!({ "result": result }).to_string()),
        Reply::Fail(status, error) => (status, json!({ "error": error }).to_string()),
        Reply::Raw(status, body) => (status, body.to_string()),
    }
}

/// Serve the mock on an ephemeral port and return its base URL.
async fn serve(reply: Reply) -> (String, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/api/generate", post(generate))
        .with_state(Mock {
            reply,
            seen: Arc::clone(&seen),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn context(base_url: &str, store: Arc<dyn ConversationStore>) -> AppContext {
    AppContext {
        completion: Arc::new(HttpCompletionService::new(base_url).unwrap()),
        store,
        clipboard: Arc::new(MemoryClipboard::new()),
        registry: ConversationRegistry::new(0.8),
    }
}

#[tokio::test]
async fn test_first_exchange_is_persisted_verbatim() {
    let (base_url, seen) = serve(Reply::Ok("hello")).await;
    let store = MemoryStore::new();
    let session =
        ConversationSession::open(context(&base_url, Arc::new(store.clone())), ConversationId::new("chat-1")).await;

    session.dispatch(Intent::EditInput("hi".into())).await;
    let effects = session.dispatch(Intent::Submit).await;

    assert_eq!(effects, vec![Effect::Scroll(ScrollTarget::Bottom)]);
    assert_eq!(
        store.get("chat-1").await.unwrap().as_deref(),
        Some(r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]"#)
    );

    let state = session.snapshot().await;
    assert_eq!(state.pending_input, "");
    assert!(!state.submit_in_flight);
    assert_eq!(state.history.turns()[0].role, Role::User);
    assert_eq!(state.history.turns()[1].role, Role::Assistant);

    let bodies = seen.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["input"], "hi");
    assert_eq!(bodies[0]["history"], json!([]));
    assert!((bodies[0]["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn test_server_error_is_surfaced() {
    let (base_url, _) = serve(Reply::Fail(StatusCode::INTERNAL_SERVER_ERROR, json!("boom"))).await;
    let store = MemoryStore::new();
    let session =
        ConversationSession::open(context(&base_url, Arc::new(store.clone())), ConversationId::new("c")).await;

    session.dispatch(Intent::EditInput("typed text".into())).await;
    let effects = session.dispatch(Intent::Submit).await;

    match &effects[..] {
        [Effect::Notify(notice)] => {
            assert_eq!(notice.level, NoticeLevel::Error);
            assert!(notice.message.contains("boom"));
        }
        other => panic!("unexpected effects: {other:?}"),
    }

    let state = session.snapshot().await;
    assert!(state.history.is_empty());
    assert_eq!(state.pending_input, "typed text");
    assert!(!state.submit_in_flight);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_structured_error_payload() {
    let (base_url, _) = serve(Reply::Fail(
        StatusCode::BAD_REQUEST,
        json!({ "message": "quota exceeded", "type": "insufficient_quota" }),
    ))
    .await;
    let service = HttpCompletionService::new(&base_url).unwrap();

    let err = service
        .generate(&GenerateRequest {
            input: "x".into(),
            history: History::new(),
            temperature: 0.5,
        })
        .await
        .unwrap_err();

    match &err {
        CompletionError::Request { status, error } => {
            assert_eq!(*status, 400);
            assert_eq!(error.as_ref().unwrap()["type"], "insufficient_quota");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "quota exceeded");
}

#[tokio::test]
async fn test_error_without_body_uses_status() {
    let (base_url, _) = serve(Reply::Raw(StatusCode::BAD_GATEWAY, "upstream down")).await;
    let service = HttpCompletionService::new(&base_url).unwrap();

    let err = service
        .generate(&GenerateRequest {
            input: String::new(),
            history: History::new(),
            temperature: 0.5,
        })
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Request failed with status 502");
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (base_url, _) = serve(Reply::Raw(StatusCode::OK, "<html>oops</html>")).await;
    let session = ConversationSession::open(
        context(&base_url, Arc::new(MemoryStore::new())),
        ConversationId::new("c"),
    )
    .await;

    session.set_input("q").await;
    let err = session.submit().await.unwrap_err();
    assert!(err.to_string().starts_with("Malformed response"));
    assert!(!session.is_submitting());
    assert!(session.snapshot().await.history.is_empty());
}

#[tokio::test]
async fn test_unreachable_server_releases_gate() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let session = ConversationSession::open(
        context(&format!("http://{addr}"), Arc::new(MemoryStore::new())),
        ConversationId::new("c"),
    )
    .await;
    session.set_input("anyone there?").await;

    let effects = session.dispatch(Intent::Submit).await;
    assert!(matches!(&effects[..], [Effect::Notify(_)]));
    assert!(!session.is_submitting());
    assert_eq!(session.snapshot().await.pending_input, "anyone there?");
}

#[tokio::test]
async fn test_file_store_round_trip_through_session() {
    let (base_url, _) = serve(Reply::Ok("stored")).await;
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ConversationStore> = Arc::new(FileStore::open(dir.path()).await.unwrap());
    let id = ConversationId::generate();

    {
        let session = ConversationSession::open(context(&base_url, Arc::clone(&store)), id.clone()).await;
        session.set_input("remember me").await;
        session.submit().await.unwrap();
    }

    let reopened = ConversationSession::open(context(&base_url, store), id).await;
    let state = reopened.snapshot().await;
    assert_eq!(state.history.export_text(), "Q1: remember me\nA1: stored");
}
