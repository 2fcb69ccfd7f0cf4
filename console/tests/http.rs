//! Console HTTP surface driven through the router with nullable collaborators.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use callverify_console::{Console, ShutdownController};
use callverify_directory::IdentityDirectory;
use callverify_nullables::{NullAuthenticator, NullClock, NullDirectory, NullTokenVerifier};
use callverify_session::{Collaborators, SessionPhase};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn console_with(directory: &NullDirectory, auth: NullAuthenticator) -> Console {
    let identities = IdentityDirectory::load(directory).await;
    Console::start(
        identities,
        Collaborators {
            authenticator: Arc::new(auth),
            token_verifier: Arc::new(NullTokenVerifier::accepting("482913")),
        },
        Arc::new(NullClock::default()),
        Duration::from_secs(2),
    )
}

async fn console(auth: NullAuthenticator) -> Console {
    console_with(&NullDirectory::with_handles(["rey_diaz", "user_2", "user_3"]), auth).await
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::get(path).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post_intent(app: &Router, intent: Value) -> (StatusCode, Value) {
    let request = Request::post("/intents")
        .header("content-type", "application/json")
        .body(Body::from(intent.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_and_identities() {
    let console = console(NullAuthenticator::approving()).await;
    let app = console.router();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get(&app, "/identities").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert_eq!(body["identities"].as_array().unwrap().len(), 3);
    assert_eq!(body["identities"][0]["handle"], "rey_diaz");
}

#[tokio::test]
async fn push_flow_reports_allow() {
    let console = console(NullAuthenticator::approving()).await;
    let app = console.router();

    let (status, views) = post_intent(&app, json!({"intent": "select_identity", "handle": "rey_diaz"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(views["phase"], "selected");
    assert_eq!(views["operator"]["send_push_enabled"], true);

    let (status, _) = post_intent(&app, json!({"intent": "send_push"})).await;
    assert_eq!(status, StatusCode::OK);

    console
        .adapter()
        .session()
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();
    let (_, views) = get(&app, "/views").await;
    assert_eq!(views["operator"]["response"], "allow");
    assert_eq!(views["operator"]["status"]["text"], "Response: allow");
    assert_eq!(views["caller"]["status"]["text"], "Push notification approved by rey_diaz.");
    assert_eq!(views["operator"]["clear_enabled"], true);
}

#[tokio::test]
async fn invalid_transition_is_conflict() {
    let console = console(NullAuthenticator::approving()).await;
    let app = console.router();

    let (status, body) = post_intent(&app, json!({"intent": "send_push"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");

    let (_, views) = get(&app, "/views").await;
    assert_eq!(views["phase"], "idle");
    assert!(views["operator"]["last_error"].is_string());
}

#[tokio::test]
async fn unknown_identity_and_blank_token_are_unprocessable() {
    let console = console(NullAuthenticator::approving()).await;
    let app = console.router();

    let (status, body) = post_intent(&app, json!({"intent": "select_identity", "handle": "nobody"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "unknown_identity");

    post_intent(&app, json!({"intent": "select_identity", "handle": "user_2"})).await;
    post_intent(&app, json!({"intent": "choose_token"})).await;
    let (status, body) = post_intent(&app, json!({"intent": "submit_token"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (_, views) = get(&app, "/views").await;
    assert_eq!(views["phase"], "token_entry");
    assert_eq!(views["operator"]["submit_enabled"], false);
}

#[tokio::test]
async fn token_flow_clears_input_on_submit() {
    let console = console(NullAuthenticator::approving()).await;
    let app = console.router();

    post_intent(&app, json!({"intent": "select_identity", "handle": "rey_diaz"})).await;
    post_intent(&app, json!({"intent": "choose_token"})).await;
    let (status, views) = post_intent(&app, json!({"intent": "enter_token", "value": "482913"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(views["operator"]["token_input"], "482913");
    assert_eq!(views["operator"]["submit_enabled"], true);

    let (status, views) = post_intent(&app, json!({"intent": "submit_token"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(views["operator"]["token_input"], "");

    let resolved = console
        .adapter()
        .session()
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();
    assert_eq!(resolved.outcome.map(|o| o.as_str()), Some("allow"));
    let (_, views) = get(&app, "/views").await;
    assert_eq!(views["caller"]["status"]["text"], "Correct token by rey_diaz");
}

#[tokio::test]
async fn submit_sends_the_token_held_by_the_session() {
    let console = console(NullAuthenticator::approving()).await;
    let app = console.router();
    let session = console.adapter().session().clone();

    post_intent(&app, json!({"intent": "select_identity", "handle": "rey_diaz"})).await;
    post_intent(&app, json!({"intent": "choose_token"})).await;
    session.enter_token("482913").await.unwrap();

    let (_, views) = get(&app, "/views").await;
    assert_eq!(views["operator"]["token_input"], "482913");
    assert_eq!(views["operator"]["submit_enabled"], true);

    let (status, _) = post_intent(&app, json!({"intent": "submit_token"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(session.snapshot().pending_token_value.is_none());

    let resolved = session
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();
    assert_eq!(resolved.outcome.map(|o| o.as_str()), Some("allow"));
}

#[tokio::test]
async fn clear_returns_to_idle() {
    let console = console(NullAuthenticator::denying()).await;
    let app = console.router();

    post_intent(&app, json!({"intent": "select_identity", "handle": "rey_diaz"})).await;
    post_intent(&app, json!({"intent": "send_push"})).await;
    let (status, views) = post_intent(&app, json!({"intent": "clear"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(views["phase"], "idle");
    assert_eq!(views["operator"]["clear_enabled"], false);
    assert_eq!(views["operator"]["response"], Value::Null);
    assert_eq!(views["caller"]["status"]["text"], "No push notification sent yet.");
}

#[tokio::test]
async fn unavailable_directory_shows_banner() {
    let console = console_with(&NullDirectory::unavailable(), NullAuthenticator::approving()).await;
    let app = console.router();

    let (_, body) = get(&app, "/identities").await;
    assert_eq!(body["available"], false);
    assert!(body["error"].is_string());

    let (_, views) = get(&app, "/views").await;
    assert_eq!(views["operator"]["selector_enabled"], false);
    assert!(views["operator"]["directory_banner"].is_string());
}

#[tokio::test]
async fn serve_stops_on_shutdown() {
    let console = console(NullAuthenticator::approving()).await;
    let controller = ShutdownController::new();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();

    let server = tokio::spawn(console.serve(listener, controller.signalled()));
    controller.shutdown();
    server.await.unwrap().unwrap();
}
