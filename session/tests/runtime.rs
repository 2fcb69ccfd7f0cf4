//! End-to-end session runs against nullable collaborators.
//!
//! All tests run on tokio's paused clock: `MonotonicClock` follows it, so
//! the delayed "completed" narrative fires deterministically.

use std::sync::Arc;
use std::time::Duration;

use callverify_directory::IdentityDirectory;
use callverify_nullables::{NullAuthenticator, NullDirectory, NullTokenVerifier};
use callverify_provider::ProviderError;
use callverify_session::{
    narrate, Collaborators, SessionError, SessionHandle, SessionPhase, SessionRuntime, Tone,
    DEFAULT_COMPLETION_DELAY,
};
use callverify_types::{MonotonicClock, Outcome, Verdict};
use tokio::task::JoinHandle;
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    handle: SessionHandle,
    task: JoinHandle<()>,
    auth: Arc<NullAuthenticator>,
    verifier: Arc<NullTokenVerifier>,
}

async fn start_with(
    directory: &NullDirectory,
    auth: NullAuthenticator,
    verifier: NullTokenVerifier,
) -> Harness {
    let auth = Arc::new(auth);
    let verifier = Arc::new(verifier);
    let identities = Arc::new(IdentityDirectory::load(directory).await);
    let collaborators = Collaborators {
        authenticator: auth.clone(),
        token_verifier: verifier.clone(),
    };
    let (handle, task) = SessionRuntime::spawn(
        identities,
        collaborators,
        Arc::new(MonotonicClock::new()),
        DEFAULT_COMPLETION_DELAY,
    );
    Harness {
        handle,
        task,
        auth,
        verifier,
    }
}

async fn start(auth: NullAuthenticator, verifier: NullTokenVerifier) -> Harness {
    let directory = NullDirectory::with_handles(["rey_diaz", "user_2", "user_3"]);
    start_with(&directory, auth, verifier).await
}

async fn until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// Operator flows
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn push_approval_then_completed_narrative() {
    let h = start(NullAuthenticator::approving(), NullTokenVerifier::accepting("482913")).await;

    h.handle.select_identity("rey_diaz").await.unwrap();
    h.handle.send_push().await.unwrap();

    let resolved = h
        .handle
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();
    let resolved_at = Instant::now();
    assert_eq!(resolved.outcome, Some(Outcome::Allow));
    assert_eq!(
        narrate(&resolved).caller.text,
        "Push notification approved by rey_diaz."
    );
    assert_eq!(narrate(&resolved).operator.text, "Response: allow");

    let done = h.handle.wait_for(|s| s.completion_elapsed()).await.unwrap();
    assert!(resolved_at.elapsed() >= DEFAULT_COMPLETION_DELAY);
    assert_eq!(narrate(&done).caller.text, "Verification of rey_diaz completed!");
    assert_eq!(done.phase, SessionPhase::Resolved);
    assert_eq!(h.auth.challenged().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn blank_token_is_rejected_and_stays_in_entry() {
    let h = start(NullAuthenticator::approving(), NullTokenVerifier::accepting("482913")).await;

    h.handle.select_identity("rey_diaz").await.unwrap();
    h.handle.choose_token().await.unwrap();
    let err = h.handle.submit_token("").await.unwrap_err();

    assert!(matches!(err, SessionError::Validation(_)));
    assert_eq!(h.handle.snapshot().phase, SessionPhase::TokenEntry);
    assert_eq!(h.verifier.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn late_response_after_reset_is_discarded() {
    let h = start(
        NullAuthenticator::held(Ok(Verdict::Allow)),
        NullTokenVerifier::accepting("482913"),
    )
    .await;

    h.handle.select_identity("user_2").await.unwrap();
    h.handle.send_push().await.unwrap();
    until(|| h.auth.calls() == 1).await;

    h.handle.reset().await.unwrap();
    h.auth.release();
    until(|| h.auth.completed() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert_eq!(snapshot.outcome, None);
    assert!(snapshot.subject.is_none());
}

#[tokio::test(start_paused = true)]
async fn unavailable_directory_keeps_session_idle() {
    let directory = NullDirectory::unavailable();
    let h = start_with(
        &directory,
        NullAuthenticator::approving(),
        NullTokenVerifier::accepting("482913"),
    )
    .await;

    assert_eq!(directory.calls(), 1);
    assert!(!h.handle.directory().is_available());
    assert!(h.handle.directory().is_empty());

    let err = h.handle.select_identity("rey_diaz").await.unwrap_err();
    assert_eq!(err.kind(), "unknown_identity");
    assert_eq!(h.handle.snapshot().phase, SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn wrong_token_resolves_as_deny() {
    let h = start(NullAuthenticator::approving(), NullTokenVerifier::accepting("111111")).await;

    h.handle.select_identity("user_3").await.unwrap();
    h.handle.choose_token().await.unwrap();
    h.handle.enter_token("482913").await.unwrap();
    assert_eq!(
        h.handle.snapshot().pending_token_value.as_deref(),
        Some("482913")
    );
    h.handle.submit_token("482913").await.unwrap();

    let resolved = h
        .handle
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();
    assert_eq!(resolved.outcome, Some(Outcome::Deny));
    let narration = narrate(&resolved);
    assert_eq!(narration.operator.text, "Response: deny");
    assert_eq!(narration.operator.tone, Tone::Failure);
    assert_eq!(narration.caller.text, "Incorrect token by user_3");
    assert_eq!(h.verifier.codes(), vec!["482913"]);
}

// ---------------------------------------------------------------------------
// Concurrency and timing
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn double_push_dispatches_once() {
    let h = start(
        NullAuthenticator::held(Ok(Verdict::Deny)),
        NullTokenVerifier::accepting("482913"),
    )
    .await;

    h.handle.select_identity("rey_diaz").await.unwrap();
    let (first, second) = tokio::join!(h.handle.send_push(), h.handle.send_push());
    assert!(first.is_ok() ^ second.is_ok());
    let rejected = first.err().or(second.err()).unwrap();
    assert_eq!(rejected.kind(), "invalid_transition");

    until(|| h.auth.calls() == 1).await;
    h.auth.release();
    let resolved = h
        .handle
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();
    assert_eq!(resolved.outcome, Some(Outcome::Deny));
    assert_eq!(h.auth.calls(), 1);
    assert_eq!(h.auth.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_completion_timer() {
    let h = start(NullAuthenticator::approving(), NullTokenVerifier::accepting("482913")).await;

    h.handle.select_identity("rey_diaz").await.unwrap();
    h.handle.send_push().await.unwrap();
    h.handle
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    h.handle.reset().await.unwrap();
    h.handle.select_identity("rey_diaz").await.unwrap();
    h.handle.send_push().await.unwrap();
    h.handle
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();
    let mut rx = h.handle.subscribe();
    rx.borrow_and_update();

    // The first timer would have fired one second from now.
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(!rx.has_changed().unwrap(), "cancelled timer published a snapshot");

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().completion_elapsed());
    assert_eq!(h.auth.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn reset_after_resolution_restores_idle_narrative() {
    let h = start(NullAuthenticator::approving(), NullTokenVerifier::accepting("482913")).await;

    h.handle.select_identity("rey_diaz").await.unwrap();
    h.handle.send_push().await.unwrap();
    h.handle
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();
    h.handle.reset().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = h.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert_eq!(
        narrate(&snapshot).caller.text,
        callverify_session::narrator::NO_PUSH_SENT
    );
}

#[tokio::test(start_paused = true)]
async fn provider_failure_resolves_as_error() {
    let h = start(
        NullAuthenticator::failing(ProviderError::Unreachable("connection refused".into())),
        NullTokenVerifier::accepting("482913"),
    )
    .await;

    h.handle.select_identity("rey_diaz").await.unwrap();
    h.handle.send_push().await.unwrap();
    let resolved = h
        .handle
        .wait_for(|s| s.phase == SessionPhase::Resolved)
        .await
        .unwrap();

    assert_eq!(resolved.outcome, Some(Outcome::Error));
    let narration = narrate(&resolved);
    assert!(narration.operator.text.contains("connection refused"));
    assert_eq!(narration.operator.tone, Tone::Warning);
    assert_eq!(narration.caller.text, "Push notification denied by rey_diaz.");
}

#[tokio::test(start_paused = true)]
async fn runtime_stops_when_handles_dropped() {
    let h = start(NullAuthenticator::approving(), NullTokenVerifier::accepting("482913")).await;
    let observer = h.handle.subscribe();
    drop(h.handle);
    h.task.await.unwrap();
    assert_eq!(observer.borrow().phase, SessionPhase::Idle);
}
