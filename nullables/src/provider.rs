//! Nullable push and token providers.
//!
//! Each answers from a queue of scripted results, falling back to a fixed
//! answer once the queue is empty. A held provider parks every call until
//! [`NullAuthenticator::release`] (or the verifier's equivalent) lets it
//! through, which keeps a call in flight for as long as a test needs.

use async_trait::async_trait;
use callverify_provider::{AuthenticationService, ProviderError, TokenVerificationService};
use callverify_types::{Handle, Identity, Verdict};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

enum Fallback {
    Fixed(Result<Verdict, ProviderError>),
    /// Allow exactly this code, deny anything else.
    AcceptCode(String),
}

struct Script {
    queue: Mutex<VecDeque<Result<Verdict, ProviderError>>>,
    fallback: Fallback,
    gate: Option<Semaphore>,
    calls: AtomicUsize,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<(Handle, Option<String>)>>,
}

impl Script {
    fn new(fallback: Fallback, held: bool) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback,
            gate: held.then(|| Semaphore::new(0)),
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    async fn answer(&self, identity: &Identity, code: Option<&str>) -> Result<Verdict, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((identity.handle.clone(), code.map(str::to_string)));
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let scripted = self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let result = match (scripted, &self.fallback) {
            (Some(result), _) => result,
            (None, Fallback::Fixed(result)) => result.clone(),
            (None, Fallback::AcceptCode(expected)) => {
                if code == Some(expected.as_str()) {
                    Ok(Verdict::Allow)
                } else {
                    Ok(Verdict::Deny)
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn push(&self, result: Result<Verdict, ProviderError>) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    fn seen(&self) -> Vec<(Handle, Option<String>)> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Push provider double.
pub struct NullAuthenticator {
    script: Script,
}

impl NullAuthenticator {
    /// Answers every challenge with `result` immediately.
    pub fn answering(result: Result<Verdict, ProviderError>) -> Self {
        Self {
            script: Script::new(Fallback::Fixed(result), false),
        }
    }

    pub fn approving() -> Self {
        Self::answering(Ok(Verdict::Allow))
    }

    pub fn denying() -> Self {
        Self::answering(Ok(Verdict::Deny))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::answering(Err(error))
    }

    /// Parks every challenge until [`release`](Self::release) is called.
    pub fn held(result: Result<Verdict, ProviderError>) -> Self {
        Self {
            script: Script::new(Fallback::Fixed(result), true),
        }
    }

    /// Queue a result for the next challenge.
    pub fn then(self, result: Result<Verdict, ProviderError>) -> Self {
        self.script.push(result);
        self
    }

    /// Let one parked challenge through.
    pub fn release(&self) {
        self.script.release(1);
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.script.completed.load(Ordering::SeqCst)
    }

    /// Highest number of challenges observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.script.max_in_flight.load(Ordering::SeqCst)
    }

    /// Handles challenged so far, in call order.
    pub fn challenged(&self) -> Vec<Handle> {
        self.script.seen().into_iter().map(|(h, _)| h).collect()
    }
}

#[async_trait]
impl AuthenticationService for NullAuthenticator {
    async fn challenge(&self, identity: &Identity) -> Result<Verdict, ProviderError> {
        self.script.answer(identity, None).await
    }
}

/// Token provider double.
pub struct NullTokenVerifier {
    script: Script,
}

impl NullTokenVerifier {
    /// Allows `code` and denies everything else.
    pub fn accepting(code: impl Into<String>) -> Self {
        Self {
            script: Script::new(Fallback::AcceptCode(code.into()), false),
        }
    }

    /// Answers every verification with `result` immediately.
    pub fn answering(result: Result<Verdict, ProviderError>) -> Self {
        Self {
            script: Script::new(Fallback::Fixed(result), false),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::answering(Err(error))
    }

    /// Parks every verification until [`release`](Self::release) is called.
    pub fn held(code: impl Into<String>) -> Self {
        Self {
            script: Script::new(Fallback::AcceptCode(code.into()), true),
        }
    }

    pub fn then(self, result: Result<Verdict, ProviderError>) -> Self {
        self.script.push(result);
        self
    }

    pub fn release(&self) {
        self.script.release(1);
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.script.completed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.script.max_in_flight.load(Ordering::SeqCst)
    }

    /// Codes submitted so far, in call order.
    pub fn codes(&self) -> Vec<String> {
        self.script
            .seen()
            .into_iter()
            .filter_map(|(_, code)| code)
            .collect()
    }
}

#[async_trait]
impl TokenVerificationService for NullTokenVerifier {
    async fn verify(&self, identity: &Identity, code: &str) -> Result<Verdict, ProviderError> {
        self.script.answer(identity, Some(code)).await
    }
}
