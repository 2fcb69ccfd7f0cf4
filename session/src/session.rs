//! The verification session state machine.

use callverify_directory::IdentityDirectory;
use callverify_types::{Identity, Method, Outcome, Timestamp, Verdict};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SessionError;
use crate::phase::{SessionPhase, Trigger};

/// How long after resolution the caller narrative switches to "completed".
pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_secs(2);

/// Monotonically increasing session token.
///
/// Advanced on every reset and every dispatch; results and timers tagged
/// with an older generation are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Identifies one outstanding collaborator call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket {
    generation: Generation,
    method: Method,
}

impl Ticket {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn method(&self) -> Method {
        self.method
    }
}

/// The collaborator call a dispatching trigger asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Push { identity: Identity },
    Token { identity: Identity, code: String },
}

/// Returned by `send_push` / `submit_token`: perform `request`, then report
/// back with `ticket`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub request: Request,
}

/// The delayed-narrative timer armed on entering `Resolved`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionTimer {
    generation: Generation,
    due_at: Timestamp,
}

impl CompletionTimer {
    pub fn due_at(&self) -> Timestamp {
        self.due_at
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// What happened to a collaborator result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Applied(Outcome),
    /// The session moved on since dispatch; the result was dropped.
    Stale,
}

/// Read-only projection of the session at a point in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub subject: Option<Identity>,
    pub method: Option<Method>,
    pub pending_token_value: Option<String>,
    pub outcome: Option<Outcome>,
    pub failure: Option<String>,
    pub started_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub generation: Generation,
    pub completion_delay_ms: u64,
    pub observed_at: Timestamp,
}

impl SessionSnapshot {
    /// Whether the delayed "completed" narrative applies at `observed_at`.
    pub fn completion_elapsed(&self) -> bool {
        self.phase == SessionPhase::Resolved
            && self.resolved_at.is_some_and(|resolved| {
                resolved.elapsed_since(self.observed_at)
                    >= Duration::from_millis(self.completion_delay_ms)
            })
    }

    pub fn subject_name(&self) -> &str {
        self.subject
            .as_ref()
            .map(|s| s.display_name.as_str())
            .unwrap_or("")
    }
}

/// One operator interaction cycle: select, challenge, resolve, reset.
#[derive(Clone, Debug)]
pub struct VerificationSession {
    phase: SessionPhase,
    subject: Option<Identity>,
    method: Option<Method>,
    pending_token_value: Option<String>,
    outcome: Option<Outcome>,
    failure: Option<String>,
    started_at: Option<Timestamp>,
    resolved_at: Option<Timestamp>,
    generation: Generation,
    in_flight: Option<Ticket>,
    timer: Option<CompletionTimer>,
    completion_delay: Duration,
}

impl Default for VerificationSession {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_DELAY)
    }
}

impl VerificationSession {
    pub fn new(completion_delay: Duration) -> Self {
        Self {
            phase: SessionPhase::Idle,
            subject: None,
            method: None,
            pending_token_value: None,
            outcome: None,
            failure: None,
            started_at: None,
            resolved_at: None,
            generation: Generation::default(),
            in_flight: None,
            timer: None,
            completion_delay,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn subject(&self) -> Option<&Identity> {
        self.subject.as_ref()
    }

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn pending_token_value(&self) -> Option<&str> {
        self.pending_token_value.as_deref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Collaborator failure detail, present with `Outcome::Error`.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn resolved_at(&self) -> Option<Timestamp> {
        self.resolved_at
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    pub fn armed_timer(&self) -> Option<CompletionTimer> {
        self.timer
    }

    pub fn completion_delay(&self) -> Duration {
        self.completion_delay
    }

    fn ensure(&self, trigger: Trigger) -> Result<(), SessionError> {
        if self.phase.accepts(trigger) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                trigger,
                phase: self.phase,
            })
        }
    }

    fn current_subject(&self, trigger: Trigger) -> Result<Identity, SessionError> {
        self.subject
            .clone()
            .ok_or(SessionError::InvalidTransition {
                trigger,
                phase: self.phase,
            })
    }

    fn issue_ticket(&mut self, method: Method) -> Ticket {
        self.generation = self.generation.next();
        let ticket = Ticket {
            generation: self.generation,
            method,
        };
        self.in_flight = Some(ticket);
        ticket
    }

    /// Target an identity from the directory. Allowed while `Idle` and,
    /// replacing the previous choice, while `Selected`.
    pub fn select_identity(
        &mut self,
        directory: &IdentityDirectory,
        handle: &str,
    ) -> Result<(), SessionError> {
        self.ensure(Trigger::SelectIdentity)?;
        let identity = directory
            .find(handle)
            .ok_or_else(|| SessionError::UnknownIdentity(handle.trim().to_string()))?;

        if let Some(previous) = &self.subject {
            tracing::debug!(previous = %previous.handle, "replacing selected identity");
        }
        tracing::info!(subject = %identity.handle, "identity selected");
        self.subject = Some(identity.clone());
        self.phase = SessionPhase::Selected;
        Ok(())
    }

    /// Move to `PushPending` and request a push challenge.
    pub fn send_push(&mut self, now: Timestamp) -> Result<Dispatch, SessionError> {
        self.ensure(Trigger::SendPush)?;
        let identity = self.current_subject(Trigger::SendPush)?;

        let ticket = self.issue_ticket(Method::Push);
        self.method = Some(Method::Push);
        self.phase = SessionPhase::PushPending;
        self.started_at = Some(now);

        tracing::info!(subject = %identity.handle, generation = ticket.generation.value(), "push dispatched");
        Ok(Dispatch {
            ticket,
            request: Request::Push { identity },
        })
    }

    /// Switch to the hardware token fallback.
    pub fn choose_token(&mut self) -> Result<(), SessionError> {
        self.ensure(Trigger::ChooseToken)?;
        self.current_subject(Trigger::ChooseToken)?;
        self.method = Some(Method::Token);
        self.phase = SessionPhase::TokenEntry;
        Ok(())
    }

    /// Record the operator's in-progress token input.
    pub fn enter_token(&mut self, value: &str) -> Result<(), SessionError> {
        self.ensure(Trigger::EnterToken)?;
        self.pending_token_value = Some(value.to_string());
        Ok(())
    }

    /// Move to `TokenPending` and request verification of `code`.
    ///
    /// Blank codes are rejected without leaving `TokenEntry`.
    pub fn submit_token(&mut self, code: &str, now: Timestamp) -> Result<Dispatch, SessionError> {
        self.ensure(Trigger::SubmitToken)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(SessionError::Validation(
                "hardware token number must not be empty".into(),
            ));
        }
        let identity = self.current_subject(Trigger::SubmitToken)?;

        let ticket = self.issue_ticket(Method::Token);
        self.pending_token_value = None;
        self.phase = SessionPhase::TokenPending;
        self.started_at = Some(now);

        tracing::info!(subject = %identity.handle, generation = ticket.generation.value(), "token submitted");
        Ok(Dispatch {
            ticket,
            request: Request::Token {
                identity,
                code: code.to_string(),
            },
        })
    }

    /// Apply a collaborator result. Only the current ticket's result moves
    /// the session out of a pending phase; anything else is stale.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Verdict, String>,
        now: Timestamp,
    ) -> Completion {
        if self.in_flight != Some(ticket) {
            tracing::debug!(
                ticket_generation = ticket.generation.value(),
                generation = self.generation.value(),
                "discarding stale completion"
            );
            return Completion::Stale;
        }

        let outcome = match result {
            Ok(verdict) => Outcome::from(verdict),
            Err(reason) => {
                tracing::warn!(method = %ticket.method, "verification call failed: {reason}");
                self.failure = Some(reason);
                Outcome::Error
            }
        };

        self.in_flight = None;
        self.outcome = Some(outcome);
        self.resolved_at = Some(now);
        self.phase = SessionPhase::Resolved;
        self.timer = Some(CompletionTimer {
            generation: self.generation,
            due_at: now.saturating_add(self.completion_delay),
        });

        tracing::info!(
            subject = %self.subject.as_ref().map(|s| s.handle.as_str()).unwrap_or(""),
            outcome = %outcome,
            "verification resolved"
        );
        Completion::Applied(outcome)
    }

    /// Fire the delayed-narrative timer. Returns `false` (and changes nothing)
    /// if `timer` is no longer armed or not yet due.
    pub fn fire_timer(&mut self, timer: CompletionTimer, now: Timestamp) -> bool {
        match self.timer {
            Some(armed) if armed == timer && now >= armed.due_at => {
                self.timer = None;
                true
            }
            _ => false,
        }
    }

    /// Return to `Idle` from any phase. Invalidates any outstanding call and
    /// disarms the narrative timer.
    pub fn reset(&mut self) {
        if let Some(ticket) = self.in_flight {
            tracing::info!(method = %ticket.method, "reset while a verification call is outstanding");
        }
        *self = Self {
            generation: self.generation.next(),
            ..Self::new(self.completion_delay)
        };
    }

    pub fn snapshot(&self, now: Timestamp) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            subject: self.subject.clone(),
            method: self.method,
            pending_token_value: self.pending_token_value.clone(),
            outcome: self.outcome,
            failure: self.failure.clone(),
            started_at: self.started_at,
            resolved_at: self.resolved_at,
            generation: self.generation,
            completion_delay_ms: u64::try_from(self.completion_delay.as_millis()).unwrap_or(u64::MAX),
            observed_at: now,
        }
    }

    /// Describe the first broken invariant, if any.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.phase != SessionPhase::Idle && self.subject.is_none() {
            return Some("subject missing outside Idle");
        }
        if self.outcome.is_some() != (self.phase == SessionPhase::Resolved) {
            return Some("outcome present outside Resolved or missing in Resolved");
        }
        if self.in_flight.is_some() != self.phase.is_pending() {
            return Some("outstanding call does not match pending phase");
        }
        if self.pending_token_value.is_some() && self.phase != SessionPhase::TokenEntry {
            return Some("pending token value outside TokenEntry");
        }
        if self.timer.is_some() && self.phase != SessionPhase::Resolved {
            return Some("narrative timer armed outside Resolved");
        }
        if self.failure.is_some() && self.outcome != Some(Outcome::Error) {
            return Some("failure detail without error outcome");
        }
        None
    }
}
