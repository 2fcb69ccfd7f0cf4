//! Tokio driver for a verification session.
//!
//! One task owns the [`VerificationSession`]. Operator intents arrive over an
//! mpsc channel and are applied synchronously; collaborator calls run on
//! spawned tasks and report back tagged with their ticket; the armed
//! narrative timer is one more `select!` branch. Every change is published
//! on a `watch` channel for read-only observers.

use callverify_directory::IdentityDirectory;
use callverify_provider::{AuthenticationService, TokenVerificationService};
use callverify_types::{Clock, Verdict};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::SessionError;
use crate::session::{
    Completion, CompletionTimer, Dispatch, Request, SessionSnapshot, Ticket, VerificationSession,
};

/// Capacity of the operator intent queue.
const COMMAND_CAPACITY: usize = 32;

/// External services the session calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub authenticator: Arc<dyn AuthenticationService>,
    pub token_verifier: Arc<dyn TokenVerificationService>,
}

enum Action {
    Select(String),
    SendPush,
    ChooseToken,
    EnterToken(String),
    SubmitToken(String),
    Reset,
}

struct Command {
    action: Action,
    reply: oneshot::Sender<Result<(), SessionError>>,
}

struct CompletionMsg {
    ticket: Ticket,
    result: Result<Verdict, String>,
}

pub struct SessionRuntime {
    session: VerificationSession,
    directory: Arc<IdentityDirectory>,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
    commands: mpsc::Receiver<Command>,
    completions_tx: mpsc::UnboundedSender<CompletionMsg>,
    completions_rx: mpsc::UnboundedReceiver<CompletionMsg>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionRuntime {
    /// Start a runtime task. It stops once every [`SessionHandle`] is dropped.
    pub fn spawn(
        directory: Arc<IdentityDirectory>,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
        completion_delay: Duration,
    ) -> (SessionHandle, JoinHandle<()>) {
        let session = VerificationSession::new(completion_delay);
        let (commands_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(session.snapshot(clock.now()));

        let runtime = Self {
            session,
            directory: directory.clone(),
            collaborators,
            clock,
            commands,
            completions_tx,
            completions_rx,
            snapshots,
        };
        let task = tokio::spawn(runtime.run());

        let handle = SessionHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
            directory,
        };
        (handle, task)
    }

    async fn run(mut self) {
        loop {
            let timer = self.session.armed_timer();
            let now = self.clock.now();
            let sleep = async move {
                match timer {
                    Some(t) => tokio::time::sleep(t.due_at().remaining_from(now)).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some(done) = self.completions_rx.recv() => self.on_completion(done),
                _ = sleep => {
                    if let Some(timer) = timer {
                        self.on_timer(timer);
                    }
                }
            }
        }
        tracing::debug!("session runtime stopped");
    }

    fn handle(&mut self, cmd: Command) {
        let now = self.clock.now();
        let result = match cmd.action {
            Action::Select(handle) => self.session.select_identity(&self.directory, &handle),
            Action::SendPush => self.session.send_push(now).map(|d| self.dispatch(d)),
            Action::ChooseToken => self.session.choose_token(),
            Action::EnterToken(value) => self.session.enter_token(&value),
            Action::SubmitToken(code) => self
                .session
                .submit_token(&code, now)
                .map(|d| self.dispatch(d)),
            Action::Reset => {
                self.session.reset();
                Ok(())
            }
        };
        match &result {
            Ok(()) => self.publish(),
            Err(e) => {
                tracing::debug!(phase = %self.session.phase(), "operator action rejected: {e}")
            }
        }
        // Observers see the new snapshot before the caller gets its reply.
        let _ = cmd.reply.send(result);
    }

    fn dispatch(&self, dispatch: Dispatch) {
        let tx = self.completions_tx.clone();
        let ticket = dispatch.ticket;
        match dispatch.request {
            Request::Push { identity } => {
                let authenticator = self.collaborators.authenticator.clone();
                tokio::spawn(async move {
                    let result = authenticator
                        .challenge(&identity)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(CompletionMsg { ticket, result });
                });
            }
            Request::Token { identity, code } => {
                let verifier = self.collaborators.token_verifier.clone();
                tokio::spawn(async move {
                    let result = verifier
                        .verify(&identity, &code)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(CompletionMsg { ticket, result });
                });
            }
        }
    }

    fn on_completion(&mut self, msg: CompletionMsg) {
        if let Completion::Applied(outcome) =
            self.session.complete(msg.ticket, msg.result, self.clock.now())
        {
            tracing::debug!(outcome = %outcome, "completion applied");
            self.publish();
        }
    }

    fn on_timer(&mut self, timer: CompletionTimer) {
        if self.session.fire_timer(timer, self.clock.now()) {
            tracing::debug!(due_at = %timer.due_at(), "completion narrative due");
            self.publish();
        }
    }

    fn publish(&self) {
        self.snapshots
            .send_replace(self.session.snapshot(self.clock.now()));
    }
}

/// Cloneable access to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    directory: Arc<IdentityDirectory>,
}

impl SessionHandle {
    async fn call(&self, action: Action) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command { action, reply })
            .await
            .map_err(|_| SessionError::RuntimeStopped)?;
        rx.await.map_err(|_| SessionError::RuntimeStopped)?
    }

    pub async fn select_identity(&self, handle: &str) -> Result<(), SessionError> {
        self.call(Action::Select(handle.to_string())).await
    }

    pub async fn send_push(&self) -> Result<(), SessionError> {
        self.call(Action::SendPush).await
    }

    pub async fn choose_token(&self) -> Result<(), SessionError> {
        self.call(Action::ChooseToken).await
    }

    pub async fn enter_token(&self, value: &str) -> Result<(), SessionError> {
        self.call(Action::EnterToken(value.to_string())).await
    }

    pub async fn submit_token(&self, code: &str) -> Result<(), SessionError> {
        self.call(Action::SubmitToken(code.to_string())).await
    }

    pub async fn reset(&self) -> Result<(), SessionError> {
        self.call(Action::Reset).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    /// Wait until a published snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::RuntimeStopped)?;
        Ok(snapshot.clone())
    }
}
