//! Maps operator intents onto session triggers.

use callverify_directory::IdentityDirectory;
use callverify_session::{SessionError, SessionHandle};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::views::{render, ConsoleViews};

/// Something the operator did in the console.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum OperatorIntent {
    SelectIdentity { handle: String },
    SendPush,
    ChooseToken,
    EnterToken { value: String },
    /// Submit whatever is in the token input.
    SubmitToken,
    Clear,
}

/// Presentation adapter over one session.
///
/// The token input lives in the session; the adapter only keeps the last
/// rejection message. Intents are applied one at a time.
pub struct PresentationAdapter {
    session: SessionHandle,
    last_error: Mutex<Option<String>>,
}

impl PresentationAdapter {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session,
            last_error: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn directory(&self) -> &IdentityDirectory {
        self.session.directory()
    }

    pub async fn apply(&self, intent: OperatorIntent) -> Result<ConsoleViews, SessionError> {
        let mut last_error = self.last_error.lock().await;
        tracing::debug!(?intent, "operator intent");

        let result = match &intent {
            OperatorIntent::SelectIdentity { handle } => self.session.select_identity(handle).await,
            OperatorIntent::SendPush => self.session.send_push().await,
            OperatorIntent::ChooseToken => self.session.choose_token().await,
            OperatorIntent::EnterToken { value } => self.session.enter_token(value).await,
            OperatorIntent::SubmitToken => {
                let code = self.session.snapshot().pending_token_value.unwrap_or_default();
                self.session.submit_token(&code).await
            }
            OperatorIntent::Clear => self.session.reset().await,
        };

        match result {
            Ok(()) => {
                *last_error = None;
                Ok(self.render(None))
            }
            Err(e) => {
                *last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Current views, including the last rejection message.
    pub async fn views(&self) -> ConsoleViews {
        let last_error = self.last_error.lock().await;
        self.render(last_error.clone())
    }

    fn render(&self, last_error: Option<String>) -> ConsoleViews {
        let mut views = render(&self.session.snapshot(), self.session.directory());
        views.operator.last_error = last_error;
        views
    }
}
