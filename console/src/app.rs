//! Wires configuration, collaborators and the session runtime into a
//! servable console.

use axum::Router;
use callverify_directory::{DirectoryService, HttpDirectory, IdentityDirectory, StaticDirectory};
use callverify_provider::DuoClient;
use callverify_session::{Collaborators, SessionRuntime};
use callverify_types::{Clock, MonotonicClock};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::adapter::PresentationAdapter;
use crate::config::{ConsoleConfig, DirectoryConfig, DirectoryKind, DuoConfig};
use crate::http::router;
use crate::ConsoleError;

pub fn directory_service(
    config: &DirectoryConfig,
) -> Result<Box<dyn DirectoryService>, ConsoleError> {
    match config.kind {
        DirectoryKind::Static => {
            let directory = StaticDirectory::from_handles(&config.identities)
                .map_err(|e| ConsoleError::Config(format!("directory.identities: {e}")))?;
            Ok(Box::new(directory))
        }
        DirectoryKind::Http => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| ConsoleError::Config("directory.url is not set".into()))?;
            Ok(Box::new(HttpDirectory::with_timeout(
                url,
                Duration::from_secs(config.timeout_secs),
            )))
        }
    }
}

/// Query the configured directory once.
pub async fn load_directory(config: &DirectoryConfig) -> Result<IdentityDirectory, ConsoleError> {
    let service = directory_service(config)?;
    Ok(IdentityDirectory::load(service.as_ref()).await)
}

/// One Duo client serves both push and passcode checks.
pub fn duo_collaborators(config: &DuoConfig) -> Result<Collaborators, ConsoleError> {
    let client = Arc::new(DuoClient::new(config.settings())?);
    tracing::info!(host = client.host(), "Duo client ready");
    Ok(Collaborators {
        authenticator: client.clone(),
        token_verifier: client,
    })
}

/// A running session with its presentation adapter.
pub struct Console {
    adapter: Arc<PresentationAdapter>,
    runtime: JoinHandle<()>,
}

impl Console {
    pub fn start(
        directory: IdentityDirectory,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
        completion_delay: Duration,
    ) -> Self {
        let (session, runtime) =
            SessionRuntime::spawn(Arc::new(directory), collaborators, clock, completion_delay);
        Self {
            adapter: Arc::new(PresentationAdapter::new(session)),
            runtime,
        }
    }

    /// Load the directory, build the Duo client and start the session.
    pub async fn from_config(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        config.validate()?;
        let collaborators = duo_collaborators(&config.duo)?;
        let directory = load_directory(&config.directory).await?;
        Ok(Self::start(
            directory,
            collaborators,
            Arc::new(MonotonicClock::new()),
            config.completion_delay(),
        ))
    }

    pub fn adapter(&self) -> Arc<PresentationAdapter> {
        self.adapter.clone()
    }

    pub fn router(&self) -> Router {
        router(self.adapter.clone())
    }

    /// Serve HTTP on `listener` until `shutdown` resolves, then stop the
    /// session runtime.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ConsoleError> {
        let addr = listener
            .local_addr()
            .map_err(|e| ConsoleError::Server(e.to_string()))?;
        tracing::info!(%addr, "operator console listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ConsoleError::Server(e.to_string()))?;

        let Self { adapter, runtime } = self;
        drop(adapter);
        runtime
            .await
            .map_err(|e| ConsoleError::Server(format!("session runtime failed: {e}")))?;
        tracing::info!("operator console stopped");
        Ok(())
    }
}
