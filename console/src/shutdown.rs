//! Stopping the console cleanly.
//!
//! A single trigger (Ctrl-C, SIGTERM, or [`ShutdownController::shutdown`])
//! stops the HTTP server. In-flight requests finish; the session runtime
//! exits once the server has released its handles.

use std::fmt;
use std::future::Future;

use tokio::signal;
use tokio::sync::broadcast;

/// What asked the console to stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Requested => "requested",
        })
    }
}

pub struct ShutdownController {
    tx: broadcast::Sender<ShutdownReason>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Future for `Console::serve`: resolves on the first trigger.
    ///
    /// The receiver is taken here, not when the future is first polled, so a
    /// trigger that lands before the server starts still stops it.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            match rx.recv().await {
                Ok(reason) => tracing::info!(%reason, "stopping console"),
                Err(_) => tracing::debug!("shutdown controller dropped, stopping console"),
            }
        }
    }

    pub fn shutdown(&self) {
        self.trigger(ShutdownReason::Requested);
    }

    fn trigger(&self, reason: ShutdownReason) {
        // No receivers just means nothing is serving yet.
        let _ = self.tx.send(reason);
    }

    /// Block until the process receives SIGINT or SIGTERM, then trigger.
    pub async fn wait_for_signal(&self) -> ShutdownReason {
        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("SIGTERM handler unavailable: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let reason = tokio::select! {
            _ = signal::ctrl_c() => ShutdownReason::Interrupt,
            _ = terminate => ShutdownReason::Terminate,
        };
        self.trigger(reason);
        reason
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
