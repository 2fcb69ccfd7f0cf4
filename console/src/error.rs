use callverify_provider::ProviderError;
use callverify_session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("server error: {0}")]
    Server(String),
}
