use thiserror::Error;

/// Failures that abort a run before any stock task is dispatched.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid scraper settings: {0}")]
    InvalidSettings(String),
    #[error("cannot dispatch symbol {symbol:?}: {reason}")]
    InvalidSymbol { symbol: String, reason: String },
    #[error("no tokio runtime available to dispatch stock tasks")]
    NoRuntime,
    #[error("failed to create http client: {0}")]
    HttpClient(String),
}
