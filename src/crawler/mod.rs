use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

/// 仿 colly 的採集器：網域白名單、回呼、非同步造訪與等待
pub mod collector;
/// reqwest 實作的 PageFetcher
pub mod http;
/// 每個網域同時進行中的請求上限
pub mod limiter;
/// 雅虎財經
pub mod yahoo;

#[cfg(test)]
pub(crate) mod stub;

pub use collector::{Collector, CollectorOptions};
pub use http::HttpFetcher;
pub use limiter::DomainLimiter;

/// One outbound page request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub user_agent: String,
    /// `None` means the body is read in full.
    pub max_body_size: Option<usize>,
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("domain of {url} is not in the allowed list")]
    ForbiddenDomain { url: String },
    #[error("{url} already visited")]
    AlreadyVisited { url: String },
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read body of {url}: {reason}")]
    Body { url: String, reason: String },
    #[error("request to {url} was aborted: {reason}")]
    Aborted { url: String, reason: String },
}

/// Transport underneath a `Collector`: performs one GET and returns the body text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;
}
