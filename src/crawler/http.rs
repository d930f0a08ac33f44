use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};

use crate::{
    crawler::{FetchError, FetchRequest, PageFetcher},
    error::SetupError,
};

/// `PageFetcher` over a shared reqwest client. No retries; one GET per call.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the reqwest client.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::HttpClient` if the TLS backend or client cannot be created.
    pub fn new() -> Result<Self, SetupError> {
        // 使用 rustls-no-provider 時需先安裝 crypto provider，重複安裝會回傳 Err，忽略即可
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = Client::builder()
            // ===== 壓縮 =====
            .brotli(true)
            .gzip(true)
            .zstd(true)
            // ===== 超時設置 =====
            .connect_timeout(Duration::from_secs(8))
            .timeout(Duration::from_secs(15))
            // ===== TCP 優化 =====
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            // ===== 連接池 =====
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            // ===== 重定向 =====
            .redirect(reqwest::redirect::Policy::limited(5))
            .referer(true)
            .build()
            .map_err(|why| SetupError::HttpClient(format!("{:?}", why)))?;

        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let url = request.url.to_string();
        let response = self
            .client
            .get(request.url.clone())
            .header(header::USER_AGENT, &request.user_agent)
            .send()
            .await
            .map_err(|why| FetchError::Transport {
                url: url.clone(),
                reason: format!("{:?}", why),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|why| FetchError::Body {
            url: url.clone(),
            reason: format!("{:?}", why),
        })?;

        Ok(match request.max_body_size {
            Some(limit) => truncate_body(text, limit),
            None => text,
        })
    }
}

/// Cuts `text` to at most `limit` bytes without splitting a character.
fn truncate_body(mut text: String, limit: usize) -> String {
    if text.len() > limit {
        let mut end = limit;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }

    text
}
