use std::{panic::AssertUnwindSafe, sync::Arc};

use anyhow::{anyhow, Result};
use futures::FutureExt;
use hashbrown::HashSet;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tokio::task::JoinSet;

use crate::{
    crawler::{DomainLimiter, FetchError, FetchRequest, PageFetcher},
    logging,
};

type RequestCallback = dyn Fn(&Url) + Send + Sync;
type ErrorCallback = dyn Fn(&Url, &FetchError) + Send + Sync;
type HtmlCallback = dyn Fn(ElementRef<'_>) + Send + Sync;

#[derive(Debug, Clone, Default)]
pub struct CollectorOptions {
    pub user_agent: String,
    /// 空清單代表不限制網域
    pub allowed_domains: Vec<String>,
    pub max_body_size: Option<usize>,
    pub allow_revisit: bool,
}

struct HtmlHandler {
    selector: Selector,
    callback: Box<HtmlCallback>,
}

#[derive(Clone, Default)]
struct Callbacks {
    request: Vec<Arc<RequestCallback>>,
    error: Vec<Arc<ErrorCallback>>,
    html: Vec<Arc<HtmlHandler>>,
}

impl Callbacks {
    fn report(&self, url: &Url, why: &FetchError) {
        for callback in &self.error {
            callback(url, why);
        }
    }
}

/// Visits pages asynchronously and hands parsed documents to registered callbacks.
///
/// `visit` only validates and schedules; the request itself runs on its own tokio
/// task. `wait` returns once every request scheduled by this collector has finished
/// and its callbacks have run.
pub struct Collector {
    options: CollectorOptions,
    fetcher: Arc<dyn PageFetcher>,
    limiter: Arc<DomainLimiter>,
    callbacks: Callbacks,
    visited: HashSet<String>,
    in_flight: JoinSet<()>,
}

impl Collector {
    pub fn new(
        options: CollectorOptions,
        fetcher: Arc<dyn PageFetcher>,
        limiter: Arc<DomainLimiter>,
    ) -> Self {
        Collector {
            options,
            fetcher,
            limiter,
            callbacks: Callbacks::default(),
            visited: HashSet::new(),
            in_flight: JoinSet::new(),
        }
    }

    /// Called right before a request goes out, after its domain slot is acquired.
    pub fn on_request(&mut self, callback: impl Fn(&Url) + Send + Sync + 'static) -> &mut Self {
        self.callbacks.request.push(Arc::new(callback));
        self
    }

    pub fn on_error(
        &mut self,
        callback: impl Fn(&Url, &FetchError) + Send + Sync + 'static,
    ) -> &mut Self {
        self.callbacks.error.push(Arc::new(callback));
        self
    }

    /// Runs `callback` for every element matching `selector` on each fetched page.
    pub fn on_html(
        &mut self,
        selector: &str,
        callback: impl Fn(ElementRef<'_>) + Send + Sync + 'static,
    ) -> Result<&mut Self> {
        let selector = Selector::parse(selector)
            .map_err(|why| anyhow!("Failed to parse selector {selector:?} because {why:?}"))?;
        self.callbacks.html.push(Arc::new(HtmlHandler {
            selector,
            callback: Box::new(callback),
        }));
        Ok(self)
    }

    /// Schedules a GET of `url`.
    ///
    /// Fails without scheduling anything when the url is malformed, its host is not
    /// allowed, or it was already visited and revisits are off.
    pub fn visit(&mut self, url: &str) -> Result<(), FetchError> {
        let parsed = Url::parse(url).map_err(|why| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: why.to_string(),
        })?;
        let host = parsed
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl {
                url: url.to_string(),
                reason: "missing host".to_string(),
            })?
            .to_ascii_lowercase();

        if !self.is_allowed(&host) {
            return Err(FetchError::ForbiddenDomain {
                url: url.to_string(),
            });
        }

        if !self.options.allow_revisit && !self.visited.insert(parsed.to_string()) {
            return Err(FetchError::AlreadyVisited {
                url: url.to_string(),
            });
        }

        let job = Job {
            request: FetchRequest {
                url: parsed,
                user_agent: self.options.user_agent.clone(),
                max_body_size: self.options.max_body_size,
            },
            host,
            fetcher: Arc::clone(&self.fetcher),
            limiter: Arc::clone(&self.limiter),
            callbacks: self.callbacks.clone(),
        };

        self.in_flight.spawn(job.run_isolated());

        Ok(())
    }

    /// Blocks until every request scheduled by this collector has completed.
    pub async fn wait(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(why) = joined {
                logging::error_file_async(format!("Collector request task ended abnormally: {:?}", why));
            }
        }
    }

    fn is_allowed(&self, host: &str) -> bool {
        self.options.allowed_domains.is_empty()
            || self
                .options
                .allowed_domains
                .iter()
                .any(|domain| domain.eq_ignore_ascii_case(host))
    }
}

struct Job {
    request: FetchRequest,
    host: String,
    fetcher: Arc<dyn PageFetcher>,
    limiter: Arc<DomainLimiter>,
    callbacks: Callbacks,
}

impl Job {
    /// A panicking fetcher or callback surfaces as `FetchError::Aborted` on this url.
    async fn run_isolated(self) {
        let url = self.request.url.clone();
        let callbacks = self.callbacks.clone();

        if let Err(panic) = AssertUnwindSafe(self.run()).catch_unwind().await {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            callbacks.report(&url, &FetchError::Aborted {
                url: url.to_string(),
                reason,
            });
        }
    }

    async fn run(self) {
        match self.fetch().await {
            Ok(body) => self.dispatch(&body),
            Err(why) => self.callbacks.report(&self.request.url, &why),
        }
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        let _permit = self
            .limiter
            .acquire(&self.host)
            .await
            .map_err(|why| FetchError::Aborted {
                url: self.request.url.to_string(),
                reason: why.to_string(),
            })?;

        for callback in &self.callbacks.request {
            callback(&self.request.url);
        }

        self.fetcher.fetch(&self.request).await
    }

    fn dispatch(&self, body: &str) {
        let document = Html::parse_document(body);
        for handler in &self.callbacks.html {
            for element in document.select(&handler.selector) {
                (handler.callback)(element);
            }
        }
    }
}
