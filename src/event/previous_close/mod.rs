//! # 前一交易日收盤價
//!
//! 每個股票代號各自一個 `StockTask` 並行採集，結果經由同一條 channel 匯流。
//! 只有協調者會在所有任務完成後關閉結果串流，任務本身從不關閉。

use std::sync::Arc;

use reqwest::Url;
use tokio::{runtime::Handle, sync::mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    config::Scraper,
    crawler::{CollectorOptions, DomainLimiter, PageFetcher},
    declare::{ResultMessage, Symbol},
    error::SetupError,
    logging::{self, LogGuard},
    util::wait_group::WaitGroup,
};

pub mod report;
pub mod task;

pub use report::Reporter;
pub use task::{StockTask, TaskContext};

/// Finite stream of results; ends once every dispatched task has completed.
pub type ResultStream = UnboundedReceiverStream<ResultMessage>;

/// Dispatches one concurrent `StockTask` per symbol and funnels their results
/// into a single stream.
pub struct Orchestrator {
    settings: Scraper,
    context: TaskContext,
}

impl Orchestrator {
    /// # Errors
    ///
    /// `SetupError::InvalidSettings` when the settings fail validation or the quote
    /// url does not point at the allowed domain.
    pub fn new(
        settings: Scraper,
        fetcher: Arc<dyn PageFetcher>,
        log_guard: Arc<LogGuard>,
    ) -> Result<Self, SetupError> {
        settings.validate()?;

        let quote_host = Url::parse(&settings.quote_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .ok_or_else(|| {
                SetupError::InvalidSettings(format!("quote url {:?} has no host", settings.quote_url))
            })?;
        if !quote_host.eq_ignore_ascii_case(&settings.allowed_domain) {
            return Err(SetupError::InvalidSettings(format!(
                "quote url host {} is not the allowed domain {}",
                quote_host, settings.allowed_domain
            )));
        }

        let context = TaskContext {
            options: CollectorOptions {
                user_agent: settings.user_agent.clone(),
                allowed_domains: vec![settings.allowed_domain.clone()],
                max_body_size: None,
                allow_revisit: true,
            },
            quote_url: settings.quote_url.clone(),
            fetcher,
            limiter: Arc::new(DomainLimiter::new(settings.per_domain_concurrency)),
            log_guard,
        };

        Ok(Orchestrator { settings, context })
    }

    /// Runs the configured symbol list.
    pub fn run_configured(&self) -> Result<ResultStream, SetupError> {
        self.run(self.settings.symbols.iter())
    }

    /// Dispatches one task per symbol and returns the stream of their results.
    ///
    /// Every task is built before any is spawned, so a setup failure leaves nothing
    /// running. Must be called from within a tokio runtime.
    pub fn run<I>(&self, symbols: I) -> Result<ResultStream, SetupError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let runtime = Handle::try_current().map_err(|_| SetupError::NoRuntime)?;
        let (tx, rx) = mpsc::unbounded_channel::<ResultMessage>();

        let tasks = symbols
            .into_iter()
            .map(|symbol| StockTask::new(Symbol::new(symbol), self.context.clone(), tx.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let wait_group = WaitGroup::new();
        let dispatched = tasks.len();
        for task in tasks {
            logging::debug_file_async(format!("Dispatching {} -> {}", task.symbol(), task.url()));
            runtime.spawn(task.execute(wait_group.add()));
        }

        // 唯一的關閉者：等全部任務 done 之後才釋放最後一個 sender
        runtime.spawn(async move {
            wait_group.wait().await;
            drop(tx);
            logging::info_file_async(format!(
                "All {} stock tasks completed, result stream closed",
                dispatched
            ));
        });

        Ok(UnboundedReceiverStream::new(rx))
    }
}
