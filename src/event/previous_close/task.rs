use std::sync::Arc;

use reqwest::Url;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    crawler::{yahoo, Collector, CollectorOptions, DomainLimiter, PageFetcher},
    declare::{ResultMessage, Symbol, PREVIOUS_CLOSE},
    error::SetupError,
    logging::{self, LogGuard},
    util::{http::element, wait_group::Completion},
};

/// Shared by every stock task of one run.
#[derive(Clone)]
pub struct TaskContext {
    pub options: CollectorOptions,
    pub quote_url: String,
    pub fetcher: Arc<dyn PageFetcher>,
    pub limiter: Arc<DomainLimiter>,
    pub log_guard: Arc<LogGuard>,
}

/// 單一股票的採集工作：抓取報價頁、取出前一交易日收盤價並送進結果串流
pub struct StockTask {
    symbol: Symbol,
    url: String,
    context: TaskContext,
    sink: UnboundedSender<ResultMessage>,
}

impl StockTask {
    /// Builds the quote url of `symbol`; a url that does not parse is a setup failure.
    pub fn new(
        symbol: Symbol,
        context: TaskContext,
        sink: UnboundedSender<ResultMessage>,
    ) -> Result<Self, SetupError> {
        if symbol.as_str().trim().is_empty() {
            return Err(SetupError::InvalidSymbol {
                symbol: symbol.to_string(),
                reason: "symbol is empty".to_string(),
            });
        }

        let url = yahoo::quote_url(&context.quote_url, symbol.as_str());
        Url::parse(&url).map_err(|why| SetupError::InvalidSymbol {
            symbol: symbol.to_string(),
            reason: format!("quote url {url:?} is invalid: {why}"),
        })?;

        Ok(StockTask {
            symbol,
            url,
            context,
            sink,
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the quote page and emits one message per matching row.
    ///
    /// Failures are written through the log guard and never returned. `completion`
    /// is signalled exactly once when this future ends, after the collector has
    /// drained every request and the result sink has been released.
    pub async fn execute(self, completion: Completion) {
        // 最先宣告、最後釋放：sink 與 collector 都會在 done() 之前 drop
        let _completion = scopeguard::guard(completion, Completion::done);

        let StockTask {
            symbol,
            url,
            context,
            sink,
        } = self;
        let log_guard = context.log_guard;
        let mut collector = Collector::new(context.options, context.fetcher, context.limiter);

        let error_guard = Arc::clone(&log_guard);
        let error_symbol = symbol.clone();
        collector
            .on_request(|url| logging::info_file_async(format!("Visiting {}", url)))
            .on_error(move |_, why| {
                error_guard.error(&format!("Error parsing stock {}: {}", error_symbol, why))
            });

        let html_symbol = symbol.clone();
        let registered = collector.on_html(yahoo::QUOTE_TABLE_SELECTOR, move |table_body| {
            for value in element::labeled_row_values(&table_body, PREVIOUS_CLOSE) {
                let msg = ResultMessage::new(html_symbol.clone(), PREVIOUS_CLOSE, value);
                if sink.send(msg).is_err() {
                    logging::warn_file_async(format!(
                        "Result stream dropped before {} was delivered",
                        html_symbol
                    ));
                }
            }
        });

        if let Err(why) = registered {
            log_guard.error(&format!("Error preparing stock {}: {:?}", symbol, why));
            return;
        }

        if let Err(why) = collector.visit(&url) {
            log_guard.error(&format!("Error visiting stock {}: {}", symbol, why));
        }

        collector.wait().await;
    }
}
