use std::{env, path::PathBuf, str::FromStr};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{crawler::yahoo, error::SetupError, logging};

const CONFIG_PATH: &str = "app.json";

const SCRAPER_SYMBOLS: &str = "SCRAPER_SYMBOLS";
const SCRAPER_USER_AGENT: &str = "SCRAPER_USER_AGENT";
const SCRAPER_ALLOWED_DOMAIN: &str = "SCRAPER_ALLOWED_DOMAIN";
const SCRAPER_PER_DOMAIN_CONCURRENCY: &str = "SCRAPER_PER_DOMAIN_CONCURRENCY";
const SCRAPER_QUOTE_URL: &str = "SCRAPER_QUOTE_URL";

const DEFAULT_USER_AGENT: &str = "1 Mozilla/5.0 (iPad; CPU OS 12_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";
const DEFAULT_PER_DOMAIN_CONCURRENCY: usize = 2;

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub scraper: Scraper,
}

/// Everything a run needs, passed to the orchestrator at construction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Scraper {
    pub symbols: Vec<String>,
    pub user_agent: String,
    pub allowed_domain: String,
    pub per_domain_concurrency: usize,
    /// 報價頁網址前綴，股票代號直接接在後面
    pub quote_url: String,
}

impl Default for Scraper {
    fn default() -> Self {
        Scraper {
            symbols: ["AAPL", "MSFT", "AMZN", "PLTR"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allowed_domain: yahoo::HOST.to_string(),
            per_domain_concurrency: DEFAULT_PER_DOMAIN_CONCURRENCY,
            quote_url: format!("https://{}/quote/", yahoo::HOST),
        }
    }
}

impl Scraper {
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.user_agent.trim().is_empty() {
            return Err(SetupError::InvalidSettings("user agent is empty".to_string()));
        }

        if self.allowed_domain.trim().is_empty() {
            return Err(SetupError::InvalidSettings(
                "allowed domain is empty".to_string(),
            ));
        }

        if self.per_domain_concurrency == 0 {
            return Err(SetupError::InvalidSettings(
                "per domain concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

pub static SETTINGS: Lazy<App> = Lazy::new(App::new);

impl App {
    /// 讀取 app.json（若存在），再以環境變數覆蓋
    pub fn new() -> Self {
        match App::get() {
            Ok(app) => app,
            Err(why) => {
                logging::error_file_async(format!(
                    "I can't read the config context because {:?}",
                    why
                ));
                App::default().override_with_env()
            }
        }
    }

    fn get() -> Result<Self> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(symbols) = env::var(SCRAPER_SYMBOLS) {
            self.scraper.symbols = parse_symbols(&symbols);
        }

        if let Ok(user_agent) = env::var(SCRAPER_USER_AGENT) {
            self.scraper.user_agent = user_agent;
        }

        if let Ok(domain) = env::var(SCRAPER_ALLOWED_DOMAIN) {
            self.scraper.allowed_domain = domain;
        }

        if let Ok(concurrency) = env::var(SCRAPER_PER_DOMAIN_CONCURRENCY) {
            self.scraper.per_domain_concurrency =
                usize::from_str(concurrency.trim()).unwrap_or(DEFAULT_PER_DOMAIN_CONCURRENCY);
        }

        if let Ok(url) = env::var(SCRAPER_QUOTE_URL) {
            self.scraper.quote_url = url;
        }

        self
    }
}

fn parse_symbols(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_fixed_constants() {
        let scraper = Scraper::default();

        assert_eq!(scraper.symbols, vec!["AAPL", "MSFT", "AMZN", "PLTR"]);
        assert_eq!(scraper.allowed_domain, "finance.yahoo.com");
        assert_eq!(scraper.per_domain_concurrency, 2);
        assert!(scraper.user_agent.starts_with("1 Mozilla/5.0 (iPad;"));
        tokio_test::assert_ok!(scraper.validate());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let scraper = Scraper {
            per_domain_concurrency: 0,
            ..Default::default()
        };

        tokio_test::assert_err!(scraper.validate());
    }

    #[test]
    fn test_validate_rejects_blank_user_agent() {
        let scraper = Scraper {
            user_agent: "  ".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            scraper.validate(),
            Err(SetupError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_parse_symbols() {
        assert_eq!(parse_symbols(" AAPL, ,MSFT,"), vec!["AAPL", "MSFT"]);
        assert!(parse_symbols("").is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let app: App =
            serde_json::from_str(r#"{"scraper":{"symbols":["TSLA"]}}"#).unwrap();

        assert_eq!(app.scraper.symbols, vec!["TSLA"]);
        assert_eq!(app.scraper.per_domain_concurrency, 2);
        assert_eq!(app.scraper.quote_url, "https://finance.yahoo.com/quote/");
    }
}
