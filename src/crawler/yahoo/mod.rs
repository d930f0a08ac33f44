//! # Yahoo Finance 報價頁
//!
//! 前一交易日收盤價（Previous Close）位於報價頁摘要表格中，
//! 每列第一格為標籤、第二格為數值。
//!
//! - 來源域名：`finance.yahoo.com`
//! - 抓取技術：HTTP GET 搭配 CSS Selector 解析。

/// Yahoo Finance 的主機域名
pub const HOST: &str = "finance.yahoo.com";

/// 報價頁表格所在的元素
pub const QUOTE_TABLE_SELECTOR: &str = "tbody";

/// Builds the quote page url of `symbol` under `base`, percent-encoding the symbol.
///
/// `base` is expected to end with the path prefix the symbol is appended to,
/// e.g. `https://finance.yahoo.com/quote/`.
pub fn quote_url(base: &str, symbol: &str) -> String {
    let mut url = String::with_capacity(base.len() + symbol.len() + 1);
    url.push_str(base);
    if !base.ends_with('/') {
        url.push('/');
    }
    url.push_str(&urlencoding::encode(symbol));
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_url() {
        assert_eq!(
            quote_url("https://finance.yahoo.com/quote/", "AAPL"),
            "https://finance.yahoo.com/quote/AAPL"
        );
        assert_eq!(
            quote_url("https://finance.yahoo.com/quote", "BRK-B"),
            "https://finance.yahoo.com/quote/BRK-B"
        );
        assert_eq!(
            quote_url("https://finance.yahoo.com/quote/", "^GSPC"),
            "https://finance.yahoo.com/quote/%5EGSPC"
        );
    }

    #[test]
    fn test_host_matches_default_domain() {
        assert!(quote_url("https://finance.yahoo.com/quote/", "X").contains(HOST));
    }
}
