use std::{fmt, sync::Arc};

/// 前一交易日收盤價在報價頁表格中的標籤
pub const PREVIOUS_CLOSE: &str = "Previous Close";

/// 股票代號
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Symbol(Arc::from(symbol.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 單一股票採集成功後送往輸出串流的訊息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMessage {
    pub symbol: Symbol,
    pub label: String,
    pub value: String,
}

impl ResultMessage {
    pub fn new(symbol: Symbol, label: impl Into<String>, value: impl Into<String>) -> Self {
        ResultMessage {
            symbol,
            label: label.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ResultMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label == PREVIOUS_CLOSE {
            write!(f, "{} Price for previous close is: {}", self.symbol, self.value)
        } else {
            write!(f, "{} {} is: {}", self.symbol, self.label, self.value)
        }
    }
}
