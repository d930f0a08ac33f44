/// 前一交易日收盤價的並行採集
pub mod previous_close;
