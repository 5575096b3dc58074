//! # kabu-market
//!
//! 报价获取与告警去重引擎：带退避重试的抓取器、带时间窗口缓存的报价服务，
//! 以及按标的冷却的告警去重器。

pub mod alert;
pub mod fetcher;
pub mod service;
