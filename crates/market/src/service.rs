use crate::fetcher::QuoteFetcher;
use kabu_core::cache::port::{CacheKey, QuoteCache};
use kabu_core::common::{Instrument, WatchEntry};
use kabu_core::market::entity::Quote;
use std::sync::Arc;
use tracing::{debug, warn};

/// # Summary
/// 组合缓存与抓取器的报价服务。
///
/// # Invariants
/// - 缓存由本服务独占；新鲜命中时不访问网络。
/// - 单个标的的失败降级为 "无报价"，不会中断整轮扫描。
pub struct QuoteService {
    cache: Arc<dyn QuoteCache>,
    fetcher: QuoteFetcher,
}

impl QuoteService {
    pub fn new(cache: Arc<dyn QuoteCache>, fetcher: QuoteFetcher) -> Self {
        Self { cache, fetcher }
    }

    /// # Summary
    /// 获取单个标的的报价。
    ///
    /// # Logic
    /// 1. 以 `(symbol, market)` 查询缓存，新鲜则直接返回。
    /// 2. 未命中或过期时调用抓取器。
    /// 3. 成功则写入缓存并返回；失败记录日志并返回 None。
    pub async fn get_quote(&self, instrument: &Instrument) -> Option<Quote> {
        let key = CacheKey::of(instrument);
        if let Some(quote) = self.cache.get_fresh(&key) {
            debug!("Cache hit for {}", key);
            return Some(quote);
        }

        match self.fetcher.fetch(instrument).await {
            Ok(quote) => {
                self.cache.put(key, quote.clone());
                Some(quote)
            }
            Err(e) => {
                warn!("No quote available for {}: {}", instrument.symbol, e);
                None
            }
        }
    }

    /// # Summary
    /// 按给定顺序获取全部监控标的的报价。
    ///
    /// # Logic
    /// 逐个调用 `get_quote`，跳过无报价的标的，保持原有相对顺序。
    pub async fn get_all_quotes(&self, entries: &[WatchEntry]) -> Vec<Quote> {
        let mut quotes = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(quote) = self.get_quote(&entry.instrument).await {
                quotes.push(quote);
            }
        }
        quotes
    }

    /// # Summary
    /// 找出涨跌幅达到标的阈值的报价。
    ///
    /// # Logic
    /// 与 `get_all_quotes` 相同的扫描，仅保留 `abs(change_percent) >= threshold` 的报价。
    pub async fn find_alert_candidates(&self, entries: &[WatchEntry]) -> Vec<Quote> {
        let mut candidates = Vec::new();
        for entry in entries {
            if let Some(quote) = self.get_quote(&entry.instrument).await
                && quote.change_percent.abs() >= entry.threshold
            {
                candidates.push(quote);
            }
        }
        candidates
    }
}
