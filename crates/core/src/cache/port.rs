use crate::common::{Instrument, Market};
use crate::market::entity::Quote;
use chrono::{DateTime, Utc};

/// # Summary
/// 报价缓存键，由 `(symbol, market)` 组成。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub market: Market,
}

impl CacheKey {
    pub fn of(instrument: &Instrument) -> Self {
        Self {
            symbol: instrument.symbol.clone(),
            market: instrument.market,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.symbol, self.market)
    }
}

/// # Summary
/// 缓存条目：报价及其抓取时间。
///
/// # Invariants
/// - 当且仅当 `now - fetched_at < ttl` 时条目被视为新鲜。
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub quote: Quote,
    pub fetched_at: DateTime<Utc>,
}

/// # Summary
/// 带时间窗口的报价缓存接口 (Port)。
///
/// # Invariants
/// - 过期条目不会被主动驱逐，只在下一次成功抓取时被覆盖。
/// - 新鲜度在读取时惰性计算，没有后台清理线程。
pub trait QuoteCache: Send + Sync {
    /// 读取条目中的报价，不判断新鲜度。
    fn get(&self, key: &CacheKey) -> Option<Quote>;

    /// 写入报价，抓取时间取当前时钟。
    fn put(&self, key: CacheKey, quote: Quote);

    /// 判断条目是否存在且仍在 TTL 内。
    fn is_fresh(&self, key: &CacheKey) -> bool;

    /// # Summary
    /// 仅在条目新鲜时返回报价。
    ///
    /// # Logic
    /// 1. 调用 `is_fresh` 判断新鲜度。
    /// 2. 新鲜则返回 `get` 的结果。
    fn get_fresh(&self, key: &CacheKey) -> Option<Quote> {
        if self.is_fresh(key) {
            self.get(key)
        } else {
            None
        }
    }
}
