use chrono::Duration;
use dashmap::DashMap;
use kabu_core::cache::port::{CacheEntry, CacheKey, QuoteCache};
use kabu_core::common::time::{RealTimeProvider, TimeProvider};
use kabu_core::market::entity::Quote;
use std::sync::Arc;
use tracing::debug;

/// # Summary
/// 基于 DashMap 的内存报价缓存实现。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 条目数量上限等于被追踪标的数量，不做主动驱逐。
/// - 新鲜度判定为严格小于：`now - fetched_at < ttl`。
pub struct MemQuoteCache {
    // 线程安全的报价容器
    storage: DashMap<CacheKey, CacheEntry>,
    // 条目有效期
    ttl: Duration,
    // 时钟来源，测试时可替换为虚拟时钟
    clock: Arc<dyn TimeProvider>,
}

impl MemQuoteCache {
    /// # Summary
    /// 使用真实时钟创建缓存。
    ///
    /// # Arguments
    /// * `ttl`: 条目有效期。
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(RealTimeProvider))
    }

    /// 使用指定时钟创建缓存
    pub fn with_clock(ttl: Duration, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            storage: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    fn entry_is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now() - entry.fetched_at < self.ttl
    }
}

impl QuoteCache for MemQuoteCache {
    fn get(&self, key: &CacheKey) -> Option<Quote> {
        self.storage.get(key).map(|e| e.value().quote.clone())
    }

    /// # Summary
    /// 写入报价并记录抓取时间。
    ///
    /// # Logic
    /// 同名 Key 直接覆盖，过期条目在此被惰性替换。
    fn put(&self, key: CacheKey, quote: Quote) {
        let entry = CacheEntry {
            quote,
            fetched_at: self.clock.now(),
        };
        debug!("Caching quote for {}", key);
        self.storage.insert(key, entry);
    }

    fn is_fresh(&self, key: &CacheKey) -> bool {
        self.storage
            .get(key)
            .is_some_and(|e| self.entry_is_fresh(e.value()))
    }

    /// # Summary
    /// 在同一次读锁内完成新鲜度判断与取值。
    fn get_fresh(&self, key: &CacheKey) -> Option<Quote> {
        self.storage
            .get(key)
            .filter(|e| self.entry_is_fresh(e.value()))
            .map(|e| e.value().quote.clone())
    }
}
