use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use kabu_core::common::time::{RealTimeProvider, TimeProvider};
use std::sync::Arc;

/// # Summary
/// 按标的维护冷却窗口的告警去重器。
///
/// # Invariants
/// - 同一标的两次实际发送之间的间隔严格大于冷却窗口。
/// - 条目在首次发送时创建，此后只更新不删除。
/// - 纯内存状态，任何操作都不会失败。
pub struct AlertDeduplicator {
    // 标的代码 -> 最近一次发送时间
    last_alert: DashMap<String, DateTime<Utc>>,
    cooldown: Duration,
    clock: Arc<dyn TimeProvider>,
}

impl AlertDeduplicator {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_clock(cooldown, Arc::new(RealTimeProvider))
    }

    pub fn with_clock(cooldown: Duration, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            last_alert: DashMap::new(),
            cooldown,
            clock,
        }
    }

    /// # Summary
    /// 判断是否应为该标的发送告警。
    ///
    /// # Logic
    /// 1. 从未告警过的标的总是返回 true。
    /// 2. 否则仅当 `now - last_alert_at > cooldown` 时返回 true。
    pub fn should_alert(&self, symbol: &str) -> bool {
        match self.last_alert.get(symbol) {
            None => true,
            Some(last) => self.clock.now() - *last.value() > self.cooldown,
        }
    }

    /// 记录一次实际发送，重新开始冷却。
    pub fn record_alert_sent(&self, symbol: &str) {
        self.last_alert.insert(symbol.to_string(), self.clock.now());
    }

    pub fn last_alert_at(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.last_alert.get(symbol).map(|t| *t.value())
    }
}

