//! 测试辅助组件：可编排的行情源与记录型通知器。

use crate::market::entity::Candle;
use crate::market::error::MarketError;
use crate::market::port::QuoteProvider;
use crate::notify::entity::Embed;
use crate::notify::error::NotifyError;
use crate::notify::port::Notifier;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// 构造一组按日递增的日线，收盘价依次取 `closes`。
pub fn daily_candles(closes: &[f64]) -> Vec<Candle> {
    let start = Utc
        .with_ymd_and_hms(2026, 1, 5, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    closes
        .iter()
        .enumerate()
        .map(|(day, &close)| Candle {
            time: start + Duration::days(i64::try_from(day).unwrap_or(0)),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        })
        .collect()
}

/// # Summary
/// 按代码逐次回放预设响应的行情源。
///
/// # Invariants
/// - 每个代码的响应队列按调用顺序消费；队列耗尽后重复最后一个响应。
/// - 未编排的代码返回 `MarketError::Unknown`。
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<Result<Vec<Candle>, MarketError>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为代码追加一个响应
    pub fn push(&self, symbol: &str, response: Result<Vec<Candle>, MarketError>) -> &Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(symbol.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// 某代码被调用的次数
    pub fn calls_for(&self, symbol: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.as_str() == symbol)
            .count()
    }
}

#[async_trait]
impl QuoteProvider for ScriptedProvider {
    async fn recent_sessions(
        &self,
        symbol: &str,
        sessions: usize,
    ) -> Result<Vec<Candle>, MarketError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(symbol.to_string());

        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = scripts
            .get_mut(symbol)
            .ok_or_else(|| MarketError::Unknown(format!("no script for {}", symbol)))?;

        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match response {
            Some(Ok(mut candles)) => {
                let skip = candles.len().saturating_sub(sessions);
                Ok(candles.split_off(skip))
            }
            Some(Err(e)) => Err(e),
            None => Err(MarketError::Unknown(format!("empty script for {}", symbol))),
        }
    }
}

/// # Summary
/// 记录所有发送内容的通知器，可切换为失败模式。
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Embed>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Embed> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, embed: &Embed) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Platform("HTTP 500".into()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(embed.clone());
        Ok(())
    }
}
