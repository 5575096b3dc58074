use crate::command::CommandParser;
use crate::handler::{self, CommandOutcome};
use crate::report;
use chrono::Duration as ChronoDuration;
use kabu_core::common::WatchEntry;
use kabu_core::common::time::{RealTimeProvider, TimeProvider};
use kabu_core::config::AppConfig;
use kabu_core::notify::error::NotifyError;
use kabu_core::notify::port::Notifier;
use kabu_core::store::error::StoreError;
use kabu_core::store::port::InstrumentStore;
use kabu_market::alert::AlertDeduplicator;
use kabu_market::service::QuoteService;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),
    #[error("Command parser error: {0}")]
    Parser(#[from] regex::Error),
}

/// # Summary
/// 行情机器人，负责定时播报、波动告警与命令处理。
///
/// # Invariants
/// - 两个周期任务在同一调度循环中串行执行，互不重叠。
/// - 监控列表在每次任务开始时由仓库重新推导。
/// - 告警在发送尝试后即记录，通知失败不会重试 (至多一次)。
pub struct StockBot {
    config: AppConfig,
    quotes: QuoteService,
    alerts: AlertDeduplicator,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn InstrumentStore>,
    parser: CommandParser,
    clock: Arc<dyn TimeProvider>,
}

impl StockBot {
    pub fn new(
        config: AppConfig,
        quotes: QuoteService,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn InstrumentStore>,
    ) -> Result<Self, BotError> {
        Self::with_clock(config, quotes, notifier, store, Arc::new(RealTimeProvider))
    }

    /// # Summary
    /// 使用指定时钟构造机器人，告警冷却与消息时间戳共用该时钟。
    pub fn with_clock(
        config: AppConfig,
        quotes: QuoteService,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn InstrumentStore>,
        clock: Arc<dyn TimeProvider>,
    ) -> Result<Self, BotError> {
        let cooldown = ChronoDuration::seconds(
            i64::try_from(config.alert.cooldown_secs).unwrap_or(i64::MAX),
        );
        Ok(Self {
            alerts: AlertDeduplicator::with_clock(cooldown, clock.clone()),
            parser: CommandParser::new()?,
            config,
            quotes,
            notifier,
            store,
            clock,
        })
    }

    /// 本轮的监控列表：仓库非空时取仓库，否则取种子列表
    pub async fn watchlist(&self) -> Vec<WatchEntry> {
        self.config.watchlist_from(self.store.load().await)
    }

    /// # Summary
    /// 执行一次定时播报。
    ///
    /// # Logic
    /// 1. 推导监控列表并获取全部报价。
    /// 2. 无任何报价时记录警告并返回 `Ok(0)`，不发送消息。
    /// 3. 否则按市场分组生成一条汇总消息发送。
    ///
    /// # Returns
    /// 汇总消息包含的报价数量；通知失败时返回 `BotError::Notify`。
    pub async fn send_regular_update(&self) -> Result<usize, BotError> {
        info!("Starting regular quote update");
        let watchlist = self.watchlist().await;
        let quotes = self.quotes.get_all_quotes(&watchlist).await;

        let Some(embed) = report::regular_embed(&quotes, self.clock.now()) else {
            warn!("No quotes available, regular update skipped");
            return Ok(0);
        };

        self.notifier.notify(&embed).await?;
        info!("Regular update sent with {} quotes", quotes.len());
        Ok(quotes.len())
    }

    /// # Summary
    /// 执行一次波动告警检查。
    ///
    /// # Logic
    /// 1. 找出涨跌幅达到阈值的候选报价。
    /// 2. 处于冷却期的标的跳过。
    /// 3. 逐个发送告警；无论发送成败都记录发送时间。
    ///
    /// # Returns
    /// 本轮尝试发送的告警数量。
    pub async fn check_price_alerts(&self) -> usize {
        let watchlist = self.watchlist().await;
        let candidates = self.quotes.find_alert_candidates(&watchlist).await;

        let mut dispatched = 0;
        for quote in candidates {
            if !self.alerts.should_alert(&quote.symbol) {
                continue;
            }
            info!(
                "Price alert for {}: {:+.2}%",
                quote.symbol, quote.change_percent
            );
            if let Err(e) = self.notifier.notify(&report::alert_embed(&quote)).await {
                error!("Failed to deliver alert for {}: {}", quote.symbol, e);
            }
            self.alerts.record_alert_sent(&quote.symbol);
            dispatched += 1;
        }
        dispatched
    }

    /// # Summary
    /// 解析并执行一行聊天命令，并将结果回复到通知渠道。
    ///
    /// # Returns
    /// - 无法识别的文本返回 `Ok(None)`。
    /// - 仓库写回失败返回 `BotError::Store`；回复发送失败只记录日志。
    pub async fn handle_command(
        &self,
        text: &str,
        user: &str,
    ) -> Result<Option<CommandOutcome>, BotError> {
        let Some(command) = self.parser.parse(text, user) else {
            return Ok(None);
        };
        let outcome = handler::apply(self.store.as_ref(), &command).await?;

        let reply = report::command_reply_embed(&outcome, self.clock.now());
        if let Err(e) = self.notifier.notify(&reply).await {
            warn!("Failed to send reply for {} command: {}", command.action, e);
        }
        Ok(Some(outcome))
    }

    /// # Summary
    /// 调度循环，直到 `shutdown` 完成。
    ///
    /// # Logic
    /// 1. 定时播报立即执行一次，此后每 `interval_secs` 执行。
    /// 2. 告警检查在一个检查间隔之后开始，每 `check_interval_secs` 执行。
    /// 3. 错过的节拍顺延，不补发。
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let regular_every = Duration::from_secs(self.config.notification.interval_secs.max(1));
        let alert_every = Duration::from_secs(self.config.alert.check_interval_secs.max(1));

        let mut regular = tokio::time::interval(regular_every);
        regular.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut alert = tokio::time::interval_at(Instant::now() + alert_every, alert_every);
        alert.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Scheduler started: regular every {:?}, alert check every {:?}",
            regular_every, alert_every
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, scheduler stopping");
                    break;
                }
                _ = regular.tick() => {
                    if let Err(e) = self.send_regular_update().await {
                        error!("Regular update failed: {}", e);
                    }
                }
                _ = alert.tick() => {
                    self.check_price_alerts().await;
                }
            }
        }
    }
}
