use kabu_core::common::Instrument;
use kabu_core::common::time::{RealTimeProvider, TimeProvider};
use kabu_core::market::entity::Quote;
use kabu_core::market::error::{FetchError, MarketError};
use kabu_core::market::port::QuoteProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

/// # Summary
/// 抓取器参数。
///
/// # Invariants
/// - `max_retries` 为总尝试次数上限，0 按 1 处理。
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub max_retries: u32,
    // 单次行情源调用的超时
    pub request_timeout: Duration,
    // 每次请求的交易日数量
    pub sessions: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            request_timeout: Duration::from_secs(10),
            sessions: 2,
        }
    }
}

/// 第 `attempt` 次尝试 (从 0 计) 之前的等待时长：`2^attempt` 秒，无抖动。
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// # Summary
/// 对外部行情源调用包上退避重试的无状态抓取器。
///
/// # Invariants
/// - 跨调用不保存任何状态，除网络调用外没有副作用。
/// - 一次重试序列总是完整执行，直到成功、遇到不可重试错误或耗尽次数。
pub struct QuoteFetcher {
    provider: Arc<dyn QuoteProvider>,
    config: FetcherConfig,
    clock: Arc<dyn TimeProvider>,
}

/// 单次尝试失败后的处理方式
enum Verdict {
    Retry,
    Fail(FetchError),
}

impl QuoteFetcher {
    pub fn new(provider: Arc<dyn QuoteProvider>, config: FetcherConfig) -> Self {
        Self::with_clock(provider, config, Arc::new(RealTimeProvider))
    }

    pub fn with_clock(
        provider: Arc<dyn QuoteProvider>,
        config: FetcherConfig,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            provider,
            config,
            clock,
        }
    }

    /// # Summary
    /// 获取单个标的的报价。
    ///
    /// # Logic
    /// 1. 最多尝试 `max_retries` 次，第 k 次 (k > 0) 前等待 `2^k` 秒。
    /// 2. 每次尝试以 `request_timeout` 为上限调用行情源，超时按瞬时故障处理。
    /// 3. 空数据、限流、其他故障可重试；请求级失败立即返回。
    /// 4. 成功时由最近两个交易日计算涨跌并返回报价。
    ///
    /// # Arguments
    /// * `instrument`: 目标标的。
    ///
    /// # Returns
    /// 成功返回报价，失败返回重试序列的终态错误。
    pub async fn fetch(&self, instrument: &Instrument) -> Result<Quote, FetchError> {
        let symbol = instrument.symbol.as_str();
        let attempts = self.config.max_retries.max(1);

        for attempt in 0..attempts {
            if attempt > 0 {
                let wait = backoff_delay(attempt);
                info!(
                    "Retry {}/{} for {}, waiting {}s",
                    attempt + 1,
                    attempts,
                    symbol,
                    wait.as_secs()
                );
                sleep(wait).await;
            }

            let is_final = attempt + 1 == attempts;
            let outcome = match timeout(
                self.config.request_timeout,
                self.provider.recent_sessions(symbol, self.config.sessions),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(MarketError::Network(format!(
                    "timed out after {}s",
                    self.config.request_timeout.as_secs()
                ))),
            };

            let verdict = match outcome {
                Ok(candles) => {
                    if let Some(quote) =
                        Quote::from_candles(instrument, &candles, self.clock.now())
                    {
                        info!("Fetched quote {} = {:.2}", symbol, quote.price);
                        return Ok(quote);
                    }
                    warn!(
                        "Empty history for {} (attempt {}/{})",
                        symbol,
                        attempt + 1,
                        attempts
                    );
                    Self::transient(is_final, FetchError::EmptyData(symbol.to_string()))
                }
                Err(MarketError::RateLimited) => {
                    warn!(
                        "Rate limited for {} (attempt {}/{})",
                        symbol,
                        attempt + 1,
                        attempts
                    );
                    Self::transient(is_final, FetchError::RateLimited(symbol.to_string()))
                }
                Err(MarketError::Request(reason)) => Verdict::Fail(FetchError::RequestFailed {
                    symbol: symbol.to_string(),
                    reason,
                }),
                Err(other) => {
                    warn!(
                        "Fetch error for {}: {} (attempt {}/{})",
                        symbol,
                        other,
                        attempt + 1,
                        attempts
                    );
                    Self::transient(
                        is_final,
                        FetchError::Unknown {
                            symbol: symbol.to_string(),
                            reason: other.to_string(),
                        },
                    )
                }
            };

            if let Verdict::Fail(err) = verdict {
                error!("Giving up on {}: {}", symbol, err);
                return Err(err);
            }
        }

        Err(FetchError::Unknown {
            symbol: symbol.to_string(),
            reason: "retries exhausted".to_string(),
        })
    }

    fn transient(is_final: bool, err: FetchError) -> Verdict {
        if is_final {
            Verdict::Fail(err)
        } else {
            Verdict::Retry
        }
    }
}
