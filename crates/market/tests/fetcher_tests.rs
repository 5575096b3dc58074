use async_trait::async_trait;
use kabu_core::common::{Instrument, Market};
use kabu_core::market::entity::Candle;
use kabu_core::market::error::{FetchError, MarketError};
use kabu_core::market::port::QuoteProvider;
use kabu_core::test_utils::{ScriptedProvider, daily_candles};
use kabu_market::fetcher::{FetcherConfig, QuoteFetcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn apple() -> Instrument {
    Instrument::new("AAPL", "Apple", Market::Us)
}

fn fetcher(provider: Arc<ScriptedProvider>) -> QuoteFetcher {
    QuoteFetcher::new(provider, FetcherConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_success_on_first_attempt_does_not_wait() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push("AAPL", Ok(daily_candles(&[100.0, 106.0])));

    let start = Instant::now();
    let quote = fetcher(provider.clone()).fetch(&apple()).await.unwrap();

    assert_eq!(quote.price, 106.0);
    assert!((quote.change_percent - 6.0).abs() < 1e-9);
    assert_eq!(provider.calls_for("AAPL"), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_empty_history_is_retried_with_backoff() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .push("AAPL", Ok(Vec::new()))
        .push("AAPL", Ok(daily_candles(&[100.0, 103.0])));

    let start = Instant::now();
    let quote = fetcher(provider.clone()).fetch(&apple()).await.unwrap();

    assert!((quote.change_percent - 3.0).abs() < 1e-9);
    assert_eq!(provider.calls_for("AAPL"), 2);
    // 第 1 次重试前等待 2^1 秒
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_empty_history_exhausts_retries() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push("AAPL", Ok(Vec::new()));

    let start = Instant::now();
    let err = fetcher(provider.clone()).fetch(&apple()).await.unwrap_err();

    assert_eq!(err, FetchError::EmptyData("AAPL".into()));
    assert_eq!(provider.calls_for("AAPL"), 3);
    // 2^1 + 2^2
    assert_eq!(start.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_persisting_through_all_attempts() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push("AAPL", Err(MarketError::RateLimited));

    let err = fetcher(provider.clone()).fetch(&apple()).await.unwrap_err();

    assert_eq!(err, FetchError::RateLimited("AAPL".into()));
    assert_eq!(provider.calls_for("AAPL"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_recovers_before_final_attempt() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .push("AAPL", Err(MarketError::RateLimited))
        .push("AAPL", Err(MarketError::RateLimited))
        .push("AAPL", Ok(daily_candles(&[50.0, 55.0])));

    let quote = fetcher(provider.clone()).fetch(&apple()).await.unwrap();
    assert_eq!(quote.price, 55.0);
    assert_eq!(provider.calls_for("AAPL"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_request_failure_is_not_retried() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .push("AAPL", Err(MarketError::Request("HTTP 404".into())))
        .push("AAPL", Ok(daily_candles(&[1.0, 2.0])));

    let start = Instant::now();
    let err = fetcher(provider.clone()).fetch(&apple()).await.unwrap_err();

    assert!(matches!(err, FetchError::RequestFailed { ref reason, .. } if reason == "HTTP 404"));
    assert_eq!(provider.calls_for("AAPL"), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_failures_are_transient() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push("AAPL", Err(MarketError::Parse("bad json".into())));

    let err = fetcher(provider.clone()).fetch(&apple()).await.unwrap_err();

    assert!(matches!(err, FetchError::Unknown { .. }));
    assert_eq!(provider.calls_for("AAPL"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_attempts_never_exceed_max_retries() {
    for max_retries in [0, 1, 2, 5] {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push("AAPL", Err(MarketError::Network("reset".into())));

        let config = FetcherConfig {
            max_retries,
            ..FetcherConfig::default()
        };
        let result = QuoteFetcher::new(provider.clone(), config).fetch(&apple()).await;

        assert!(result.is_err());
        assert_eq!(provider.calls_for("AAPL"), max_retries.max(1) as usize);
    }
}

/// 永不返回的行情源
struct HangingProvider;

#[async_trait]
impl QuoteProvider for HangingProvider {
    async fn recent_sessions(&self, _: &str, _: usize) -> Result<Vec<Candle>, MarketError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_hanging_provider_is_cut_off_by_timeout() {
    let config = FetcherConfig {
        max_retries: 2,
        request_timeout: Duration::from_secs(5),
        sessions: 2,
    };
    let fetcher = QuoteFetcher::new(Arc::new(HangingProvider), config);

    let start = Instant::now();
    let err = fetcher.fetch(&apple()).await.unwrap_err();

    assert!(matches!(err, FetchError::Unknown { .. }));
    // 5s 超时 + 2s 退避 + 5s 超时
    assert_eq!(start.elapsed(), Duration::from_secs(12));
}
