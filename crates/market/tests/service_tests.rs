use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use kabu_cache::mem::MemQuoteCache;
use kabu_core::common::time::FakeClockProvider;
use kabu_core::common::{Instrument, Market, WatchEntry};
use kabu_core::market::error::MarketError;
use kabu_core::test_utils::{ScriptedProvider, daily_candles};
use kabu_market::fetcher::{FetcherConfig, QuoteFetcher};
use kabu_market::service::QuoteService;
use std::sync::Arc;

struct Harness {
    provider: Arc<ScriptedProvider>,
    clock: Arc<FakeClockProvider>,
    service: QuoteService,
}

fn harness() -> Harness {
    let provider = Arc::new(ScriptedProvider::new());
    let clock = Arc::new(FakeClockProvider::new(
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap(),
    ));
    let cache = Arc::new(MemQuoteCache::with_clock(
        ChronoDuration::seconds(60),
        clock.clone(),
    ));
    let fetcher = QuoteFetcher::with_clock(provider.clone(), FetcherConfig::default(), clock.clone());
    Harness {
        provider,
        clock,
        service: QuoteService::new(cache, fetcher),
    }
}

fn entry(symbol: &str, name: &str, market: Market, threshold: f64) -> WatchEntry {
    WatchEntry::new(Instrument::new(symbol, name, market), threshold)
}

#[tokio::test(start_paused = true)]
async fn test_fresh_cache_hit_skips_provider() {
    let h = harness();
    h.provider.push("AAPL", Ok(daily_candles(&[100.0, 106.0])));
    let apple = Instrument::new("AAPL", "Apple", Market::Us);

    let first = h.service.get_quote(&apple).await.unwrap();
    h.clock.advance(ChronoDuration::seconds(30));
    let second = h.service.get_quote(&apple).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.provider.calls_for("AAPL"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_entry_triggers_refetch() {
    let h = harness();
    h.provider
        .push("AAPL", Ok(daily_candles(&[100.0, 106.0])))
        .push("AAPL", Ok(daily_candles(&[106.0, 110.0])));
    let apple = Instrument::new("AAPL", "Apple", Market::Us);

    h.service.get_quote(&apple).await.unwrap();
    h.clock.advance(ChronoDuration::seconds(61));
    let refreshed = h.service.get_quote(&apple).await.unwrap();

    assert_eq!(refreshed.price, 110.0);
    assert_eq!(h.provider.calls_for("AAPL"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_is_absent_and_not_cached() {
    let h = harness();
    h.provider
        .push("NOPE", Err(MarketError::Request("HTTP 404".into())))
        .push("NOPE", Ok(daily_candles(&[1.0, 2.0])));
    let nope = Instrument::new("NOPE", "Missing", Market::Us);

    assert!(h.service.get_quote(&nope).await.is_none());
    assert!(h.service.get_quote(&nope).await.is_some());
    assert_eq!(h.provider.calls_for("NOPE"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_skips_failing_instrument_and_keeps_order() {
    let h = harness();
    h.provider
        .push("7203.T", Ok(daily_candles(&[3000.0, 3030.0])))
        .push("BROKEN", Err(MarketError::Parse("garbage".into())))
        .push("BTC-USD", Ok(daily_candles(&[60000.0, 61200.0])));

    let entries = vec![
        entry("7203.T", "Toyota", Market::Jp, 5.0),
        entry("BROKEN", "Broken", Market::Us, 5.0),
        entry("BTC-USD", "Bitcoin", Market::Crypto, 5.0),
    ];
    let quotes = h.service.get_all_quotes(&entries).await;

    let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["7203.T", "BTC-USD"]);
    assert_eq!(h.provider.calls_for("BROKEN"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_alert_candidates_respect_threshold() {
    let h = harness();
    h.provider
        .push("AAPL", Ok(daily_candles(&[100.0, 106.0])))
        .push("MSFT", Ok(daily_candles(&[100.0, 103.0])))
        .push("TSLA", Ok(daily_candles(&[100.0, 95.0])));

    let entries = vec![
        entry("AAPL", "Apple", Market::Us, 5.0),
        entry("MSFT", "Microsoft", Market::Us, 5.0),
        entry("TSLA", "Tesla", Market::Us, 5.0),
    ];
    let candidates = h.service.find_alert_candidates(&entries).await;

    let symbols: Vec<_> = candidates.iter().map(|q| q.symbol.as_str()).collect();
    // 下跌 5% 恰好达到阈值
    assert_eq!(symbols, vec!["AAPL", "TSLA"]);
    let apple = &candidates[0];
    assert_eq!(apple.price, 106.0);
    assert!((apple.change - 6.0).abs() < 1e-9);
    assert!((apple.change_percent - 6.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_below_threshold_is_excluded() {
    let h = harness();
    h.provider.push("AAPL", Ok(daily_candles(&[100.0, 103.0])));
    let entries = vec![entry("AAPL", "Apple", Market::Us, 5.0)];

    let candidates = h.service.find_alert_candidates(&entries).await;
    assert!(candidates.is_empty());

    let quotes = h.service.get_all_quotes(&entries).await;
    assert!((quotes[0].change_percent - 3.0).abs() < 1e-9);
    // 第二轮扫描命中缓存
    assert_eq!(h.provider.calls_for("AAPL"), 1);
}
