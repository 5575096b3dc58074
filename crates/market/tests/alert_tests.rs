use chrono::{Duration, TimeZone, Utc};
use kabu_core::common::time::FakeClockProvider;
use kabu_market::alert::AlertDeduplicator;
use std::sync::Arc;

fn setup() -> (Arc<FakeClockProvider>, AlertDeduplicator) {
    let clock = Arc::new(FakeClockProvider::new(
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap(),
    ));
    let dedup = AlertDeduplicator::with_clock(Duration::seconds(1800), clock.clone());
    (clock, dedup)
}

#[test]
fn test_never_alerted_symbol_is_eligible() {
    let (_clock, dedup) = setup();
    assert!(dedup.should_alert("AAPL"));
    assert!(dedup.should_alert("AAPL"));
    assert!(dedup.last_alert_at("AAPL").is_none());
}

#[test]
fn test_cooldown_blocks_until_window_strictly_elapsed() {
    let (clock, dedup) = setup();
    dedup.record_alert_sent("AAPL");

    for secs in [1, 60, 1799, 1800] {
        let (window_clock, window) = setup();
        window.record_alert_sent("X");
        window_clock.advance(Duration::seconds(secs));
        assert!(!window.should_alert("X"), "should be cooling down at +{}s", secs);
    }

    clock.advance(Duration::seconds(1800));
    assert!(!dedup.should_alert("AAPL"));
    clock.advance(Duration::milliseconds(1));
    assert!(dedup.should_alert("AAPL"));
}

#[test]
fn test_recording_again_rearms_cooldown() {
    let (clock, dedup) = setup();
    dedup.record_alert_sent("AAPL");
    clock.advance(Duration::seconds(1801));
    assert!(dedup.should_alert("AAPL"));

    dedup.record_alert_sent("AAPL");
    assert_eq!(dedup.last_alert_at("AAPL"), Some(clock_now(&clock)));
    clock.advance(Duration::seconds(900));
    assert!(!dedup.should_alert("AAPL"));
}

#[test]
fn test_symbols_cool_down_independently() {
    let (_clock, dedup) = setup();
    dedup.record_alert_sent("AAPL");
    assert!(!dedup.should_alert("AAPL"));
    assert!(dedup.should_alert("MSFT"));
}

fn clock_now(clock: &FakeClockProvider) -> chrono::DateTime<Utc> {
    use kabu_core::common::time::TimeProvider;
    clock.now()
}

#[test]
fn test_real_clock_cooldown_blocks_immediate_repeat() {
    let dedup = AlertDeduplicator::new(Duration::seconds(1800));
    assert!(dedup.should_alert("BTC-USD"));
    dedup.record_alert_sent("BTC-USD");
    assert!(!dedup.should_alert("BTC-USD"));
    assert!(dedup.last_alert_at("BTC-USD").is_some());
}
