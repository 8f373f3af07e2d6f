//! Ticker behaviour under a paused Tokio clock.
//!
//! `start_paused` makes `sleep_until` resolve by auto-advancing the clock,
//! so these tests are deterministic and instant.

use std::time::Duration;

use gauntlet_tick::{MAX_RATE_HZ, Ticker};
use tokio::time::Instant;

fn ticker(rate_hz: u32) -> Ticker {
    Ticker::new(rate_hz, Duration::ZERO)
}

#[tokio::test(start_paused = true)]
async fn test_ticks_fire_at_fixed_period() {
    let start = Instant::now();
    let mut ticker = ticker(10);

    for _ in 0..5 {
        ticker.wait_for_tick().await;
    }

    assert_eq!(start.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_late_tick_restarts_cadence() {
    let mut ticker = ticker(10);
    ticker.wait_for_tick().await;

    // Next tick was due at 200ms; we are now at 450ms. It fires at once
    // instead of replaying 200ms, 300ms and 400ms.
    tokio::time::advance(Duration::from_millis(350)).await;
    let before = Instant::now();
    ticker.wait_for_tick().await;
    assert_eq!(before.elapsed(), Duration::ZERO);

    let before = Instant::now();
    ticker.wait_for_tick().await;
    assert_eq!(before.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_ticker_never_fires() {
    let mut ticker = ticker(0);

    let result =
        tokio::time::timeout(Duration::from_secs(60), ticker.wait_for_tick()).await;
    assert!(result.is_err(), "disabled ticker should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_rate_is_clamped() {
    let start = Instant::now();
    let mut ticker = ticker(10_000);
    ticker.wait_for_tick().await;

    // The timer wheel has millisecond resolution.
    let period = Duration::from_secs_f64(1.0 / f64::from(MAX_RATE_HZ));
    let elapsed = start.elapsed();
    assert!(elapsed >= period);
    assert!(elapsed <= period + Duration::from_millis(1));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_wait_keeps_schedule() {
    let mut ticker = ticker(10);

    let early = tokio::time::timeout(Duration::from_millis(40), ticker.wait_for_tick()).await;
    assert!(early.is_err());

    let start = Instant::now();
    ticker.wait_for_tick().await;
    assert_eq!(start.elapsed(), Duration::from_millis(60));
}

#[tokio::test(start_paused = true)]
async fn test_jitter_delays_first_tick_within_bound() {
    let start = Instant::now();
    let mut ticker = Ticker::new(10, Duration::from_millis(5));
    ticker.wait_for_tick().await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed <= Duration::from_millis(105));
}
