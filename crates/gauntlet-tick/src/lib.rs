//! Fixed-rate ticker for periodic work such as lobby snapshots.
//!
//! A [`Ticker`] is meant to live inside an actor's `tokio::select!` loop
//! next to its command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle command */ }
//!         _ = ticker.wait_for_tick() => { /* broadcast snapshot */ }
//!     }
//! }
//! ```
//!
//! A rate of 0 disables ticking: [`Ticker::wait_for_tick`] then pends
//! forever and the other `select!` branches keep running. A tick that
//! wakes up late restarts the cadence from now; missed periods are
//! logged, never replayed.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

pub const MAX_RATE_HZ: u32 = 128;

/// Upper bound on the random delay before the first tick, so that tickers
/// created together do not fire in lockstep.
pub const DEFAULT_INITIAL_JITTER: Duration = Duration::from_millis(2);

/// Fixed-rate ticker. One per periodic task.
pub struct Ticker {
    period: Option<Duration>,
    next: Option<Instant>,
    seq: u64,
}

impl Ticker {
    /// Ticks `rate_hz` times per second (clamped to [`MAX_RATE_HZ`]), the
    /// first one delayed by up to `initial_jitter` extra.
    pub fn new(rate_hz: u32, initial_jitter: Duration) -> Self {
        if rate_hz > MAX_RATE_HZ {
            warn!(rate_hz, max = MAX_RATE_HZ, "tick rate clamped");
        }
        let period = match rate_hz.min(MAX_RATE_HZ) {
            0 => None,
            hz => Some(Duration::from_secs_f64(1.0 / f64::from(hz))),
        };
        let next = period.map(|p| {
            let jitter_us = u64::try_from(initial_jitter.as_micros()).unwrap_or(u64::MAX);
            let jitter = if jitter_us > 0 {
                Duration::from_micros(rand::rng().random_range(0..jitter_us))
            } else {
                Duration::ZERO
            };
            Instant::now() + p + jitter
        });

        match period {
            Some(p) => debug!(period_ms = p.as_secs_f64() * 1000.0, "ticker created"),
            None => debug!("ticker created disabled"),
        }

        Self {
            period,
            next,
            seq: 0,
        }
    }

    pub fn with_rate(rate_hz: u32) -> Self {
        Self::new(rate_hz, DEFAULT_INITIAL_JITTER)
    }

    /// Waits for the next tick. Cancel-safe: dropping the future before it
    /// resolves leaves the schedule untouched.
    pub async fn wait_for_tick(&mut self) {
        let (Some(next), Some(period)) = (self.next, self.period) else {
            return std::future::pending().await;
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(next);
        self.seq += 1;
        if late_by > period / 10 {
            let skipped = late_by.as_nanos() / period.as_nanos();
            if skipped > 0 {
                warn!(
                    seq = self.seq,
                    skipped = u64::try_from(skipped).unwrap_or(u64::MAX),
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "tick overrun, skipping ahead"
                );
            }
        }
        trace!(seq = self.seq, "tick");
        self.next = Some(now + period);
    }
}
