//! Scheduled refresh, independent of cache TTL and consumer traffic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Local, LocalResult, NaiveTime, TimeZone};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::RateCache;
use crate::resolver::RateResolver;
use crate::source::api::API_TAG;

const DAY: StdDuration = StdDuration::from_secs(24 * 60 * 60);

/// Injectable time source, so delay computation is deterministic under test
/// and independent scheduler instances can coexist.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in the local timezone.
    fn now_local(&self) -> DateTime<Local>;
}

/// The process wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Delay from `now` until the next midnight in `now`'s timezone.
///
/// On a DST transition that swallows midnight the delay falls back to a
/// plain 24h wait; an ambiguous midnight resolves to its earlier instant.
pub fn delay_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> StdDuration {
    let next_day = match now.date_naive().succ_opt() {
        Some(day) => day,
        None => return DAY,
    };

    let midnight = next_day.and_time(NaiveTime::MIN);
    let next = match now.timezone().from_local_datetime(&midnight) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t,
        LocalResult::None => return DAY,
    };

    next.signed_duration_since(now.clone())
        .to_std()
        .unwrap_or(StdDuration::ZERO)
}

/// Drives the resolver on a fixed daily cadence.
///
/// The first tick lands on the next local midnight; every subsequent tick is
/// an unconditional 24h later. Each tick invalidates the API memo tag first,
/// so the scheduled refresh always reaches the network. A failed tick is
/// logged and simply waits for the next cadence; there is no retry with
/// backoff, and nothing can terminate the loop short of [`stop`].
///
/// [`stop`]: RefreshScheduler::stop
pub struct RefreshScheduler {
    resolver: Arc<RateResolver>,
    cache: Arc<RateCache>,
    clock: Arc<dyn Clock>,
    interval: StdDuration,
    started: AtomicBool,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// Create a scheduler. Nothing runs until [`start`](Self::start).
    pub fn new(
        resolver: Arc<RateResolver>,
        cache: Arc<RateCache>,
        clock: Arc<dyn Clock>,
        interval: StdDuration,
    ) -> Self {
        Self {
            resolver,
            cache,
            clock,
            interval,
            started: AtomicBool::new(false),
            shutdown_tx: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Start the refresh loop. Idempotent: a second call while running is a
    /// no-op and returns `false`; duplicate timers are never created.
    pub fn start(&self) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("scheduler already started");
            return false;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        *self.shutdown_tx.lock() = Some(shutdown_tx);

        let resolver = self.resolver.clone();
        let cache = self.cache.clone();
        let interval = self.interval;
        let first_delay = delay_until_next_midnight(&self.clock.now_local());

        info!(
            delay_secs = first_delay.as_secs(),
            "first scheduled refresh at next local midnight"
        );

        let handle = tokio::spawn(async move {
            let mut delay = first_delay;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        cache.invalidate(API_TAG);
                        match resolver.refresh().await {
                            Some(rate) => info!(
                                value = rate.value,
                                source = %rate.source,
                                "scheduled refresh complete"
                            ),
                            None => warn!("scheduled refresh failed, waiting for next tick"),
                        }
                        delay = interval;
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("scheduler shutting down");
                        break;
                    }
                }
            }
        });
        *self.handle.lock() = Some(handle);

        true
    }

    /// Stop the refresh loop and wait for the task to exit. The scheduler
    /// can be started again afterwards.
    pub async fn stop(&self) {
        let shutdown_tx = self.shutdown_tx.lock().take();
        if let Some(tx) = shutdown_tx {
            let _ = tx.send(()).await;
        }

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.started.store(false, Ordering::SeqCst);
    }

    /// Whether the refresh loop is currently running.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MockRateSource, RateSource};
    use chrono::FixedOffset;

    #[test]
    fn delay_one_hour_before_midnight() {
        let tz = FixedOffset::west_opt(4 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2025, 8, 1, 23, 0, 0).unwrap();

        assert_eq!(
            delay_until_next_midnight(&now),
            StdDuration::from_secs(3600)
        );
    }

    #[test]
    fn delay_just_after_midnight() {
        let tz = FixedOffset::west_opt(4 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2025, 8, 1, 0, 5, 0).unwrap();

        assert_eq!(
            delay_until_next_midnight(&now),
            StdDuration::from_secs(23 * 3600 + 55 * 60)
        );
    }

    #[test]
    fn delay_never_exceeds_a_day() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let now = tz.with_ymd_and_hms(2025, 8, 1, 0, 0, 1).unwrap();

        assert!(delay_until_next_midnight(&now) < StdDuration::from_secs(24 * 60 * 60));
    }

    fn make_scheduler() -> RefreshScheduler {
        let source = Arc::new(MockRateSource::returning("mock", 36.5));
        let resolver = Arc::new(RateResolver::new(vec![source as Arc<dyn RateSource>]));
        RefreshScheduler::new(
            resolver,
            Arc::new(RateCache::new()),
            Arc::new(SystemClock),
            DAY,
        )
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let scheduler = make_scheduler();

        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_started());

        scheduler.stop().await;
    }

    #[tokio::test]
    async fn stop_allows_restart() {
        let scheduler = make_scheduler();

        assert!(scheduler.start());
        scheduler.stop().await;
        assert!(!scheduler.is_started());

        assert!(scheduler.start());
        scheduler.stop().await;
    }
}
