use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Supplies the current local instant. The classifier and the week view
/// never read the wall clock themselves.
pub trait Clock {
    fn now(&self) -> PrimitiveDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> PrimitiveDateTime {
        let now = OffsetDateTime::now_utc().to_offset(local_offset());
        PrimitiveDateTime::new(now.date(), now.time())
    }
}

/// Clock pinned to one instant, for deterministic evaluation in tests.
pub struct FixedClock(pub PrimitiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> PrimitiveDateTime {
        self.0
    }
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn utc_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

pub fn fresh_id() -> String {
    format!(
        "task-{}",
        OffsetDateTime::now_utc().unix_timestamp_nanos()
    )
}

/// Periodic re-evaluation timer. Fires the callback every `interval` until
/// cancelled or dropped; the worker sleeps in short slices so teardown does
/// not wait out a full interval.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start<F>(interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            const SLICE: Duration = Duration::from_millis(25);
            loop {
                let mut waited = Duration::ZERO;
                while waited < interval {
                    if flag.load(Ordering::Relaxed) {
                        return;
                    }
                    let step = SLICE.min(interval - waited);
                    std::thread::sleep(step);
                    waited += step;
                }
                if flag.load(Ordering::Relaxed) {
                    return;
                }
                on_tick();
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn cancel(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.halt();
    }
}
