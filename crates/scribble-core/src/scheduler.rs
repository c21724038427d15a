//! Timing: frame throttling, debounced resize handling and periodic refresh.
//!
//! Time comes from an injected [`Clock`] so the engine can be driven
//! deterministically in tests.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

// Use web-time on WASM, std::time otherwise
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Interval between canvas-info refreshes.
pub const INFO_REFRESH_INTERVAL: Duration = Duration::from_secs(1);
/// Quiet period after the last resize before the surfaces are rebuilt.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall clock measured from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Lets an action run at most once per interval.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Duration>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Returns `true` (and records `now`) if the interval has elapsed since
    /// the last time this returned `true`.
    pub fn ready(&mut self, now: Duration) -> bool {
        match self.last {
            Some(last) if now.saturating_sub(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Forget the last run so the next `ready` call succeeds.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Fires once after triggers have stopped for `delay`.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    pending_since: Option<Duration>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    /// Record a trigger, restarting the quiet period.
    pub fn trigger(&mut self, now: Duration) {
        self.pending_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Returns `true` once when the quiet period has passed.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_sub(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.pending_since = None;
    }
}

/// Owns the clock and hands out the timers the engine runs on.
#[derive(Clone)]
pub struct Scheduler {
    clock: Rc<dyn Clock>,
}

impl Scheduler {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// A scheduler on the system clock.
    pub fn system() -> Self {
        Self::new(Rc::new(SystemClock::new()))
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn frame_throttle(&self, frame_interval: Duration) -> Throttle {
        Throttle::new(frame_interval)
    }

    pub fn info_refresh(&self) -> Throttle {
        Throttle::new(INFO_REFRESH_INTERVAL)
    }

    pub fn resize_debounce(&self) -> Debounce {
        Debounce::new(RESIZE_DEBOUNCE)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").field("now", &self.now()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_throttle_first_call_is_ready() {
        let mut throttle = Throttle::new(16 * MS);
        assert!(throttle.ready(Duration::ZERO));
        assert!(!throttle.ready(10 * MS));
        assert!(throttle.ready(16 * MS));
        assert!(!throttle.ready(20 * MS));
    }

    #[test]
    fn test_throttle_reset() {
        let mut throttle = Throttle::new(Duration::from_secs(1));
        assert!(throttle.ready(Duration::ZERO));
        throttle.reset();
        assert!(throttle.ready(MS));
    }

    #[test]
    fn test_debounce_waits_for_quiet() {
        let mut debounce = Debounce::new(150 * MS);
        assert!(!debounce.poll(Duration::ZERO));

        debounce.trigger(Duration::ZERO);
        debounce.trigger(100 * MS);
        assert!(!debounce.poll(200 * MS));
        assert!(debounce.poll(250 * MS));
        // Fires only once
        assert!(!debounce.poll(400 * MS));
    }

    #[test]
    fn test_debounce_cancel() {
        let mut debounce = Debounce::new(10 * MS);
        debounce.trigger(Duration::ZERO);
        debounce.cancel();
        assert!(!debounce.is_pending());
        assert!(!debounce.poll(Duration::from_secs(5)));
    }

    #[test]
    fn test_manual_clock_drives_scheduler() {
        let clock = Rc::new(ManualClock::new());
        let scheduler = Scheduler::new(clock.clone());
        assert_eq!(scheduler.now(), Duration::ZERO);
        clock.advance(40 * MS);
        assert_eq!(scheduler.now(), 40 * MS);

        let mut info = scheduler.info_refresh();
        assert!(info.ready(scheduler.now()));
        clock.advance(999 * MS);
        assert!(!info.ready(scheduler.now()));
        clock.advance(MS);
        assert!(info.ready(scheduler.now()));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
